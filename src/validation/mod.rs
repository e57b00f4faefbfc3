//! The static checks run against a registry before it serves requests.
//!
//! Cycles, empty nodes and ambiguous labels are errors; nodes that can end up
//! unavailable and needs nothing can satisfy are reported as advisories.

pub use self::error::{ValidationError, ValidationErrorType};
pub use self::validator::Validator;

mod error;
mod validator;
mod rules {
    pub mod coverage;
    pub mod structure;
}
