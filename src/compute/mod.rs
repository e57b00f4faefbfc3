//! Resolves nodes on demand against a request's characteristics.
pub mod batch;
pub mod context;
pub mod engine;
pub mod inputs;
pub mod ledger;

pub use batch::{resolve_all, Request};
pub use context::ResolutionContext;
pub use engine::{resolve, Resolution, Resolver};
pub use inputs::{Inputs, StrategyError};
pub use ledger::{Ledger, Outcome, Provenance, ResolutionError};
