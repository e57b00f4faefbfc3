//! The rail trip: which inputs a client may send, and how each quantity is derived.
pub mod characterization;
pub mod rail_trip;

pub use characterization::{CharacteristicKind, Characterization, CharacterizationError, Declared};
pub use rail_trip::{build_registry, GOAL};
