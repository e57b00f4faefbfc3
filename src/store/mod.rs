//! Defines the core data structures: values, characteristics, compliance, and the node registry.
pub mod characteristics;
pub mod compliance;
pub mod registry;
pub mod timeframe;
pub mod types;

pub use characteristics::Characteristics;
pub use compliance::{Compliance, ComplianceSet, ComplianceTag};
pub use registry::{ComputeFn, Node, Registry, Strategy};
pub use timeframe::{Timeframe, TimeframeError};
pub use types::{Coordinates, Location, NodeId, Record, Value, ValueKind};
