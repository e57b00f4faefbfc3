// Library facade: the main entry point for embedding the engine.
// Nodes and their ordered strategies live in `store`, on-demand resolution in
// `compute`, and the rail trip model itself in `model`.

pub mod analysis;
pub mod compute;
pub mod config;
pub mod display;
pub mod logging;
pub mod model;
pub mod ports;
pub mod service;
pub mod store;
pub mod validation;

pub use compute::{resolve, resolve_all, Ledger, Outcome, Provenance, Request, Resolution, ResolutionError, StrategyError};
pub use config::{EngineConfig, LoggingConfig};
pub use service::{Collaborators, ImpactService, ServiceError};
pub use store::{Characteristics, Compliance, ComplianceSet, ComplianceTag, Registry, Strategy, Timeframe, Value};
