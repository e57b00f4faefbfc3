//! Narrow interfaces to everything outside the engine: reference data, geocoding,
//! routing, and persistence of request records.
//!
//! All calls are blocking. Timeouts and retries belong to the implementation; the
//! engine only sees a value or a `CollaboratorError`.
pub mod memory;

use crate::store::{Coordinates, Location, Record};
use std::fmt;
use thiserror::Error;

pub use memory::{InMemoryRecordStore, InMemoryReferenceData, ReferenceLoadError, StaticGeocoder, StaticRouter};

/// Client input as received, before characterization.
pub type RawCharacteristics = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollaboratorErrorKind {
    /// The collaborator has no answer for this input.
    NotFound,
    /// Transient or unexplained failure (timeout, connection reset...).
    Failed,
    /// Remote service answered with a non-success status code.
    Status(u16),
    /// Misconfiguration on our side (missing endpoint, bad key format...).
    Configuration,
    /// Credentials rejected.
    Unauthorized,
}

impl fmt::Display for CollaboratorErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollaboratorErrorKind::NotFound => f.write_str("not found"),
            CollaboratorErrorKind::Failed => f.write_str("failed"),
            CollaboratorErrorKind::Status(code) => write!(f, "status {}", code),
            CollaboratorErrorKind::Configuration => f.write_str("misconfigured"),
            CollaboratorErrorKind::Unauthorized => f.write_str("unauthorized"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{service} {kind}: {message}")]
pub struct CollaboratorError {
    pub service: &'static str,
    pub kind: CollaboratorErrorKind,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(service: &'static str, kind: CollaboratorErrorKind, message: impl Into<String>) -> Self {
        Self { service, kind, message: message.into() }
    }

    pub fn not_found(service: &'static str, message: impl Into<String>) -> Self {
        Self::new(service, CollaboratorErrorKind::NotFound, message)
    }

    pub fn failed(service: &'static str, message: impl Into<String>) -> Self {
        Self::new(service, CollaboratorErrorKind::Failed, message)
    }

    pub fn status(service: &'static str, code: u16) -> Self {
        Self::new(service, CollaboratorErrorKind::Status(code), format!("request returned {}", code))
    }

    pub fn configuration(service: &'static str, message: impl Into<String>) -> Self {
        Self::new(service, CollaboratorErrorKind::Configuration, message)
    }

    pub fn unauthorized(service: &'static str, message: impl Into<String>) -> Self {
        Self::new(service, CollaboratorErrorKind::Unauthorized, message)
    }

    /// Retrying or falling back to another strategy cannot help with these.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, CollaboratorErrorKind::Configuration | CollaboratorErrorKind::Unauthorized)
    }
}

/// Lookup of curated reference rows by category and key.
pub trait ReferenceData: Send + Sync {
    /// `Ok(None)` means the key does not exist in that category.
    fn lookup(&self, category: &str, key: &str) -> Result<Option<Record>, CollaboratorError>;
}

pub trait Geocoder: Send + Sync {
    fn geocode(&self, text: &str) -> Result<Location, CollaboratorError>;
}

pub trait Router: Send + Sync {
    /// Travel distance between two points, in kilometres.
    fn distance_km(&self, a: Coordinates, b: Coordinates) -> Result<f64, CollaboratorError>;
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record store I/O failed: {0}")]
    Io(String),
}

/// Persistence of request records (the raw characteristics a client submitted).
pub trait RecordStore: Send + Sync {
    fn load(&self, id: &str) -> Result<Option<RawCharacteristics>, StoreError>;
    fn save(&self, id: &str, record: &RawCharacteristics) -> Result<(), StoreError>;
}
