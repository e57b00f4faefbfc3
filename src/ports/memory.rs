//! In-memory collaborators: reference tables loaded from JSON, canned geocoder and
//! router answers, and a map-backed record store.

use super::{CollaboratorError, Geocoder, RawCharacteristics, RecordStore, ReferenceData, Router, StoreError};
use crate::store::{Coordinates, Location, Record};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReferenceLoadError {
    #[error("Failed to read reference data from {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("Reference data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Reference tables keyed by `(category, key)`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReferenceData {
    rows: HashMap<(String, String), Record>,
}

impl InMemoryReferenceData {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, record: Record) -> Self {
        self.insert(record);
        self
    }

    pub fn insert(&mut self, record: Record) {
        self.rows.insert((record.category.clone(), record.key.clone()), record);
    }

    pub fn len(&self) -> usize { self.rows.len() }
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    /// Parses `{ "<category>": { "<key>": { "<field>": <value>, ... } } }`.
    pub fn from_json_str(json: &str) -> Result<Self, ReferenceLoadError> {
        type Tables = BTreeMap<String, BTreeMap<String, BTreeMap<String, serde_json::Value>>>;
        let tables: Tables = serde_json::from_str(json)?;

        let mut data = Self::new();
        for (category, rows) in tables {
            for (key, fields) in rows {
                data.insert(Record { category: category.clone(), key, fields });
            }
        }
        tracing::debug!(rows = data.len(), "reference data parsed");
        Ok(data)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReferenceLoadError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|source| ReferenceLoadError::Io { path: path.display().to_string(), source })?;
        Self::from_json_str(&json)
    }
}

impl ReferenceData for InMemoryReferenceData {
    fn lookup(&self, category: &str, key: &str) -> Result<Option<Record>, CollaboratorError> {
        Ok(self.rows.get(&(category.to_string(), key.to_string())).cloned())
    }
}

/// Answers from a fixed table; anything else is `NotFound`.
#[derive(Debug, Default)]
pub struct StaticGeocoder {
    places: HashMap<String, Location>,
    fail_with: Option<CollaboratorError>,
    calls: AtomicUsize,
}

impl StaticGeocoder {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, text: impl Into<String>, lat: f64, lng: f64, country_code: impl Into<String>) -> Self {
        let location = Location { coordinates: Coordinates::new(lat, lng), country_code: country_code.into() };
        self.places.insert(text.into(), location);
        self
    }

    /// Every call fails with `err`.
    pub fn failing(err: CollaboratorError) -> Self {
        Self { fail_with: Some(err), ..Self::default() }
    }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::Relaxed) }
}

impl Geocoder for StaticGeocoder {
    fn geocode(&self, text: &str) -> Result<Location, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.places
            .get(text)
            .cloned()
            .ok_or_else(|| CollaboratorError::not_found("geocoder", format!("no match for '{}'", text)))
    }
}

/// Known routes between coordinate pairs; unknown pairs answer with status 601 (unroutable).
#[derive(Debug, Default)]
pub struct StaticRouter {
    routes: Vec<(Coordinates, Coordinates, f64)>,
    fail_with: Option<CollaboratorError>,
    calls: AtomicUsize,
}

impl StaticRouter {
    const UNROUTABLE: u16 = 601;
    const EPSILON: f64 = 1e-6;

    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, a: Coordinates, b: Coordinates, km: f64) -> Self {
        self.routes.push((a, b, km));
        self
    }

    pub fn failing(err: CollaboratorError) -> Self {
        Self { fail_with: Some(err), ..Self::default() }
    }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::Relaxed) }

    fn same(x: Coordinates, y: Coordinates) -> bool {
        (x.lat - y.lat).abs() < Self::EPSILON && (x.lng - y.lng).abs() < Self::EPSILON
    }
}

impl Router for StaticRouter {
    fn distance_km(&self, a: Coordinates, b: Coordinates) -> Result<f64, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.routes
            .iter()
            .find(|(from, to, _)| (Self::same(*from, a) && Self::same(*to, b)) || (Self::same(*from, b) && Self::same(*to, a)))
            .map(|(_, _, km)| *km)
            .ok_or_else(|| CollaboratorError::status("router", Self::UNROUTABLE))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<String, RawCharacteristics>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self { Self::default() }
}

impl RecordStore for InMemoryRecordStore {
    fn load(&self, id: &str) -> Result<Option<RawCharacteristics>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Io("record store lock poisoned".into()))?;
        Ok(records.get(id).cloned())
    }

    fn save(&self, id: &str, record: &RawCharacteristics) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::Io("record store lock poisoned".into()))?;
        records.insert(id.to_string(), record.clone());
        Ok(())
    }
}
