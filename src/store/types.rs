//! types.rs
//! Values flowing through the resolver: client input, reference records, and computed results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline(always)]
    pub fn index(&self) -> usize { self.0 as usize }
    pub fn new(idx: usize) -> Self { Self(idx as u32) }
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self { Self { lat, lng } }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// The answer of a geocoder: where a place is and which country it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub coordinates: Coordinates,
    pub country_code: String,
}

/// A row of reference data (a rail class, a country, a fuel...).
///
/// Fields are kept as loose JSON so one record type serves every category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub category: String,
    pub key: String,
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl Record {
    pub fn new(category: impl Into<String>, key: impl Into<String>) -> Self {
        Self { category: category.into(), key: key.into(), fields: BTreeMap::new() }
    }

    /// Builder used by fixtures and in-memory reference tables.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(serde_json::Value::as_f64)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(serde_json::Value::as_str)
    }
}

/// The atomic unit of data in the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Number(f64),
    Date(NaiveDate),
    Text(String),
    /// Shared reference-data record; cloning a resolved value never copies the row.
    Record(Arc<Record>),
    Location(Location),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Number(_) => ValueKind::Number,
            Value::Date(_) => ValueKind::Date,
            Value::Text(_) => ValueKind::Text,
            Value::Record(_) => ValueKind::Record,
            Value::Location(_) => ValueKind::Location,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self { Value::Number(n) => Some(*n), _ => None }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self { Value::Record(r) => Some(r), _ => None }
    }

    pub fn record(record: Record) -> Self { Value::Record(Arc::new(record)) }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self { Value::Number(n) }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self { Value::Date(d) }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self { Value::record(r) }
}

impl From<Location> for Value {
    fn from(l: Location) -> Self { Value::Location(l) }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{:.3}", n),
            Value::Date(d) => write!(f, "{}", d),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Record(r) => write!(f, "{}({})", r.category, r.key),
            Value::Location(l) => write!(f, "{} [{}]", l.coordinates, l.country_code),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Number,
    Date,
    Text,
    Record,
    Location,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueKind::Number => "number",
            ValueKind::Date => "date",
            ValueKind::Text => "text",
            ValueKind::Record => "record",
            ValueKind::Location => "location",
        };
        f.write_str(s)
    }
}
