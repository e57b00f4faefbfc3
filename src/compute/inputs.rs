//! inputs.rs
//! The resolved needs handed to a strategy's compute function, with typed accessors.

use crate::ports::CollaboratorError;
use crate::store::{Location, Record, Value, ValueKind};
use chrono::NaiveDate;
use smallvec::SmallVec;
use thiserror::Error;

/// Why a strategy did not produce a value.
///
/// Every variant except a fatal collaborator failure makes the resolver fall
/// through to the next strategy.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrategyError {
    #[error("Strategy produced no result")]
    NoResult,
    #[error("Input '{0}' was not resolved")]
    MissingInput(String),
    #[error("Input '{name}' is a {actual}, expected a {expected}")]
    TypeMismatch { name: String, expected: ValueKind, actual: ValueKind },
    #[error("Record {category}({key}) has no usable field '{field}'")]
    MissingField { category: String, key: String, field: String },
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

impl StrategyError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, StrategyError::Collaborator(e) if e.is_fatal())
    }
}

/// Read-only view over a strategy's resolved needs.
#[derive(Debug, Clone)]
pub struct Inputs<'a> {
    values: SmallVec<[(&'a str, Value); 4]>,
}

impl<'a> Inputs<'a> {
    pub(crate) fn new(values: SmallVec<[(&'a str, Value); 4]>) -> Self {
        Self { values }
    }

    /// Builds a view directly, for exercising compute functions in isolation.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        Self { values: pairs.into_iter().collect() }
    }

    pub fn get(&self, name: &str) -> Result<&Value, StrategyError> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| StrategyError::MissingInput(name.to_string()))
    }

    fn mismatch(name: &str, expected: ValueKind, actual: &Value) -> StrategyError {
        StrategyError::TypeMismatch { name: name.to_string(), expected, actual: actual.kind() }
    }

    pub fn number(&self, name: &str) -> Result<f64, StrategyError> {
        match self.get(name)? {
            Value::Number(n) => Ok(*n),
            other => Err(Self::mismatch(name, ValueKind::Number, other)),
        }
    }

    /// Accepts a date value or an ISO-8601 date string.
    pub fn date(&self, name: &str) -> Result<NaiveDate, StrategyError> {
        match self.get(name)? {
            Value::Date(d) => Ok(*d),
            Value::Text(s) => s.parse::<NaiveDate>().map_err(|_| Self::mismatch(name, ValueKind::Date, &Value::Text(s.clone()))),
            other => Err(Self::mismatch(name, ValueKind::Date, other)),
        }
    }

    pub fn text(&self, name: &str) -> Result<&str, StrategyError> {
        match self.get(name)? {
            Value::Text(s) => Ok(s),
            other => Err(Self::mismatch(name, ValueKind::Text, other)),
        }
    }

    pub fn record(&self, name: &str) -> Result<&Record, StrategyError> {
        match self.get(name)? {
            Value::Record(r) => Ok(r),
            other => Err(Self::mismatch(name, ValueKind::Record, other)),
        }
    }

    pub fn location(&self, name: &str) -> Result<&Location, StrategyError> {
        match self.get(name)? {
            Value::Location(l) => Ok(l),
            other => Err(Self::mismatch(name, ValueKind::Location, other)),
        }
    }

    /// Numeric field of a record input, e.g. `rail_class.speed`.
    pub fn field(&self, name: &str, field: &str) -> Result<f64, StrategyError> {
        let record = self.record(name)?;
        record.number(field).ok_or_else(|| StrategyError::MissingField {
            category: record.category.clone(),
            key: record.key.clone(),
            field: field.to_string(),
        })
    }

    pub fn len(&self) -> usize { self.values.len() }
    pub fn is_empty(&self) -> bool { self.values.is_empty() }
}
