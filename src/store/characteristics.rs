//! The per-request bag of client-supplied values.

use super::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named input values supplied once at request start. Never mutated during resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Characteristics {
    values: BTreeMap<String, Value>,
}

impl Characteristics {
    pub fn new() -> Self { Self::default() }

    /// Builder form; a later value for the same name replaces the earlier one.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Absent values are never stored, so an absent characteristic cannot short-circuit a node.
    pub fn insert_opt(&mut self, name: impl Into<String>, value: Option<Value>) {
        if let Some(v) = value {
            self.values.insert(name.into(), v);
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool { self.values.contains_key(name) }
    pub fn len(&self) -> usize { self.values.len() }
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Characteristics {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self { values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect() }
    }
}
