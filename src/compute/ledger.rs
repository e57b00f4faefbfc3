//! ledger.rs
//! Per-request cache of resolved outcomes, each tagged with its provenance.

use crate::ports::CollaboratorError;
use crate::store::{Compliance, Strategy, Value};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Fatal conditions that abort a whole request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolutionError {
    #[error("Circular dependency: {}", .path.join(" -> "))]
    CircularDependency { path: Vec<String> },
    #[error("Strategy '{label}' of '{node}' cannot run: {source}")]
    Collaborator { node: String, label: String, #[source] source: CollaboratorError },
}

pub const CLIENT_INPUT_LABEL: &str = "from client input";

/// Which calculation path produced a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub label: String,
    pub compliance: Compliance,
    /// The need names the strategy consumed, in declared order.
    pub inputs: SmallVec<[String; 4]>,
}

impl Provenance {
    pub fn client_input() -> Self {
        Self { label: CLIENT_INPUT_LABEL.to_string(), compliance: Compliance::Universal, inputs: SmallVec::new() }
    }

    pub(crate) fn from_strategy(strategy: &Strategy) -> Self {
        Self {
            label: strategy.label().to_string(),
            compliance: strategy.compliance().clone(),
            inputs: strategy.need_names().iter().cloned().collect(),
        }
    }

    pub fn is_client_input(&self) -> bool {
        self.inputs.is_empty() && self.label == CLIENT_INPUT_LABEL
    }
}

/// Terminal state of one name within a request.
///
/// `Unavailable` is an ordinary outcome, never confused with a resolved zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Resolved { value: Value, provenance: Provenance },
    Unavailable,
}

impl Outcome {
    pub fn is_resolved(&self) -> bool { matches!(self, Outcome::Resolved { .. }) }

    pub fn value(&self) -> Option<&Value> {
        match self { Outcome::Resolved { value, .. } => Some(value), Outcome::Unavailable => None }
    }

    pub fn provenance(&self) -> Option<&Provenance> {
        match self { Outcome::Resolved { provenance, .. } => Some(provenance), Outcome::Unavailable => None }
    }

    pub fn number(&self) -> Option<f64> {
        self.value().and_then(Value::as_number)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: BTreeMap<String, Outcome>,
}

impl Ledger {
    pub fn new() -> Self { Self::default() }

    #[inline(always)]
    pub fn get(&self, name: &str) -> Option<&Outcome> {
        self.entries.get(name)
    }

    #[inline(always)]
    pub fn insert(&mut self, name: impl Into<String>, outcome: Outcome) {
        self.entries.insert(name.into(), outcome);
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Outcome)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Names touched by the derivation of `target` (itself included).
    pub fn derivation_of(&self, target: &str) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut stack = vec![target];

        while let Some(name) = stack.pop() {
            let Some((key, outcome)) = self.entries.get_key_value(name) else { continue };
            if !seen.insert(key.as_str()) {
                continue;
            }
            order.push(key.as_str());
            if let Some(p) = outcome.provenance() {
                stack.extend(p.inputs.iter().rev().map(String::as_str));
            }
        }
        order
    }

    /// Intersection of the compliance claims of every strategy in the derivation of `target`.
    ///
    /// Returns `None` when `target` is unavailable or was never resolved.
    pub fn derivation_compliance(&self, target: &str) -> Option<Compliance> {
        if !self.get(target)?.is_resolved() {
            return None;
        }
        let mut acc = None;
        for name in self.derivation_of(target) {
            if let Some(p) = self.get(name).and_then(Outcome::provenance) {
                p.compliance.restrict(&mut acc);
            }
        }
        Some(acc.map_or(Compliance::Universal, Compliance::Tags))
    }
}
