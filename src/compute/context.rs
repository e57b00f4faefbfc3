//! Request-local state: inputs, timeframe, compliance filter, cache, and the in-progress stack.

use super::ledger::Ledger;
use crate::store::{Characteristics, ComplianceSet, Timeframe};

/// Lives exactly as long as one resolution request. Never shared between requests.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    pub(crate) characteristics: Characteristics,
    pub(crate) timeframe: Timeframe,
    pub(crate) required: ComplianceSet,
    pub(crate) ledger: Ledger,
    // Ordered so a re-entry can report the full cycle path.
    pub(crate) in_progress: Vec<String>,
}

impl ResolutionContext {
    pub fn new(characteristics: Characteristics, timeframe: Timeframe, required: ComplianceSet) -> Self {
        Self {
            characteristics,
            timeframe,
            required,
            ledger: Ledger::new(),
            in_progress: Vec::new(),
        }
    }

    pub fn characteristics(&self) -> &Characteristics { &self.characteristics }
    pub fn timeframe(&self) -> &Timeframe { &self.timeframe }
    pub fn required_compliance(&self) -> &ComplianceSet { &self.required }
    pub fn ledger(&self) -> &Ledger { &self.ledger }

    pub fn into_ledger(self) -> Ledger { self.ledger }

    /// Position of `name` on the in-progress stack, if it is currently being resolved.
    pub(crate) fn reentry(&self, name: &str) -> Option<usize> {
        self.in_progress.iter().position(|n| n == name)
    }
}
