//! The central validator that orchestrates the execution of all validation rules.
use super::error::ValidationError;
use super::rules::{coverage, structure};
use crate::store::Registry;
use std::collections::HashSet;

/// The orchestrator for the static checks.
///
/// It's like a linter for the registry: it collects every problem before any
/// request is resolved, instead of letting the first unlucky request find it.
pub struct Validator<'a> {
    registry: &'a Registry,
    declared: HashSet<String>,
}

impl<'a> Validator<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry, declared: HashSet::new() }
    }

    /// Names clients may supply directly. Enables the unknown-need lint.
    pub fn with_characteristics<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared = names.into_iter().map(Into::into).collect();
        self
    }

    /// Runs the hard rules.
    ///
    /// # Returns
    /// - `Ok(())` if the registry is safe to serve requests from.
    /// - `Err(Vec<ValidationError>)` with every problem found.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = structure::validate_cycles(self.registry);

        for node in self.registry.nodes() {
            errors.extend(structure::validate_not_empty(node));
            errors.extend(structure::validate_unique_labels(node));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Runs the advisory rules. Findings here do not make the registry unusable.
    pub fn lint(&self) -> Vec<ValidationError> {
        let mut findings = Vec::new();
        for node in self.registry.nodes() {
            findings.extend(coverage::lint_default(node));
            if !self.declared.is_empty() {
                findings.extend(coverage::lint_needs(self.registry, node, &self.declared));
            }
        }
        findings
    }
}
