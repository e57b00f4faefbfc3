//! Advisory rules about how reliably a node can produce a value.

use crate::store::{Node, Registry};
use crate::validation::error::{ValidationError, ValidationErrorType};
use std::collections::HashSet;

/// A node whose every strategy has needs can be unavailable for sparse input.
/// That is legitimate (e.g. a location that only a geocoder can supply) but worth listing.
pub(crate) fn lint_default(node: &Node) -> Option<ValidationError> {
    if node.strategies().is_empty() || node.has_default() {
        return None;
    }
    Some(ValidationError::new(
        node.name(),
        ValidationErrorType::MissingDefault,
        "No strategy without needs; the node is unavailable when none of its needs resolve.",
    ))
}

/// Needs that nothing can satisfy: not a node, and not a characteristic clients may send.
pub(crate) fn lint_needs(registry: &Registry, node: &Node, declared: &HashSet<String>) -> Vec<ValidationError> {
    let mut reported = HashSet::new();
    node.strategies()
        .iter()
        .flat_map(|s| s.need_names().iter().map(move |n| (s.label(), n.as_str())))
        .filter(|(_, need)| !registry.contains(need) && !declared.contains(*need))
        .filter(|(_, need)| reported.insert(*need))
        .map(|(label, need)| {
            ValidationError::new(
                node.name(),
                ValidationErrorType::UnknownNeed,
                format!("Strategy '{}' needs '{}', which is neither a node nor a declared characteristic.", label, need),
            )
        })
        .collect()
}
