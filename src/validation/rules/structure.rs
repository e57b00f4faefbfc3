//! Hard structural rules: a registry failing these should not be deployed.

use crate::analysis::topology;
use crate::store::{Node, Registry};
use crate::validation::error::{ValidationError, ValidationErrorType};
use std::collections::HashSet;

/// "The Loop Rule": no node may transitively need itself.
///
/// At request time a cycle is only discovered if some request happens to walk into
/// it, so it is checked for the whole registry up front.
pub(crate) fn validate_cycles(registry: &Registry) -> Vec<ValidationError> {
    topology::find_cycles(registry)
        .into_iter()
        .map(|path| {
            ValidationError::new(
                path[0].clone(),
                ValidationErrorType::Cycle,
                format!("Circular dependency: {}", path.join(" -> ")),
            )
        })
        .collect()
}

pub(crate) fn validate_not_empty(node: &Node) -> Option<ValidationError> {
    if node.strategies().is_empty() {
        return Some(ValidationError::new(
            node.name(),
            ValidationErrorType::EmptyNode,
            "Node has no strategies and can never resolve.",
        ));
    }
    None
}

pub(crate) fn validate_unique_labels(node: &Node) -> Option<ValidationError> {
    let mut seen = HashSet::new();
    let duplicates: Vec<&str> = node
        .strategies()
        .iter()
        .map(|s| s.label())
        .filter(|label| !seen.insert(*label))
        .collect();

    if duplicates.is_empty() {
        return None;
    }
    Some(ValidationError::new(
        node.name(),
        ValidationErrorType::DuplicateLabel,
        format!("Strategy labels must be unique within a node; repeated: {:?}", duplicates),
    ))
}
