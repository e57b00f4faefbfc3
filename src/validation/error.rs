//! Defines the error types for the validation module.
use std::fmt;

/// The specific category of a validation finding.
///
// This enum allows for programmatic inspection of findings, which is more
// robust than string matching on the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorType {
    /// Nodes whose strategies depend on each other in a loop.
    Cycle,
    /// A node registered with no strategies at all.
    EmptyNode,
    /// Two strategies of one node share a label, making provenance ambiguous.
    DuplicateLabel,
    /// Advisory: every strategy has needs, so the node can end up unavailable.
    MissingDefault,
    /// Advisory: a need is neither a node nor a declared characteristic.
    UnknownNeed,
}

/// A structured finding from the static checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The node where the problem was detected.
    pub node_name: String,
    pub error_type: ValidationErrorType,
    /// A human-readable message explaining the problem.
    pub message: String,
}

impl ValidationError {
    pub fn new(node_name: impl Into<String>, error_type: ValidationErrorType, message: impl Into<String>) -> Self {
        Self { node_name: node_name.into(), error_type, message: message.into() }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.node_name, self.message)
    }
}

impl std::error::Error for ValidationError {}
