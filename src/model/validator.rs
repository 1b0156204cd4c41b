//! Input validation for catalog writes
//!
//! Validation runs before any transaction is opened. It is deterministic and
//! never mutates its input. Structural checks that need stored state
//! (parent existence, environment match) are performed by the catalog inside
//! its transaction using [`check_extension`].

use thiserror::Error;

use super::types::{Status, StructureNode};

/// Result type for validation
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required text field is blank
    #[error("{0} cannot be empty")]
    Blank(&'static str),

    /// Symbol lists must not repeat a symbol
    #[error("duplicate symbol '{0}'")]
    DuplicateSymbol(String),

    /// New axiom definitions need both a name and a notation
    #[error("missing axiom definition")]
    MissingAxiomDefinition,

    /// The parent is classified as deadend or deprecated
    #[error("node {node_id} is {status} and cannot be extended")]
    NotExtendable { node_id: String, status: Status },

    /// A child must live in its parent's environment
    #[error("environment mismatch: parent is in {parent_env}, child requested {child_env}")]
    EnvironmentMismatch {
        parent_env: String,
        child_env: String,
    },

    /// A node cannot be marked as a duplicate of itself
    #[error("node {0} cannot duplicate itself")]
    SelfDuplicate(String),

    /// Admin profiles keep their role and reputation
    #[error("user {0} is an admin and cannot be modified")]
    ProtectedAdmin(String),
}

/// Require a trimmed, non-empty value
pub fn require_text(field: &'static str, value: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Blank(field));
    }
    Ok(trimmed.to_string())
}

/// Validate an ordered symbol set (sets or operators)
pub fn validate_symbols(symbols: &[String]) -> ValidationResult<Vec<String>> {
    let mut seen = Vec::with_capacity(symbols.len());
    for raw in symbols {
        let symbol = require_text("symbol", raw)?;
        if seen.contains(&symbol) {
            return Err(ValidationError::DuplicateSymbol(symbol));
        }
        seen.push(symbol);
    }
    Ok(seen)
}

/// Check that `parent` may receive a child in `environment_id`
pub fn check_extension(parent: &StructureNode, environment_id: &str) -> ValidationResult<()> {
    if !parent.status.is_extendable() {
        return Err(ValidationError::NotExtendable {
            node_id: parent.id.clone(),
            status: parent.status,
        });
    }
    if parent.environment_id != environment_id {
        return Err(ValidationError::EnvironmentMismatch {
            parent_env: parent.environment_id.clone(),
            child_env: environment_id.to_string(),
        });
    }
    Ok(())
}
