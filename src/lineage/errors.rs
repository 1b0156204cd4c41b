//! Lineage errors

use thiserror::Error;

/// Result type for chain verification
pub type LineageResult<T> = Result<T, LineageError>;

/// Structural corruption found while walking a parent chain
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineageError {
    /// The starting node is not in the dataset
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// A node names a parent that does not exist
    #[error("Node {node_id} references missing parent {parent_id}")]
    MissingParent { node_id: String, parent_id: String },

    /// The parent chain revisits a node
    #[error("Parent chain cycles back to {0}")]
    Cycle(String),
}
