//! # Store Errors
//!
//! Error types for the entity store.

use thiserror::Error;

use super::key::DocKey;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Entity store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    // ==================
    // Transaction Errors
    // ==================
    /// A document read by the transaction changed before commit
    #[error("Write conflict on {0}")]
    Conflict(DocKey),

    /// Every attempt of a retried transaction hit a conflict
    #[error("Transaction aborted after {attempts} conflicting attempts")]
    RetriesExhausted { attempts: u32 },

    /// Transactions must finish reading before they start writing
    #[error("Read of {0} after a write in the same transaction")]
    ReadAfterWrite(DocKey),

    // ==================
    // Data Errors
    // ==================
    /// Stored document does not match the expected record shape
    #[error("Malformed document {key}: {reason}")]
    Malformed { key: String, reason: String },

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    // ==================
    // Snapshot Errors
    // ==================
    /// Snapshot file could not be read or written
    #[error("Snapshot I/O error: {0}")]
    Io(String),

    /// Snapshot payload does not match its checksum
    #[error("Snapshot checksum mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { expected: u32, computed: u32 },

    // ==================
    // Internal Errors
    // ==================
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Whether retrying the same operation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Conflict(_) | StoreError::RetriesExhausted { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::key::Collection;

    #[test]
    fn test_transient_errors() {
        let key = DocKey::entity(Collection::Nodes, "n1");
        assert!(StoreError::Conflict(key).is_transient());
        assert!(StoreError::RetriesExhausted { attempts: 5 }.is_transient());
        assert!(!StoreError::Internal("x".into()).is_transient());
    }

    #[test]
    fn test_checksum_message_is_hex() {
        let err = StoreError::ChecksumMismatch {
            expected: 0xdeadbeef,
            computed: 1,
        };
        assert!(err.to_string().contains("0xdeadbeef"));
    }
}
