//! # Entity Store
//!
//! Durable key-value collections with the two capabilities the rest of the
//! crate relies on:
//!
//! - point reads, filtered scans and server-side counts
//! - atomic read-modify-write commits guarded by the revisions a
//!   transaction observed, plus a change notification stream
//!
//! [`MemoryStore`] is the in-process reference implementation; any backend
//! that implements [`EntityStore`] can be dropped in.

pub mod checksum;
pub mod errors;
pub mod key;
pub mod memory;
pub mod revision;
pub mod snapshot;
pub mod transaction;

pub use errors::{StoreError, StoreResult};
pub use key::{Collection, CollectionPath, DocKey};
pub use memory::MemoryStore;
pub use revision::Revision;
pub use snapshot::{export_dataset, import_dataset, SnapshotFile};
pub use transaction::{run_transaction, Committed, Transaction};

use std::collections::BTreeMap;

use serde_json::Value;

use crate::realtime::{ChangeFilter, ChangeReceiver};

/// A document as stored, with the revision of the commit that last wrote it
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDoc {
    pub key: DocKey,
    pub revision: Revision,
    pub data: Value,
}

/// Revisions observed by a transaction; None records an absent document
pub type ReadSet = BTreeMap<DocKey, Option<Revision>>;

/// One buffered write
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Create or overwrite a document
    Set { key: DocKey, data: Value },
    /// Remove a document (no-op if absent)
    Delete { key: DocKey },
}

impl WriteOp {
    pub fn key(&self) -> &DocKey {
        match self {
            WriteOp::Set { key, .. } => key,
            WriteOp::Delete { key } => key,
        }
    }
}

/// Equality predicate on a top-level document field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

impl FieldFilter {
    /// `field == value`
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Check if a document matches this filter. A missing field never matches.
    pub fn matches(&self, document: &Value) -> bool {
        document
            .get(&self.field)
            .map(|v| v == &self.value)
            .unwrap_or(false)
    }
}

/// Backing store for every entity collection
pub trait EntityStore: Send + Sync {
    /// Point read
    fn get(&self, key: &DocKey) -> StoreResult<Option<StoredDoc>>;

    /// All documents in `path` matching every filter, in key order
    fn scan(&self, path: &CollectionPath, filters: &[FieldFilter]) -> StoreResult<Vec<StoredDoc>>;

    /// Number of documents in `path` matching every filter, computed by the
    /// store without returning the documents
    fn count(&self, path: &CollectionPath, filters: &[FieldFilter]) -> StoreResult<u64>;

    /// Atomically apply `writes` if every document in `reads` still has the
    /// observed revision. Fails with [`StoreError::Conflict`] otherwise.
    fn commit(&self, reads: &ReadSet, writes: Vec<WriteOp>) -> StoreResult<Revision>;

    /// Subscribe to committed changes
    fn subscribe(&self, filter: ChangeFilter) -> ChangeReceiver;
}

impl<S: EntityStore + ?Sized> EntityStore for std::sync::Arc<S> {
    fn get(&self, key: &DocKey) -> StoreResult<Option<StoredDoc>> {
        (**self).get(key)
    }

    fn scan(&self, path: &CollectionPath, filters: &[FieldFilter]) -> StoreResult<Vec<StoredDoc>> {
        (**self).scan(path, filters)
    }

    fn count(&self, path: &CollectionPath, filters: &[FieldFilter]) -> StoreResult<u64> {
        (**self).count(path, filters)
    }

    fn commit(&self, reads: &ReadSet, writes: Vec<WriteOp>) -> StoreResult<Revision> {
        (**self).commit(reads, writes)
    }

    fn subscribe(&self, filter: ChangeFilter) -> ChangeReceiver {
        (**self).subscribe(filter)
    }
}
