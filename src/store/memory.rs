//! # In-Memory Store
//!
//! Thread-safe reference implementation of [`EntityStore`].
//!
//! ## Invariants
//! - Commits are serialized by a single write lock; a commit either applies
//!   every write or none.
//! - Every commit that writes gets a fresh revision, strictly greater than
//!   all earlier ones. A deleted and re-created document never reuses a
//!   revision, so stale reads are always detected.
//! - Change events are published before the lock is released.

use std::collections::BTreeMap;
use std::sync::RwLock;

use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::key::{CollectionPath, DocKey};
use super::revision::Revision;
use super::{EntityStore, FieldFilter, ReadSet, StoredDoc, WriteOp};
use crate::realtime::{ChangeEvent, ChangeFeed, ChangeFilter, ChangeReceiver};

#[derive(Debug, Clone)]
struct Entry {
    revision: Revision,
    data: Value,
}

#[derive(Debug)]
struct Inner {
    docs: BTreeMap<DocKey, Entry>,
    head: Revision,
}

/// In-process entity store
#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    feed: ChangeFeed,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                docs: BTreeMap::new(),
                head: Revision::new(0),
            }),
            feed: ChangeFeed::new(),
        }
    }

    /// Create a store holding `documents`, all written by a single commit
    pub fn with_documents(documents: Vec<(DocKey, Value)>) -> StoreResult<Self> {
        let store = Self::new();
        if !documents.is_empty() {
            let writes = documents
                .into_iter()
                .map(|(key, data)| WriteOp::Set { key, data })
                .collect();
            store.commit(&ReadSet::new(), writes)?;
        }
        Ok(store)
    }

    /// Every stored document, in key order
    pub fn documents(&self) -> StoreResult<Vec<(DocKey, Value)>> {
        let inner = self.read_inner()?;
        Ok(inner
            .docs
            .iter()
            .map(|(key, entry)| (key.clone(), entry.data.clone()))
            .collect())
    }

    /// Revision of the latest commit
    pub fn head(&self) -> StoreResult<Revision> {
        Ok(self.read_inner()?.head)
    }

    /// Number of stored documents across all collections
    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The change feed this store publishes to
    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    fn read_inner(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Internal("Lock poisoned".into()))
    }

    fn matching<'a>(
        inner: &'a Inner,
        path: &'a CollectionPath,
        filters: &'a [FieldFilter],
    ) -> impl Iterator<Item = (&'a DocKey, &'a Entry)> + 'a {
        inner
            .docs
            .iter()
            .filter(move |(key, _)| &key.path == path)
            .filter(move |(_, entry)| filters.iter().all(|f| f.matches(&entry.data)))
    }
}

impl EntityStore for MemoryStore {
    fn get(&self, key: &DocKey) -> StoreResult<Option<StoredDoc>> {
        let inner = self.read_inner()?;
        Ok(inner.docs.get(key).map(|entry| StoredDoc {
            key: key.clone(),
            revision: entry.revision,
            data: entry.data.clone(),
        }))
    }

    fn scan(&self, path: &CollectionPath, filters: &[FieldFilter]) -> StoreResult<Vec<StoredDoc>> {
        let inner = self.read_inner()?;
        Ok(Self::matching(&inner, path, filters)
            .map(|(key, entry)| StoredDoc {
                key: key.clone(),
                revision: entry.revision,
                data: entry.data.clone(),
            })
            .collect())
    }

    fn count(&self, path: &CollectionPath, filters: &[FieldFilter]) -> StoreResult<u64> {
        let inner = self.read_inner()?;
        Ok(Self::matching(&inner, path, filters).count() as u64)
    }

    fn commit(&self, reads: &ReadSet, writes: Vec<WriteOp>) -> StoreResult<Revision> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::Internal("Lock poisoned".into()))?;

        for (key, observed) in reads {
            let current = inner.docs.get(key).map(|entry| entry.revision);
            if current != *observed {
                return Err(StoreError::Conflict(key.clone()));
            }
        }

        if writes.is_empty() {
            return Ok(inner.head);
        }

        let revision = inner.head.next();
        inner.head = revision;

        let mut events = Vec::with_capacity(writes.len());
        for write in writes {
            let (key, previous, data) = match write {
                WriteOp::Set { key, data } => {
                    let previous = inner.docs.insert(
                        key.clone(),
                        Entry {
                            revision,
                            data: data.clone(),
                        },
                    );
                    (key, previous.map(|e| e.data), Some(data))
                }
                WriteOp::Delete { key } => {
                    let previous = inner.docs.remove(&key);
                    (key, previous.map(|e| e.data), None)
                }
            };

            if let Some(event) = ChangeEvent::from_images(
                key.collection_name(),
                key.id.clone(),
                revision,
                previous,
                data,
            ) {
                events.push(event);
            }
        }

        for event in events {
            self.feed.publish(event);
        }

        Ok(revision)
    }

    fn subscribe(&self, filter: ChangeFilter) -> ChangeReceiver {
        self.feed.subscribe(filter)
    }
}
