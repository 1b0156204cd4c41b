//! # Transactions
//!
//! Optimistic read-modify-write units on top of [`EntityStore::commit`].
//!
//! A transaction records the revision of every document it reads, buffers
//! its writes, and hands both to the store at commit. All reads must happen
//! before the first write. [`run_transaction`] re-runs the body with fresh
//! reads whenever the commit reports a conflict, up to a fixed number of
//! attempts.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::key::DocKey;
use super::revision::Revision;
use super::{EntityStore, ReadSet, WriteOp};
use crate::observability::Logger;

/// An open transaction against a store
pub struct Transaction<'s, S: EntityStore + ?Sized> {
    store: &'s S,
    reads: ReadSet,
    writes: Vec<WriteOp>,
}

impl<'s, S: EntityStore + ?Sized> Transaction<'s, S> {
    /// Begin a transaction
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            reads: ReadSet::new(),
            writes: Vec::new(),
        }
    }

    /// Read a document, recording its revision for the commit check
    pub fn get(&mut self, key: &DocKey) -> StoreResult<Option<Value>> {
        if !self.writes.is_empty() {
            return Err(StoreError::ReadAfterWrite(key.clone()));
        }

        let doc = self.store.get(key)?;
        self.reads
            .entry(key.clone())
            .or_insert_with(|| doc.as_ref().map(|d| d.revision));

        Ok(doc.map(|d| d.data))
    }

    /// Read and deserialize a document
    pub fn get_as<T: DeserializeOwned>(&mut self, key: &DocKey) -> StoreResult<Option<T>> {
        match self.get(key)? {
            Some(data) => serde_json::from_value(data)
                .map(Some)
                .map_err(|e| StoreError::Malformed {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    /// Buffer a full-document write
    pub fn set<T: Serialize>(&mut self, key: DocKey, record: &T) -> StoreResult<()> {
        let data = serde_json::to_value(record)?;
        self.writes.push(WriteOp::Set { key, data });
        Ok(())
    }

    /// Buffer a raw document write
    pub fn set_value(&mut self, key: DocKey, data: Value) {
        self.writes.push(WriteOp::Set { key, data });
    }

    /// Buffer a delete
    pub fn delete(&mut self, key: DocKey) {
        self.writes.push(WriteOp::Delete { key });
    }

    /// Submit reads and writes to the store
    pub fn commit(self) -> StoreResult<Revision> {
        self.store.commit(&self.reads, self.writes)
    }
}

/// Result of a committed transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed<T> {
    /// Value returned by the transaction body
    pub value: T,
    /// Revision assigned to the commit
    pub revision: Revision,
    /// Number of attempts it took (1 = no conflict)
    pub attempts: u32,
}

/// Run `body` inside a transaction, retrying on commit conflicts.
///
/// An error returned by `body` aborts immediately with nothing written. After
/// `max_attempts` conflicting commits the call fails with
/// [`StoreError::RetriesExhausted`].
pub fn run_transaction<S, T, E, F>(store: &S, max_attempts: u32, mut body: F) -> Result<Committed<T>, E>
where
    S: EntityStore + ?Sized,
    E: From<StoreError>,
    F: FnMut(&mut Transaction<'_, S>) -> Result<T, E>,
{
    let attempts = max_attempts.max(1);

    for attempt in 1..=attempts {
        let mut txn = Transaction::new(store);
        let value = body(&mut txn)?;

        match txn.commit() {
            Ok(revision) => {
                return Ok(Committed {
                    value,
                    revision,
                    attempts: attempt,
                })
            }
            Err(StoreError::Conflict(key)) => {
                Logger::trace(
                    "TXN_CONFLICT",
                    &[
                        ("attempt", &attempt.to_string()),
                        ("key", &key.to_string()),
                    ],
                );
                std::thread::yield_now();
            }
            Err(e) => return Err(e.into()),
        }
    }

    Logger::warn(
        "TXN_RETRIES_EXHAUSTED",
        &[("attempts", &attempts.to_string())],
    );
    Err(StoreError::RetriesExhausted { attempts }.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::key::Collection;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn key(id: &str) -> DocKey {
        DocKey::entity(Collection::Axioms, id)
    }

    #[test]
    fn test_read_after_write_rejected() {
        let store = MemoryStore::new();
        let mut txn = Transaction::new(&store);
        txn.set_value(key("a"), json!({}));
        assert!(matches!(
            txn.get(&key("a")),
            Err(StoreError::ReadAfterWrite(_))
        ));
    }

    #[test]
    fn test_malformed_document_reported() {
        let store = MemoryStore::with_documents(vec![(key("a"), json!({ "id": 5 }))]).unwrap();
        let mut txn = Transaction::new(&store);
        let result = txn.get_as::<crate::model::Axiom>(&key("a"));
        assert!(matches!(result, Err(StoreError::Malformed { .. })));
    }

    #[test]
    fn test_interleaved_transactions_conflict() {
        let store = MemoryStore::with_documents(vec![(key("a"), json!({ "n": 0 }))]).unwrap();

        let mut first = Transaction::new(&store);
        first.get(&key("a")).unwrap();

        let mut second = Transaction::new(&store);
        second.get(&key("a")).unwrap();
        second.set_value(key("a"), json!({ "n": 1 }));
        second.commit().unwrap();

        first.set_value(key("a"), json!({ "n": 2 }));
        assert!(matches!(first.commit(), Err(StoreError::Conflict(_))));
    }

    #[test]
    fn test_run_transaction_retries_after_conflict() {
        let store = MemoryStore::with_documents(vec![(key("a"), json!({ "n": 0 }))]).unwrap();
        let mut interfered = false;

        let committed = run_transaction::<_, _, StoreError, _>(&store, 3, |txn| {
            let current = txn.get(&key("a"))?.unwrap();
            let n = current["n"].as_i64().unwrap();

            if !interfered {
                interfered = true;
                store
                    .commit(&ReadSet::new(), vec![WriteOp::Set {
                        key: key("a"),
                        data: json!({ "n": 100 }),
                    }])
                    .unwrap();
            }

            txn.set_value(key("a"), json!({ "n": n + 1 }));
            Ok(n + 1)
        })
        .unwrap();

        assert_eq!(committed.attempts, 2);
        assert_eq!(committed.value, 101);
        assert_eq!(store.get(&key("a")).unwrap().unwrap().data, json!({ "n": 101 }));
    }

    #[test]
    fn test_run_transaction_exhausts_retries() {
        let store = MemoryStore::with_documents(vec![(key("a"), json!({ "n": 0 }))]).unwrap();

        let result = run_transaction::<_, (), StoreError, _>(&store, 2, |txn| {
            txn.get(&key("a"))?;
            store
                .commit(&ReadSet::new(), vec![WriteOp::Set {
                    key: key("a"),
                    data: json!({ "n": 1 }),
                }])
                .unwrap();
            txn.set_value(key("a"), json!({ "n": 2 }));
            Ok(())
        });

        assert!(matches!(
            result,
            Err(StoreError::RetriesExhausted { attempts: 2 })
        ));
    }

    #[test]
    fn test_body_error_aborts_without_writes() {
        let store = MemoryStore::new();
        let result = run_transaction::<_, (), StoreError, _>(&store, 3, |txn| {
            txn.set_value(key("a"), json!({}));
            Err(StoreError::Internal("abort".into()))
        });
        assert!(result.is_err());
        assert!(store.is_empty());
    }
}
