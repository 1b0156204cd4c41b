//! # Snapshots
//!
//! JSON snapshot files and typed import/export between a store and a
//! [`Dataset`].
//!
//! File layout:
//!
//! ```text
//! { "checksum": <crc32 of payload text>, "payload": "<json text>" }
//! ```
//!
//! The checksum covers the exact payload text, so verification never
//! depends on how a JSON library orders keys.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::checksum::{compute_checksum, verify_checksum};
use super::errors::{StoreError, StoreResult};
use super::key::{Collection, CollectionPath, DocKey};
use super::memory::MemoryStore;
use super::{EntityStore, ReadSet, WriteOp};
use crate::model::Dataset;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    checksum: u32,
    payload: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotDocument {
    key: DocKey,
    data: Value,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Payload {
    documents: Vec<SnapshotDocument>,
}

/// A snapshot file on disk
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write every document of `store`, replacing the file atomically
    pub fn save(&self, store: &MemoryStore) -> StoreResult<()> {
        let payload = Payload {
            documents: store
                .documents()?
                .into_iter()
                .map(|(key, data)| SnapshotDocument { key, data })
                .collect(),
        };
        let payload = serde_json::to_string(&payload)?;
        let envelope = Envelope {
            checksum: compute_checksum(payload.as_bytes()),
            payload,
        };
        let content = serde_json::to_string_pretty(&envelope)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Load the file into a fresh store. Revisions restart from one commit.
    pub fn load(&self) -> StoreResult<MemoryStore> {
        let content = fs::read_to_string(&self.path)?;
        let envelope: Envelope = serde_json::from_str(&content)?;

        if !verify_checksum(envelope.payload.as_bytes(), envelope.checksum) {
            return Err(StoreError::ChecksumMismatch {
                expected: envelope.checksum,
                computed: compute_checksum(envelope.payload.as_bytes()),
            });
        }

        let payload: Payload = serde_json::from_str(&envelope.payload)?;
        MemoryStore::with_documents(
            payload
                .documents
                .into_iter()
                .map(|doc| (doc.key, doc.data))
                .collect(),
        )
    }
}

/// Write every entity of `dataset` into `store` in one commit
pub fn import_dataset<S: EntityStore + ?Sized>(store: &S, dataset: &Dataset) -> StoreResult<()> {
    let mut writes = Vec::new();

    for env in &dataset.environments {
        writes.push(set(Collection::Environments, &env.id, env)?);
    }
    for axiom in &dataset.axioms {
        writes.push(set(Collection::Axioms, &axiom.id, axiom)?);
    }
    for node in &dataset.nodes {
        writes.push(set(Collection::Nodes, &node.id, node)?);
    }
    for theorem in &dataset.theorems {
        writes.push(set(Collection::Theorems, &theorem.id, theorem)?);
    }
    for user in &dataset.users {
        writes.push(set(Collection::Users, &user.uid, user)?);
    }

    store.commit(&ReadSet::new(), writes)?;
    Ok(())
}

/// Read every entity collection of `store` into a dataset
pub fn export_dataset<S: EntityStore + ?Sized>(store: &S) -> StoreResult<Dataset> {
    Ok(Dataset {
        environments: scan_all(store, Collection::Environments)?,
        axioms: scan_all(store, Collection::Axioms)?,
        nodes: scan_all(store, Collection::Nodes)?,
        theorems: scan_all(store, Collection::Theorems)?,
        users: scan_all(store, Collection::Users)?,
    })
}

fn set<T: Serialize>(collection: Collection, id: &str, record: &T) -> StoreResult<WriteOp> {
    Ok(WriteOp::Set {
        key: DocKey::entity(collection, id),
        data: serde_json::to_value(record)?,
    })
}

fn scan_all<S, T>(store: &S, collection: Collection) -> StoreResult<Vec<T>>
where
    S: EntityStore + ?Sized,
    T: DeserializeOwned,
{
    store
        .scan(&CollectionPath::root(collection), &[])?
        .into_iter()
        .map(|doc| {
            serde_json::from_value(doc.data).map_err(|e| StoreError::Malformed {
                key: doc.key.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_preserves_documents() {
        let dir = tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("tree.json"));

        let store = MemoryStore::new();
        import_dataset(&store, &Dataset::additive_magma()).unwrap();
        file.save(&store).unwrap();

        let loaded = file.load().unwrap();
        assert_eq!(loaded.documents().unwrap(), store.documents().unwrap());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let dir = tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("tree.json"));

        let store = MemoryStore::new();
        import_dataset(&store, &Dataset::additive_magma()).unwrap();
        file.save(&store).unwrap();

        let content = fs::read_to_string(file.path()).unwrap();
        let mut envelope: Envelope = serde_json::from_str(&content).unwrap();
        envelope.payload = envelope.payload.replace("greenVotes\":100", "greenVotes\":999");
        fs::write(file.path(), serde_json::to_string(&envelope).unwrap()).unwrap();

        assert!(matches!(
            file.load(),
            Err(StoreError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_export_matches_import() {
        let store = MemoryStore::new();
        let dataset = Dataset::additive_magma();
        import_dataset(&store, &dataset).unwrap();

        let exported = export_dataset(&store).unwrap();
        assert_eq!(exported.nodes.len(), dataset.nodes.len());
        assert_eq!(exported.axioms.len(), dataset.axioms.len());
        assert_eq!(exported.users, dataset.users);
        assert!(exported.node("node_genesis").is_some());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("absent.json"));
        assert!(matches!(file.load(), Err(StoreError::Io(_))));
    }
}
