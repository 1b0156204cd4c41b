//! Deletion Guard Tests
//!
//! - Axiom dependents are counted across every environment
//! - Nodes are guarded by their children
//! - Refused deletes leave the store untouched
//! - Dependents created while a delete is in flight still block it

use std::sync::{Arc, Mutex};

use axiomtree::auth::ActorContext;
use axiomtree::guard::{DeletionCheck, DeletionGuard};
use axiomtree::model::Dataset;
use axiomtree::service::{AxiomSource, Catalog, StructureInput, UniverseInput};
use axiomtree::realtime::{ChangeFilter, ChangeReceiver};
use axiomtree::store::{
    import_dataset, Collection, CollectionPath, DocKey, EntityStore, FieldFilter, MemoryStore,
    ReadSet, Revision, StoreResult, StoredDoc, WriteOp,
};
use axiomtree::{CoreError, GovernanceConfig};

fn setup() -> (Arc<MemoryStore>, Catalog<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    import_dataset(store.as_ref(), &Dataset::additive_magma()).unwrap();
    let catalog = Catalog::new(Arc::clone(&store), GovernanceConfig::default());
    (store, catalog)
}

// =============================================================================
// Counts
// =============================================================================

#[test]
fn test_count_matches_referencing_nodes() {
    let (store, _) = setup();
    let guard = DeletionGuard::new(store);

    assert_eq!(
        guard.can_delete_axiom("axComm").unwrap(),
        DeletionCheck {
            allowed: false,
            dependent_count: 2
        }
    );
    assert_eq!(
        guard.can_delete_axiom("axInv").unwrap(),
        DeletionCheck {
            allowed: true,
            dependent_count: 0
        }
    );
}

#[test]
fn test_axiom_count_spans_environments() {
    let (store, catalog) = setup();
    let admin = ActorContext::admin("root");

    let other = catalog
        .create_universe(
            &admin,
            UniverseInput {
                name: "Multiplicative".into(),
                sets: vec!["M".into()],
                operators: vec!["*".into()],
                root_axiom_name: "Closure".into(),
                root_axiom_notation: "a * b \\in M".into(),
                genesis_notation: "(M, *)".into(),
            },
        )
        .unwrap();
    catalog
        .create_structure(
            &admin,
            StructureInput {
                parent_id: other.genesis.id.clone(),
                environment_id: other.environment.id.clone(),
                display_notation: "ab = ba".into(),
                axiom: AxiomSource::Existing { id: "axComm".into() },
            },
        )
        .unwrap();

    let check = DeletionGuard::new(store).can_delete_axiom("axComm").unwrap();
    assert_eq!(check.dependent_count, 3);
}

// =============================================================================
// Deletes
// =============================================================================

#[test]
fn test_refused_axiom_delete_reports_count() {
    let (store, catalog) = setup();
    let err = catalog
        .delete_axiom(&ActorContext::admin("root"), "axAssoc")
        .unwrap_err();

    assert!(matches!(
        err,
        CoreError::IntegrityViolation {
            dependent_count: 3,
            ..
        }
    ));
    assert!(store
        .get(&DocKey::entity(Collection::Axioms, "axAssoc"))
        .unwrap()
        .is_some());
    assert_eq!(catalog.metrics().snapshot().deletions_refused, 1);
}

#[test]
fn test_unreferenced_axiom_deleted() {
    let (store, catalog) = setup();
    catalog
        .delete_axiom(&ActorContext::admin("root"), "axInv")
        .unwrap();
    assert!(store
        .get(&DocKey::entity(Collection::Axioms, "axInv"))
        .unwrap()
        .is_none());
}

#[test]
fn test_node_with_children_kept() {
    let (_, catalog) = setup();
    let err = catalog
        .delete_structure(&ActorContext::admin("root"), "nodeRootComm")
        .unwrap_err();
    assert_eq!(err.dependent_count(), Some(1));
}

#[test]
fn test_leaf_delete_cascades_theorems() {
    let (store, catalog) = setup();
    let admin = ActorContext::admin("root");

    // nodeCommAssoc owns thm_comm_assoc_swap but has the duplicate below it
    catalog.delete_structure(&admin, "nodeZombieDuplicate").unwrap();
    catalog.delete_structure(&admin, "nodeCommAssoc").unwrap();

    assert!(store
        .get(&DocKey::entity(Collection::Theorems, "thm_comm_assoc_swap"))
        .unwrap()
        .is_none());
    assert!(catalog.delete_axiom(&admin, "axAssoc").is_err());
}

#[test]
fn test_universe_delete_requires_empty_tree() {
    let (_, catalog) = setup();
    let admin = ActorContext::admin("root");

    let err = catalog
        .delete_universe(&admin, "env_additive_magma")
        .unwrap_err();
    assert_eq!(err.dependent_count(), Some(5));

    let fresh = catalog
        .create_universe(
            &admin,
            UniverseInput {
                name: "Scratch".into(),
                sets: vec!["S".into()],
                operators: vec!["+".into()],
                root_axiom_name: "Closure".into(),
                root_axiom_notation: "a + b \\in S".into(),
                genesis_notation: "(S, +)".into(),
            },
        )
        .unwrap();
    catalog.delete_universe(&admin, &fresh.environment.id).unwrap();

    let data = catalog.dataset().unwrap();
    assert!(data.node(&fresh.genesis.id).is_none());
    assert!(data.axiom(&fresh.root_axiom.id).is_some());
}

#[test]
fn test_deletes_are_admin_only() {
    let (_, catalog) = setup();
    let citizen = ActorContext::citizen("carl");
    assert!(matches!(
        catalog.delete_axiom(&citizen, "axInv"),
        Err(CoreError::Unauthorized)
    ));
    assert!(matches!(
        catalog.delete_structure(&citizen, "nodeAssocComm"),
        Err(CoreError::Unauthorized)
    ));
}

// =============================================================================
// Concurrent dependents
// =============================================================================

/// Store wrapper that commits one new structure right after answering the
/// first dependent count.
struct RacingStore {
    inner: Arc<MemoryStore>,
    pending: Mutex<Option<StructureInput>>,
}

impl RacingStore {
    fn new(inner: Arc<MemoryStore>, input: StructureInput) -> Self {
        Self {
            inner,
            pending: Mutex::new(Some(input)),
        }
    }
}

impl EntityStore for RacingStore {
    fn get(&self, key: &DocKey) -> StoreResult<Option<StoredDoc>> {
        self.inner.get(key)
    }

    fn scan(&self, path: &CollectionPath, filters: &[FieldFilter]) -> StoreResult<Vec<StoredDoc>> {
        self.inner.scan(path, filters)
    }

    fn count(&self, path: &CollectionPath, filters: &[FieldFilter]) -> StoreResult<u64> {
        let counted = self.inner.count(path, filters)?;
        let pending = self.pending.lock().unwrap().take();
        if let Some(input) = pending {
            Catalog::new(Arc::clone(&self.inner), GovernanceConfig::default())
                .create_structure(&ActorContext::novice("nina"), input)
                .unwrap();
        }
        Ok(counted)
    }

    fn commit(&self, reads: &ReadSet, writes: Vec<WriteOp>) -> StoreResult<Revision> {
        self.inner.commit(reads, writes)
    }

    fn subscribe(&self, filter: ChangeFilter) -> ChangeReceiver {
        self.inner.subscribe(filter)
    }
}

fn leaf_under(parent: &str, axiom: &str) -> StructureInput {
    StructureInput {
        parent_id: parent.into(),
        environment_id: "env_additive_magma".into(),
        display_notation: "x + (-x) = 0".into(),
        axiom: AxiomSource::Existing { id: axiom.into() },
    }
}

#[test]
fn test_axiom_referenced_mid_delete_is_kept() {
    let (store, _) = setup();
    let racing = RacingStore::new(Arc::clone(&store), leaf_under("nodeAssocComm", "axInv"));
    let catalog = Catalog::new(Arc::new(racing), GovernanceConfig::default());

    let err = catalog
        .delete_axiom(&ActorContext::admin("root"), "axInv")
        .unwrap_err();

    assert_eq!(err.dependent_count(), Some(1));
    assert!(store
        .get(&DocKey::entity(Collection::Axioms, "axInv"))
        .unwrap()
        .is_some());
    assert!(!DeletionGuard::new(store).can_delete_axiom("axInv").unwrap().allowed);
}

#[test]
fn test_node_extended_mid_delete_is_kept() {
    let (store, _) = setup();
    let racing = RacingStore::new(Arc::clone(&store), leaf_under("nodeAssocComm", "axIdent"));
    let catalog = Catalog::new(Arc::new(racing), GovernanceConfig::default());

    let err = catalog
        .delete_structure(&ActorContext::admin("root"), "nodeAssocComm")
        .unwrap_err();

    assert_eq!(err.dependent_count(), Some(1));
    assert!(store
        .get(&DocKey::entity(Collection::Nodes, "nodeAssocComm"))
        .unwrap()
        .is_some());
}

#[test]
fn test_structure_creation_rewrites_parent_and_axiom() {
    let (store, catalog) = setup();
    let parent_key = DocKey::entity(Collection::Nodes, "nodeAssocComm");
    let axiom_key = DocKey::entity(Collection::Axioms, "axInv");
    let parent_before = store.get(&parent_key).unwrap().unwrap();
    let axiom_before = store.get(&axiom_key).unwrap().unwrap();

    catalog
        .create_structure(&ActorContext::novice("nina"), leaf_under("nodeAssocComm", "axInv"))
        .unwrap();

    let parent_after = store.get(&parent_key).unwrap().unwrap();
    let axiom_after = store.get(&axiom_key).unwrap().unwrap();
    assert!(parent_after.revision > parent_before.revision);
    assert!(axiom_after.revision > axiom_before.revision);
    assert_eq!(parent_after.data, parent_before.data);
    assert_eq!(axiom_after.data, axiom_before.data);
}
