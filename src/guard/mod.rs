//! # Deletion Guard
//!
//! Reference counts that decide whether a delete may proceed. Counting is
//! delegated to the store so no documents are fetched.
//!
//! - axioms are global: every node in every environment is counted
//! - nodes are guarded by their direct children only
//! - theorems are leaves and are never guarded

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::errors::{CoreError, CoreResult};
use crate::store::{Collection, CollectionPath, EntityStore, FieldFilter, StoreResult};

/// Outcome of a dependency count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionCheck {
    pub allowed: bool,
    pub dependent_count: u64,
}

impl DeletionCheck {
    pub fn from_count(dependent_count: u64) -> Self {
        Self {
            allowed: dependent_count == 0,
            dependent_count,
        }
    }

    /// Turn a refusal into [`CoreError::IntegrityViolation`]
    pub fn ensure_allowed(&self, entity: impl Into<String>) -> CoreResult<()> {
        if self.allowed {
            Ok(())
        } else {
            Err(CoreError::IntegrityViolation {
                entity: entity.into(),
                dependent_count: self.dependent_count,
            })
        }
    }
}

/// Dependency counter over a store
pub struct DeletionGuard<S: EntityStore> {
    store: Arc<S>,
}

impl<S: EntityStore> DeletionGuard<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Nodes in any environment that reference `axiom_id`
    pub fn can_delete_axiom(&self, axiom_id: &str) -> StoreResult<DeletionCheck> {
        self.count_nodes(&[FieldFilter::eq("axiomId", axiom_id)])
    }

    /// Nodes whose parent is `node_id`
    pub fn can_delete_node(&self, node_id: &str) -> StoreResult<DeletionCheck> {
        self.count_nodes(&[FieldFilter::eq("parentId", node_id)])
    }

    /// Nodes in `environment_id` other than its genesis nodes
    pub fn can_delete_universe(&self, environment_id: &str) -> StoreResult<DeletionCheck> {
        let in_env = FieldFilter::eq("environmentId", environment_id);
        let path = CollectionPath::root(Collection::Nodes);
        let total = self.store.count(&path, &[in_env.clone()])?;
        let roots = self
            .store
            .count(&path, &[in_env, FieldFilter::eq("parentId", Value::Null)])?;
        Ok(DeletionCheck::from_count(total.saturating_sub(roots)))
    }

    fn count_nodes(&self, filters: &[FieldFilter]) -> StoreResult<DeletionCheck> {
        let count = self
            .store
            .count(&CollectionPath::root(Collection::Nodes), filters)?;
        Ok(DeletionCheck::from_count(count))
    }
}
