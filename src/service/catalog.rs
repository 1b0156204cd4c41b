use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::inputs::{
    AxiomSource, AxiomUpdate, StructureInput, TheoremInput, TheoremUpdate, Universe, UniverseInput,
};
use crate::auth::{ActorContext, ReputationKind, Role, UserProfile};
use crate::config::GovernanceConfig;
use crate::errors::{CoreError, CoreResult};
use crate::guard::{DeletionCheck, DeletionGuard};
use crate::lineage::{Lineage, LineageIndex};
use crate::model::validator::{check_extension, require_text, validate_symbols};
use crate::model::{
    Axiom, Dataset, Environment, Status, StructureNode, Theorem, ValidationError, VoteTally,
};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::store::{
    export_dataset, run_transaction, Collection, CollectionPath, DocKey, EntityStore, FieldFilter,
    Transaction,
};

/// Records with an owning author
trait Authored {
    fn author_id(&self) -> &str;
}

impl Authored for Axiom {
    fn author_id(&self) -> &str {
        &self.author_id
    }
}

impl Authored for StructureNode {
    fn author_id(&self) -> &str {
        &self.author_id
    }
}

impl Authored for Theorem {
    fn author_id(&self) -> &str {
        &self.author_id
    }
}

fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

/// Catalog write services over one store
pub struct Catalog<S: EntityStore> {
    store: Arc<S>,
    config: GovernanceConfig,
    metrics: Arc<MetricsRegistry>,
    guard: DeletionGuard<S>,
}

impl<S: EntityStore> Catalog<S> {
    pub fn new(store: Arc<S>, config: GovernanceConfig) -> Self {
        Self::with_metrics(store, config, Arc::new(MetricsRegistry::new()))
    }

    pub fn with_metrics(store: Arc<S>, config: GovernanceConfig, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            guard: DeletionGuard::new(Arc::clone(&store)),
            store,
            config,
            metrics,
        }
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    pub fn guard(&self) -> &DeletionGuard<S> {
        &self.guard
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Every entity collection as one dataset
    pub fn dataset(&self) -> CoreResult<Dataset> {
        Ok(export_dataset(self.store.as_ref())?)
    }

    /// Resolve a node's lineage from the current store contents
    pub fn lineage(&self, node_id: &str) -> CoreResult<Lineage> {
        let data = self.dataset()?;
        let lineage = LineageIndex::new(&data.nodes, &data.axioms, &data.theorems).resolve(node_id);
        if !lineage.integrity.is_complete() {
            log_event_with_fields(
                Event::LineageCorrupt,
                &[("node", node_id), ("integrity", &format!("{:?}", lineage.integrity))],
            );
        }
        Ok(lineage)
    }

    // =========================================================================
    // Universes
    // =========================================================================

    /// Create an environment, its root axiom and its verified genesis node
    /// in one commit
    pub fn create_universe(&self, actor: &ActorContext, input: UniverseInput) -> CoreResult<Universe> {
        actor.require_admin()?;

        let environment = Environment {
            id: new_id("env"),
            name: require_text("name", &input.name)?,
            sets: validate_symbols(&input.sets)?,
            operators: validate_symbols(&input.operators)?,
        };
        let now = Utc::now();
        let root_axiom = Axiom {
            id: new_id("ax"),
            canonical_name: require_text("rootAxiomName", &input.root_axiom_name)?,
            aliases: Vec::new(),
            notation: require_text("rootAxiomNotation", &input.root_axiom_notation)?,
            author_id: actor.user_id.clone(),
            created_at: now,
        };
        let genesis = StructureNode {
            id: new_id("node"),
            parent_id: None,
            axiom_id: Some(root_axiom.id.clone()),
            environment_id: environment.id.clone(),
            author_id: actor.user_id.clone(),
            display_notation: require_text("genesisNotation", &input.genesis_notation)?,
            status: Status::Verified,
            duplicate_of_id: None,
            to_be_deleted: false,
            stats: VoteTally::default(),
            created_at: now,
        };

        self.write(|txn| {
            txn.set(DocKey::entity(Collection::Environments, &environment.id), &environment)?;
            txn.set(DocKey::entity(Collection::Axioms, &root_axiom.id), &root_axiom)?;
            txn.set(DocKey::entity(Collection::Nodes, &genesis.id), &genesis)?;
            Ok(())
        })?;

        self.record(
            Event::UniverseCreated,
            &[("environment", &environment.id), ("actor", &actor.user_id)],
        );
        Ok(Universe {
            environment,
            root_axiom,
            genesis,
        })
    }

    /// Rename an environment; its symbols never change
    pub fn rename_universe(&self, actor: &ActorContext, environment_id: &str, name: &str) -> CoreResult<Environment> {
        actor.require_admin()?;
        let name = require_text("name", name)?;
        let key = DocKey::entity(Collection::Environments, environment_id);

        let environment = self.write(|txn| {
            let mut environment: Environment = txn
                .get_as(&key)?
                .ok_or_else(|| CoreError::not_found(&key))?;
            environment.name = name.clone();
            txn.set(key.clone(), &environment)?;
            Ok(environment)
        })?;

        self.record(Event::UniverseRenamed, &[("environment", environment_id)]);
        Ok(environment)
    }

    /// Delete an environment once only its genesis nodes remain. The genesis
    /// nodes and their theorems go with it; the root axiom stays in the
    /// global registry.
    ///
    /// The dependent count is taken inside the transaction after the genesis
    /// nodes are read. A child created concurrently rewrites its parent, so
    /// the delete conflicts and recounts.
    pub fn delete_universe(&self, actor: &ActorContext, environment_id: &str) -> CoreResult<()> {
        actor.require_admin()?;
        let key = DocKey::entity(Collection::Environments, environment_id);

        self.write(|txn| {
            if txn.get(&key)?.is_none() {
                return Err(CoreError::not_found(&key));
            }
            let genesis_keys: Vec<DocKey> = self
                .store
                .scan(
                    &CollectionPath::root(Collection::Nodes),
                    &[
                        FieldFilter::eq("environmentId", environment_id),
                        FieldFilter::eq("parentId", Value::Null),
                    ],
                )?
                .into_iter()
                .map(|doc| doc.key)
                .collect();
            let mut doomed = genesis_keys;
            for genesis in doomed.clone() {
                doomed.extend(self.owned_records(&genesis.id)?);
            }
            for doc in &doomed {
                txn.get(doc)?;
            }
            self.check_deletion(&key, self.guard.can_delete_universe(environment_id)?)?;

            txn.delete(key.clone());
            for doc in doomed {
                txn.delete(doc);
            }
            Ok(())
        })?;

        self.metrics.increment_deletions();
        self.record(Event::UniverseDeleted, &[("environment", environment_id)]);
        Ok(())
    }

    // =========================================================================
    // Structures
    // =========================================================================

    /// Add a child structure, registering a new axiom if requested
    pub fn create_structure(&self, actor: &ActorContext, input: StructureInput) -> CoreResult<StructureNode> {
        actor.require_role(Role::Novice)?;

        let now = Utc::now();
        let display_notation = require_text("displayNotation", &input.display_notation)?;
        let (axiom_id, new_axiom) = match &input.axiom {
            AxiomSource::Existing { id } => (id.clone(), None),
            AxiomSource::New {
                canonical_name,
                notation,
                aliases,
            } => {
                let canonical_name = require_text("canonicalName", canonical_name)
                    .map_err(|_| ValidationError::MissingAxiomDefinition)?;
                let notation = require_text("notation", notation)
                    .map_err(|_| ValidationError::MissingAxiomDefinition)?;
                let axiom = Axiom {
                    id: new_id("ax"),
                    canonical_name,
                    aliases: aliases.iter().map(|a| a.trim().to_string()).collect(),
                    notation,
                    author_id: actor.user_id.clone(),
                    created_at: now,
                };
                (axiom.id.clone(), Some(axiom))
            }
        };

        let node = StructureNode {
            id: new_id("node"),
            parent_id: Some(input.parent_id.clone()),
            axiom_id: Some(axiom_id.clone()),
            environment_id: input.environment_id.clone(),
            author_id: actor.user_id.clone(),
            display_notation,
            status: Status::Unverified,
            duplicate_of_id: None,
            to_be_deleted: false,
            stats: VoteTally::default(),
            created_at: now,
        };

        let parent_key = DocKey::entity(Collection::Nodes, &input.parent_id);
        let axiom_key = DocKey::entity(Collection::Axioms, &axiom_id);

        // The parent and a linked axiom are written back unchanged so that a
        // delete which counted dependents before this commit conflicts.
        self.write(|txn| {
            let parent_doc = txn
                .get(&parent_key)?
                .ok_or_else(|| CoreError::not_found(&parent_key))?;
            let parent: StructureNode = serde_json::from_value(parent_doc.clone())?;
            check_extension(&parent, &node.environment_id)?;

            let linked_axiom = match &new_axiom {
                Some(_) => None,
                None => Some(
                    txn.get(&axiom_key)?
                        .ok_or_else(|| CoreError::not_found(&axiom_key))?,
                ),
            };

            txn.set_value(parent_key.clone(), parent_doc);
            if let Some(doc) = linked_axiom {
                txn.set_value(axiom_key.clone(), doc);
            }
            if let Some(axiom) = &new_axiom {
                txn.set(axiom_key.clone(), axiom)?;
            }
            txn.set(DocKey::entity(Collection::Nodes, &node.id), &node)?;
            Ok(())
        })?;

        self.record(
            Event::StructureCreated,
            &[
                ("node", &node.id),
                ("parent", &input.parent_id),
                ("axiom", &axiom_id),
                ("actor", &actor.user_id),
            ],
        );
        Ok(node)
    }

    /// Correct a node's display notation
    pub fn update_structure_notation(
        &self,
        actor: &ActorContext,
        node_id: &str,
        display_notation: &str,
    ) -> CoreResult<StructureNode> {
        actor.require_role(Role::Novice)?;
        let display_notation = require_text("displayNotation", display_notation)?;
        let key = DocKey::entity(Collection::Nodes, node_id);

        let node = self.write(|txn| {
            let mut node: StructureNode = owned(actor, &key, txn.get_as(&key)?)?;
            node.display_notation = display_notation.clone();
            txn.set(key.clone(), &node)?;
            Ok(node)
        })?;

        self.record(Event::StructureUpdated, &[("node", node_id), ("field", "displayNotation")]);
        Ok(node)
    }

    /// Delete a node with no children, along with its theorems and vote slips.
    /// Children are counted inside the transaction, after the node is read.
    pub fn delete_structure(&self, actor: &ActorContext, node_id: &str) -> CoreResult<()> {
        actor.require_admin()?;
        let key = DocKey::entity(Collection::Nodes, node_id);

        self.write(|txn| {
            if txn.get(&key)?.is_none() {
                return Err(CoreError::not_found(&key));
            }
            let cascade = self.owned_records(node_id)?;
            for owned in &cascade {
                txn.get(owned)?;
            }
            self.check_deletion(&key, self.guard.can_delete_node(node_id)?)?;

            txn.delete(key.clone());
            for owned in cascade {
                txn.delete(owned);
            }
            Ok(())
        })?;

        self.metrics.increment_deletions();
        self.record(Event::StructureDeleted, &[("node", node_id)]);
        Ok(())
    }

    // =========================================================================
    // Moderation
    // =========================================================================

    /// Override a node's declared status
    pub fn set_node_status(&self, actor: &ActorContext, node_id: &str, status: Status) -> CoreResult<StructureNode> {
        actor.require_admin()?;
        let node = self.update_node(node_id, |node| {
            node.status = status;
            Ok(())
        })?;
        self.record(
            Event::StatusOverridden,
            &[("entity", &format!("nodes/{}", node_id)), ("status", status.as_str())],
        );
        Ok(node)
    }

    /// Point a node at the node it duplicates, or clear the mark with None
    pub fn mark_duplicate(
        &self,
        actor: &ActorContext,
        node_id: &str,
        duplicate_of: Option<&str>,
    ) -> CoreResult<StructureNode> {
        actor.require_admin()?;
        if duplicate_of == Some(node_id) {
            return Err(ValidationError::SelfDuplicate(node_id.to_string()).into());
        }

        let key = DocKey::entity(Collection::Nodes, node_id);
        let target_key = duplicate_of.map(|id| DocKey::entity(Collection::Nodes, id));

        let node = self.write(|txn| {
            let mut node: StructureNode = txn
                .get_as(&key)?
                .ok_or_else(|| CoreError::not_found(&key))?;
            if let Some(target_key) = &target_key {
                if txn.get(target_key)?.is_none() {
                    return Err(CoreError::not_found(target_key));
                }
            }
            node.duplicate_of_id = duplicate_of.map(str::to_string);
            txn.set(key.clone(), &node)?;
            Ok(node)
        })?;

        self.record(
            Event::StructureUpdated,
            &[("node", node_id), ("duplicateOf", duplicate_of.unwrap_or("none"))],
        );
        Ok(node)
    }

    /// Set or clear the pending-deletion flag
    pub fn flag_for_deletion(&self, actor: &ActorContext, node_id: &str, flagged: bool) -> CoreResult<StructureNode> {
        actor.require_admin()?;
        let node = self.update_node(node_id, |node| {
            node.to_be_deleted = flagged;
            Ok(())
        })?;
        self.record(
            Event::StructureUpdated,
            &[("node", node_id), ("toBeDeleted", if flagged { "true" } else { "false" })],
        );
        Ok(node)
    }

    /// Override a theorem's declared status
    pub fn set_theorem_status(&self, actor: &ActorContext, theorem_id: &str, status: Status) -> CoreResult<Theorem> {
        actor.require_admin()?;
        let key = DocKey::entity(Collection::Theorems, theorem_id);

        let theorem = self.write(|txn| {
            let mut theorem: Theorem = txn
                .get_as(&key)?
                .ok_or_else(|| CoreError::not_found(&key))?;
            theorem.status = status;
            txn.set(key.clone(), &theorem)?;
            Ok(theorem)
        })?;

        self.record(
            Event::StatusOverridden,
            &[("entity", &key.to_string()), ("status", status.as_str())],
        );
        Ok(theorem)
    }

    // =========================================================================
    // Axioms
    // =========================================================================

    /// Correct an axiom's name, notation or aliases
    pub fn update_axiom(&self, actor: &ActorContext, axiom_id: &str, update: AxiomUpdate) -> CoreResult<Axiom> {
        actor.require_admin()?;
        let canonical_name = update
            .canonical_name
            .as_deref()
            .map(|v| require_text("canonicalName", v))
            .transpose()?;
        let notation = update
            .notation
            .as_deref()
            .map(|v| require_text("notation", v))
            .transpose()?;
        let key = DocKey::entity(Collection::Axioms, axiom_id);

        let axiom = self.write(|txn| {
            let mut axiom: Axiom = txn
                .get_as(&key)?
                .ok_or_else(|| CoreError::not_found(&key))?;
            if let Some(name) = &canonical_name {
                axiom.canonical_name = name.clone();
            }
            if let Some(notation) = &notation {
                axiom.notation = notation.clone();
            }
            if let Some(aliases) = &update.aliases {
                axiom.aliases = aliases.clone();
            }
            txn.set(key.clone(), &axiom)?;
            Ok(axiom)
        })?;

        self.record(Event::AxiomUpdated, &[("axiom", axiom_id)]);
        Ok(axiom)
    }

    /// Delete an axiom no node references. References are counted inside
    /// the transaction, after the axiom is read.
    pub fn delete_axiom(&self, actor: &ActorContext, axiom_id: &str) -> CoreResult<()> {
        actor.require_admin()?;
        let key = DocKey::entity(Collection::Axioms, axiom_id);

        self.write(|txn| {
            if txn.get(&key)?.is_none() {
                return Err(CoreError::not_found(&key));
            }
            self.check_deletion(&key, self.guard.can_delete_axiom(axiom_id)?)?;
            txn.delete(key.clone());
            Ok(())
        })?;

        self.metrics.increment_deletions();
        self.record(Event::AxiomDeleted, &[("axiom", axiom_id)]);
        Ok(())
    }

    // =========================================================================
    // Theorems
    // =========================================================================

    /// Attach a new, unverified theorem to a node
    pub fn create_theorem(&self, actor: &ActorContext, node_id: &str, input: TheoremInput) -> CoreResult<Theorem> {
        actor.require_role(Role::Novice)?;

        let theorem = Theorem {
            id: new_id("thm"),
            node_id: node_id.to_string(),
            name: require_text("name", &input.name)?,
            aliases: input.aliases.iter().map(|a| a.trim().to_string()).collect(),
            statement_notation: require_text("statementNotation", &input.statement_notation)?,
            proof_notation: require_text("proofNotation", &input.proof_notation)?,
            author_id: actor.user_id.clone(),
            status: Status::Unverified,
            stats: VoteTally::default(),
            created_at: Utc::now(),
        };
        let node_key = DocKey::entity(Collection::Nodes, node_id);

        self.write(|txn| {
            let node = txn
                .get(&node_key)?
                .ok_or_else(|| CoreError::not_found(&node_key))?;
            // Rewritten unchanged so a concurrent delete of the node retries
            txn.set_value(node_key.clone(), node);
            txn.set(DocKey::entity(Collection::Theorems, &theorem.id), &theorem)?;
            Ok(())
        })?;

        self.record(
            Event::TheoremCreated,
            &[("theorem", &theorem.id), ("node", node_id), ("actor", &actor.user_id)],
        );
        Ok(theorem)
    }

    /// Correct a theorem's text
    pub fn update_theorem(&self, actor: &ActorContext, theorem_id: &str, update: TheoremUpdate) -> CoreResult<Theorem> {
        actor.require_role(Role::Novice)?;
        let name = update
            .name
            .as_deref()
            .map(|v| require_text("name", v))
            .transpose()?;
        let statement = update
            .statement_notation
            .as_deref()
            .map(|v| require_text("statementNotation", v))
            .transpose()?;
        let proof = update
            .proof_notation
            .as_deref()
            .map(|v| require_text("proofNotation", v))
            .transpose()?;
        let key = DocKey::entity(Collection::Theorems, theorem_id);

        let theorem = self.write(|txn| {
            let mut theorem: Theorem = owned(actor, &key, txn.get_as(&key)?)?;
            if let Some(name) = &name {
                theorem.name = name.clone();
            }
            if let Some(aliases) = &update.aliases {
                theorem.aliases = aliases.clone();
            }
            if let Some(statement) = &statement {
                theorem.statement_notation = statement.clone();
            }
            if let Some(proof) = &proof {
                theorem.proof_notation = proof.clone();
            }
            txn.set(key.clone(), &theorem)?;
            Ok(theorem)
        })?;

        self.record(Event::TheoremUpdated, &[("theorem", theorem_id)]);
        Ok(theorem)
    }

    /// Delete a theorem and its vote slips
    pub fn delete_theorem(&self, actor: &ActorContext, theorem_id: &str) -> CoreResult<()> {
        actor.require_role(Role::Novice)?;
        let key = DocKey::entity(Collection::Theorems, theorem_id);

        self.write(|txn| {
            owned::<Theorem>(actor, &key, txn.get_as(&key)?)?;
            txn.delete(key.clone());
            for slip in self.vote_slips(Collection::Theorems, theorem_id)? {
                txn.delete(slip);
            }
            Ok(())
        })?;

        self.metrics.increment_deletions();
        self.record(Event::TheoremDeleted, &[("theorem", theorem_id)]);
        Ok(())
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Return a user's profile, creating a first-time citizen profile when
    /// none exists
    pub fn sync_user(
        &self,
        uid: &str,
        display_name: Option<String>,
        email: Option<String>,
    ) -> CoreResult<UserProfile> {
        if uid.trim().is_empty() {
            return Err(CoreError::AuthenticationRequired);
        }
        let key = DocKey::entity(Collection::Users, uid);

        let (profile, created) = self.write(|txn| {
            if let Some(existing) = txn.get_as::<UserProfile>(&key)? {
                return Ok((existing, false));
            }
            let profile = UserProfile::new(uid, display_name.clone(), email.clone());
            txn.set(key.clone(), &profile)?;
            Ok((profile, true))
        })?;

        if created {
            self.record(Event::UserRegistered, &[("user", uid)]);
        }
        Ok(profile)
    }

    /// Build an actor from a stored profile. A user without a profile is not
    /// signed in.
    pub fn actor_for(&self, uid: &str) -> CoreResult<ActorContext> {
        let key = DocKey::entity(Collection::Users, uid);
        match self.store.get(&key)? {
            Some(doc) => Ok(serde_json::from_value::<UserProfile>(doc.data)?.actor()),
            None => Err(CoreError::AuthenticationRequired),
        }
    }

    /// Change a user's role. Setting the current role is a no-op; admin
    /// profiles are never changed.
    pub fn update_user_role(&self, actor: &ActorContext, uid: &str, role: Role) -> CoreResult<UserProfile> {
        actor.require_admin()?;
        let key = DocKey::entity(Collection::Users, uid);

        let (profile, changed) = self.write(|txn| {
            let mut profile: UserProfile = txn
                .get_as(&key)?
                .ok_or_else(|| CoreError::not_found(&key))?;
            if profile.role == role {
                return Ok((profile, false));
            }
            if profile.is_protected() {
                return Err(ValidationError::ProtectedAdmin(uid.to_string()).into());
            }
            profile.role = role;
            txn.set(key.clone(), &profile)?;
            Ok((profile, true))
        })?;

        if changed {
            self.record(
                Event::RoleChanged,
                &[("user", uid), ("role", role.as_str()), ("actor", &actor.user_id)],
            );
        }
        Ok(profile)
    }

    /// Add `amount` (possibly negative) to one of a user's scores
    pub fn adjust_reputation(
        &self,
        actor: &ActorContext,
        uid: &str,
        kind: ReputationKind,
        amount: i64,
    ) -> CoreResult<UserProfile> {
        actor.require_admin()?;
        let key = DocKey::entity(Collection::Users, uid);

        let profile = self.write(|txn| {
            let mut profile: UserProfile = txn
                .get_as(&key)?
                .ok_or_else(|| CoreError::not_found(&key))?;
            if profile.is_protected() {
                return Err(ValidationError::ProtectedAdmin(uid.to_string()).into());
            }
            if amount != 0 {
                profile.reputation.adjust(kind, amount);
                txn.set(key.clone(), &profile)?;
            }
            Ok(profile)
        })?;

        if amount != 0 {
            self.record(
                Event::ReputationAdjusted,
                &[("user", uid), ("kind", kind.as_str()), ("amount", &amount.to_string())],
            );
        }
        Ok(profile)
    }

    /// Promote every novice whose combined reputation reached the threshold,
    /// in one commit. Returns the promoted user ids.
    pub fn promote_eligible_novices(&self, actor: &ActorContext) -> CoreResult<Vec<String>> {
        actor.require_admin()?;

        let promoted = self.write(|txn| {
            let novices = self.store.scan(
                &CollectionPath::root(Collection::Users),
                &[FieldFilter::eq("role", Role::Novice.as_str())],
            )?;
            let mut eligible = Vec::new();
            for doc in novices {
                if let Some(profile) = txn.get_as::<UserProfile>(&doc.key)? {
                    if profile.is_eligible_for_promotion() {
                        eligible.push((doc.key, profile));
                    }
                }
            }

            let mut promoted = Vec::with_capacity(eligible.len());
            for (key, mut profile) in eligible {
                profile.role = Role::Citizen;
                txn.set(key, &profile)?;
                promoted.push(profile.uid);
            }
            Ok(promoted)
        })?;

        for uid in &promoted {
            self.record(
                Event::RoleChanged,
                &[("user", uid), ("role", Role::Citizen.as_str()), ("actor", &actor.user_id)],
            );
        }
        Ok(promoted)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn write<T, F>(&self, body: F) -> CoreResult<T>
    where
        F: FnMut(&mut Transaction<'_, S>) -> CoreResult<T>,
    {
        let committed = run_transaction::<_, _, CoreError, _>(
            self.store.as_ref(),
            self.config.max_transaction_attempts,
            body,
        )?;
        self.metrics
            .add_transaction_conflicts(u64::from(committed.attempts.saturating_sub(1)));
        self.metrics.increment_catalog_writes();
        Ok(committed.value)
    }

    fn update_node<F>(&self, node_id: &str, mut apply: F) -> CoreResult<StructureNode>
    where
        F: FnMut(&mut StructureNode) -> CoreResult<()>,
    {
        let key = DocKey::entity(Collection::Nodes, node_id);
        self.write(|txn| {
            let mut node: StructureNode = txn
                .get_as(&key)?
                .ok_or_else(|| CoreError::not_found(&key))?;
            apply(&mut node)?;
            txn.set(key.clone(), &node)?;
            Ok(node)
        })
    }

    fn check_deletion(&self, key: &DocKey, check: DeletionCheck) -> CoreResult<()> {
        if !check.allowed {
            self.metrics.increment_deletions_refused();
            log_event_with_fields(
                Event::DeletionRefused,
                &[
                    ("entity", &key.to_string()),
                    ("dependents", &check.dependent_count.to_string()),
                ],
            );
        }
        check.ensure_allowed(key.to_string())
    }

    /// Theorems owned by a node plus every vote slip on the node and on them
    fn owned_records(&self, node_id: &str) -> CoreResult<Vec<DocKey>> {
        let mut keys = self.vote_slips(Collection::Nodes, node_id)?;
        let theorems = self.store.scan(
            &CollectionPath::root(Collection::Theorems),
            &[FieldFilter::eq("nodeId", node_id)],
        )?;
        for theorem in theorems {
            keys.extend(self.vote_slips(Collection::Theorems, &theorem.key.id)?);
            keys.push(theorem.key);
        }
        Ok(keys)
    }

    fn vote_slips(&self, collection: Collection, entity_id: &str) -> CoreResult<Vec<DocKey>> {
        Ok(self
            .store
            .scan(&CollectionPath::votes(collection, entity_id), &[])?
            .into_iter()
            .map(|doc| doc.key)
            .collect())
    }

    fn record(&self, event: Event, fields: &[(&str, &str)]) {
        log_event_with_fields(event, fields);
    }
}

/// Resolve an author-gated record. Non-admins get `Unauthorized` both for
/// records they do not own and for records that do not exist.
fn owned<T: Authored>(actor: &ActorContext, key: &DocKey, record: Option<T>) -> CoreResult<T> {
    match record {
        Some(record) => {
            actor.require_author_or_admin(record.author_id())?;
            Ok(record)
        }
        None if actor.is_admin() => Err(CoreError::not_found(key)),
        None => Err(CoreError::Unauthorized),
    }
}
