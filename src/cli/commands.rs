//! CLI command implementations
//!
//! Every command opens the snapshot file, runs one operation against an
//! in-memory store and prints one JSON response. Only `init` and `vote`
//! write the snapshot back.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::auth::{ActorContext, Role};
use crate::config::GovernanceConfig;
use crate::errors::CoreError;
use crate::governance::effective_status;
use crate::guard::DeletionGuard;
use crate::layout::layout_tree;
use crate::lineage::{ancestors, descendants};
use crate::model::{Dataset, Governed, VoteChoice};
use crate::observability::{log_event_with_fields, Event};
use crate::service::Catalog;
use crate::store::{export_dataset, import_dataset, MemoryStore, SnapshotFile};
use crate::voting::{VoteTarget, VotingEngine};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::write_response;

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { data, force } => init(&data, force),
        Command::Lineage { node, data } => lineage(&data, &node),
        Command::Status {
            collection,
            id,
            data,
            config,
        } => status(&data, config.as_deref(), collection, &id),
        Command::Vote {
            collection,
            id,
            user,
            role,
            choice,
            data,
            config,
        } => vote(&data, config.as_deref(), collection, &id, &user, role, choice),
        Command::CheckAxiom { axiom, data } => check_axiom(&data, &axiom),
        Command::Layout { environment, data } => layout(&data, environment.as_deref()),
        Command::Promote { admin, data } => promote(&data, &admin),
    }
}

/// Write a snapshot holding the demonstration universe
pub fn init(data: &Path, force: bool) -> CliResult<()> {
    let file = SnapshotFile::new(data);
    if file.exists() && !force {
        return Err(CliError::already_initialized(&data.display().to_string()));
    }

    let store = MemoryStore::new();
    import_dataset(&store, &Dataset::additive_magma())?;
    save(&file, &store)?;

    write_response(&json!({
        "path": data.display().to_string(),
        "documents": store.len(),
    }))
}

/// Print the lineage of one node with its ancestor and descendant ids
pub fn lineage(data: &Path, node_id: &str) -> CliResult<()> {
    let store = open(&SnapshotFile::new(data))?;
    let catalog = Catalog::new(Arc::new(store), GovernanceConfig::default());
    let resolved = catalog.lineage(node_id)?;
    let nodes = catalog.dataset()?.nodes;

    write_response(&json!({
        "node": node_id,
        "ancestors": ancestors(node_id, &nodes),
        "descendants": descendants(node_id, &nodes),
        "lineage": resolved,
    }))
}

/// Print declared and effective status of a node or theorem
pub fn status(data: &Path, config: Option<&Path>, target: VoteTarget, id: &str) -> CliResult<()> {
    let config = load_config(config)?;
    let store = open(&SnapshotFile::new(data))?;
    let dataset = export_dataset(&store)?;

    let entity: &dyn Governed = match target {
        VoteTarget::Nodes => dataset
            .node(id)
            .map(|n| n as &dyn Governed)
            .ok_or_else(|| CoreError::not_found(format!("nodes/{}", id)))?,
        VoteTarget::Theorems => dataset
            .theorem(id)
            .map(|t| t as &dyn Governed)
            .ok_or_else(|| CoreError::not_found(format!("theorems/{}", id)))?,
    };

    let tally = entity.tally();
    write_response(&json!({
        "collection": target.to_string(),
        "id": id,
        "declared": entity.declared_status(),
        "stats": tally,
        "net": tally.net(),
        "status": effective_status(&config, entity),
    }))
}

/// Cast a vote and persist the result
pub fn vote(
    data: &Path,
    config: Option<&Path>,
    target: VoteTarget,
    id: &str,
    user: &str,
    role: Role,
    choice: VoteChoice,
) -> CliResult<()> {
    let config = load_config(config)?;
    let file = SnapshotFile::new(data);
    let store = Arc::new(open(&file)?);

    let engine = VotingEngine::new(Arc::clone(&store), config);
    let actor = ActorContext::new(user, role);
    let receipt = engine.cast_vote(&actor, target, id, user, choice)?;

    save(&file, &store)?;
    log_event_with_fields(
        Event::MetricsReported,
        &[("counters", &engine.metrics().to_json())],
    );
    write_response(&receipt)
}

/// Report how many nodes still reference an axiom
pub fn check_axiom(data: &Path, axiom_id: &str) -> CliResult<()> {
    let store = open(&SnapshotFile::new(data))?;
    let check = DeletionGuard::new(Arc::new(store)).can_delete_axiom(axiom_id)?;
    write_response(&json!({
        "axiom": axiom_id,
        "allowed": check.allowed,
        "dependentCount": check.dependent_count,
    }))
}

/// Print the rendered tree
pub fn layout(data: &Path, environment: Option<&str>) -> CliResult<()> {
    let store = open(&SnapshotFile::new(data))?;
    let dataset = export_dataset(&store)?;
    let nodes = match environment {
        Some(env) => dataset.nodes_in(env),
        None => dataset.nodes.clone(),
    };
    write_response(&layout_tree(&nodes, &dataset.axioms))
}

/// Batch-promote eligible novices as a stored admin and save the snapshot
pub fn promote(data: &Path, admin_id: &str) -> CliResult<()> {
    let file = SnapshotFile::new(data);
    let store = Arc::new(open(&file)?);
    let catalog = Catalog::new(Arc::clone(&store), GovernanceConfig::default());

    let actor = catalog.actor_for(admin_id)?;
    let promoted = catalog.promote_eligible_novices(&actor)?;

    save(&file, &store)?;
    write_response(&json!({ "promoted": promoted }))
}

fn load_config(path: Option<&Path>) -> CliResult<GovernanceConfig> {
    match path {
        Some(path) => Ok(GovernanceConfig::load(path)?),
        None => Ok(GovernanceConfig::default()),
    }
}

fn open(file: &SnapshotFile) -> CliResult<MemoryStore> {
    if !file.exists() {
        return Err(CliError::not_initialized(&file.path().display().to_string()));
    }
    let store = file.load()?;
    log_event_with_fields(
        Event::SnapshotLoaded,
        &[
            ("path", &file.path().display().to_string()),
            ("documents", &store.len().to_string()),
        ],
    );
    Ok(store)
}

fn save(file: &SnapshotFile, store: &MemoryStore) -> CliResult<()> {
    file.save(store)?;
    log_event_with_fields(
        Event::SnapshotSaved,
        &[
            ("path", &file.path().display().to_string()),
            ("documents", &store.len().to_string()),
        ],
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_refuses_existing_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tree.json");

        init(&path, false).unwrap();
        let err = init(&path, false).unwrap_err();
        assert_eq!(err.code_str(), "AXT_CLI_ALREADY_INITIALIZED");
        init(&path, true).unwrap();
    }

    #[test]
    fn test_commands_require_snapshot() {
        let dir = tempdir().unwrap();
        let err = lineage(&dir.path().join("absent.json"), "node_genesis").unwrap_err();
        assert_eq!(err.code_str(), "AXT_CLI_NOT_INITIALIZED");
    }

    #[test]
    fn test_vote_is_persisted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tree.json");
        init(&path, false).unwrap();

        vote(
            &path,
            None,
            VoteTarget::Nodes,
            "nodeRootComm",
            "alice",
            Role::Citizen,
            VoteChoice::Green,
        )
        .unwrap();

        let store = SnapshotFile::new(&path).load().unwrap();
        let dataset = export_dataset(&store).unwrap();
        assert_eq!(dataset.node("nodeRootComm").unwrap().stats.green_votes, 51);
    }

    #[test]
    fn test_vote_by_novice_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tree.json");
        init(&path, false).unwrap();

        let err = vote(
            &path,
            None,
            VoteTarget::Nodes,
            "nodeRootComm",
            "nina",
            Role::Novice,
            VoteChoice::Green,
        )
        .unwrap_err();
        assert_eq!(err.code_str(), "AXT_UNAUTHORIZED");
    }

    #[test]
    fn test_status_of_unknown_entity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tree.json");
        init(&path, false).unwrap();

        let err = status(&path, None, VoteTarget::Theorems, "ghost").unwrap_err();
        assert_eq!(err.code_str(), "AXT_NOT_FOUND");
    }

    #[test]
    fn test_promote_uses_stored_role() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tree.json");
        init(&path, false).unwrap();

        let err = promote(&path, "userContributor").unwrap_err();
        assert_eq!(err.code_str(), "AXT_UNAUTHORIZED");
        let err = promote(&path, "nobody").unwrap_err();
        assert_eq!(err.code_str(), "AXT_AUTH_REQUIRED");

        promote(&path, "systemAdmin").unwrap();
        let store = SnapshotFile::new(&path).load().unwrap();
        let dataset = export_dataset(&store).unwrap();
        assert_eq!(dataset.user("userApprentice").unwrap().role, Role::Citizen);
        assert_eq!(dataset.user("userNovice").unwrap().role, Role::Novice);
    }
}
