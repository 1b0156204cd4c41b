//! # Dataset
//!
//! An in-memory copy of every entity collection. Readers load one of these
//! from the store and run the pure lineage, status and layout steps on it.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::types::{Axiom, Environment, Status, StructureNode, Theorem, VoteTally};
use crate::auth::{Reputation, Role, UserProfile};

/// All entities of the catalog, in store order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub environments: Vec<Environment>,
    #[serde(default)]
    pub axioms: Vec<Axiom>,
    #[serde(default)]
    pub nodes: Vec<StructureNode>,
    #[serde(default)]
    pub theorems: Vec<Theorem>,
    #[serde(default)]
    pub users: Vec<UserProfile>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: &str) -> Option<&StructureNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn theorem(&self, id: &str) -> Option<&Theorem> {
        self.theorems.iter().find(|t| t.id == id)
    }

    pub fn axiom(&self, id: &str) -> Option<&Axiom> {
        self.axioms.iter().find(|a| a.id == id)
    }

    pub fn user(&self, uid: &str) -> Option<&UserProfile> {
        self.users.iter().find(|u| u.uid == uid)
    }

    /// Nodes belonging to one environment
    pub fn nodes_in(&self, environment_id: &str) -> Vec<StructureNode> {
        self.nodes
            .iter()
            .filter(|n| n.environment_id == environment_id)
            .cloned()
            .collect()
    }

    /// The demonstration universe: an additive magma and its refinements.
    pub fn additive_magma() -> Self {
        let now = Utc::now();
        let admin = "systemAdmin";

        let axiom = |id: &str, name: &str, aliases: &[&str], notation: &str| Axiom {
            id: id.to_string(),
            canonical_name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            notation: notation.to_string(),
            author_id: admin.to_string(),
            created_at: now,
        };

        let axioms = vec![
            axiom(
                "axComm",
                "Commutativity",
                &["Symmetric", "Abelian"],
                "a + b = b + a",
            ),
            axiom(
                "axAssoc",
                "Associativity",
                &["Grouping"],
                "(a + b) + c = a + (b + c)",
            ),
            axiom(
                "axIdent",
                "Identity Element",
                &["Neutral Element", "Unity"],
                "\\exists e : a + e = a",
            ),
            axiom(
                "axInv",
                "Inverse Element",
                &["Reversibility"],
                "\\forall a, \\exists a^{-1} : a + a^{-1} = e",
            ),
        ];

        let node = |id: &str,
                    parent: Option<&str>,
                    axiom_id: Option<&str>,
                    author: &str,
                    notation: &str,
                    status: Status,
                    stats: (i64, i64)| StructureNode {
            id: id.to_string(),
            parent_id: parent.map(str::to_string),
            axiom_id: axiom_id.map(str::to_string),
            environment_id: "env_additive_magma".to_string(),
            author_id: author.to_string(),
            display_notation: notation.to_string(),
            status,
            duplicate_of_id: None,
            to_be_deleted: false,
            stats: VoteTally::new(stats.0, stats.1),
            created_at: now,
        };

        let mut zombie = node(
            "nodeZombieDuplicate",
            Some("nodeCommAssoc"),
            Some("axAssoc"),
            "userNovice",
            "\\text{Duplicate of Node A}",
            Status::Deprecated,
            (2, 10),
        );
        zombie.duplicate_of_id = Some("nodeCommAssoc".to_string());
        zombie.to_be_deleted = true;

        let nodes = vec![
            node(
                "node_genesis",
                None,
                None,
                admin,
                "\\text{Magma } (S, +)",
                Status::Verified,
                (100, 0),
            ),
            node(
                "nodeRootComm",
                Some("node_genesis"),
                Some("axComm"),
                admin,
                "x + y = y + x",
                Status::Unverified,
                (50, 1),
            ),
            node(
                "nodeRootAssoc",
                Some("node_genesis"),
                Some("axAssoc"),
                admin,
                "(x + y) + z = x + (y + z)",
                Status::Verified,
                (45, 0),
            ),
            node(
                "nodeCommAssoc",
                Some("nodeRootComm"),
                Some("axAssoc"),
                "userContributor",
                "(x + y) + z = x + (y + z)",
                Status::Verified,
                (20, 0),
            ),
            node(
                "nodeAssocComm",
                Some("nodeRootAssoc"),
                Some("axComm"),
                "userContributor",
                "x + y = y + x",
                Status::Verified,
                (20, 0),
            ),
            zombie,
        ];

        let theorem = |id: &str,
                       node_id: &str,
                       name: &str,
                       statement: &str,
                       proof: &str,
                       stats: (i64, i64)| Theorem {
            id: id.to_string(),
            node_id: node_id.to_string(),
            name: name.to_string(),
            aliases: Vec::new(),
            statement_notation: statement.to_string(),
            proof_notation: proof.to_string(),
            author_id: admin.to_string(),
            status: Status::Verified,
            stats: VoteTally::new(stats.0, stats.1),
            created_at: now,
        };

        let theorems = vec![
            theorem(
                "thm_magma_closure",
                "node_genesis",
                "Closure",
                "\\forall a, b \\in S, a + b \\in S",
                "By definition of a binary operation on a set.",
                (100, 0),
            ),
            theorem(
                "thm_comm_zero",
                "nodeRootComm",
                "Commuting with zero",
                "x + 0 = 0 + x",
                "Direct application of commutativity with y = 0.",
                (10, 0),
            ),
            theorem(
                "thm_comm_assoc_swap",
                "nodeCommAssoc",
                "Reordering",
                "x + (y + z) = (z + y) + x",
                "Group (y + z) by associativity, then swap by commutativity.",
                (5, 0),
            ),
        ];

        let user = |uid: &str, name: &str, role: Role, reputation: (i64, i64)| UserProfile {
            uid: uid.to_string(),
            display_name: Some(name.to_string()),
            email: None,
            role,
            reputation: Reputation::new(reputation.0, reputation.1),
            created_at: now,
        };

        let users = vec![
            user(admin, "System Admin", Role::Admin, (0, 0)),
            user("userContributor", "Contributor", Role::Citizen, (40, 25)),
            user("userNovice", "Novice", Role::Novice, (2, 10)),
            user("userApprentice", "Apprentice", Role::Novice, (20, 35)),
        ];

        Self {
            environments: vec![Environment {
                id: "env_additive_magma".to_string(),
                name: "Additive Magma".to_string(),
                sets: vec!["S".to_string()],
                operators: vec!["+".to_string()],
            }],
            axioms,
            nodes,
            theorems,
            users,
        }
    }
}
