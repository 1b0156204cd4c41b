//! # Document Keys
//!
//! Logical addressing of stored records:
//! `environments/{id}`, `axioms/{id}`, `nodes/{id}`, `theorems/{id}`,
//! `users/{uid}` and the vote sub-collections
//! `{collection}/{id}/votes/{voterId}`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level entity collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Environments,
    Axioms,
    Nodes,
    Theorems,
    Users,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Environments => "environments",
            Collection::Axioms => "axioms",
            Collection::Nodes => "nodes",
            Collection::Theorems => "theorems",
            Collection::Users => "users",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "environments" => Ok(Collection::Environments),
            "axioms" => Ok(Collection::Axioms),
            "nodes" => Ok(Collection::Nodes),
            "theorems" => Ok(Collection::Theorems),
            "users" => Ok(Collection::Users),
            other => Err(format!("unknown collection '{}'", other)),
        }
    }
}

/// A collection, or the vote sub-collection of one entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CollectionPath {
    Root { collection: Collection },
    Votes {
        parent: Collection,
        #[serde(rename = "entityId")]
        entity_id: String,
    },
}

impl CollectionPath {
    pub fn root(collection: Collection) -> Self {
        Self::Root { collection }
    }

    pub fn votes(parent: Collection, entity_id: impl Into<String>) -> Self {
        Self::Votes {
            parent,
            entity_id: entity_id.into(),
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionPath::Root { collection } => write!(f, "{}", collection),
            CollectionPath::Votes { parent, entity_id } => {
                write!(f, "{}/{}/votes", parent, entity_id)
            }
        }
    }
}

/// Address of one document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocKey {
    pub path: CollectionPath,
    pub id: String,
}

impl DocKey {
    pub fn new(path: CollectionPath, id: impl Into<String>) -> Self {
        Self {
            path,
            id: id.into(),
        }
    }

    /// Key of a top-level entity
    pub fn entity(collection: Collection, id: impl Into<String>) -> Self {
        Self::new(CollectionPath::root(collection), id)
    }

    /// Key of one voter's slip on an entity
    pub fn vote(parent: Collection, entity_id: impl Into<String>, voter_id: impl Into<String>) -> Self {
        Self::new(CollectionPath::votes(parent, entity_id), voter_id)
    }

    /// Collection name used in change events (`nodes`, `nodes/n1/votes`, ...)
    pub fn collection_name(&self) -> String {
        self.path.to_string()
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.path, self.id)
    }
}
