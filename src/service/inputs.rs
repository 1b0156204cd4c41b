//! Request payloads for catalog writes

use serde::{Deserialize, Serialize};

use crate::model::{Axiom, Environment, StructureNode};

/// A new universe: environment, root axiom and genesis node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniverseInput {
    pub name: String,
    #[serde(default)]
    pub sets: Vec<String>,
    #[serde(default)]
    pub operators: Vec<String>,
    pub root_axiom_name: String,
    pub root_axiom_notation: String,
    pub genesis_notation: String,
}

/// Records written by [`crate::service::Catalog::create_universe`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Universe {
    pub environment: Environment,
    pub root_axiom: Axiom,
    pub genesis: StructureNode,
}

/// Which axiom a new structure adds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AxiomSource {
    /// Reuse an axiom from the global registry
    Existing { id: String },
    /// Register a new axiom alongside the structure
    #[serde(rename_all = "camelCase")]
    New {
        canonical_name: String,
        notation: String,
        #[serde(default)]
        aliases: Vec<String>,
    },
}

/// A child structure under an existing node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureInput {
    pub parent_id: String,
    pub environment_id: String,
    pub display_notation: String,
    pub axiom: AxiomSource,
}

/// Corrections to an axiom's descriptive fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxiomUpdate {
    pub canonical_name: Option<String>,
    pub notation: Option<String>,
    pub aliases: Option<Vec<String>>,
}

/// A new theorem on a node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TheoremInput {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub statement_notation: String,
    pub proof_notation: String,
}

/// Corrections to a theorem's text
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TheoremUpdate {
    pub name: Option<String>,
    pub aliases: Option<Vec<String>>,
    pub statement_notation: Option<String>,
    pub proof_notation: Option<String>,
}
