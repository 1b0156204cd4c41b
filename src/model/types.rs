//! # Entity Types
//!
//! Persisted records for the structure tree. Field names on the wire are
//! camelCase; enum wire values equal their lowercase names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a node or theorem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Newly created, pending consensus
    Unverified,
    /// Accepted as canonical
    Verified,
    /// Valid structure that cannot be extended further (admin only)
    Deadend,
    /// Rejected by the current vote balance
    Trash,
    /// Marked for removal (admin only)
    Deprecated,
}

impl Status {
    /// All statuses, in declaration order
    pub const ALL: [Status; 5] = [
        Status::Unverified,
        Status::Verified,
        Status::Deadend,
        Status::Trash,
        Status::Deprecated,
    ];

    /// Returns the wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Unverified => "unverified",
            Status::Verified => "verified",
            Status::Deadend => "deadend",
            Status::Trash => "trash",
            Status::Deprecated => "deprecated",
        }
    }

    /// Admin classifications that no vote balance can override
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Deadend | Status::Deprecated)
    }

    /// Whether a child node may be created under an entity in this status
    pub fn is_extendable(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown status '{}'", s))
    }
}

/// A single voter's choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Green,
    Black,
}

impl VoteChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteChoice::Green => "green",
            VoteChoice::Black => "black",
        }
    }

    /// The other choice
    pub fn opposite(&self) -> Self {
        match self {
            VoteChoice::Green => VoteChoice::Black,
            VoteChoice::Black => VoteChoice::Green,
        }
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VoteChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "green" => Ok(VoteChoice::Green),
            "black" => Ok(VoteChoice::Black),
            other => Err(format!("unknown vote choice '{}'", other)),
        }
    }
}

/// Aggregate vote counters carried on a node or theorem.
///
/// Only the voting engine mutates these counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    #[serde(default)]
    pub green_votes: i64,
    #[serde(default)]
    pub black_votes: i64,
}

impl VoteTally {
    pub fn new(green_votes: i64, black_votes: i64) -> Self {
        Self {
            green_votes,
            black_votes,
        }
    }

    /// greenVotes - blackVotes, saturating at the i64 bounds
    pub fn net(&self) -> i64 {
        self.green_votes.saturating_sub(self.black_votes)
    }

    /// Total number of slips represented by this tally
    pub fn total(&self) -> i64 {
        self.green_votes.saturating_add(self.black_votes)
    }

    pub(crate) fn adjust(&mut self, choice: VoteChoice, delta: i64) {
        let counter = match choice {
            VoteChoice::Green => &mut self.green_votes,
            VoteChoice::Black => &mut self.black_votes,
        };
        *counter = counter.saturating_add(delta);
    }

    /// Floor both counters at zero
    pub(crate) fn clamped(self) -> Self {
        Self {
            green_votes: self.green_votes.max(0),
            black_votes: self.black_votes.max(0),
        }
    }
}

/// Namespace of symbols shared by one subtree of structures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sets: Vec<String>,
    #[serde(default)]
    pub operators: Vec<String>,
}

/// A globally shared axiom, referenced by structure nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Axiom {
    pub id: String,
    pub canonical_name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub notation: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
}

/// One step in the tree: a parent extended by one axiom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureNode {
    pub id: String,
    /// None only for the genesis node of an environment
    pub parent_id: Option<String>,
    /// None only for the genesis node of an environment
    pub axiom_id: Option<String>,
    pub environment_id: String,
    pub author_id: String,
    pub display_notation: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_of_id: Option<String>,
    #[serde(default)]
    pub to_be_deleted: bool,
    #[serde(default)]
    pub stats: VoteTally,
    pub created_at: DateTime<Utc>,
}

impl StructureNode {
    pub fn is_genesis(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A statement with proof, owned by exactly one structure node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theorem {
    pub id: String,
    pub node_id: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub statement_notation: String,
    pub proof_notation: String,
    pub author_id: String,
    pub status: Status,
    #[serde(default)]
    pub stats: VoteTally,
    pub created_at: DateTime<Utc>,
}

/// Durable per-voter record stored at `{collection}/{id}/votes/{voterId}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteSlip {
    pub choice: VoteChoice,
    pub timestamp: DateTime<Utc>,
}

/// Anything that carries a declared status and a vote tally
pub trait Governed {
    fn declared_status(&self) -> Status;
    fn tally(&self) -> VoteTally;
}

impl Governed for StructureNode {
    fn declared_status(&self) -> Status {
        self.status
    }

    fn tally(&self) -> VoteTally {
        self.stats
    }
}

impl Governed for Theorem {
    fn declared_status(&self) -> Status {
        self.status
    }

    fn tally(&self) -> VoteTally {
        self.stats
    }
}
