//! Vote targets and receipts

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Status, VoteChoice, VoteSlip, VoteTally};
use crate::store::{Collection, Revision};

/// Collections that accept votes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteTarget {
    Nodes,
    Theorems,
}

impl VoteTarget {
    pub fn collection(&self) -> Collection {
        match self {
            VoteTarget::Nodes => Collection::Nodes,
            VoteTarget::Theorems => Collection::Theorems,
        }
    }
}

impl fmt::Display for VoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection().as_str())
    }
}

impl std::str::FromStr for VoteTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nodes" => Ok(VoteTarget::Nodes),
            "theorems" => Ok(VoteTarget::Theorems),
            other => Err(format!("'{}' does not accept votes", other)),
        }
    }
}

/// Net effect of one cast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteAction {
    /// First vote from this voter
    Cast,
    /// Replaced an opposite vote
    Swapped,
    /// Same choice again; the vote was withdrawn
    Retracted,
}

impl VoteAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteAction::Cast => "cast",
            VoteAction::Swapped => "swapped",
            VoteAction::Retracted => "retracted",
        }
    }
}

/// Outcome of a committed vote
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub target: VoteTarget,
    pub entity_id: String,
    pub voter_id: String,
    pub action: VoteAction,
    /// Choice held before this cast
    pub previous: Option<VoteChoice>,
    /// Slip held after this cast; None after a retraction
    pub slip: Option<VoteSlip>,
    /// Tally as committed
    pub tally: VoteTally,
    /// Effective status under the committed tally
    pub status: Status,
    pub revision: Revision,
    pub attempts: u32,
}
