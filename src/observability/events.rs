//! Observable events
//!
//! Every log line emitted by the crate names one of these events.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    ConfigLoaded,

    // Snapshot
    SnapshotLoaded,
    SnapshotSaved,

    // Voting
    VoteCast,
    VoteSwapped,
    VoteRetracted,
    VoteRejected,

    // Catalog writes
    UniverseCreated,
    UniverseRenamed,
    UniverseDeleted,
    StructureCreated,
    StructureUpdated,
    StructureDeleted,
    AxiomUpdated,
    AxiomDeleted,
    TheoremCreated,
    TheoremUpdated,
    TheoremDeleted,
    StatusOverridden,

    // Users
    UserRegistered,
    RoleChanged,
    ReputationAdjusted,

    // Guards
    DeletionRefused,
    LineageCorrupt,

    // Counters
    MetricsReported,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::SnapshotLoaded => "SNAPSHOT_LOADED",
            Event::SnapshotSaved => "SNAPSHOT_SAVED",

            Event::VoteCast => "VOTE_CAST",
            Event::VoteSwapped => "VOTE_SWAPPED",
            Event::VoteRetracted => "VOTE_RETRACTED",
            Event::VoteRejected => "VOTE_REJECTED",

            Event::UniverseCreated => "UNIVERSE_CREATED",
            Event::UniverseRenamed => "UNIVERSE_RENAMED",
            Event::UniverseDeleted => "UNIVERSE_DELETED",
            Event::StructureCreated => "STRUCTURE_CREATED",
            Event::StructureUpdated => "STRUCTURE_UPDATED",
            Event::StructureDeleted => "STRUCTURE_DELETED",
            Event::AxiomUpdated => "AXIOM_UPDATED",
            Event::AxiomDeleted => "AXIOM_DELETED",
            Event::TheoremCreated => "THEOREM_CREATED",
            Event::TheoremUpdated => "THEOREM_UPDATED",
            Event::TheoremDeleted => "THEOREM_DELETED",
            Event::StatusOverridden => "STATUS_OVERRIDDEN",

            Event::UserRegistered => "USER_REGISTERED",
            Event::RoleChanged => "ROLE_CHANGED",
            Event::ReputationAdjusted => "REPUTATION_ADJUSTED",

            Event::DeletionRefused => "DELETION_REFUSED",
            Event::LineageCorrupt => "LINEAGE_CORRUPT",

            Event::MetricsReported => "METRICS_REPORTED",
        }
    }

    /// Events that report a refused or degraded operation
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Event::VoteRejected | Event::DeletionRefused | Event::LineageCorrupt
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
