//! # Governance
//!
//! Effective status of a node or theorem, derived from its declared status
//! and vote tally. Derivation is pure and total; it is recomputed on every
//! read and never written back.
//!
//! ## Asymmetry between `verified` and `trash`
//!
//! The two outcomes behave differently and callers must not assume they
//! are symmetric:
//!
//! - `verified` is only reachable from a declared `unverified`. Once the
//!   declared field holds `verified`, falling votes never demote it.
//! - `trash` is derived live. An entity whose net score drops to the trash
//!   threshold shows as `trash`, and shows its declared status again as
//!   soon as the score recovers. A declared `verified` entity can show as
//!   `trash`.
//!
//! Admin classifications (`deadend`, `deprecated`) win over any tally.

use crate::config::GovernanceConfig;
use crate::model::{Governed, Status, VoteTally};

pub use crate::config::{TRASH_THRESHOLD, VERIFY_THRESHOLD};

/// Derive the effective status using the default thresholds
pub fn derive_status(declared: Status, tally: VoteTally) -> Status {
    derive_status_with(&GovernanceConfig::default(), declared, tally)
}

/// Derive the effective status using the thresholds in `config`
pub fn derive_status_with(config: &GovernanceConfig, declared: Status, tally: VoteTally) -> Status {
    let net = tally.net();

    match declared {
        Status::Deprecated | Status::Deadend => declared,
        Status::Unverified if net >= config.verify_threshold => Status::Verified,
        Status::Unverified | Status::Verified | Status::Trash
            if net <= config.trash_threshold =>
        {
            Status::Trash
        }
        Status::Unverified | Status::Verified | Status::Trash => declared,
    }
}

/// Effective status of any governed entity
pub fn effective_status<G: Governed + ?Sized>(config: &GovernanceConfig, entity: &G) -> Status {
    derive_status_with(config, entity.declared_status(), entity.tally())
}
