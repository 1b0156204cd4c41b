//! # Data Model
//!
//! Environments, axioms, structure nodes, theorems and vote slips, plus the
//! validation rules applied before they are written.

pub mod dataset;
pub mod types;
pub mod validator;

pub use dataset::Dataset;
pub use types::{
    Axiom, Environment, Governed, Status, StructureNode, Theorem, VoteChoice, VoteSlip, VoteTally,
};
pub use validator::{ValidationError, ValidationResult};
