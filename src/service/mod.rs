//! # Catalog Services
//!
//! Every write to environments, axioms, structure nodes and theorems other
//! than vote tallies. Each operation authorizes the actor, validates its
//! input, then performs its reads and writes in one transaction.

mod catalog;
mod inputs;

pub use catalog::Catalog;
pub use inputs::{
    AxiomSource, AxiomUpdate, StructureInput, TheoremInput, TheoremUpdate, Universe, UniverseInput,
};
