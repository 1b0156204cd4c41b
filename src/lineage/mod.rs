//! # Lineage
//!
//! Inheritance along the parent chain. A node's scope is every axiom and
//! theorem defined on its ancestors (root first) followed by its own.
//!
//! Resolution is pure: it reads only the slices it is given and never
//! fails. Broken chains are reported through [`ChainIntegrity`];
//! [`verify_chain`] surfaces the same conditions as a typed error.

mod errors;
mod resolver;

pub use errors::{LineageError, LineageResult};
pub use resolver::{
    ancestors, descendants, resolve_lineage, verify_chain, ChainIntegrity, Lineage, LineageIndex,
};
