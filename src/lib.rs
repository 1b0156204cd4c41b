//! axiomtree - a collaborative, governed tree of algebraic structures
//!
//! Structures extend their parent by one axiom and inherit every axiom and
//! theorem above them. Community votes drive each entity's status; admins
//! may override it.

pub mod auth;
pub mod cli;
pub mod config;
pub mod errors;
pub mod governance;
pub mod guard;
pub mod layout;
pub mod lineage;
pub mod model;
pub mod observability;
pub mod realtime;
pub mod service;
pub mod store;
pub mod voting;

pub use config::GovernanceConfig;
pub use errors::{CoreError, CoreResult};
