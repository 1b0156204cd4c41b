//! CLI module for axiomtree
//!
//! Provides command-line interface for:
//! - init: Seed a snapshot file
//! - lineage, status, layout: Read-only views of a snapshot
//! - vote: Cast a vote and save the snapshot
//! - check-axiom: Report axiom dependents
//! - promote: Batch-promote eligible novices

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check_axiom, init, layout, lineage, promote, run, run_command, status, vote};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_response;
