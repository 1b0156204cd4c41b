//! CLI argument definitions using clap
//!
//! Commands:
//! - axiomtree init --data <path>
//! - axiomtree lineage <node> --data <path>
//! - axiomtree status <collection> <id> --data <path>
//! - axiomtree vote <collection> <id> --user <id> --role <role> --choice <choice>
//! - axiomtree check-axiom <axiom> --data <path>
//! - axiomtree layout --data <path>
//! - axiomtree promote --admin <id> --data <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::auth::Role;
use crate::model::VoteChoice;
use crate::voting::VoteTarget;

/// axiomtree - a governed tree of algebraic structures
#[derive(Parser, Debug)]
#[command(name = "axiomtree")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a snapshot seeded with the additive magma universe
    Init {
        /// Path to the snapshot file
        #[arg(long, default_value = "./axiomtree.json")]
        data: PathBuf,

        /// Overwrite an existing snapshot
        #[arg(long)]
        force: bool,
    },

    /// Print the axioms and theorems in scope at a node
    Lineage {
        /// Node id
        node: String,

        /// Path to the snapshot file
        #[arg(long, default_value = "./axiomtree.json")]
        data: PathBuf,
    },

    /// Print the declared and effective status of a node or theorem
    Status {
        /// nodes or theorems
        #[arg(value_parser = parse_target)]
        collection: VoteTarget,

        /// Entity id
        id: String,

        /// Path to the snapshot file
        #[arg(long, default_value = "./axiomtree.json")]
        data: PathBuf,

        /// Path to a governance configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Cast, swap or retract a vote and save the snapshot
    Vote {
        /// nodes or theorems
        #[arg(value_parser = parse_target)]
        collection: VoteTarget,

        /// Entity id
        id: String,

        /// Voter id
        #[arg(long)]
        user: String,

        /// Voter role
        #[arg(long, default_value = "citizen", value_parser = parse_role)]
        role: Role,

        /// green or black
        #[arg(long, value_parser = parse_choice)]
        choice: VoteChoice,

        /// Path to the snapshot file
        #[arg(long, default_value = "./axiomtree.json")]
        data: PathBuf,

        /// Path to a governance configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Report whether an axiom can be deleted
    CheckAxiom {
        /// Axiom id
        axiom: String,

        /// Path to the snapshot file
        #[arg(long, default_value = "./axiomtree.json")]
        data: PathBuf,
    },

    /// Print node positions and edges for rendering
    Layout {
        /// Only lay out nodes of this environment
        #[arg(long)]
        environment: Option<String>,

        /// Path to the snapshot file
        #[arg(long, default_value = "./axiomtree.json")]
        data: PathBuf,
    },

    /// Promote every novice with enough reputation to citizen
    Promote {
        /// Acting user id; its stored profile must be an admin
        #[arg(long)]
        admin: String,

        /// Path to the snapshot file
        #[arg(long, default_value = "./axiomtree.json")]
        data: PathBuf,
    },
}

fn parse_target(s: &str) -> Result<VoteTarget, String> {
    s.parse()
}

fn parse_role(s: &str) -> Result<Role, String> {
    s.parse()
}

fn parse_choice(s: &str) -> Result<VoteChoice, String> {
    s.parse()
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vote() {
        let cli = Cli::try_parse_from([
            "axiomtree",
            "vote",
            "theorems",
            "thm_comm_zero",
            "--user",
            "alice",
            "--choice",
            "black",
        ])
        .unwrap();

        match cli.command {
            Command::Vote {
                collection,
                role,
                choice,
                data,
                ..
            } => {
                assert_eq!(collection, VoteTarget::Theorems);
                assert_eq!(role, Role::Citizen);
                assert_eq!(choice, VoteChoice::Black);
                assert_eq!(data, PathBuf::from("./axiomtree.json"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_unknown_collection_rejected() {
        assert!(Cli::try_parse_from(["axiomtree", "status", "axioms", "axComm"]).is_err());
    }

    #[test]
    fn test_check_axiom_kebab_case() {
        let cli = Cli::try_parse_from(["axiomtree", "check-axiom", "axAssoc"]).unwrap();
        assert!(matches!(cli.command, Command::CheckAxiom { .. }));
    }
}
