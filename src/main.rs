//! axiomtree CLI entry point
//!
//! Parses arguments and dispatches through `cli::run`. Failures are written
//! to stderr as a JSON error envelope and exit with status 1.

use axiomtree::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e.to_json());
        std::process::exit(1);
    }
}
