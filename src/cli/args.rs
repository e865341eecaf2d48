//! Command-line arguments and subcommands for the `spectest` binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::assert::Outcome;

#[derive(Debug, Parser)]
#[command(
    name = "spectest",
    version,
    about = "Verify HTTP exchanges and report failures the way an assertion library does."
)]
pub struct SpectestArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compare two JSON files semantically (key order and whitespace ignored).
    JsonEq {
        /// File holding the expected document.
        #[arg(required = true)]
        expected: PathBuf,
        /// File holding the actual document.
        #[arg(required = true)]
        actual: PathBuf,
    },
    /// Check that a status code falls in an outcome's range.
    Status {
        /// The HTTP status code to check.
        code: u16,
        /// The expected outcome class.
        #[arg(long, value_enum)]
        expect: Outcome,
    },
    /// Discover and run all YAML check suites in a directory.
    Suite {
        /// Directory searched recursively for `*.yaml` and `*.yml` suites.
        #[arg(default_value = "tests/suites")]
        path: PathBuf,
        /// Only run cases whose name contains this substring.
        #[arg(long)]
        filter: Option<String>,
        /// Disable colored output.
        #[arg(long)]
        no_color: bool,
    },
}
