//! The `spectest` command-line interface.
//!
//! Exit codes: 0 when every check passes, 1 when a check fails, 2 when the
//! run could not be carried out (unreadable file, malformed suite, invalid
//! status code).

use std::fs;
use std::path::Path;
use std::process;

use clap::Parser;
use http::{Request, Response, StatusCode};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::assert::{apply_asserts, DefaultVerifier, Outcome, Verifier};
use crate::cli::args::{Command, SpectestArgs};
use crate::cli::output::ConsoleSink;
use crate::error::{Result, SpectestError};
use crate::suite::{report_results, run_suite, SuiteConfig};

pub mod args;
pub mod output;

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "SPECTEST_LOG";

/// The main entry point for the CLI.
pub fn run() {
    init_tracing();
    let args = SpectestArgs::parse();
    debug!(?args, "parsed arguments");

    let result = match args.command {
        Command::JsonEq { expected, actual } => handle_json_eq(&expected, &actual),
        Command::Status { code, expect } => handle_status(code, expect),
        Command::Suite {
            path,
            filter,
            no_color,
        } => handle_suite(&path, filter.as_deref(), no_color),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            process::exit(2);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn use_colors() -> bool {
    atty::is(atty::Stream::Stderr)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| SpectestError::io(path, e))
}

/// Handles the `json-eq` subcommand.
fn handle_json_eq(expected: &Path, actual: &Path) -> Result<bool> {
    let expected = read(expected)?;
    let actual = read(actual)?;
    let mut sink = ConsoleSink::new("json-eq", use_colors());
    Ok(DefaultVerifier::new().json_eq(&mut sink, &expected, &actual, &[]))
}

/// Handles the `status` subcommand.
fn handle_status(code: u16, expect: Outcome) -> Result<bool> {
    let status =
        StatusCode::from_u16(code).map_err(|source| SpectestError::InvalidStatus { code, source })?;
    let mut response = Response::new(Vec::<u8>::new());
    *response.status_mut() = status;
    let request = Request::new(Vec::<u8>::new());

    let mut sink = ConsoleSink::new("status", use_colors());
    let name = format!("status {code}");
    Ok(apply_asserts(
        &DefaultVerifier::new(),
        &mut sink,
        &response,
        &request,
        &[expect.predicate()],
        &name,
    ))
}

/// Handles the `suite` subcommand.
fn handle_suite(path: &Path, filter: Option<&str>, no_color: bool) -> Result<bool> {
    let config = SuiteConfig {
        root: path.to_path_buf(),
        use_colors: !no_color && use_colors(),
    };
    let summary = run_suite(&config, filter, &DefaultVerifier::new())?;
    report_results(&summary, &config);
    Ok(summary.is_success())
}
