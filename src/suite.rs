//! YAML check suites.
//!
//! Runs the verification engine outside Rust code: each suite file lists
//! cases, each case is one check routed through a [`Verifier`], and every
//! failure report is collected per case.
//!
//! # Suite Format
//!
//! ```yaml
//! - name: "bodies match"
//!   kind: json              # json | text | status
//!   expected: '{"a": 1}'
//!   actual: '{"a": 1.0}'
//! - name: "missing user"
//!   kind: status
//!   code: 404
//!   outcome: client_error   # success | client_error | server_error
//!   skip: false             # optional, defaults to false
//!   only: false             # optional, defaults to false
//! ```
//!
//! When any case is marked `only`, every other case is skipped.

use std::fs;
use std::path::{Path, PathBuf};

use http::{Request, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::assert::{apply_asserts, MsgArg, Operand, Outcome, RecordingSink, Verifier};
use crate::error::{Result, SpectestError};

// =============================================================================
// CORE TYPES
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SuiteCase {
    pub name: String,
    #[serde(flatten)]
    pub check: Check,
    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub only: bool,
}

/// What a case verifies, selected by its `kind` field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Check {
    /// Semantic JSON equality of two documents.
    Json { expected: String, actual: String },
    /// Exact text equality, with a line diff on mismatch.
    Text { expected: String, actual: String },
    /// Status code falls in the outcome's range.
    Status { code: u16, outcome: Outcome },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseResult {
    Pass {
        file: String,
        name: String,
    },
    /// `report` holds every failure report the case produced, in order.
    Fail {
        file: String,
        name: String,
        report: String,
    },
    Skipped {
        file: String,
        name: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct SuiteSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub results: Vec<CaseResult>,
}

impl SuiteSummary {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Debug, Clone)]
pub struct SuiteConfig {
    pub root: PathBuf,
    pub use_colors: bool,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("tests/suites"),
            use_colors: atty::is(atty::Stream::Stderr),
        }
    }
}

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";

impl SuiteConfig {
    pub fn colorize(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

// =============================================================================
// DISCOVERY AND LOADING
// =============================================================================

/// All `*.yaml` and `*.yml` files under `root`, in path order.
pub fn discover_suite_files<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .is_some_and(|ext| ext == "yaml" || ext == "yml")
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

pub fn load_suite(path: &Path) -> Result<Vec<SuiteCase>> {
    let content = fs::read_to_string(path).map_err(|e| SpectestError::io(path, e))?;
    serde_yaml::from_str(&content).map_err(|e| SpectestError::suite_parse(path, &content, e))
}

pub fn skip_reason(case: &SuiteCase, has_only: bool, filter: Option<&str>) -> Option<String> {
    if has_only && !case.only {
        return Some("Not marked 'only' in 'only' mode".to_string());
    }
    if case.skip {
        return Some("Marked 'skip'".to_string());
    }
    if let Some(f) = filter {
        if !case.name.to_lowercase().contains(&f.to_lowercase()) {
            return Some(format!("Filtered out by substring: {f}"));
        }
    }
    None
}

// =============================================================================
// EXECUTION
// =============================================================================

/// Runs one case through `verifier`, collecting its reports in a sink named
/// after the case.
pub fn run_case(file: &str, case: &SuiteCase, verifier: &dyn Verifier) -> CaseResult {
    debug!(case = %case.name, file, "running case");
    let mut sink = RecordingSink::named(case.name.as_str());

    match &case.check {
        Check::Json { expected, actual } => {
            verifier.json_eq(&mut sink, expected, actual, &[]);
        }
        Check::Text { expected, actual } => {
            verifier.equal(&mut sink, Operand::of(expected), Operand::of(actual), &[]);
        }
        Check::Status { code, outcome } => match StatusCode::from_u16(*code) {
            Ok(status) => {
                let mut response = Response::new(Vec::<u8>::new());
                *response.status_mut() = status;
                let request = Request::new(Vec::<u8>::new());
                apply_asserts(
                    verifier,
                    &mut sink,
                    &response,
                    &request,
                    &[outcome.predicate()],
                    &case.name,
                );
            }
            Err(source) => {
                let err = SpectestError::InvalidStatus {
                    code: *code,
                    source,
                };
                verifier.no_error(&mut sink, Some(&err), &[MsgArg::name(case.name.as_str())]);
            }
        },
    }

    let file = file.to_string();
    let name = case.name.clone();
    if sink.failed() {
        CaseResult::Fail {
            file,
            name,
            report: sink.failures().concat(),
        }
    } else {
        CaseResult::Pass { file, name }
    }
}

/// Loads every suite under `config.root` and runs its cases.
pub fn run_suite(
    config: &SuiteConfig,
    filter: Option<&str>,
    verifier: &dyn Verifier,
) -> Result<SuiteSummary> {
    fs::metadata(&config.root).map_err(|e| SpectestError::io(&config.root, e))?;

    let mut all_cases = Vec::new();
    for path in discover_suite_files(&config.root) {
        let cases = load_suite(&path)?;
        info!(file = %path.display(), cases = cases.len(), "loaded suite");
        let file = path.display().to_string();
        all_cases.extend(cases.into_iter().map(|case| (file.clone(), case)));
    }

    let has_only = all_cases.iter().any(|(_, case)| case.only);
    let results: Vec<CaseResult> = all_cases
        .into_iter()
        .map(|(file, case)| match skip_reason(&case, has_only, filter) {
            Some(reason) => CaseResult::Skipped {
                file,
                name: case.name,
                reason,
            },
            None => run_case(&file, &case, verifier),
        })
        .collect();

    let (passed, failed, skipped) = partition_results(&results);
    Ok(SuiteSummary {
        passed,
        failed,
        skipped,
        results,
    })
}

// =============================================================================
// REPORTING
// =============================================================================

/// Counts of passed, failed and skipped cases.
pub fn partition_results(results: &[CaseResult]) -> (usize, usize, usize) {
    let passed = results
        .iter()
        .filter(|r| matches!(r, CaseResult::Pass { .. }))
        .count();
    let failed = results
        .iter()
        .filter(|r| matches!(r, CaseResult::Fail { .. }))
        .count();
    let skipped = results
        .iter()
        .filter(|r| matches!(r, CaseResult::Skipped { .. }))
        .count();
    (passed, failed, skipped)
}

/// Prints one line per case, the failure reports and a summary line.
pub fn report_results(summary: &SuiteSummary, config: &SuiteConfig) {
    for r in &summary.results {
        match r {
            CaseResult::Pass { file, name } => {
                println!("{}: {name} [{file}]", config.colorize("PASS", GREEN))
            }
            CaseResult::Fail { file, name, report } => {
                eprintln!("{}: {name} [{file}]", config.colorize("FAIL", RED));
                eprintln!("{report}");
            }
            CaseResult::Skipped { file, name, reason } => {
                println!(
                    "{}: {name} [{file}] ({reason})",
                    config.colorize("SKIP", YELLOW)
                )
            }
        }
    }

    println!(
        "\nSuite summary: total {}, {} {}, {} {}, {} {}",
        summary.total(),
        config.colorize("passed", GREEN),
        summary.passed,
        config.colorize("failed", RED),
        summary.failed,
        config.colorize("skipped", YELLOW),
        summary.skipped,
    );

    if summary.failed > 0 {
        eprintln!("\nFailed cases:");
        for r in &summary.results {
            if let CaseResult::Fail { name, .. } = r {
                eprintln!("  - {name}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert::{DefaultVerifier, NoopVerifier};

    fn case(name: &str, check: Check) -> SuiteCase {
        SuiteCase {
            name: name.to_string(),
            check,
            skip: false,
            only: false,
        }
    }

    #[test]
    fn parses_every_kind() {
        let yaml = r#"
- name: json bodies
  kind: json
  expected: '{"a": 1}'
  actual: '{"a": 1.0}'
- name: greeting
  kind: text
  expected: hello
  actual: hello
  skip: true
- name: not found
  kind: status
  code: 404
  outcome: client_error
"#;
        let cases: Vec<SuiteCase> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cases.len(), 3);
        assert_eq!(
            cases[0].check,
            Check::Json {
                expected: r#"{"a": 1}"#.into(),
                actual: r#"{"a": 1.0}"#.into(),
            }
        );
        assert!(cases[1].skip);
        assert_eq!(
            cases[2].check,
            Check::Status {
                code: 404,
                outcome: Outcome::ClientError,
            }
        );
    }

    #[test]
    fn skip_rules() {
        let mut c = case("Get User", Check::Status { code: 200, outcome: Outcome::Success });
        assert_eq!(skip_reason(&c, false, None), None);
        assert_eq!(skip_reason(&c, false, Some("get")), None);
        assert!(skip_reason(&c, false, Some("delete")).is_some());
        assert!(skip_reason(&c, true, None).is_some());
        c.only = true;
        assert_eq!(skip_reason(&c, true, None), None);
        c.skip = true;
        assert_eq!(skip_reason(&c, false, None), Some("Marked 'skip'".to_string()));
    }

    #[test]
    fn failing_text_case_carries_the_report() {
        let c = case(
            "greeting",
            Check::Text {
                expected: "hello".into(),
                actual: "help".into(),
            },
        );
        match run_case("greet.yaml", &c, &DefaultVerifier::new()) {
            CaseResult::Fail { report, name, .. } => {
                assert_eq!(name, "greeting");
                assert!(report.contains("Not equal"));
                assert!(report.contains("\tTest:"));
                assert!(report.contains("Diff:"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn status_cases() {
        let verifier = DefaultVerifier::new();
        let pass = case("ok", Check::Status { code: 204, outcome: Outcome::Success });
        assert!(matches!(run_case("s.yaml", &pass, &verifier), CaseResult::Pass { .. }));

        let fail = case("oops", Check::Status { code: 503, outcome: Outcome::ClientError });
        match run_case("s.yaml", &fail, &verifier) {
            CaseResult::Fail { report, .. } => {
                assert!(report.contains("not a client error. Status code=503"));
                assert!(report.contains("\tName:"));
            }
            other => panic!("expected failure, got {other:?}"),
        }

        let invalid = case("bad", Check::Status { code: 42, outcome: Outcome::Success });
        match run_case("s.yaml", &invalid, &verifier) {
            CaseResult::Fail { report, .. } => {
                assert!(report.contains("invalid HTTP status code 42"))
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn noop_verifier_passes_everything() {
        let c = case(
            "broken",
            Check::Json {
                expected: "{".into(),
                actual: "[]".into(),
            },
        );
        assert!(matches!(run_case("x.yaml", &c, &NoopVerifier), CaseResult::Pass { .. }));
    }

    #[test]
    fn missing_root_is_an_io_error() {
        let config = SuiteConfig {
            root: PathBuf::from("does/not/exist"),
            use_colors: false,
        };
        let err = run_suite(&config, None, &NoopVerifier).unwrap_err();
        assert!(matches!(err, SpectestError::Io { .. }));
    }

    #[test]
    fn colorize_respects_config() {
        let plain = SuiteConfig {
            root: PathBuf::new(),
            use_colors: false,
        };
        assert_eq!(plain.colorize("PASS", GREEN), "PASS");
        let colored = SuiteConfig {
            use_colors: true,
            ..plain
        };
        assert_eq!(colored.colorize("PASS", GREEN), "\x1b[32mPASS\x1b[0m");
    }
}
