// Exit codes and console output of the `spectest` binary.

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn spectest() -> Command {
    let mut cmd = Command::cargo_bin("spectest").unwrap();
    cmd.env_remove("SPECTEST_LOG");
    cmd
}

#[test]
fn json_eq_accepts_reordered_documents() {
    spectest()
        .args(["json-eq", "tests/fixtures/user.json", "tests/fixtures/user_reordered.json"])
        .assert()
        .success();
}

#[test]
fn json_eq_reports_mismatch() {
    spectest()
        .args(["json-eq", "tests/fixtures/user.json", "tests/fixtures/user_changed.json"])
        .assert()
        .code(1)
        .stderr(
            contains("FAIL")
                .and(contains("Error Trace:"))
                .and(contains("Not equal"))
                .and(contains("Diff:"))
                .and(contains("Test:")),
        );
}

#[test]
fn json_eq_missing_file_is_an_operational_error() {
    spectest()
        .args(["json-eq", "tests/fixtures/user.json", "tests/fixtures/absent.json"])
        .assert()
        .code(2)
        .stderr(contains("spectest::io").and(contains("absent.json")));
}

#[test]
fn status_matches_outcome() {
    spectest()
        .args(["status", "404", "--expect", "client-error"])
        .assert()
        .success();
}

#[test]
fn status_outside_outcome_fails() {
    spectest()
        .args(["status", "500", "--expect", "success"])
        .assert()
        .code(1)
        .stderr(contains("not success. Status code=500").and(contains("status 500")));
}

#[test]
fn invalid_status_code_is_an_operational_error() {
    spectest()
        .args(["status", "42", "--expect", "success"])
        .assert()
        .code(2)
        .stderr(contains("spectest::status"));
}

#[test]
fn suite_runs_bundled_suites() {
    spectest()
        .args(["suite", "tests/suites", "--no-color"])
        .assert()
        .success()
        .stdout(contains("PASS").and(contains("Suite summary: total 9")));
}

#[test]
fn suite_with_failures_exits_one() {
    spectest()
        .args(["suite", "tests/fixtures/failing_suite", "--no-color"])
        .assert()
        .code(1)
        .stderr(contains("FAIL: bodies differ").and(contains("Failed cases:")));
}

#[test]
fn malformed_suite_is_rendered_as_a_diagnostic() {
    spectest()
        .args(["suite", "tests/fixtures/broken_suite"])
        .assert()
        .code(2)
        .stderr(contains("spectest::suite::parse").or(contains("invalid suite file")));
}
