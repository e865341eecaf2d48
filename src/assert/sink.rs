//! Reporting sinks: where failure reports end up.

use std::fmt;
use std::thread;

/// Receives rendered failure reports.
///
/// Whether a failure aborts the running test is the sink's decision: the
/// verifier only ever calls [`ReportSink::report_failure`].
pub trait ReportSink {
    /// Records a failure and marks the test failed; execution continues.
    fn report_failure(&mut self, message: &str);

    /// Records a failure and stops the test immediately.
    fn abort(&mut self, message: &str) -> !;

    fn abortf(&mut self, args: fmt::Arguments<'_>) -> ! {
        self.abort(&args.to_string())
    }

    /// Name of the running test, surfaced as the report's `Test` row.
    fn name(&self) -> Option<String> {
        None
    }
}

/// Keeps every reported failure in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    name: Option<String>,
    failures: Vec<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            failures: Vec::new(),
        }
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    pub fn failed(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl ReportSink for RecordingSink {
    fn report_failure(&mut self, message: &str) {
        self.failures.push(message.to_owned());
    }

    fn abort(&mut self, message: &str) -> ! {
        self.failures.push(message.to_owned());
        panic!("{message}")
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }
}

/// Sink for native `#[test]` functions.
///
/// Failures are echoed to stderr as they happen and the test fails when the
/// sink is dropped, so non-fatal reports let the rest of the test run first.
#[derive(Debug)]
pub struct TestSink {
    name: Option<String>,
    failures: usize,
}

impl TestSink {
    pub fn new() -> Self {
        Self {
            name: thread::current().name().map(str::to_owned),
            failures: 0,
        }
    }

    pub fn failures(&self) -> usize {
        self.failures
    }
}

impl Default for TestSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportSink for TestSink {
    fn report_failure(&mut self, message: &str) {
        self.failures += 1;
        eprintln!("{message}");
    }

    fn abort(&mut self, message: &str) -> ! {
        self.failures += 1;
        panic!("{message}")
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }
}

impl Drop for TestSink {
    fn drop(&mut self) {
        if self.failures > 0 && !thread::panicking() {
            panic!("{} assertion(s) failed", self.failures);
        }
    }
}
