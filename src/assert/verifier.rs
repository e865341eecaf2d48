//! The pluggable verifier surface.
//!
//! A harness holds one [`Verifier`] and routes every check through it.
//! [`DefaultVerifier`] performs real comparisons and reports failures;
//! [`NoopVerifier`] accepts everything and never touches the sink.

use std::error::Error;

use tracing::debug;

use super::caller::CallerLocator;
use super::compare::{
    diff, format_unequal_values, objects_are_equal, parse_json, truncating_format,
    validate_equal_args, Operand,
};
use super::message::{message_from_args, LabeledContent, MsgArg};
use super::render::labeled_output;
use super::sink::ReportSink;

/// Assertion capability set. Every method returns `true` on success.
pub trait Verifier {
    fn equal(
        &self,
        t: &mut dyn ReportSink,
        expected: Operand<'_>,
        actual: Operand<'_>,
        msg_and_args: &[MsgArg],
    ) -> bool;

    fn is_true(&self, t: &mut dyn ReportSink, value: bool, msg_and_args: &[MsgArg]) -> bool;

    /// Semantic JSON equality: whitespace and key order are irrelevant.
    fn json_eq(
        &self,
        t: &mut dyn ReportSink,
        expected: &str,
        actual: &str,
        msg_and_args: &[MsgArg],
    ) -> bool;

    fn fail(&self, t: &mut dyn ReportSink, failure_message: &str, msg_and_args: &[MsgArg])
        -> bool;

    fn no_error(
        &self,
        t: &mut dyn ReportSink,
        err: Option<&dyn Error>,
        msg_and_args: &[MsgArg],
    ) -> bool;
}

// ============================================================================
// DEFAULT VERIFIER
// ============================================================================

/// Compares for real and reports failures with an error trace.
#[derive(Debug, Clone, Default)]
pub struct DefaultVerifier {
    locator: CallerLocator,
}

impl DefaultVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locator(locator: CallerLocator) -> Self {
        Self { locator }
    }
}

impl Verifier for DefaultVerifier {
    fn equal(
        &self,
        t: &mut dyn ReportSink,
        expected: Operand<'_>,
        actual: Operand<'_>,
        msg_and_args: &[MsgArg],
    ) -> bool {
        if let Err(err) = validate_equal_args(expected, actual) {
            let message = format!(
                "Invalid operation: {} == {} ({err})",
                truncating_format(expected),
                truncating_format(actual)
            );
            return self.fail(t, &message, msg_and_args);
        }

        if !objects_are_equal(expected, actual) {
            let diff = diff(expected, actual);
            let (expected, actual) = format_unequal_values(expected, actual);
            let message = format!("Not equal: \nexpected: {expected}\nactual  : {actual}{diff}");
            return self.fail(t, &message, msg_and_args);
        }
        true
    }

    fn is_true(&self, t: &mut dyn ReportSink, value: bool, msg_and_args: &[MsgArg]) -> bool {
        if !value {
            return self.fail(t, "Should be true", msg_and_args);
        }
        true
    }

    fn json_eq(
        &self,
        t: &mut dyn ReportSink,
        expected: &str,
        actual: &str,
        msg_and_args: &[MsgArg],
    ) -> bool {
        let expected_json = match parse_json(expected) {
            Ok(value) => value,
            Err(err) => {
                let message = format!(
                    "Expected value ('{expected}') is not valid json.\nJSON parsing error: '{err}'"
                );
                return self.fail(t, &message, msg_and_args);
            }
        };
        let actual_json = match parse_json(actual) {
            Ok(value) => value,
            Err(err) => {
                let message =
                    format!("Input ('{actual}') needs to be valid json.\nJSON parsing error: '{err}'");
                return self.fail(t, &message, msg_and_args);
            }
        };

        self.equal(
            t,
            Operand::of(&expected_json),
            Operand::of(&actual_json),
            msg_and_args,
        )
    }

    fn fail(&self, t: &mut dyn ReportSink, failure_message: &str, msg_and_args: &[MsgArg]) -> bool {
        let mut content = vec![
            LabeledContent::new("Error Trace", self.locator.caller_info().join("\n\t\t\t")),
            LabeledContent::new("Error", failure_message),
        ];
        if let Some(name) = t.name() {
            content.push(LabeledContent::new("Test", name));
        }
        content.extend(message_from_args(msg_and_args));

        debug!(failure = failure_message, "assertion failed");
        t.report_failure(&format!("\n{}", labeled_output(&content)));
        false
    }

    fn no_error(
        &self,
        t: &mut dyn ReportSink,
        err: Option<&dyn Error>,
        msg_and_args: &[MsgArg],
    ) -> bool {
        match err {
            Some(err) => {
                let message = format!("Received unexpected error:\n{}", error_chain(err));
                self.fail(t, &message, msg_and_args)
            }
            None => true,
        }
    }
}

/// Display text of an error followed by its source chain.
fn error_chain(err: &dyn Error) -> String {
    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        detail.push_str("\nCaused by: ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    detail
}

// ============================================================================
// NOOP VERIFIER
// ============================================================================

/// Accepts every check without evaluating it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopVerifier;

impl Verifier for NoopVerifier {
    fn equal(&self, _: &mut dyn ReportSink, _: Operand<'_>, _: Operand<'_>, _: &[MsgArg]) -> bool {
        true
    }

    fn is_true(&self, _: &mut dyn ReportSink, _: bool, _: &[MsgArg]) -> bool {
        true
    }

    fn json_eq(&self, _: &mut dyn ReportSink, _: &str, _: &str, _: &[MsgArg]) -> bool {
        true
    }

    fn fail(&self, _: &mut dyn ReportSink, _: &str, _: &[MsgArg]) -> bool {
        true
    }

    fn no_error(&self, _: &mut dyn ReportSink, _: Option<&dyn Error>, _: &[MsgArg]) -> bool {
        true
    }
}
