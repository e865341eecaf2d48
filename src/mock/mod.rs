//! A scriptable [`Verifier`] for testing code that drives a verifier.
//!
//! [`MockVerifier`] records every call it receives. Each method can be
//! overridden with a closure; methods left alone accept the check.

use std::error::Error;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use crate::assert::{MsgArg, Operand, ReportSink, Verifier};


/// One recorded verifier call. Operands are kept in their `Debug` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Equal {
        expected: String,
        actual: String,
        msg_and_args: Vec<MsgArg>,
    },
    IsTrue {
        value: bool,
        msg_and_args: Vec<MsgArg>,
    },
    JsonEq {
        expected: String,
        actual: String,
        msg_and_args: Vec<MsgArg>,
    },
    Fail {
        failure_message: String,
        msg_and_args: Vec<MsgArg>,
    },
    NoError {
        error: Option<String>,
        msg_and_args: Vec<MsgArg>,
    },
}

type EqualFn = dyn Fn(&mut dyn ReportSink, Operand<'_>, Operand<'_>, &[MsgArg]) -> bool + Send + Sync;
type IsTrueFn = dyn Fn(&mut dyn ReportSink, bool, &[MsgArg]) -> bool + Send + Sync;
type JsonEqFn = dyn Fn(&mut dyn ReportSink, &str, &str, &[MsgArg]) -> bool + Send + Sync;
type FailFn = dyn Fn(&mut dyn ReportSink, &str, &[MsgArg]) -> bool + Send + Sync;
type NoErrorFn = dyn Fn(&mut dyn ReportSink, Option<&dyn Error>, &[MsgArg]) -> bool + Send + Sync;

#[derive(Default)]
pub struct MockVerifier {
    calls: Mutex<Vec<Call>>,
    equal: Option<Box<EqualFn>>,
    is_true: Option<Box<IsTrueFn>>,
    json_eq: Option<Box<JsonEqFn>>,
    fail: Option<Box<FailFn>>,
    no_error: Option<Box<NoErrorFn>>,
}

impl MockVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_equal(
        mut self,
        f: impl Fn(&mut dyn ReportSink, Operand<'_>, Operand<'_>, &[MsgArg]) -> bool
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.equal = Some(Box::new(f));
        self
    }

    pub fn on_is_true(
        mut self,
        f: impl Fn(&mut dyn ReportSink, bool, &[MsgArg]) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.is_true = Some(Box::new(f));
        self
    }

    pub fn on_json_eq(
        mut self,
        f: impl Fn(&mut dyn ReportSink, &str, &str, &[MsgArg]) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.json_eq = Some(Box::new(f));
        self
    }

    pub fn on_fail(
        mut self,
        f: impl Fn(&mut dyn ReportSink, &str, &[MsgArg]) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.fail = Some(Box::new(f));
        self
    }

    pub fn on_no_error(
        mut self,
        f: impl Fn(&mut dyn ReportSink, Option<&dyn Error>, &[MsgArg]) -> bool
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.no_error = Some(Box::new(f));
        self
    }

    /// Every call received so far, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: Call) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl Verifier for MockVerifier {
    fn equal(
        &self,
        t: &mut dyn ReportSink,
        expected: Operand<'_>,
        actual: Operand<'_>,
        msg_and_args: &[MsgArg],
    ) -> bool {
        self.record(Call::Equal {
            expected: format!("{expected:?}"),
            actual: format!("{actual:?}"),
            msg_and_args: msg_and_args.to_vec(),
        });
        self.equal
            .as_ref()
            .map_or(true, |f| f(t, expected, actual, msg_and_args))
    }

    fn is_true(&self, t: &mut dyn ReportSink, value: bool, msg_and_args: &[MsgArg]) -> bool {
        self.record(Call::IsTrue {
            value,
            msg_and_args: msg_and_args.to_vec(),
        });
        self.is_true
            .as_ref()
            .map_or(true, |f| f(t, value, msg_and_args))
    }

    fn json_eq(
        &self,
        t: &mut dyn ReportSink,
        expected: &str,
        actual: &str,
        msg_and_args: &[MsgArg],
    ) -> bool {
        self.record(Call::JsonEq {
            expected: expected.to_owned(),
            actual: actual.to_owned(),
            msg_and_args: msg_and_args.to_vec(),
        });
        self.json_eq
            .as_ref()
            .map_or(true, |f| f(t, expected, actual, msg_and_args))
    }

    fn fail(&self, t: &mut dyn ReportSink, failure_message: &str, msg_and_args: &[MsgArg]) -> bool {
        self.record(Call::Fail {
            failure_message: failure_message.to_owned(),
            msg_and_args: msg_and_args.to_vec(),
        });
        self.fail
            .as_ref()
            .map_or(true, |f| f(t, failure_message, msg_and_args))
    }

    fn no_error(
        &self,
        t: &mut dyn ReportSink,
        err: Option<&dyn Error>,
        msg_and_args: &[MsgArg],
    ) -> bool {
        self.record(Call::NoError {
            error: err.map(|e| e.to_string()),
            msg_and_args: msg_and_args.to_vec(),
        });
        self.no_error
            .as_ref()
            .map_or(true, |f| f(t, err, msg_and_args))
    }
}

impl fmt::Debug for MockVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockVerifier")
            .field("calls", &self.calls())
            .field("equal", &self.equal.is_some())
            .field("is_true", &self.is_true.is_some())
            .field("json_eq", &self.json_eq.is_some())
            .field("fail", &self.fail.is_some())
            .field("no_error", &self.no_error.is_some())
            .finish()
    }
}
