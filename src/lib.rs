//! Verification and failure-reporting engine for HTTP request/response
//! testing harnesses.
//!
//! [`assert`] holds the engine: value comparison, caller location, report
//! composition and the pluggable [`Verifier`]. [`mock`] provides a scriptable
//! verifier, [`suite`] runs YAML check suites and [`cli`] is the `spectest`
//! binary's front end.

pub use crate::assert::{
    DefaultVerifier, MsgArg, NoopVerifier, Operand, RecordingSink, ReportSink, TestSink, Verifier,
};
pub use crate::error::{Result, SpectestError};

pub mod assert;
pub mod cli;
pub mod error;
pub mod mock;
pub mod suite;
