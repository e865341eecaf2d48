//! Verification and failure reporting.
//!
//! Checks run through a [`Verifier`]. A failed check is rendered into a
//! tab-aligned report (error trace, error text, test name and any extra
//! context) and handed to a [`ReportSink`], which decides whether the test
//! keeps running.
//!
//! ```
//! use spectest::assert::{DefaultVerifier, MsgArg, Operand, RecordingSink, Verifier};
//!
//! let verifier = DefaultVerifier::new();
//! let mut sink = RecordingSink::named("get_user");
//! verifier.equal(&mut sink, Operand::of(&200), Operand::of(&404), &[MsgArg::text("status")]);
//! assert!(sink.failures()[0].contains("Not equal"));
//! ```

pub mod caller;
pub mod compare;
pub mod message;
pub mod outcome;
pub mod render;
pub mod sink;
pub mod verifier;

pub use caller::{BacktraceWalker, CallerLocator, Frame, LocatorConfig, StackWalker};
pub use compare::{Comparable, InvalidOperation, Operand, MAX_RENDER_LEN};
pub use message::{LabeledContent, MsgArg};
pub use outcome::{apply_asserts, is_client_error, is_server_error, is_success, Assert, Outcome, OutcomeError};
pub use sink::{RecordingSink, ReportSink, TestSink};
pub use verifier::{DefaultVerifier, NoopVerifier, Verifier};
