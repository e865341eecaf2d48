//! Response outcome predicates over status-code ranges.
//!
//! Predicates have the [`Assert`] shape so a harness can hold them in a list
//! next to user-written checks and run them with [`apply_asserts`].

use http::{Request, Response};
use serde::Deserialize;
use thiserror::Error;

use super::message::MsgArg;
use super::sink::ReportSink;
use super::verifier::Verifier;

/// A check run against a response and the request that produced it.
pub type Assert<B = Vec<u8>> = fn(&Response<B>, &Request<B>) -> Result<(), OutcomeError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutcomeError {
    #[error("not success. Status code={0}")]
    NotSuccess(u16),
    #[error("not a client error. Status code={0}")]
    NotClientError(u16),
    #[error("not a server error. Status code={0}")]
    NotServerError(u16),
}

/// Passes for status codes in `[200, 400)`.
pub fn is_success<B, R>(response: &Response<B>, _request: &Request<R>) -> Result<(), OutcomeError> {
    let code = response.status().as_u16();
    if (200..400).contains(&code) {
        Ok(())
    } else {
        Err(OutcomeError::NotSuccess(code))
    }
}

/// Passes for status codes in `[400, 500)`.
pub fn is_client_error<B, R>(
    response: &Response<B>,
    _request: &Request<R>,
) -> Result<(), OutcomeError> {
    let code = response.status().as_u16();
    if (400..500).contains(&code) {
        Ok(())
    } else {
        Err(OutcomeError::NotClientError(code))
    }
}

/// Passes for status codes of 500 and above.
pub fn is_server_error<B, R>(
    response: &Response<B>,
    _request: &Request<R>,
) -> Result<(), OutcomeError> {
    let code = response.status().as_u16();
    if code >= 500 {
        Ok(())
    } else {
        Err(OutcomeError::NotServerError(code))
    }
}

/// Named outcome classes, as written in suite files and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    ClientError,
    ServerError,
}

impl Outcome {
    pub fn predicate<B>(self) -> Assert<B> {
        match self {
            Outcome::Success => is_success::<B, B>,
            Outcome::ClientError => is_client_error::<B, B>,
            Outcome::ServerError => is_server_error::<B, B>,
        }
    }
}

/// Runs every check and reports each error through `no_error`, tagged with
/// `name`. Returns whether all checks passed.
pub fn apply_asserts<B>(
    verifier: &dyn Verifier,
    t: &mut dyn ReportSink,
    response: &Response<B>,
    request: &Request<B>,
    asserts: &[Assert<B>],
    name: &str,
) -> bool {
    let mut passed = true;
    for check in asserts {
        let err = check(response, request).err();
        let ok = verifier.no_error(
            t,
            err.as_ref().map(|e| e as &dyn std::error::Error),
            &[MsgArg::name(name)],
        );
        passed &= ok;
    }
    passed
}
