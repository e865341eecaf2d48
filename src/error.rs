//! Operational errors of the suite runner and command-line front end.
//!
//! Assertion failures are never errors: they go through a report sink.
//! These cover everything that stops a run before checks can be made.

use std::io;
use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

pub type Result<T, E = SpectestError> = std::result::Result<T, E>;

#[derive(Error, Diagnostic, Debug)]
pub enum SpectestError {
    #[error("failed to read {}", path.display())]
    #[diagnostic(
        code(spectest::io),
        help("check that the path exists and is readable")
    )]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid suite file {}", path.display())]
    #[diagnostic(
        code(spectest::suite::parse),
        help("a suite is a YAML list of cases, each with `name` and `kind` (json, text or status)")
    )]
    SuiteParse {
        path: PathBuf,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: Option<SourceSpan>,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid HTTP status code {code}")]
    #[diagnostic(
        code(spectest::status),
        help("status codes are numbers from 100 to 999")
    )]
    InvalidStatus {
        code: u16,
        #[source]
        source: http::status::InvalidStatusCode,
    },
}

impl SpectestError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SpectestError::Io {
            path: path.into(),
            source,
        }
    }

    /// Wraps a YAML error, pointing the diagnostic at the offending location.
    pub fn suite_parse(path: impl Into<PathBuf>, content: &str, source: serde_yaml::Error) -> Self {
        let path = path.into();
        let span = source
            .location()
            .map(|location| SourceSpan::from((location.index(), 0)));
        SpectestError::SuiteParse {
            src: NamedSource::new(path.display().to_string(), content.to_owned()),
            path,
            span,
            source,
        }
    }
}
