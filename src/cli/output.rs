//! Console output for the CLI.
//!
//! Failure reports go to stderr behind a colored `FAIL` label; the label is
//! plain when stderr is not a terminal.

use std::io::{self, Write};
use std::process;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use tracing::warn;

use crate::assert::ReportSink;

/// Prints failure reports as they arrive, to stderr unless another writer
/// is supplied.
pub struct ConsoleSink<W = StandardStream> {
    name: String,
    failures: usize,
    out: W,
}

impl ConsoleSink {
    pub fn new(name: impl Into<String>, use_colors: bool) -> Self {
        let choice = if use_colors {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        Self::with_writer(name, StandardStream::stderr(choice))
    }
}

impl<W: WriteColor> ConsoleSink<W> {
    pub fn with_writer(name: impl Into<String>, out: W) -> Self {
        Self {
            name: name.into(),
            failures: 0,
            out,
        }
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn print(&mut self, message: &str) -> io::Result<()> {
        self.out
            .set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
        write!(self.out, "FAIL")?;
        self.out.reset()?;
        writeln!(self.out, ": {}{message}", self.name)?;
        self.out.flush()
    }
}

impl<W: WriteColor> ReportSink for ConsoleSink<W> {
    fn report_failure(&mut self, message: &str) {
        self.failures += 1;
        if let Err(err) = self.print(message) {
            warn!(error = %err, sink = %self.name, report = message, "failed to write failure report");
        }
    }

    fn abort(&mut self, message: &str) -> ! {
        self.report_failure(message);
        process::exit(1)
    }

    fn name(&self) -> Option<String> {
        Some(self.name.clone())
    }
}
