//! Terminal output.
//!
//! Report lines go out unstyled so they can be piped and compared verbatim;
//! only fatal errors are colored.

use std::io;

use console::{Style, Term};
use mermaider_build::BuildReport;

/// Terminal output writer.
pub(crate) struct Output {
    out: Term,
    err: Term,
    red: Style,
}

impl Output {
    /// Create a new output writer.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            red: Style::new().for_stderr().red(),
        }
    }

    /// Write a build report: rendered targets (when verbose) to stdout,
    /// failures to stderr.
    pub(crate) fn report(&self, report: &BuildReport, verbose: bool) -> io::Result<()> {
        report.write_to(verbose, &mut &self.out, &mut &self.err)
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.err.write_line(&self.red.apply_to(msg).to_string());
    }
}
