//! Build outcomes and their textual report.

use std::io::{self, Write};
use std::path::PathBuf;

/// Where a diagram block lives in the input tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLocation {
    /// Document path relative to the input root.
    pub document: PathBuf,
    /// One-based line of the opening fence; `None` when the document itself
    /// could not be read.
    pub line: Option<usize>,
}

/// Result of processing one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Rendered,
    Skipped,
    Deleted,
    /// Carries the diagnostic reported for the target.
    Failed(String),
}

/// Outcome for a single diagram block or pruned orphan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    /// Originating block; `None` for orphaned targets.
    pub source: Option<BlockLocation>,
    /// Target path relative to the output root.
    pub target: PathBuf,
    pub status: OutcomeStatus,
}

/// Outcome counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub rendered: usize,
    pub skipped: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Ordered outcomes of a build run.
#[derive(Debug, Clone)]
pub struct BuildReport {
    input_dir: PathBuf,
    output_dir: PathBuf,
    outcomes: Vec<BuildOutcome>,
}

impl BuildReport {
    pub(crate) fn new(
        input_dir: PathBuf,
        output_dir: PathBuf,
        outcomes: Vec<BuildOutcome>,
    ) -> Self {
        Self {
            input_dir,
            output_dir,
            outcomes,
        }
    }

    /// Outcomes in discovery order, orphans last.
    #[must_use]
    pub fn outcomes(&self) -> &[BuildOutcome] {
        &self.outcomes
    }

    /// Whether no outcome failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self
            .outcomes
            .iter()
            .any(|o| matches!(o.status, OutcomeStatus::Failed(_)))
    }

    /// Process exit status for this report.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.is_success())
    }

    #[must_use]
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for outcome in &self.outcomes {
            match outcome.status {
                OutcomeStatus::Rendered => summary.rendered += 1,
                OutcomeStatus::Skipped => summary.skipped += 1,
                OutcomeStatus::Deleted => summary.deleted += 1,
                OutcomeStatus::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }

    /// Write the report.
    ///
    /// With `verbose`, every rendered target is listed on `out` as
    /// `<target> OK`. Every failure is written to `err` as
    /// `<document>:<line>: <message>`, `<document>: <message>` for unreadable
    /// documents, or `<target>: <message>` for orphans.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to either stream fails.
    pub fn write_to(
        &self,
        verbose: bool,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> io::Result<()> {
        for outcome in &self.outcomes {
            match &outcome.status {
                OutcomeStatus::Rendered if verbose => {
                    writeln!(out, "{} OK", self.target_path(outcome).display())?;
                }
                OutcomeStatus::Failed(message) => {
                    let message = flatten(message);
                    match &outcome.source {
                        Some(location) => {
                            let document = self.input_dir.join(&location.document);
                            match location.line {
                                Some(line) => {
                                    writeln!(err, "{}:{line}: {message}", document.display())?;
                                }
                                None => writeln!(err, "{}: {message}", document.display())?,
                            }
                        }
                        None => {
                            writeln!(err, "{}: {message}", self.target_path(outcome).display())?;
                        }
                    }
                }
                _ => {}
            }
        }
        out.flush()?;
        err.flush()
    }

    fn target_path(&self, outcome: &BuildOutcome) -> PathBuf {
        self.output_dir.join(&outcome.target)
    }
}

/// Join the trimmed, non-empty lines of a diagnostic with single spaces.
fn flatten(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
