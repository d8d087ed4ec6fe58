//! Run-level error types.
//!
//! Only precondition failures abort a build. Everything that goes wrong for a
//! single diagram is recorded as a [`Failed`](crate::OutcomeStatus::Failed)
//! outcome instead.

use std::path::PathBuf;

/// Error that prevents a build from starting.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A required argument (input or output directory) was not provided.
    #[error("missingArgumentError: {0} is required")]
    MissingArgument(&'static str),

    /// Input root does not exist or is not a directory.
    #[error("inputDirectoryError: {} is not a directory", .0.display())]
    InputDirectory(PathBuf),

    /// Output root does not exist or is not a directory.
    #[error("outputDirectoryError: {} is not a directory", .0.display())]
    OutputDirectory(PathBuf),

    /// Render worker pool could not be created.
    #[error("failed to start render workers: {0}")]
    Workers(#[from] rayon::ThreadPoolBuildError),
}

impl BuildError {
    /// Stable identifier of the error kind, as printed on the error channel.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingArgument(_) => "missingArgumentError",
            Self::InputDirectory(_) => "inputDirectoryError",
            Self::OutputDirectory(_) => "outputDirectoryError",
            Self::Workers(_) => "workerError",
        }
    }
}
