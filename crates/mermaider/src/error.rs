//! CLI error types.

use mermaider_build::BuildError;
use mermaider_config::ConfigError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Build(#[from] BuildError),

    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}
