//! The build command.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use mermaider_build::{BuildConfig, Builder, KrokiRenderer, Mode};
use mermaider_config::{CliSettings, Config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for a build run.
#[derive(Args, Debug)]
pub(crate) struct BuildArgs {
    /// Directory containing Markdown sources (overrides config).
    input_dir: Option<PathBuf>,

    /// Existing directory receiving the SVG files (overrides config).
    output_dir: Option<PathBuf>,

    /// Re-render every diagram, overwriting existing files.
    #[arg(short, long)]
    all: bool,

    /// Re-render diagrams whose document is newer than the SVG file.
    #[arg(short, long)]
    update: bool,

    /// Delete SVG files that no longer have a diagram.
    #[arg(short, long)]
    delete: bool,

    /// Write standalone images with a fixed width and an XML declaration.
    #[arg(short = 'i', long = "img")]
    fixed_width: bool,

    /// List every rendered file.
    #[arg(short, long)]
    verbose: bool,

    /// Path to configuration file (default: auto-discover mermaider.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Kroki server URL for diagram rendering (overrides config).
    #[arg(long, env = "KROKI_URL")]
    kroki_url: Option<String>,

    /// Number of diagrams rendered in parallel (overrides config).
    #[arg(short, long)]
    jobs: Option<usize>,
}

impl BuildArgs {
    /// Build mode selected by the flags.
    pub(crate) fn mode(&self) -> Mode {
        Mode::from_flags(self.all, self.update, self.delete)
    }

    /// Run the build and write its report.
    ///
    /// Returns whether every diagram succeeded.
    pub(crate) fn execute(self, output: &Output) -> Result<bool, CliError> {
        let cli_settings = CliSettings {
            input_dir: self.input_dir.clone(),
            output_dir: self.output_dir.clone(),
            kroki_url: self.kroki_url.clone(),
            jobs: self.jobs,
        };
        let Config {
            kroki,
            build_resolved: build,
            config_path,
            ..
        } = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        tracing::debug!(
            config = ?config_path,
            kroki_url = %kroki.url,
            mode = ?self.mode(),
            "Loaded configuration"
        );

        let renderer = KrokiRenderer::new(kroki.url.clone()).timeout(kroki.timeout());
        let build_config = BuildConfig {
            input_dir: build.input_dir,
            output_dir: build.output_dir,
            mode: self.mode(),
            fixed_width: self.fixed_width,
            jobs: build.jobs.and_then(NonZeroUsize::new),
            exclude: build.exclude,
        };

        let report = Builder::new(build_config, Arc::new(renderer)).build()?;
        output.report(&report, self.verbose)?;

        Ok(report.is_success())
    }
}
