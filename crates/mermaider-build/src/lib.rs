//! Mermaid diagram build pipeline.
//!
//! This crate turns fenced `mermaid` blocks found in a tree of text documents
//! into standalone SVG files, mirroring the input tree under an output root:
//! - Fence extraction with `CommonMark` fence rules and explicit `name=` targets
//! - A pure overwrite policy for default, `--all`, `--update` and `--delete` runs
//! - Parallel rendering through a [`DiagramRenderer`] (Kroki by default)
//! - Per-target outcomes that never abort the batch, plus a textual report
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mermaider_build::{BuildConfig, Builder, KrokiRenderer, Mode};
//!
//! let config = BuildConfig {
//!     input_dir: Some("docs".into()),
//!     output_dir: Some("diagrams".into()),
//!     mode: Mode::Update,
//!     ..BuildConfig::default()
//! };
//! let builder = Builder::new(config, Arc::new(KrokiRenderer::new("https://kroki.io")));
//!
//! let report = builder.build()?;
//! report.write_to(true, &mut std::io::stdout(), &mut std::io::stderr())?;
//! std::process::exit(report.exit_code());
//! ```

mod builder;
mod consts;
mod error;
mod fence;
mod kroki;
mod policy;
mod render;
mod report;
mod scanner;
mod svg;

pub use builder::{BuildConfig, Builder};
pub use error::BuildError;
pub use fence::{DiagramBlock, DiagramBlocks, extract};
pub use kroki::KrokiRenderer;
pub use policy::{Decision, Mode, Overwrite, decide};
pub use render::{DiagramRenderer, RenderError};
pub use report::{BlockLocation, BuildOutcome, BuildReport, OutcomeStatus, Summary};
