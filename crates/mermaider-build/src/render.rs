//! Render invocation.
//!
//! Wraps a [`DiagramRenderer`] with a uniform contract: render, normalize,
//! optionally fix the width, then write the target. Jobs run in parallel on a
//! bounded rayon pool and results come back in job order.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::ThreadPool;
use rayon::prelude::*;

use crate::svg;

/// External diagram renderer.
///
/// Implementations must be thread-safe (`Send + Sync`) for use with parallel
/// rendering.
pub trait DiagramRenderer: Send + Sync {
    /// Render diagram source text to SVG bytes.
    fn render(&self, source: &str) -> Result<Vec<u8>, RenderError>;
}

/// Failure to produce a target for a single diagram.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The renderer rejected the diagram; carries its diagnostic verbatim.
    #[error("{0}")]
    Diagram(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("invalid SVG: {0}")]
    InvalidSvg(String),
}

/// One diagram to render into one target file.
#[derive(Debug)]
pub(crate) struct RenderJob {
    pub source: String,
    /// Absolute target path.
    pub target: PathBuf,
}

/// Render all jobs on the given pool.
///
/// Returns one result per job, in job order regardless of completion order.
pub(crate) fn render_all(
    pool: &ThreadPool,
    renderer: &dyn DiagramRenderer,
    jobs: &[RenderJob],
    fixed_width: bool,
) -> Vec<Result<(), RenderError>> {
    if jobs.is_empty() {
        return Vec::new();
    }

    pool.install(|| {
        jobs.par_iter()
            .map(|job| render_target(renderer, &job.source, &job.target, fixed_width))
            .collect()
    })
}

/// Render a single diagram and write it to `target`.
///
/// The target is only touched once rendering has succeeded.
pub(crate) fn render_target(
    renderer: &dyn DiagramRenderer,
    source: &str,
    target: &Path,
    fixed_width: bool,
) -> Result<(), RenderError> {
    let data = renderer.render(source)?;
    let text = String::from_utf8(data)
        .map_err(|e| RenderError::InvalidSvg(format!("invalid UTF-8: {e}")))?;
    let svg = svg::normalize(&text)
        .ok_or_else(|| RenderError::InvalidSvg("missing <svg> root element".to_owned()))?;

    let content = if fixed_width {
        svg::fix_width(svg)
    } else {
        svg.to_owned()
    };

    write_target(target, &content)
}

/// Write target content, creating parent directories as needed.
fn write_target(target: &Path, content: &str) -> Result<(), RenderError> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, &e))?;
    }
    fs::write(target, content).map_err(|e| io_error(target, &e))
}

/// Remove an orphaned target.
pub(crate) fn remove_target(target: &Path) -> Result<(), RenderError> {
    fs::remove_file(target).map_err(|e| io_error(target, &e))
}

fn io_error(path: &Path, err: &std::io::Error) -> RenderError {
    RenderError::Io(format!("{}: {err}", path.display()))
}
