//! Build orchestration.
//!
//! A build walks the input tree, extracts diagram blocks from every document,
//! asks the overwrite policy what to do with each target and renders the
//! selected ones on a worker pool. Planning is sequential; only rendering runs
//! in parallel. Failures are recorded per target and never stop the run.

use std::collections::HashSet;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use glob::Pattern;

use crate::consts::TARGET_EXTENSION;
use crate::error::BuildError;
use crate::fence;
use crate::policy::{self, Decision, Mode};
use crate::render::{self, DiagramRenderer, RenderJob};
use crate::report::{BlockLocation, BuildOutcome, BuildReport, OutcomeStatus};
use crate::scanner::{FileRef, Scanner};

/// Convert Duration to milliseconds as f64.
fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Configuration for [`Builder`].
#[derive(Clone, Debug, Default)]
pub struct BuildConfig {
    /// Root directory containing source documents.
    pub input_dir: Option<PathBuf>,
    /// Root directory receiving rendered targets. Must already exist.
    pub output_dir: Option<PathBuf>,
    /// Overwrite and pruning policy.
    pub mode: Mode,
    /// Write targets with an absolute width and an XML declaration.
    pub fixed_width: bool,
    /// Render worker count (`None` uses available parallelism).
    pub jobs: Option<NonZeroUsize>,
    /// Input paths to ignore, relative to `input_dir`.
    pub exclude: Vec<Pattern>,
}

/// Renders the diagrams of an input tree into a mirrored output tree.
pub struct Builder {
    config: BuildConfig,
    renderer: Arc<dyn DiagramRenderer>,
}

/// Work collected while walking the input tree.
#[derive(Default)]
struct Plan {
    outcomes: Vec<BuildOutcome>,
    jobs: Vec<RenderJob>,
    /// Outcome slot of each job, parallel to `jobs`.
    slots: Vec<usize>,
    /// Relative targets claimed by discovered blocks.
    targets: HashSet<PathBuf>,
    /// Documents that could not be read; their targets are unknown.
    unreadable: usize,
}

impl Builder {
    /// Create a builder rendering through `renderer`.
    #[must_use]
    pub fn new(config: BuildConfig, renderer: Arc<dyn DiagramRenderer>) -> Self {
        Self { config, renderer }
    }

    /// Run the build.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory argument is missing or invalid, or if
    /// the render workers cannot be started. Per-diagram failures are reported
    /// in the returned [`BuildReport`] instead.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let start = Instant::now();
        let (input_dir, output_dir) = self.check_directories()?;

        let mut plan = Plan::default();
        let documents = Scanner::new(input_dir)
            .exclude(&self.config.exclude)
            .skip_dir(output_dir)
            .scan();
        for document in &documents {
            self.plan_document(document, output_dir, &mut plan);
        }

        if !plan.jobs.is_empty() {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.jobs.map_or(0, NonZeroUsize::get))
                .build()?;
            let results = render::render_all(
                &pool,
                self.renderer.as_ref(),
                &plan.jobs,
                self.config.fixed_width,
            );
            for (slot, result) in plan.slots.iter().zip(results) {
                if let Err(e) = result {
                    plan.outcomes[*slot].status = OutcomeStatus::Failed(e.to_string());
                }
            }
        }

        if self.config.mode.prunes_orphans() {
            if plan.unreadable == 0 {
                self.prune_orphans(input_dir, output_dir, &mut plan);
            } else {
                tracing::warn!(
                    unreadable = plan.unreadable,
                    "Skipping orphan pruning: some documents could not be read"
                );
            }
        }

        let report = BuildReport::new(
            input_dir.to_path_buf(),
            output_dir.to_path_buf(),
            plan.outcomes,
        );
        let summary = report.summary();
        tracing::info!(
            documents = documents.len(),
            rendered = summary.rendered,
            skipped = summary.skipped,
            deleted = summary.deleted,
            failed = summary.failed,
            elapsed_ms = elapsed_ms(start),
            "Build finished"
        );

        Ok(report)
    }

    /// Check directory arguments in order: input given, output given, input
    /// valid, output valid.
    fn check_directories(&self) -> Result<(&Path, &Path), BuildError> {
        let input_dir = self
            .config
            .input_dir
            .as_deref()
            .ok_or(BuildError::MissingArgument("input directory"))?;
        let output_dir = self
            .config
            .output_dir
            .as_deref()
            .ok_or(BuildError::MissingArgument("output directory"))?;

        if !input_dir.is_dir() {
            return Err(BuildError::InputDirectory(input_dir.to_path_buf()));
        }
        if !output_dir.is_dir() {
            return Err(BuildError::OutputDirectory(output_dir.to_path_buf()));
        }

        Ok((input_dir, output_dir))
    }

    fn plan_document(&self, document: &FileRef, output_dir: &Path, plan: &mut Plan) {
        let stem = document
            .relative
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = document.relative.parent().unwrap_or(Path::new(""));

        // Invalid UTF-8 in prose must not hide the diagrams around it
        let bytes = match fs::read(&document.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(
                    path = %document.path.display(),
                    error = %e,
                    "Failed to read document"
                );
                plan.unreadable += 1;
                plan.outcomes.push(BuildOutcome {
                    source: Some(BlockLocation {
                        document: document.relative.clone(),
                        line: None,
                    }),
                    target: dir.join(format!("{stem}.{TARGET_EXTENSION}")),
                    status: OutcomeStatus::Failed(format!("failed to read document: {e}")),
                });
                return;
            }
        };
        let text = String::from_utf8_lossy(&bytes);
        let source_mtime = policy::source_mtime(modified(&document.path));

        for block in fence::extract(&text) {
            let target = dir.join(block.target_name(&stem));
            let location = BlockLocation {
                document: document.relative.clone(),
                line: Some(block.line),
            };

            if !plan.targets.insert(target.clone()) {
                let message = format!("duplicate target {}", target.display());
                plan.outcomes.push(BuildOutcome {
                    source: Some(location),
                    target,
                    status: OutcomeStatus::Failed(message),
                });
                continue;
            }

            let target_path = output_dir.join(&target);
            let decision = policy::decide(
                self.config.mode,
                Some(source_mtime),
                modified(&target_path),
            );
            tracing::debug!(
                document = %document.relative.display(),
                line = block.line,
                target = %target.display(),
                ?decision,
                "Planned diagram"
            );

            let status = match decision {
                Decision::Render => {
                    plan.slots.push(plan.outcomes.len());
                    plan.jobs.push(RenderJob {
                        source: block.source,
                        target: target_path,
                    });
                    // Settled once the job has run
                    OutcomeStatus::Rendered
                }
                Decision::Skip => OutcomeStatus::Skipped,
                Decision::Delete => remove(&target_path),
            };
            plan.outcomes.push(BuildOutcome {
                source: Some(location),
                target,
                status,
            });
        }
    }

    /// Offer every unclaimed target under the output root to the policy.
    ///
    /// Hidden files are offered too. When the input and output roots are the
    /// same directory, hand-made SVGs next to the documents are orphans as well.
    fn prune_orphans(&self, input_dir: &Path, output_dir: &Path, plan: &mut Plan) {
        let existing = Scanner::new(output_dir)
            .extension(TARGET_EXTENSION)
            .skip_dir(input_dir)
            .hidden_files(true)
            .scan();

        for file in existing {
            if plan.targets.contains(&file.relative) {
                continue;
            }

            let decision = policy::decide(self.config.mode, None, modified(&file.path));
            tracing::debug!(target = %file.relative.display(), ?decision, "Orphaned target");

            let status = match decision {
                Decision::Delete => remove(&file.path),
                Decision::Render | Decision::Skip => continue,
            };
            plan.outcomes.push(BuildOutcome {
                source: None,
                target: file.relative,
                status,
            });
        }
    }
}

fn remove(target: &Path) -> OutcomeStatus {
    match render::remove_target(target) {
        Ok(()) => OutcomeStatus::Deleted,
        Err(e) => OutcomeStatus::Failed(e.to_string()),
    }
}

/// Modification time of an existing file.
///
/// `None` when the file does not exist. A file whose mtime cannot be read is
/// treated as modified at the epoch.
fn modified(path: &Path) -> Option<SystemTime> {
    let metadata = fs::metadata(path).ok()?;
    Some(metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH))
}
