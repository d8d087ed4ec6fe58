//! Document discovery by filesystem walking.
//!
//! The scanner only identifies files; nothing is read at this stage. Results
//! are ordered by relative path (component-wise, as `Path` orders them), which
//! is what makes build reports reproducible across platforms and filesystems.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;

/// Reference to a file found under a scanned root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    /// Path relative to the scanned root (e.g., "guide/setup.md").
    pub relative: PathBuf,
    /// Full path (root joined with `relative`).
    pub path: PathBuf,
}

/// Recursive, ordered directory walker.
///
/// Hidden entries (leading `.`) are skipped. Hidden directories are never
/// descended into, even when hidden files are reported.
#[derive(Debug)]
pub struct Scanner {
    root: PathBuf,
    extension: Option<String>,
    exclude: Vec<Pattern>,
    skip_dir: Option<PathBuf>,
    hidden_files: bool,
}

impl Scanner {
    /// Create a scanner for the given root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: None,
            exclude: Vec::new(),
            skip_dir: None,
            hidden_files: false,
        }
    }

    /// Only report files with this extension.
    #[must_use]
    pub fn extension(mut self, extension: &str) -> Self {
        self.extension = Some(extension.to_owned());
        self
    }

    /// Skip entries whose relative path matches any of the patterns.
    #[must_use]
    pub fn exclude(mut self, patterns: &[Pattern]) -> Self {
        self.exclude = patterns.to_vec();
        self
    }

    /// Do not descend into `dir` (e.g., an output tree nested in the input tree).
    #[must_use]
    pub fn skip_dir(mut self, dir: &Path) -> Self {
        self.skip_dir = fs::canonicalize(dir).ok();
        self
    }

    /// Also report hidden files.
    #[must_use]
    pub fn hidden_files(mut self, include: bool) -> Self {
        self.hidden_files = include;
        self
    }

    /// Scan the filesystem and return file references in path order.
    ///
    /// Returns an empty Vec if the root directory doesn't exist.
    pub fn scan(&self) -> Vec<FileRef> {
        let mut refs = Vec::new();
        if self.root.is_dir() {
            self.scan_directory(&self.root, Path::new(""), &mut refs);
        }
        refs
    }

    /// Scan a directory, recursing into subdirectories in name order.
    fn scan_directory(&self, dir_path: &Path, relative: &Path, refs: &mut Vec<FileRef>) {
        let entries = match fs::read_dir(dir_path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %dir_path.display(), error = %e, "Failed to read directory");
                return;
            }
        };

        // Collect entries with cached file_type to avoid repeated stat calls
        let mut entries: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|e| {
                let is_dir = e.file_type().is_ok_and(|t| t.is_dir());
                (e.file_name(), e.path(), is_dir)
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        for (name, path, is_dir) in entries {
            if name.to_string_lossy().starts_with('.') && (is_dir || !self.hidden_files) {
                continue;
            }

            let child = relative.join(&name);
            if self.is_excluded(&child) {
                continue;
            }

            if is_dir {
                if self.is_skipped_dir(&path) {
                    continue;
                }
                self.scan_directory(&path, &child, refs);
            } else if self.has_wanted_extension(&path) {
                refs.push(FileRef {
                    relative: child,
                    path,
                });
            }
        }
    }

    fn is_excluded(&self, relative: &Path) -> bool {
        self.exclude.iter().any(|p| p.matches_path(relative))
    }

    fn is_skipped_dir(&self, path: &Path) -> bool {
        self.skip_dir
            .as_deref()
            .is_some_and(|skip| fs::canonicalize(path).is_ok_and(|p| p == skip))
    }

    fn has_wanted_extension(&self, path: &Path) -> bool {
        self.extension
            .as_deref()
            .is_none_or(|wanted| path.extension().is_some_and(|e| e == wanted))
    }
}
