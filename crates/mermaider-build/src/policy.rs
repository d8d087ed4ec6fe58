//! Overwrite policy for rendered targets.
//!
//! [`decide`] is a pure function of the build [`Mode`] and the modification
//! times of a diagram's source document and its target. `None` means the file
//! does not exist.

use std::time::SystemTime;

/// How existing targets with a matching source are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overwrite {
    /// Never replace an existing target.
    #[default]
    Never,
    /// Always re-render.
    Always,
    /// Re-render when the source is newer than the target.
    IfNewer,
}

/// Build mode selected by the command line flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Render missing targets only.
    #[default]
    Default,
    /// Re-render every target (`--all`).
    All,
    /// Re-render stale targets (`--update`).
    Update,
    /// Prune orphaned targets (`--delete`), overwriting per the inner policy.
    Delete(Overwrite),
}

impl Mode {
    /// Resolve mode flags with precedence delete > all > update > default.
    #[must_use]
    pub fn from_flags(all: bool, update: bool, delete: bool) -> Self {
        let overwrite = if all {
            Overwrite::Always
        } else if update {
            Overwrite::IfNewer
        } else {
            Overwrite::Never
        };

        match (delete, overwrite) {
            (true, overwrite) => Self::Delete(overwrite),
            (false, Overwrite::Always) => Self::All,
            (false, Overwrite::IfNewer) => Self::Update,
            (false, Overwrite::Never) => Self::Default,
        }
    }

    /// Overwrite policy for targets that still have a source.
    #[must_use]
    pub fn overwrite(self) -> Overwrite {
        match self {
            Self::Default => Overwrite::Never,
            Self::All => Overwrite::Always,
            Self::Update => Overwrite::IfNewer,
            Self::Delete(overwrite) => overwrite,
        }
    }

    /// Whether targets without a source are removed.
    #[must_use]
    pub fn prunes_orphans(self) -> bool {
        matches!(self, Self::Delete(_))
    }
}

/// What to do with a single target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Render the diagram into the target.
    Render,
    /// Leave the target as it is.
    Skip,
    /// Remove the orphaned target.
    Delete,
}

/// Decide how to treat a target.
///
/// `source` is `Some(mtime)` when a diagram block maps to the target; `target`
/// is `Some(mtime)` when the target file exists. Sources without a readable
/// mtime go through [`source_mtime`] first.
#[must_use]
pub fn decide(mode: Mode, source: Option<SystemTime>, target: Option<SystemTime>) -> Decision {
    match (source, target) {
        (Some(_), None) => Decision::Render,
        (None, None) => Decision::Skip,
        (None, Some(_)) if mode.prunes_orphans() => Decision::Delete,
        (None, Some(_)) => Decision::Skip,
        (Some(source), Some(target)) => match mode.overwrite() {
            Overwrite::Never => Decision::Skip,
            Overwrite::Always => Decision::Render,
            Overwrite::IfNewer if source > target => Decision::Render,
            Overwrite::IfNewer => Decision::Skip,
        },
    }
}

/// Modification time used for a source whose mtime cannot be read.
///
/// Treated as newer than any target so `--update` errs on re-rendering.
#[must_use]
pub fn source_mtime(mtime: Option<SystemTime>) -> SystemTime {
    mtime.unwrap_or_else(SystemTime::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(secs: u64) -> Option<SystemTime> {
        Some(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
    }

    const ALL_MODES: [Mode; 6] = [
        Mode::Default,
        Mode::All,
        Mode::Update,
        Mode::Delete(Overwrite::Never),
        Mode::Delete(Overwrite::Always),
        Mode::Delete(Overwrite::IfNewer),
    ];

    #[test]
    fn test_from_flags_precedence() {
        assert_eq!(Mode::from_flags(false, false, false), Mode::Default);
        assert_eq!(Mode::from_flags(true, false, false), Mode::All);
        assert_eq!(Mode::from_flags(false, true, false), Mode::Update);
        assert_eq!(Mode::from_flags(true, true, false), Mode::All);
        assert_eq!(
            Mode::from_flags(false, false, true),
            Mode::Delete(Overwrite::Never)
        );
        assert_eq!(
            Mode::from_flags(true, true, true),
            Mode::Delete(Overwrite::Always)
        );
        assert_eq!(
            Mode::from_flags(false, true, true),
            Mode::Delete(Overwrite::IfNewer)
        );
    }

    #[test]
    fn test_missing_target_always_renders() {
        for mode in ALL_MODES {
            assert_eq!(decide(mode, at(10), None), Decision::Render, "{mode:?}");
        }
    }

    #[test]
    fn test_nothing_exists_skips() {
        for mode in ALL_MODES {
            assert_eq!(decide(mode, None, None), Decision::Skip, "{mode:?}");
        }
    }

    #[test]
    fn test_orphan_deleted_only_in_delete_mode() {
        assert_eq!(decide(Mode::Default, None, at(10)), Decision::Skip);
        assert_eq!(decide(Mode::All, None, at(10)), Decision::Skip);
        assert_eq!(decide(Mode::Update, None, at(10)), Decision::Skip);
        for overwrite in [Overwrite::Never, Overwrite::Always, Overwrite::IfNewer] {
            assert_eq!(
                decide(Mode::Delete(overwrite), None, at(10)),
                Decision::Delete
            );
        }
    }

    #[test]
    fn test_default_never_overwrites() {
        assert_eq!(decide(Mode::Default, at(20), at(10)), Decision::Skip);
        assert_eq!(decide(Mode::Default, at(10), at(20)), Decision::Skip);
    }

    #[test]
    fn test_all_always_overwrites() {
        assert_eq!(decide(Mode::All, at(20), at(10)), Decision::Render);
        assert_eq!(decide(Mode::All, at(10), at(20)), Decision::Render);
    }

    #[test]
    fn test_update_overwrites_only_newer() {
        assert_eq!(decide(Mode::Update, at(20), at(10)), Decision::Render);
        assert_eq!(decide(Mode::Update, at(10), at(10)), Decision::Skip);
        assert_eq!(decide(Mode::Update, at(10), at(20)), Decision::Skip);
    }

    #[test]
    fn test_delete_composes_with_overwrite() {
        assert_eq!(
            decide(Mode::Delete(Overwrite::Never), at(20), at(10)),
            Decision::Skip
        );
        assert_eq!(
            decide(Mode::Delete(Overwrite::Always), at(10), at(20)),
            Decision::Render
        );
        assert_eq!(
            decide(Mode::Delete(Overwrite::IfNewer), at(20), at(10)),
            Decision::Render
        );
        assert_eq!(
            decide(Mode::Delete(Overwrite::IfNewer), at(10), at(20)),
            Decision::Skip
        );
    }

    #[test]
    fn test_unknown_source_mtime_is_newest() {
        let target = SystemTime::now() - Duration::from_secs(60);
        assert_eq!(
            decide(Mode::Update, Some(source_mtime(None)), Some(target)),
            Decision::Render
        );
        assert_eq!(
            source_mtime(at(5)),
            SystemTime::UNIX_EPOCH + Duration::from_secs(5)
        );
    }
}
