//! Scratch storage for downloaded and generated files.
//!
//! Every inbound event gets its own [`ScratchDir`], so concurrent events never share (or purge)
//! each other's files. [`clear_directory`] is the best-effort purge used after publishing.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::DigestResult;

/// Outcome of a best-effort purge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Entries deleted.
    pub removed: Vec<PathBuf>,
    /// Entries that could not be deleted, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Fold another purge's results into this one.
    pub fn merge(&mut self, other: CleanupReport) {
        self.removed.extend(other.removed);
        self.failed.extend(other.failed);
    }
}

/// Delete every entry (file, symlink or directory) directly under `dir`.
///
/// The directory itself is kept. Failures are logged and skipped; the purge never stops early.
/// A missing `dir` yields an empty report.
pub fn clear_directory(dir: impl AsRef<Path>) -> CleanupReport {
    let dir = dir.as_ref();
    let mut report = CleanupReport::default();
    if !dir.exists() {
        return report;
    }

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
                warn!(path = %path.display(), error = %e, "failed to read scratch entry");
                report.failed.push((path, e.to_string()));
                continue;
            }
        };

        let path = entry.path().to_path_buf();
        // walkdir does not follow links, so a symlink to a directory reports as a symlink.
        let result = if entry.file_type().is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };

        match result {
            Ok(()) => {
                info!(path = %path.display(), "deleted");
                report.removed.push(path);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to delete");
                report.failed.push((path, e.to_string()));
            }
        }
    }

    report
}

/// A unique scratch directory for one pipeline invocation.
///
/// The directory and anything left in it are removed when the value is dropped.
#[derive(Debug)]
pub struct ScratchDir {
    dir: tempfile::TempDir,
}

impl ScratchDir {
    /// Create a scratch directory under `root` (or the OS temp dir when `None`).
    pub fn new(root: Option<&Path>) -> DigestResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("survey-digest-");
        let dir = match root {
            Some(root) => {
                fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Purge the directory's contents, keeping the directory.
    pub fn clear(&self) -> CleanupReport {
        clear_directory(self.path())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{clear_directory, ScratchDir};

    #[test]
    fn clears_files_and_directories() {
        let scratch = ScratchDir::new(None).unwrap();
        let root = scratch.path();
        fs::write(root.join("a.csv"), "x").unwrap();
        fs::create_dir_all(root.join("nested/deeper")).unwrap();
        fs::write(root.join("nested/deeper/b.xlsx"), "y").unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink(root.join("nested"), root.join("link")).unwrap();

        let report = scratch.clear();
        assert!(report.is_clean());
        assert!(root.exists());
        assert_eq!(fs::read_dir(root).unwrap().count(), 0);
    }

    #[test]
    fn missing_directory_is_a_no_op() {
        let scratch = ScratchDir::new(None).unwrap();
        let report = clear_directory(scratch.path().join("nope"));
        assert!(report.removed.is_empty());
        assert!(report.failed.is_empty());
    }

    #[test]
    fn scratch_dirs_are_unique_and_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let a = ScratchDir::new(Some(root.path())).unwrap();
        let b = ScratchDir::new(Some(root.path())).unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().starts_with(root.path()));

        let kept = a.path().to_path_buf();
        drop(a);
        assert!(!kept.exists());
    }
}
