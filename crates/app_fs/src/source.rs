//! Directory enumeration seam
//!
//! Sub-directories and files are enumerated as two separate passes so that a
//! failure in one (access denied on a reparse point, for example) leaves the
//! other usable.

use crate::{FsError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// A name/path pair produced by one enumeration pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub path: PathBuf,
    pub name: String,
}

impl RawEntry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self { path, name }
    }
}

/// Where directory contents come from
pub trait DirectorySource: Send + Sync {
    /// Does `path` denote an existing directory?
    fn is_dir(&self, path: &Path) -> bool;

    /// Enumerate the immediate sub-directories of `path`
    fn directories(&self, path: &Path) -> Result<Vec<RawEntry>>;

    /// Enumerate the immediate files of `path`
    fn files(&self, path: &Path) -> Result<Vec<RawEntry>>;
}

/// `std::fs` backed source
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDirectorySource;

impl StdDirectorySource {
    fn enumerate(&self, path: &Path, want_dirs: bool) -> Result<Vec<RawEntry>> {
        let reader = fs::read_dir(path).map_err(|e| FsError::from_io(e, path))?;
        let mut out = Vec::new();

        for entry in reader {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry in {}: {}", path.display(), e);
                    continue;
                }
            };

            let entry_path = entry.path();
            // Symlinks report their own type; follow them so linked folders browse as folders
            let is_dir = match entry.file_type() {
                Ok(ft) if ft.is_symlink() => entry_path.is_dir(),
                Ok(ft) => ft.is_dir(),
                Err(_) => continue,
            };

            if is_dir == want_dirs {
                out.push(RawEntry {
                    name: entry.file_name().to_string_lossy().to_string(),
                    path: entry_path,
                });
            }
        }

        Ok(out)
    }
}

impl DirectorySource for StdDirectorySource {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn directories(&self, path: &Path) -> Result<Vec<RawEntry>> {
        self.enumerate(path, true)
    }

    fn files(&self, path: &Path) -> Result<Vec<RawEntry>> {
        self.enumerate(path, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separates_dirs_and_files() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("a.txt"), b"x").unwrap();

        let source = StdDirectorySource;
        let dirs = source.directories(tmp.path()).unwrap();
        let files = source.files(tmp.path()).unwrap();

        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs[0].name, "sub");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "a.txt");
    }

    #[test]
    fn test_missing_directory_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");

        let err = StdDirectorySource.files(&missing).unwrap_err();
        assert!(matches!(err, FsError::NotFound(_)));
        assert!(!StdDirectorySource.is_dir(&missing));
    }

    #[test]
    fn test_raw_entry_name_from_path() {
        let raw = RawEntry::new("/some/where/file.md");
        assert_eq!(raw.name, "file.md");
    }
}
