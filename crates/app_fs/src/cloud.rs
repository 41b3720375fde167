//! Cloud placeholder classification
//!
//! Cloud roots are recognised by folder naming only. A sync root whose folder
//! name carries no known keyword (renamed tenant folders, custom mount points)
//! is reported as not cloud managed. That false negative is a known limitation
//! of the heuristic.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path};

/// Folder-name keywords that mark a cloud sync root (matched case-insensitively)
pub const DEFAULT_CLOUD_KEYWORDS: &[&str] = &["onedrive", "dropbox", "google drive", "icloud drive"];

/// Cloud storage state of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CloudStatus {
    #[default]
    NotCloudManaged,
    /// Placeholder stub; content lives remotely
    CloudOnly,
    LocallyAvailable,
    /// Metadata could not be read
    Unknown,
}

impl CloudStatus {
    /// User-facing description
    pub fn description(self) -> &'static str {
        match self {
            CloudStatus::CloudOnly => "Cloud only (not downloaded)",
            CloudStatus::LocallyAvailable => "Available locally",
            CloudStatus::NotCloudManaged => "Not cloud managed",
            CloudStatus::Unknown => "Unknown status",
        }
    }

    /// Status as it should be drawn: Unknown renders like NotCloudManaged
    pub fn for_display(self) -> CloudStatus {
        match self {
            CloudStatus::Unknown => CloudStatus::NotCloudManaged,
            other => other,
        }
    }

    pub fn is_cloud_only(self) -> bool {
        self == CloudStatus::CloudOnly
    }
}

/// Best-effort classifier for cloud-synced files
#[derive(Debug, Clone)]
pub struct CloudStatusProbe {
    keywords: Vec<String>,
}

impl Default for CloudStatusProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl CloudStatusProbe {
    pub fn new() -> Self {
        Self::with_keywords(DEFAULT_CLOUD_KEYWORDS.iter().copied())
    }

    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    /// Is any folder on `path` named like a cloud sync root?
    pub fn is_under_cloud_root(&self, path: &Path) -> bool {
        path.components().any(|component| match component {
            Component::Normal(name) => {
                let name = name.to_string_lossy().to_lowercase();
                self.keywords.iter().any(|k| name.contains(k.as_str()))
            }
            _ => false,
        })
    }

    /// Classify a file. Never fails; unreadable metadata yields `Unknown`.
    pub fn classify(&self, path: &Path) -> CloudStatus {
        if !self.is_under_cloud_root(path) {
            return CloudStatus::NotCloudManaged;
        }

        let metadata = match fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return CloudStatus::NotCloudManaged;
            }
            Err(e) => {
                tracing::debug!("Cloud probe could not read {}: {}", path.display(), e);
                return CloudStatus::Unknown;
            }
        };

        if !metadata.is_file() {
            return CloudStatus::NotCloudManaged;
        }

        if is_placeholder(&metadata) {
            CloudStatus::CloudOnly
        } else {
            CloudStatus::LocallyAvailable
        }
    }
}

/// Placeholder files carry one of the recall-on-access attributes
#[cfg(windows)]
fn is_placeholder(metadata: &fs::Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;
    use windows::Win32::Storage::FileSystem::{
        FILE_ATTRIBUTE_RECALL_ON_DATA_ACCESS, FILE_ATTRIBUTE_RECALL_ON_OPEN,
    };

    let recall = FILE_ATTRIBUTE_RECALL_ON_OPEN.0 | FILE_ATTRIBUTE_RECALL_ON_DATA_ACCESS.0;
    metadata.file_attributes() & recall != 0
}

#[cfg(not(windows))]
fn is_placeholder(_metadata: &fs::Metadata) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outside_cloud_root() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("plain.txt");
        fs::write(&file, b"x").unwrap();

        let probe = CloudStatusProbe::new();
        assert_eq!(probe.classify(&file), CloudStatus::NotCloudManaged);
    }

    #[test]
    fn test_cloud_root_keyword_is_case_insensitive() {
        let probe = CloudStatusProbe::new();
        assert!(probe.is_under_cloud_root(Path::new("/home/me/OneDrive - Contoso/doc.txt")));
        assert!(probe.is_under_cloud_root(Path::new("/Users/me/Dropbox/a.png")));
        assert!(!probe.is_under_cloud_root(Path::new("/home/me/Documents/doc.txt")));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_materialized_file_is_locally_available() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("OneDrive");
        fs::create_dir(&root).unwrap();
        let file = root.join("notes.md");
        fs::write(&file, b"hello").unwrap();

        let probe = CloudStatusProbe::new();
        assert_eq!(probe.classify(&file), CloudStatus::LocallyAvailable);
    }

    #[test]
    fn test_missing_file_is_not_cloud_managed() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("onedrive").join("gone.txt");

        let probe = CloudStatusProbe::new();
        assert_eq!(probe.classify(&missing), CloudStatus::NotCloudManaged);
    }

    #[test]
    fn test_directory_is_not_cloud_managed() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("OneDrive");
        fs::create_dir(&root).unwrap();

        let probe = CloudStatusProbe::new();
        assert_eq!(probe.classify(&root), CloudStatus::NotCloudManaged);
    }

    #[cfg(unix)]
    #[test]
    fn test_metadata_failure_is_unknown() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("onedrive");
        fs::create_dir(&root).unwrap();
        let file = root.join("file.txt");
        fs::write(&file, b"x").unwrap();

        // Treating a file as a directory fails with ENOTDIR rather than NotFound
        let probe = CloudStatusProbe::new();
        assert_eq!(probe.classify(&file.join("inner")), CloudStatus::Unknown);
    }

    #[test]
    fn test_custom_keywords() {
        let probe = CloudStatusProbe::with_keywords(["  MyCloud ", ""]);
        assert!(probe.is_under_cloud_root(Path::new("/data/mycloud/x.txt")));
        assert!(!probe.is_under_cloud_root(Path::new("/data/OneDrive/x.txt")));
    }

    #[test]
    fn test_unknown_displays_as_not_cloud() {
        assert_eq!(CloudStatus::Unknown.for_display(), CloudStatus::NotCloudManaged);
        assert_eq!(CloudStatus::CloudOnly.for_display(), CloudStatus::CloudOnly);
        assert_eq!(CloudStatus::CloudOnly.description(), "Cloud only (not downloaded)");
    }
}
