//! File system browser - directory listing

use crate::{CloudStatus, CloudStatusProbe, DirectorySource, RawEntry, StdDirectorySource};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Extensions the preview collaborator can render (compared case-insensitively)
pub const PREVIEW_EXTENSIONS: &[&str] = &[
    // images
    "jpg", "jpeg", "png", "gif", "svg", "bmp",
    // markup, text and data
    "html", "htm", "txt", "md", "ini", "sql", "json", "js",
];

/// Display name of the synthetic "go up" entry
pub const PARENT_DISPLAY_NAME: &str = "..";

/// Status reported when part of a directory could not be enumerated
pub const CANNOT_SHOW_DIRECTORY: &str = "Cannot show directory";

/// Status reported for a path that is not an existing directory
pub fn not_found_message(path: &Path) -> String {
    format!("{} does not exist", path.display())
}

/// Is a file with this extension previewable?
pub fn is_previewable(extension: &str) -> bool {
    PREVIEW_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(extension))
}

/// Parent directory, `None` at a filesystem root
pub fn parent_of(path: &Path) -> Option<PathBuf> {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

/// Fold `.` and `..` lexically so one directory has one spelling.
/// `..` at the root stays at the root.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(Component::ParentDir),
            },
            Component::CurDir => {}
            _ => normalized.push(component),
        }
    }
    normalized
}

/// What an entry represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Synthetic "go up" row
    ParentPseudoEntry,
    Directory,
    File,
}

/// One row of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub path: PathBuf,
    pub display_name: String,
    pub kind: EntryKind,
    /// Lower-cased, empty for directories
    pub extension: String,
    pub previewable: bool,
    /// Meaningful only for files
    pub cloud_status: CloudStatus,
}

impl Entry {
    pub fn parent(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            display_name: PARENT_DISPLAY_NAME.to_string(),
            kind: EntryKind::ParentPseudoEntry,
            extension: String::new(),
            previewable: false,
            cloud_status: CloudStatus::NotCloudManaged,
        }
    }

    pub fn directory(raw: RawEntry) -> Self {
        Self {
            path: raw.path,
            display_name: raw.name,
            kind: EntryKind::Directory,
            extension: String::new(),
            previewable: false,
            cloud_status: CloudStatus::NotCloudManaged,
        }
    }

    pub fn file(raw: RawEntry, cloud_status: CloudStatus) -> Self {
        let extension = raw
            .path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let previewable = is_previewable(&extension);

        Self {
            path: raw.path,
            display_name: raw.name,
            kind: EntryKind::File,
            extension,
            previewable,
            cloud_status,
        }
    }

    /// Selecting this entry changes directory
    pub fn is_navigable(&self) -> bool {
        matches!(self.kind, EntryKind::Directory | EntryKind::ParentPseudoEntry)
    }
}

/// Ordered contents of one directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub directory: PathBuf,
    pub entries: Vec<Entry>,
    /// Some part of the enumeration failed
    pub partial_failure: bool,
    /// User-facing status accompanying a failure
    pub status: Option<String>,
}

impl Listing {
    fn failed(directory: &Path, status: String) -> Self {
        Self {
            directory: directory.to_path_buf(),
            entries: Vec::new(),
            partial_failure: true,
            status: Some(status),
        }
    }

    pub fn parent_entry(&self) -> Option<&Entry> {
        self.entries
            .first()
            .filter(|e| e.kind == EntryKind::ParentPseudoEntry)
    }

    pub fn directories(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Directory)
    }

    pub fn files(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::File)
    }
}

/// Builds listings from a directory source
#[derive(Clone)]
pub struct DirectoryLister {
    source: Arc<dyn DirectorySource>,
    probe: CloudStatusProbe,
}

impl Default for DirectoryLister {
    fn default() -> Self {
        Self::new(Arc::new(StdDirectorySource), CloudStatusProbe::new())
    }
}

impl DirectoryLister {
    pub fn new(source: Arc<dyn DirectorySource>, probe: CloudStatusProbe) -> Self {
        Self { source, probe }
    }

    /// Does `path` denote an existing directory?
    pub fn is_directory(&self, path: &Path) -> bool {
        self.source.is_dir(path)
    }

    /// List a directory. Never fails; problems are reported on the listing.
    pub fn list(&self, path: &Path) -> Listing {
        if !self.source.is_dir(path) {
            tracing::warn!("Not an existing directory: {}", path.display());
            return Listing::failed(path, not_found_message(path));
        }

        let mut partial_failure = false;

        let mut directories = match self.source.directories(path) {
            Ok(dirs) => dirs,
            Err(e) => {
                tracing::warn!("Cannot enumerate directories of {}: {}", path.display(), e);
                partial_failure = true;
                Vec::new()
            }
        };

        let mut files = match self.source.files(path) {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!("Cannot enumerate files of {}: {}", path.display(), e);
                partial_failure = true;
                Vec::new()
            }
        };

        directories.retain(|raw| is_visible_name(&raw.name));
        files.retain(|raw| is_visible_name(&raw.name));
        directories.sort_by(|a, b| compare_names(&a.name, &b.name));
        files.sort_by(|a, b| compare_names(&a.name, &b.name));

        let mut entries = Vec::with_capacity(directories.len() + files.len() + 1);
        if let Some(parent) = parent_of(path) {
            entries.push(Entry::parent(parent));
        }
        entries.extend(directories.into_iter().map(Entry::directory));
        entries.extend(files.into_iter().map(|raw| {
            let status = self.probe.classify(&raw.path);
            Entry::file(raw, status)
        }));

        tracing::debug!(
            "Listed {}: {} entries{}",
            path.display(),
            entries.len(),
            if partial_failure { " (partial)" } else { "" }
        );

        Listing {
            directory: path.to_path_buf(),
            entries,
            partial_failure,
            status: partial_failure.then(|| CANNOT_SHOW_DIRECTORY.to_string()),
        }
    }
}

/// Blank names and `$`-prefixed system artifacts are not browsable
fn is_visible_name(name: &str) -> bool {
    !name.trim().is_empty() && !name.starts_with('$')
}

/// Ordinal case-insensitive comparison, exact ordinal as tie-breaker
fn compare_names(a: &str, b: &str) -> Ordering {
    let upper_a = a.chars().flat_map(char::to_uppercase);
    let upper_b = b.chars().flat_map(char::to_uppercase);
    upper_a.cmp(upper_b).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FsError;
    use std::collections::HashSet;

    /// In-memory source; `None` groups fail with access denied
    struct FakeSource {
        existing: HashSet<PathBuf>,
        directories: Option<Vec<&'static str>>,
        files: Option<Vec<&'static str>>,
    }

    impl FakeSource {
        fn new(dir: &str, directories: Option<Vec<&'static str>>, files: Option<Vec<&'static str>>) -> Self {
            Self {
                existing: [PathBuf::from(dir)].into_iter().collect(),
                directories,
                files,
            }
        }

        fn group(path: &Path, names: &Option<Vec<&'static str>>) -> crate::Result<Vec<RawEntry>> {
            match names {
                Some(names) => Ok(names.iter().map(|n| RawEntry::new(path.join(n))).collect()),
                None => Err(FsError::AccessDenied(path.display().to_string())),
            }
        }
    }

    impl DirectorySource for FakeSource {
        fn is_dir(&self, path: &Path) -> bool {
            self.existing.contains(path)
        }

        fn directories(&self, path: &Path) -> crate::Result<Vec<RawEntry>> {
            Self::group(path, &self.directories)
        }

        fn files(&self, path: &Path) -> crate::Result<Vec<RawEntry>> {
            Self::group(path, &self.files)
        }
    }

    fn lister(source: FakeSource) -> DirectoryLister {
        DirectoryLister::new(Arc::new(source), CloudStatusProbe::new())
    }

    fn names(listing: &Listing) -> Vec<&str> {
        listing.entries.iter().map(|e| e.display_name.as_str()).collect()
    }

    #[test]
    fn test_docs_scenario() {
        let source = FakeSource::new("/docs", Some(vec!["A"]), Some(vec!["b.txt", "$sys"]));
        let listing = lister(source).list(Path::new("/docs"));

        assert!(!listing.partial_failure);
        assert_eq!(names(&listing), vec!["..", "A", "b.txt"]);
        assert_eq!(listing.entries[1].kind, EntryKind::Directory);
        assert_eq!(listing.entries[2].kind, EntryKind::File);
        assert_eq!(listing.parent_entry().unwrap().path, PathBuf::from("/"));
    }

    #[test]
    fn test_root_has_no_parent() {
        let source = FakeSource::new("/", Some(vec!["A"]), Some(vec!["b.txt"]));
        let listing = lister(source).list(Path::new("/"));

        assert!(listing.parent_entry().is_none());
        assert_eq!(names(&listing), vec!["A", "b.txt"]);
    }

    #[test]
    fn test_directories_before_files_case_insensitive() {
        let source = FakeSource::new(
            "/w",
            Some(vec!["zeta", "Alpha", "beta"]),
            Some(vec!["b.md", "a.TXT", "C.json", "aa.txt"]),
        );
        let listing = lister(source).list(Path::new("/w"));

        assert_eq!(
            names(&listing),
            vec!["..", "Alpha", "beta", "zeta", "a.TXT", "aa.txt", "b.md", "C.json"]
        );
    }

    #[test]
    fn test_hidden_and_blank_names_filtered() {
        let source = FakeSource::new(
            "/w",
            Some(vec!["$Recycle.Bin", "   ", "keep"]),
            Some(vec!["$MFT", " ", "ok.txt"]),
        );
        let listing = lister(source).list(Path::new("/w"));

        assert_eq!(names(&listing), vec!["..", "keep", "ok.txt"]);
    }

    #[test]
    fn test_directory_enumeration_failure_keeps_files() {
        let source = FakeSource::new("/w", None, Some(vec!["b.txt", "a.txt"]));
        let listing = lister(source).list(Path::new("/w"));

        assert!(listing.partial_failure);
        assert_eq!(listing.status.as_deref(), Some(CANNOT_SHOW_DIRECTORY));
        assert_eq!(listing.directories().count(), 0);
        let files: Vec<_> = listing.files().map(|e| e.display_name.as_str()).collect();
        assert_eq!(files, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_file_enumeration_failure_keeps_directories() {
        let source = FakeSource::new("/w", Some(vec!["d"]), None);
        let listing = lister(source).list(Path::new("/w"));

        assert!(listing.partial_failure);
        assert_eq!(listing.directories().count(), 1);
        assert_eq!(listing.files().count(), 0);
    }

    #[test]
    fn test_missing_directory_fails_fast() {
        let source = FakeSource::new("/w", Some(vec![]), Some(vec![]));
        let listing = lister(source).list(Path::new("/missing"));

        assert!(listing.partial_failure);
        assert!(listing.entries.is_empty());
        assert_eq!(listing.status.as_deref(), Some("/missing does not exist"));
    }

    #[test]
    fn test_previewable_is_case_insensitive() {
        let source = FakeSource::new("/w", Some(vec![]), Some(vec!["x.JPG", "y.jpg", "report.csv", "README"]));
        let listing = lister(source).list(Path::new("/w"));

        let by_name = |n: &str| listing.entries.iter().find(|e| e.display_name == n).unwrap();
        assert!(by_name("x.JPG").previewable);
        assert_eq!(by_name("x.JPG").extension, "jpg");
        assert!(by_name("y.jpg").previewable);
        assert!(!by_name("report.csv").previewable);
        assert!(!by_name("README").previewable);
        assert_eq!(by_name("README").extension, "");
    }

    #[test]
    fn test_is_previewable_set() {
        for ext in PREVIEW_EXTENSIONS {
            assert!(is_previewable(ext));
            assert!(is_previewable(&ext.to_uppercase()));
        }
        assert!(!is_previewable("csv"));
        assert!(!is_previewable(""));
    }

    #[test]
    fn test_real_directory_listing() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("Sub")).unwrap();
        std::fs::create_dir(tmp.path().join("$hidden")).unwrap();
        std::fs::write(tmp.path().join("note.txt"), b"n").unwrap();

        let listing = DirectoryLister::default().list(tmp.path());
        let rows: Vec<_> = listing
            .entries
            .iter()
            .filter(|e| e.kind != EntryKind::ParentPseudoEntry)
            .map(|e| (e.display_name.as_str(), e.kind))
            .collect();

        assert!(!listing.partial_failure);
        assert_eq!(rows, vec![("Sub", EntryKind::Directory), ("note.txt", EntryKind::File)]);
        assert_eq!(listing.entries[0].kind, EntryKind::ParentPseudoEntry);
    }

    #[cfg(unix)]
    #[test]
    fn test_normalize_folds_parent_and_current() {
        assert_eq!(normalize_path(Path::new("/x/A/..")), PathBuf::from("/x"));
        assert_eq!(normalize_path(Path::new("/x/./A/b/../c")), PathBuf::from("/x/A/c"));
        assert_eq!(normalize_path(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(normalize_path(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(normalize_path(Path::new("../../c")), PathBuf::from("../../c"));
    }

    #[test]
    fn test_navigable_kinds() {
        assert!(Entry::parent("/").is_navigable());
        assert!(Entry::directory(RawEntry::new("/a")).is_navigable());
        assert!(!Entry::file(RawEntry::new("/a.txt"), CloudStatus::NotCloudManaged).is_navigable());
    }
}
