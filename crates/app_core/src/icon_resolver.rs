//! Per-entry icon resolution

use crate::icon::{synthesize, Icon, IconKind, IconSize};
use crate::icon_cache::IconKey;
use crate::icon_provider::SystemIconProvider;
use app_fs::{Entry, EntryKind};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Chooses the icon for an entry
pub struct IconResolver {
    provider: Arc<dyn SystemIconProvider>,
    size: IconSize,
    badge_cloud_only: bool,
    /// All folders look alike, so the provider is asked once per resolver
    folder: OnceCell<Option<Arc<Icon>>>,
}

impl IconResolver {
    pub fn new(provider: Arc<dyn SystemIconProvider>, size: IconSize) -> Self {
        Self {
            provider,
            size,
            badge_cloud_only: true,
            folder: OnceCell::new(),
        }
    }

    pub fn with_cloud_badge(mut self, enabled: bool) -> Self {
        self.badge_cloud_only = enabled;
        self
    }

    /// Cache key for an entry's icon
    pub fn key_for(entry: &Entry) -> IconKey {
        match entry.kind {
            EntryKind::ParentPseudoEntry => IconKey::GoUp,
            EntryKind::Directory => IconKey::Folder,
            EntryKind::File => IconKey::Path(entry.path.clone()),
        }
    }

    /// Icon for `entry`, or `None` when the platform has none
    pub fn resolve(&self, entry: &Entry) -> Option<Arc<Icon>> {
        match entry.kind {
            // The go-up glyph is always the small one
            EntryKind::ParentPseudoEntry => {
                Some(Arc::new(synthesize(IconKind::UpArrow, IconSize::Small)))
            }
            EntryKind::Directory => self.folder_icon(),
            EntryKind::File => self.file_icon(entry),
        }
    }

    /// Toolbar refresh glyph
    pub fn refresh_icon(&self) -> Arc<Icon> {
        Arc::new(synthesize(IconKind::Refresh, self.size))
    }

    fn folder_icon(&self) -> Option<Arc<Icon>> {
        self.folder
            .get_or_init(|| match self.provider.folder_icon(self.size) {
                Ok(icon) => Some(Arc::new(icon)),
                Err(e) => {
                    tracing::debug!("{}", e);
                    None
                }
            })
            .clone()
    }

    fn file_icon(&self, entry: &Entry) -> Option<Arc<Icon>> {
        let icon = match self.provider.file_icon(&entry.path, &entry.extension, self.size) {
            Ok(icon) => icon,
            Err(e) => {
                tracing::debug!("{}", e);
                return None;
            }
        };

        if self.badge_cloud_only && entry.cloud_status.for_display().is_cloud_only() {
            Some(Arc::new(icon.badged_cloud_only()))
        } else {
            Some(Arc::new(icon))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AppError, BuiltinIconProvider, IconCache};
    use app_fs::{CloudStatus, RawEntry};
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Builtin glyphs plus call counting; `.none` files have no icon
    #[derive(Default)]
    struct CountingProvider {
        folder_calls: AtomicUsize,
        file_calls: AtomicUsize,
    }

    impl SystemIconProvider for CountingProvider {
        fn folder_icon(&self, size: IconSize) -> Result<Icon, AppError> {
            self.folder_calls.fetch_add(1, Ordering::SeqCst);
            BuiltinIconProvider.folder_icon(size)
        }

        fn file_icon(&self, path: &Path, extension: &str, size: IconSize) -> Result<Icon, AppError> {
            self.file_calls.fetch_add(1, Ordering::SeqCst);
            if extension == "none" {
                return Err(AppError::IconUnavailable(path.display().to_string()));
            }
            BuiltinIconProvider.file_icon(path, extension, size)
        }
    }

    fn file(path: &str, status: CloudStatus) -> Entry {
        Entry::file(RawEntry::new(path), status)
    }

    fn dir(path: &str) -> Entry {
        Entry::directory(RawEntry::new(path))
    }

    #[test]
    fn test_parent_uses_up_arrow() {
        let resolver = IconResolver::new(Arc::new(CountingProvider::default()), IconSize::Small);
        let icon = resolver.resolve(&Entry::parent("/")).unwrap();
        assert_eq!(*icon, synthesize(IconKind::UpArrow, IconSize::Small));
    }

    #[test]
    fn test_parent_arrow_stays_small_with_large_icons() {
        let resolver = IconResolver::new(Arc::new(CountingProvider::default()), IconSize::Large);
        let arrow = resolver.resolve(&Entry::parent("/")).unwrap();
        let folder = resolver.resolve(&dir("/a")).unwrap();

        assert_eq!(arrow.width(), 16);
        assert_eq!(folder.width(), 32);
        assert_eq!(resolver.refresh_icon().width(), 32);
    }

    #[test]
    fn test_folder_icon_requested_once() {
        let provider = Arc::new(CountingProvider::default());
        let resolver = IconResolver::new(provider.clone(), IconSize::Small);
        let cache = IconCache::new();

        for name in ["/a", "/b", "/c"] {
            let entry = dir(name);
            cache.get_or_resolve(IconResolver::key_for(&entry), || resolver.resolve(&entry));
            cache.clear();
        }

        assert_eq!(provider.folder_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_file_icon_is_none() {
        let resolver = IconResolver::new(Arc::new(CountingProvider::default()), IconSize::Small);
        assert!(resolver.resolve(&file("/x/blob.none", CloudStatus::NotCloudManaged)).is_none());
        assert!(resolver.resolve(&file("/x/ok.txt", CloudStatus::NotCloudManaged)).is_some());
    }

    #[test]
    fn test_cloud_only_is_badged() {
        let resolver = IconResolver::new(Arc::new(CountingProvider::default()), IconSize::Small);
        let cloud = resolver.resolve(&file("/OneDrive/a.txt", CloudStatus::CloudOnly)).unwrap();
        let local = resolver.resolve(&file("/OneDrive/a.txt", CloudStatus::LocallyAvailable)).unwrap();
        let unknown = resolver.resolve(&file("/OneDrive/a.txt", CloudStatus::Unknown)).unwrap();

        assert_ne!(*cloud, *local);
        assert_eq!(*unknown, *local);
    }

    #[test]
    fn test_badge_can_be_disabled() {
        let resolver = IconResolver::new(Arc::new(CountingProvider::default()), IconSize::Small)
            .with_cloud_badge(false);
        let cloud = resolver.resolve(&file("/OneDrive/a.txt", CloudStatus::CloudOnly)).unwrap();
        assert_eq!(*cloud, synthesize(IconKind::Document, IconSize::Small));
    }

    #[test]
    fn test_keys() {
        assert_eq!(IconResolver::key_for(&dir("/a")), IconKey::Folder);
        assert_eq!(IconResolver::key_for(&Entry::parent("/")), IconKey::GoUp);
        assert_eq!(
            IconResolver::key_for(&file("/a/b.txt", CloudStatus::NotCloudManaged)),
            IconKey::Path(PathBuf::from("/a/b.txt"))
        );
    }
}
