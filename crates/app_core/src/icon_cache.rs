//! Icon cache
//!
//! Each key is resolved at most once until the next [`IconCache::clear`].
//! Concurrent callers for the same key wait on a per-key cell instead of
//! racing a second resolution; other keys are not blocked.

use crate::Icon;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifies a cacheable icon
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IconKey {
    /// Shared folder glyph
    Folder,
    /// Shared "go up" glyph
    GoUp,
    /// Shared toolbar refresh glyph
    Refresh,
    /// Per-file icon
    Path(PathBuf),
}

impl IconKey {
    /// Literal tag for shared keys
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            IconKey::Folder => Some("folder"),
            IconKey::GoUp => Some("go-up"),
            IconKey::Refresh => Some("refresh"),
            IconKey::Path(_) => None,
        }
    }

    pub fn is_shared(&self) -> bool {
        self.tag().is_some()
    }
}

impl fmt::Display for IconKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.tag(), self) {
            (Some(tag), _) => f.write_str(tag),
            (None, IconKey::Path(path)) => write!(f, "{}", path.display()),
            (None, _) => Ok(()),
        }
    }
}

type Slot = Arc<OnceCell<Option<Arc<Icon>>>>;

/// Key to icon mapping; the single owner of cached icons
#[derive(Default)]
pub struct IconCache {
    entries: DashMap<IconKey, Slot>,
    hits: AtomicU64,
    resolutions: AtomicU64,
    released: AtomicU64,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub resolutions: u64,
    pub released: u64,
}

impl IconCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached icon for `key`, running `resolve` only if no value
    /// (including "no icon") has been cached yet
    pub fn get_or_resolve<F>(&self, key: IconKey, resolve: F) -> Option<Arc<Icon>>
    where
        F: FnOnce() -> Option<Arc<Icon>>,
    {
        // The shard lock is released before resolving
        let slot: Slot = Arc::clone(self.entries.entry(key).or_default().value());

        let mut resolved_here = false;
        let icon = slot
            .get_or_init(|| {
                resolved_here = true;
                self.resolutions.fetch_add(1, Ordering::Relaxed);
                resolve()
            })
            .clone();

        if !resolved_here {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        icon
    }

    /// Cached value without resolving
    pub fn get(&self, key: &IconKey) -> Option<Arc<Icon>> {
        self.entries
            .get(key)
            .and_then(|slot| slot.get().cloned().flatten())
    }

    pub fn contains(&self, key: &IconKey) -> bool {
        self.entries
            .get(key)
            .map(|slot| slot.get().is_some())
            .unwrap_or(false)
    }

    /// Drop every cached icon. Returns the number of entries released.
    pub fn clear(&self) -> usize {
        let mut released = 0;
        self.entries.retain(|_, _| {
            released += 1;
            false
        });

        self.released.fetch_add(released as u64, Ordering::Relaxed);
        if released > 0 {
            tracing::trace!("Icon cache released {} entries", released);
        }
        released
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            resolutions: self.resolutions.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
        }
    }
}

impl Drop for IconCache {
    fn drop(&mut self) {
        let released = self.clear();
        tracing::debug!("Icon cache dropped, released {} entries", released);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{synthesize, IconKind, IconSize};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;

    fn icon() -> Option<Arc<Icon>> {
        Some(Arc::new(synthesize(IconKind::Document, IconSize::Small)))
    }

    #[test]
    fn test_resolves_once_per_key() {
        let cache = IconCache::new();
        let calls = AtomicUsize::new(0);
        let key = IconKey::Path(PathBuf::from("/docs/b.txt"));

        let resolve = || {
            calls.fetch_add(1, Ordering::SeqCst);
            icon()
        };
        let first = cache.get_or_resolve(key.clone(), resolve).unwrap();
        let second = cache.get_or_resolve(key.clone(), resolve).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_clear_forces_resolution() {
        let cache = IconCache::new();
        let calls = AtomicUsize::new(0);
        let resolve = || {
            calls.fetch_add(1, Ordering::SeqCst);
            icon()
        };

        cache.get_or_resolve(IconKey::GoUp, resolve);
        assert_eq!(cache.clear(), 1);
        assert!(cache.is_empty());
        cache.get_or_resolve(IconKey::GoUp, resolve);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().released, 1);
    }

    #[test]
    fn test_missing_icon_is_cached() {
        let cache = IconCache::new();
        let calls = AtomicUsize::new(0);
        let resolve = || {
            calls.fetch_add(1, Ordering::SeqCst);
            None
        };

        assert!(cache.get_or_resolve(IconKey::Folder, resolve).is_none());
        assert!(cache.get_or_resolve(IconKey::Folder, resolve).is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.contains(&IconKey::Folder));
    }

    #[test]
    fn test_clear_releases_icons() {
        let cache = IconCache::new();
        let held = cache.get_or_resolve(IconKey::Refresh, icon).unwrap();
        let weak = Arc::downgrade(&held);
        drop(held);

        assert!(weak.upgrade().is_some());
        cache.clear();
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_concurrent_same_key_resolves_once() {
        let cache = IconCache::new();
        let calls = AtomicUsize::new(0);
        let barrier = Barrier::new(8);
        let key = IconKey::Path(PathBuf::from("/shared.png"));

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    barrier.wait();
                    cache.get_or_resolve(key.clone(), || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(std::time::Duration::from_millis(20));
                        icon()
                    })
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().hits, 7);
    }

    #[test]
    fn test_key_tags() {
        assert_eq!(IconKey::Folder.to_string(), "folder");
        assert_eq!(IconKey::GoUp.to_string(), "go-up");
        assert_eq!(IconKey::Refresh.to_string(), "refresh");
        assert!(!IconKey::Path(PathBuf::from("/a")).is_shared());
        assert_eq!(IconKey::Path(PathBuf::from("/a")).to_string(), "/a");
    }
}
