//! Directory Browser File System Layer
//!
//! Provides the filesystem side of the browser:
//! - Entry / Listing data model
//! - DirectoryLister: sorted, filtered listings that survive partial failures
//! - CloudStatusProbe: best-effort cloud placeholder classification
//! - DirectorySource: the enumeration seam (real `std::fs` or injected)
//! - Clipboard helper for the "copy path" context action

mod browser;
mod cloud;
mod source;
mod clipboard;

pub use browser::{
    DirectoryLister, Entry, EntryKind, Listing, PREVIEW_EXTENSIONS, PARENT_DISPLAY_NAME,
    CANNOT_SHOW_DIRECTORY, is_previewable, normalize_path, not_found_message, parent_of,
};
pub use cloud::{CloudStatus, CloudStatusProbe, DEFAULT_CLOUD_KEYWORDS};
pub use source::{DirectorySource, RawEntry, StdDirectorySource};
pub use clipboard::{ClipboardSink, SystemClipboard};

use thiserror::Error;

/// File system errors
#[derive(Error, Debug)]
pub enum FsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),
}

impl FsError {
    /// Map an I/O error raised while touching `path` to the closest variant
    pub fn from_io(err: std::io::Error, path: &std::path::Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound(path.display().to_string()),
            std::io::ErrorKind::PermissionDenied => {
                FsError::AccessDenied(path.display().to_string())
            }
            _ => FsError::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, FsError>;
