//! Application error types
//!
//! Nothing here is fatal to the process. Errors reach collaborators only as
//! status strings via [`AppError::user_message`].

use std::path::PathBuf;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Partial enumeration failure: {}", .0.display())]
    PartialEnumeration(PathBuf),

    #[error("Icon unavailable: {0}")]
    IconUnavailable(String),

    #[error("Clipboard unavailable: {0}")]
    ClipboardUnavailable(String),

    #[error("Image encode error: {0}")]
    ImageEncode(String),

    #[error("Background loader stopped")]
    LoaderStopped,
}

impl AppError {
    /// Text for the status display collaborator
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotFound(path) => app_fs::not_found_message(path),
            AppError::PartialEnumeration(_) => app_fs::CANNOT_SHOW_DIRECTORY.to_string(),
            AppError::ClipboardUnavailable(msg) => format!("Cannot copy path: {}", msg),
            AppError::IconUnavailable(_) => String::new(),
            _ => self.to_string(),
        }
    }
}

impl From<app_fs::FsError> for AppError {
    fn from(e: app_fs::FsError) -> Self {
        match e {
            app_fs::FsError::NotFound(p) => AppError::NotFound(PathBuf::from(p)),
            app_fs::FsError::Clipboard(msg) => AppError::ClipboardUnavailable(msg),
            app_fs::FsError::Io(io) => AppError::Io(io),
            other => AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, other.to_string())),
        }
    }
}

impl From<image::ImageError> for AppError {
    fn from(e: image::ImageError) -> Self {
        AppError::ImageEncode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = AppError::NotFound(PathBuf::from("/missing"));
        assert_eq!(err.user_message(), "/missing does not exist");
    }

    #[test]
    fn test_fs_error_mapping() {
        let err: AppError = app_fs::FsError::Clipboard("no display".into()).into();
        assert_eq!(err.user_message(), "Cannot copy path: no display");

        let err: AppError = app_fs::FsError::AccessDenied("/root".into()).into();
        assert!(matches!(err, AppError::Io(_)));
    }
}
