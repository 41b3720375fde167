//! Clipboard access for the "copy path" context action

use crate::{FsError, Result};

/// Receives text destined for the clipboard
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// System clipboard. Opened lazily so a headless session only fails when used.
#[derive(Default)]
pub struct SystemClipboard {
    #[cfg(feature = "clipboard")]
    clipboard: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardSink for SystemClipboard {
    #[cfg(feature = "clipboard")]
    fn set_text(&mut self, text: &str) -> Result<()> {
        if self.clipboard.is_none() {
            let opened = arboard::Clipboard::new().map_err(|e| FsError::Clipboard(e.to_string()))?;
            self.clipboard = Some(opened);
        }

        if let Some(clipboard) = self.clipboard.as_mut() {
            clipboard
                .set_text(text.to_string())
                .map_err(|e| FsError::Clipboard(e.to_string()))?;
        }

        tracing::debug!("Copied {} bytes to clipboard", text.len());
        Ok(())
    }

    #[cfg(not(feature = "clipboard"))]
    fn set_text(&mut self, _text: &str) -> Result<()> {
        Err(FsError::Clipboard("Clipboard support not enabled".into()))
    }
}
