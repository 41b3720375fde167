//! Panic hook for crash reporting
//!
//! Every panic becomes a [`CrashReport`] that goes to stderr, the tracing
//! log and a dump file in the temp directory.

use backtrace::Backtrace;
use chrono::{DateTime, Local};
use std::io;
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};

/// Initialize the panic hook for crash reporting
pub fn init_panic_hook() {
    std::panic::set_hook(Box::new(panic_handler));
    tracing::debug!("Panic hook initialized");
}

/// Everything recorded about one panic
#[derive(Debug, Clone)]
pub struct CrashReport {
    pub timestamp: DateTime<Local>,
    pub thread: String,
    pub location: Option<String>,
    pub message: String,
    pub backtrace: String,
}

impl CrashReport {
    /// Capture the current thread, location and stack for a panic
    pub fn from_panic(info: &PanicHookInfo) -> Self {
        Self {
            timestamp: Local::now(),
            thread: std::thread::current().name().unwrap_or("<unnamed>").to_string(),
            location: info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column())),
            message: payload_text(info).to_string(),
            backtrace: format!("{:?}", Backtrace::new()),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "=== CRITICAL PANIC ===\n\
             Timestamp: {}\n\
             Thread: {}\n\
             Location: {}\n\
             Message: {}\n\n\
             Stack Trace:\n{}",
            self.timestamp.to_rfc3339(),
            self.thread,
            self.location.as_deref().unwrap_or("<unknown>"),
            self.message,
            self.backtrace
        )
    }

    /// Write the rendered report into `dir`, returning the file path
    pub fn write_dump(&self, dir: &Path) -> io::Result<PathBuf> {
        let path = dir.join(format!(
            "directory_browser_crash_{}.txt",
            self.timestamp.format("%Y%m%d_%H%M%S")
        ));
        std::fs::write(&path, self.render())?;
        Ok(path)
    }
}

fn panic_handler(info: &PanicHookInfo) {
    let report = CrashReport::from_panic(info);
    let text = report.render();

    eprintln!("{}", text);
    // The file writer may already be gone
    tracing::error!("{}", text);

    let dump_path = match report.write_dump(&std::env::temp_dir()) {
        Ok(path) => Some(path),
        Err(e) => {
            eprintln!("Failed to write crash dump: {}", e);
            None
        }
    };

    #[cfg(windows)]
    show_error_dialog(dump_path.as_deref(), &report.message);
    #[cfg(not(windows))]
    let _ = dump_path;
}

/// Panic message for both `&str` and formatted `String` payloads
fn payload_text<'a>(info: &'a PanicHookInfo) -> &'a str {
    let payload = info.payload();
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<unknown>")
}

#[cfg(windows)]
fn show_error_dialog(dump_path: Option<&Path>, message: &str) {
    use windows::core::HSTRING;
    use windows::Win32::UI::WindowsAndMessaging::{MessageBoxW, MB_ICONERROR, MB_OK};

    let log_line = dump_path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<not written>".to_string());
    let msg = format!(
        "An unexpected error occurred.\n\n\
         Crash report: {}\n\n\
         Error: {}",
        log_line, message
    );

    unsafe {
        MessageBoxW(
            None,
            &HSTRING::from(msg),
            &HSTRING::from("Directory Browser - Fatal Error"),
            MB_ICONERROR | MB_OK,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CrashReport {
        CrashReport {
            timestamp: Local::now(),
            thread: "main".to_string(),
            location: Some("src/navigation.rs:10:5".to_string()),
            message: "listing vanished".to_string(),
            backtrace: "frame 0".to_string(),
        }
    }

    #[test]
    fn test_render_includes_details() {
        let text = sample().render();
        assert!(text.contains("Message: listing vanished"));
        assert!(text.contains("Thread: main"));
        assert!(text.contains("Location: src/navigation.rs:10:5"));
        assert!(text.ends_with("frame 0"));
    }

    #[test]
    fn test_render_without_location() {
        let report = CrashReport {
            location: None,
            ..sample()
        };
        assert!(report.render().contains("Location: <unknown>"));
    }

    #[test]
    fn test_write_dump() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample();
        let path = report.write_dump(dir.path()).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("directory_browser_crash_"));
        assert!(name.ends_with(".txt"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), report.render());
    }
}
