//! Directory browser logging & observability
//!
//! Provides structured logging, panic handling, crash reports, and deadlock detection.

mod logging;
mod panic_hook;

pub use logging::{cleanup_logs_in, cleanup_old_logs, init_logging};
pub use panic_hook::{init_panic_hook, CrashReport};
pub use tracing_appender::non_blocking::WorkerGuard;

use directories::ProjectDirs;
use std::path::PathBuf;

/// Get the application log directory
pub fn log_dir() -> PathBuf {
    ProjectDirs::from("com", "DirectoryBrowser", "DirectoryBrowser")
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Initialize all observability features.
/// The returned guard flushes the log file when dropped; hold it until exit.
pub fn init() -> anyhow::Result<WorkerGuard> {
    let guard = init_logging()?;
    init_panic_hook();

    #[cfg(debug_assertions)]
    init_deadlock_detector();

    Ok(guard)
}

#[cfg(debug_assertions)]
fn init_deadlock_detector() {
    use std::thread;
    use std::time::Duration;

    let spawned = thread::Builder::new()
        .name("deadlock-detector".into())
        .spawn(|| loop {
            thread::sleep(Duration::from_secs(10));
            let deadlocks = parking_lot::deadlock::check_deadlock();
            if !deadlocks.is_empty() {
                tracing::error!("Deadlock detected!");
                for (i, threads) in deadlocks.iter().enumerate() {
                    tracing::error!("Deadlock #{}", i);
                    for t in threads {
                        tracing::error!("Thread Id {:#?}", t.thread_id());
                        tracing::error!("{:#?}", t.backtrace());
                    }
                }
            }
        });

    if let Err(e) = spawned {
        tracing::warn!("Deadlock detector unavailable: {}", e);
    }
}
