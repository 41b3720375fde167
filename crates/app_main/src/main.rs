//! Directory browser - terminal host for the navigation engine
//!
//! Main entry point.

mod app;
mod cli;

use anyhow::Result;
use app_core::BrowserConfig;
use clap::Parser;
use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging and panic hook first
    let _log_guard = app_log::init()?;

    // Clean up old logs (7 days)
    if let Err(e) = app_log::cleanup_old_logs(7) {
        tracing::warn!("Failed to cleanup old logs: {}", e);
    }

    tracing::info!("Directory browser starting...");

    // Load configuration
    let mut config = BrowserConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Invalid configuration, using defaults: {}", e);
        BrowserConfig::default()
    });
    cli.apply(&mut config);

    if cli.save_config {
        config.save()?;
    }

    if let Some(dir) = &cli.list {
        return app::print_listing(dir, &config);
    }

    if let Some(dir) = &cli.dump_icons {
        let written = app::dump_icons(dir)?;
        println!("Wrote {} icons to {}", written, dir.display());
        return Ok(());
    }

    app::run(&config)
}
