//! Command line options

use app_core::{BrowserConfig, IconSize};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "directory_browser", version, about = "Browse directories from the terminal")]
pub struct Cli {
    /// Directory to open instead of the configured one
    pub directory: Option<PathBuf>,

    /// Print the listing of DIR as JSON and exit
    #[arg(long, value_name = "DIR", conflicts_with = "dump_icons")]
    pub list: Option<PathBuf>,

    /// Write the synthesized icons as PNG files into DIR and exit
    #[arg(long, value_name = "DIR")]
    pub dump_icons: Option<PathBuf>,

    /// List directories on a worker thread
    #[arg(long)]
    pub background: bool,

    /// Start-up debounce in milliseconds
    #[arg(long, value_name = "MS")]
    pub startup_delay_ms: Option<u64>,

    /// Use 32px icons
    #[arg(long)]
    pub large_icons: bool,

    /// Persist the effective configuration
    #[arg(long)]
    pub save_config: bool,
}

impl Cli {
    /// Overlay command line options on the loaded configuration
    pub fn apply(&self, config: &mut BrowserConfig) {
        if let Some(dir) = &self.directory {
            config.initial_directory = Some(dir.clone());
        }
        if let Some(ms) = self.startup_delay_ms {
            config.startup_delay_ms = ms;
        }
        if self.background {
            config.background_loading = true;
        }
        if self.large_icons {
            config.icon_size = IconSize::Large;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "directory_browser",
            "/srv",
            "--background",
            "--startup-delay-ms",
            "50",
            "--large-icons",
        ]);
        let mut config = BrowserConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.initial_directory, Some(PathBuf::from("/srv")));
        assert_eq!(config.startup_delay_ms, 50);
        assert!(config.background_loading);
        assert_eq!(config.icon_size, IconSize::Large);
    }

    #[test]
    fn test_defaults_leave_config() {
        let cli = Cli::parse_from(["directory_browser"]);
        let mut config = BrowserConfig::default();
        cli.apply(&mut config);
        assert_eq!(config, BrowserConfig::default());
    }

    #[test]
    fn test_list_conflicts_with_dump() {
        let parsed = Cli::try_parse_from(["directory_browser", "--list", "a", "--dump-icons", "b"]);
        assert!(parsed.is_err());
    }
}
