//! Application configuration

use crate::IconSize;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main browser configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Directory shown at start-up; the user's home when unset
    pub initial_directory: Option<PathBuf>,
    /// Start-up debounce before passive navigation events are honoured
    pub startup_delay_ms: u64,
    pub icon_size: IconSize,
    /// Draw a badge on cloud-only placeholders
    pub badge_cloud_only: bool,
    /// Folder-name keywords that mark cloud sync roots
    pub cloud_keywords: Vec<String>,
    /// List directories on a worker thread
    pub background_loading: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            initial_directory: None,
            startup_delay_ms: 500,
            icon_size: IconSize::Small,
            badge_cloud_only: true,
            cloud_keywords: app_fs::DEFAULT_CLOUD_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            background_loading: false,
        }
    }
}

impl BrowserConfig {
    /// Load configuration from file
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Self = toml::from_str(&content)?;
            tracing::info!("Configuration loaded from {:?}", config_path);
            Ok(config)
        } else {
            tracing::info!("Using default configuration");
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        tracing::info!("Configuration saved to {:?}", config_path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("com", "DirectoryBrowser", "DirectoryBrowser")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./config.toml"))
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    /// Start directory: configured, else home, else the filesystem root
    pub fn resolve_initial_directory(&self) -> PathBuf {
        self.initial_directory
            .clone()
            .or_else(|| directories::UserDirs::new().map(|d| d.home_dir().to_path_buf()))
            .unwrap_or_else(|| PathBuf::from(std::path::MAIN_SEPARATOR_STR))
    }

    pub fn cloud_probe(&self) -> app_fs::CloudStatusProbe {
        app_fs::CloudStatusProbe::with_keywords(&self.cloud_keywords)
    }
}
