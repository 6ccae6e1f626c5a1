//! Configuration management for GameHub
//!
//! Handles the library database location, scan behaviour, per-platform
//! settings and logging. Config files are TOML; a user file is layered
//! over the system-wide one.

mod platforms;

pub use platforms::{PlatformConfig, PlatformsConfig, ReferenceConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// System-wide configuration directory
pub const SYSTEM_CONFIG_DIR: &str = "/etc/gamehub";

/// Name of the config file inside a config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Per-user configuration directory (`~/.config/gamehub` on Linux)
pub fn user_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gamehub"))
}

/// Per-user data directory holding the database and reference library
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("gamehub"))
        .unwrap_or_else(|| PathBuf::from(".gamehub"))
}

/// Library storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// SQLite database holding platforms and games
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

fn default_database_path() -> PathBuf {
    data_dir().join("library.db")
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Scan behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Extract icons even when it requires extra filesystem work
    #[serde(default)]
    pub expensive_icons: bool,

    /// Scan different platforms concurrently
    #[serde(default = "default_true")]
    pub parallel: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            expensive_icons: false,
            parallel: true,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing-subscriber` env-filter directive
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

/// Main GameHub configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameHubConfig {
    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub platforms: PlatformsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GameHubConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the system file and overlay the user file on top of it.
    ///
    /// Missing files are skipped; if neither exists the defaults are returned.
    pub fn load_layered(system: &Path, user: &Path) -> Result<Self, ConfigError> {
        let mut merged = toml::Value::Table(toml::Table::new());

        for path in [system, user] {
            if !path.exists() {
                continue;
            }
            let contents = std::fs::read_to_string(path)?;
            let layer: toml::Value = toml::from_str(&contents)?;
            tracing::debug!("Applying configuration layer {}", path.display());
            merge_toml(&mut merged, layer);
        }

        let config: Self = merged.try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load_default() -> Result<Self, ConfigError> {
        let system_config = Path::new(SYSTEM_CONFIG_DIR).join(CONFIG_FILE_NAME);
        let user_config = user_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME));

        let user_exists = user_config.as_ref().is_some_and(|p| p.exists());
        if !user_exists && !system_config.exists() {
            tracing::warn!("No configuration file found, using defaults");
            return Ok(Self::default());
        }

        match user_config {
            Some(user) => Self::load_layered(&system_config, &user),
            None => Self::load(&system_config),
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        tracing::info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values that would make scanning or logging meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.filter must not be empty".into()));
        }
        if self.platforms.reference.extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "platforms.reference.extensions must list at least one extension".into(),
            ));
        }
        Ok(())
    }
}

/// Helper function to merge TOML values
pub fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                if let Some(base_value) = base_table.get_mut(&key) {
                    merge_toml(base_value, value);
                } else {
                    base_table.insert(key, value);
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
