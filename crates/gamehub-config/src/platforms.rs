//! Per-platform settings

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings shared by every platform variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Register this platform at startup
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Override the auto-detected install root
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

/// Reference platform settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub path: Option<PathBuf>,

    /// File extensions treated as installed games
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_extensions() -> Vec<String> {
    ["exe", "sh", "x86_64", "appimage", "game"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            extensions: default_extensions(),
        }
    }
}

/// All platform sections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformsConfig {
    #[serde(default)]
    pub steam: PlatformConfig,

    #[serde(default)]
    pub gog: PlatformConfig,

    #[serde(default)]
    pub reference: ReferenceConfig,
}
