//! Reference platform backed by a plain directory tree
//!
//! Every file with a known extension under the root is an installed game,
//! grouped by its first-level subdirectory. A `catalog.toml` at the root
//! can list further owned games that are not on disk:
//!
//! ```toml
//! [[game]]
//! id = "shooters/quake.sh"
//! title = "Quake"
//! tag = "shooters"
//! ```

use crate::launch::GameLauncher;
use crate::scanner::{PlatformScanner, ScanContext, ScanError};
use crate::{GameRecord, Platform, PlatformFactory, PlatformRow};
use gamehub_config::ReferenceConfig;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const REFERENCE_PLATFORM_NAME: &str = "Reference";

/// Catalog of owned games, relative to the root
pub const CATALOG_FILE: &str = "catalog.toml";

/// Default root (`<data dir>/reference`)
pub fn default_root() -> PathBuf {
    gamehub_config::data_dir().join("reference")
}

#[derive(Debug, Default, Deserialize)]
struct Catalog {
    #[serde(default)]
    game: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    id: String,
    title: String,
    #[serde(default)]
    tag: Option<String>,
}

/// Reference scanner configuration
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Extensions (lowercase, no dot) treated as games
    pub extensions: HashSet<String>,

    /// Directories to skip
    pub skip_dirs: HashSet<String>,

    /// Skip hidden files/directories
    pub skip_hidden: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::from(&ReferenceConfig::default())
    }
}

impl From<&ReferenceConfig> for ScanConfig {
    fn from(config: &ReferenceConfig) -> Self {
        let extensions = config
            .extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect();

        let skip_dirs = ["saves", "screenshots", ".gamehub"]
            .iter()
            .map(|d| d.to_string())
            .collect();

        Self {
            extensions,
            skip_dirs,
            skip_hidden: true,
        }
    }
}

pub struct ReferenceScanner {
    root: PathBuf,
    config: ScanConfig,
}

impl ReferenceScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config(root, ScanConfig::default())
    }

    pub fn with_config(root: impl Into<PathBuf>, config: ScanConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scan_dir(
        &self,
        dir: &Path,
        platform_id: i64,
        ctx: &ScanContext,
        games: &mut HashSet<GameRecord>,
    ) -> Result<(), ScanError> {
        for entry in super::readable_entries(dir)? {
            ctx.checkpoint()?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();

            if self.config.skip_hidden && name.starts_with('.') {
                continue;
            }

            if path.is_dir() {
                if !self.config.skip_dirs.contains(&name.to_lowercase()) {
                    self.scan_dir(&path, platform_id, ctx, games)?;
                }
            } else if path.is_file()
                && let Some(ext) = path.extension().and_then(|e| e.to_str())
                && self.config.extensions.contains(&ext.to_lowercase())
                && let Some(game) = self.create_game(&path, platform_id)
            {
                games.insert(game);
            }
        }

        Ok(())
    }

    fn create_game(&self, path: &Path, platform_id: i64) -> Option<GameRecord> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let external_id = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let tag = if relative.components().count() > 1 {
            relative
                .components()
                .next()
                .map(|c| c.as_os_str().to_string_lossy().to_string())?
        } else {
            GameRecord::DEFAULT_TAG.to_string()
        };

        let stem = path.file_stem()?.to_string_lossy().to_string();

        Some(
            GameRecord::new(platform_id, external_id, clean_game_name(&stem))
                .with_alias(stem)
                .with_launch_command(path.to_string_lossy())
                .with_tag(tag),
        )
    }

    fn load_catalog(&self) -> Result<Catalog, ScanError> {
        let path = self.root.join(CATALOG_FILE);
        if !path.is_file() {
            return Ok(Catalog::default());
        }
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if super::is_inaccessible(&e) => {
                tracing::warn!("Skipping unreadable catalog {:?}: {}", path, e);
                return Ok(Catalog::default());
            }
            Err(e) => return Err(e.into()),
        };
        toml::from_str(&text).map_err(|e| ScanError::manifest(&path, e.to_string()))
    }
}

impl PlatformScanner for ReferenceScanner {
    fn installed_games(
        &self,
        platform_id: i64,
        ctx: &ScanContext,
    ) -> Result<HashSet<GameRecord>, ScanError> {
        let mut games = HashSet::new();
        if !self.root.is_dir() {
            tracing::debug!("Reference root {:?} not found", self.root);
            return Ok(games);
        }

        self.scan_dir(&self.root, platform_id, ctx, &mut games)?;
        Ok(games)
    }

    fn non_installed_games(
        &self,
        platform_id: i64,
        ctx: &ScanContext,
    ) -> Result<HashSet<GameRecord>, ScanError> {
        let mut games = HashSet::new();
        for entry in self.load_catalog()?.game {
            ctx.checkpoint()?;
            if self.root.join(&entry.id).is_file() {
                continue;
            }
            let tag = entry
                .tag
                .unwrap_or_else(|| GameRecord::DEFAULT_TAG.to_string());
            games.insert(
                GameRecord::new(platform_id, entry.id, entry.title)
                    .with_tag(tag)
                    .with_installed(false),
            );
        }
        Ok(games)
    }
}

/// Strip region, version and dump markers from a file name
pub fn clean_game_name(name: &str) -> String {
    let mut clean = name.replace('_', " ");

    // Drop every (...) and [...] group
    for (open, close) in [('(', ')'), ('[', ']')] {
        while let Some(start) = clean.find(open) {
            match clean[start..].find(close) {
                Some(len) => clean.replace_range(start..start + len + 1, ""),
                None => break,
            }
        }
    }

    let clean = clean.split_whitespace().collect::<Vec<_>>().join(" ");
    if clean.is_empty() {
        name.to_string()
    } else {
        clean
    }
}

pub struct ReferenceFactory {
    root: Option<PathBuf>,
    config: ScanConfig,
    launcher: Arc<dyn GameLauncher>,
}

impl ReferenceFactory {
    pub fn new(config: &ReferenceConfig, launcher: Arc<dyn GameLauncher>) -> Self {
        Self {
            root: config.path.clone(),
            config: ScanConfig::from(config),
            launcher,
        }
    }

    fn build(&self, root: PathBuf) -> Platform {
        Platform::new(
            REFERENCE_PLATFORM_NAME,
            Arc::new(ReferenceScanner::with_config(
                root.clone(),
                self.config.clone(),
            )),
            Arc::clone(&self.launcher),
        )
        .with_description("Games in a local directory")
        .with_path(root)
    }
}

impl PlatformFactory for ReferenceFactory {
    fn platform_name(&self) -> &str {
        REFERENCE_PLATFORM_NAME
    }

    fn create_default(&self) -> Platform {
        self.build(self.root.clone().unwrap_or_else(default_root))
    }

    fn create_from_database(&self, row: &PlatformRow) -> Platform {
        let root = match &self.root {
            Some(root) => root.clone(),
            None if !row.path.as_os_str().is_empty() => row.path.clone(),
            None => default_root(),
        };
        self.build(root)
            .with_id(row.id)
            .with_description(row.description.clone())
            .with_enabled(row.is_active)
    }
}
