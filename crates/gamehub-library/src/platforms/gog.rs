//! GOG platform
//!
//! Offline installers drop a `goggame-<id>.info` JSON file into each game's
//! install directory; that file is all we read.

use crate::launch::GameLauncher;
use crate::scanner::{PlatformScanner, ScanContext, ScanError};
use crate::{GameRecord, Platform, PlatformFactory, PlatformRow};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const GOG_PLATFORM_NAME: &str = "GOG";

pub const GOG_TAG: &str = "gog";

/// Default install root (`~/GOG Games`)
pub fn default_root() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join("GOG Games"))
}

/// Contents of `goggame-<id>.info`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    pub game_id: String,
    pub name: String,
    #[serde(default)]
    pub play_tasks: Vec<PlayTask>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayTask {
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl GameInfo {
    pub fn parse(path: &Path) -> Result<Self, ScanError> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| ScanError::manifest(path, e.to_string()))
    }

    /// Executable of the primary play task, falling back to the first file task
    pub fn primary_executable(&self) -> Option<&str> {
        let is_file = |t: &&PlayTask| t.kind.as_deref().is_none_or(|k| k == "FileTask");
        self.play_tasks
            .iter()
            .filter(is_file)
            .find(|t| t.is_primary)
            .or_else(|| self.play_tasks.iter().find(is_file))
            .and_then(|t| t.path.as_deref())
    }
}

/// Scans immediate subdirectories of the GOG root for info files
pub struct GogScanner {
    root: PathBuf,
}

impl GogScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn info_file(dir: &Path) -> Result<Option<PathBuf>, ScanError> {
        for entry in super::readable_entries(dir)? {
            let path = entry.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if name.starts_with("goggame-") && name.ends_with(".info") {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    fn to_record(
        platform_id: i64,
        install_dir: &Path,
        info: GameInfo,
        ctx: &ScanContext,
    ) -> GameRecord {
        let launch = match info.primary_executable() {
            Some(exe) => install_dir.join(exe),
            None => install_dir.join("start.sh"),
        };

        let icon = if ctx.expensive_icons {
            let icon = install_dir.join(format!("goggame-{}.ico", info.game_id));
            if icon.is_file() {
                icon.to_string_lossy().to_string()
            } else {
                String::new()
            }
        } else {
            String::new()
        };

        let alias = install_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        GameRecord::new(platform_id, info.game_id, info.name)
            .with_alias(alias)
            .with_launch_command(launch.to_string_lossy())
            .with_icon_path(icon)
            .with_tag(GOG_TAG)
    }
}

impl PlatformScanner for GogScanner {
    fn installed_games(
        &self,
        platform_id: i64,
        ctx: &ScanContext,
    ) -> Result<HashSet<GameRecord>, ScanError> {
        let mut games = HashSet::new();
        if !self.root.is_dir() {
            tracing::debug!("GOG root {:?} not found", self.root);
            return Ok(games);
        }

        for entry in super::readable_entries(&self.root)? {
            ctx.checkpoint()?;
            let dir = entry.path();
            if !dir.is_dir() {
                continue;
            }
            let Some(info_path) = Self::info_file(&dir)? else {
                continue;
            };
            match GameInfo::parse(&info_path) {
                Ok(info) => {
                    games.insert(Self::to_record(platform_id, &dir, info, ctx));
                }
                Err(ScanError::Io(e)) if super::is_inaccessible(&e) => {
                    tracing::warn!("Skipping unreadable {:?}: {}", info_path, e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(games)
    }

    /// Owned but uninstalled titles only come from the account API
    fn non_installed_games(
        &self,
        _platform_id: i64,
        _ctx: &ScanContext,
    ) -> Result<HashSet<GameRecord>, ScanError> {
        Ok(HashSet::new())
    }
}

pub struct GogFactory {
    root: Option<PathBuf>,
    launcher: Arc<dyn GameLauncher>,
}

impl GogFactory {
    pub fn new(root: Option<PathBuf>, launcher: Arc<dyn GameLauncher>) -> Self {
        Self { root, launcher }
    }

    fn build(&self, root: PathBuf) -> Platform {
        Platform::new(
            GOG_PLATFORM_NAME,
            Arc::new(GogScanner::new(root.clone())),
            Arc::clone(&self.launcher),
        )
        .with_description("GOG offline installers")
        .with_path(root)
    }
}

impl PlatformFactory for GogFactory {
    fn platform_name(&self) -> &str {
        GOG_PLATFORM_NAME
    }

    fn create_default(&self) -> Platform {
        let root = self.root.clone().or_else(default_root).unwrap_or_default();
        self.build(root)
    }

    fn create_from_database(&self, row: &PlatformRow) -> Platform {
        let root = match &self.root {
            Some(root) => root.clone(),
            None if !row.path.as_os_str().is_empty() => row.path.clone(),
            None => default_root().unwrap_or_default(),
        };
        self.build(root)
            .with_id(row.id)
            .with_description(row.description.clone())
            .with_enabled(row.is_active)
    }
}
