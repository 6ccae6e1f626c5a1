//! Steam platform

use super::vdf::{self, KvValue};
use crate::launch::GameLauncher;
use crate::scanner::{PlatformScanner, ScanContext, ScanError};
use crate::{GameRecord, Platform, PlatformFactory, PlatformRow};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const STEAM_PLATFORM_NAME: &str = "Steam";

/// Tag given to every Steam game
pub const STEAM_TAG: &str = "steam";

/// `StateFlags` bit set once an app is fully installed
const STATE_FULLY_INSTALLED: u32 = 4;

/// Locate the Steam root directory
pub fn detect_root() -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".steam").join("steam"));
        candidates.push(home.join(".local").join("share").join("Steam"));
    }
    if let Some(data) = dirs::data_dir() {
        candidates.push(data.join("Steam"));
    }

    candidates.into_iter().find(|path| path.join("steamapps").is_dir())
}

/// One `appmanifest_<appid>.acf`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppManifest {
    pub app_id: String,
    pub name: String,
    pub install_dir: String,
    pub state_flags: u32,
}

impl AppManifest {
    pub fn parse(path: &Path) -> Result<Self, ScanError> {
        let doc = vdf::load(path)?;
        let state = doc
            .section("AppState")
            .ok_or_else(|| ScanError::manifest(path, "missing AppState section"))?;

        let app_id = state
            .get_str("appid")
            .ok_or_else(|| ScanError::manifest(path, "missing appid"))?
            .to_string();
        let state_flags = match state.get_str("StateFlags") {
            Some(flags) => flags
                .parse()
                .map_err(|_| ScanError::manifest(path, format!("bad StateFlags '{flags}'")))?,
            None => 0,
        };

        Ok(Self {
            name: state.get_str("name").unwrap_or(&app_id).to_string(),
            install_dir: state.get_str("installdir").unwrap_or_default().to_string(),
            app_id,
            state_flags,
        })
    }

    pub fn is_installed(&self) -> bool {
        self.state_flags & STATE_FULLY_INSTALLED != 0
    }
}

/// Scans Steam library folders for app manifests
pub struct SteamScanner {
    root: Option<PathBuf>,
}

impl SteamScanner {
    /// `None` means auto-detect on every scan
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    fn root(&self) -> Option<PathBuf> {
        self.root.clone().or_else(detect_root)
    }

    /// The root plus every extra library listed in `libraryfolders.vdf`
    pub fn library_folders(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
        let mut folders = vec![root.to_path_buf()];

        let file = [
            root.join("steamapps").join("libraryfolders.vdf"),
            root.join("config").join("libraryfolders.vdf"),
        ]
        .into_iter()
        .find(|p| p.is_file());
        let Some(file) = file else {
            return Ok(folders);
        };

        let doc = match vdf::load(&file) {
            Ok(doc) => doc,
            Err(ScanError::Io(e)) if super::is_inaccessible(&e) => {
                tracing::warn!("Skipping unreadable {:?}: {}", file, e);
                return Ok(folders);
            }
            Err(e) => return Err(e),
        };
        let Some((_, KvValue::Section(entries))) = doc.iter().next() else {
            return Ok(folders);
        };

        for (key, value) in entries.iter() {
            let path = match value {
                KvValue::Section(folder) => folder.get_str("path").map(PathBuf::from),
                // Older format: "1" "/mnt/games/steam"
                KvValue::String(path) if key.parse::<u32>().is_ok() => Some(PathBuf::from(path)),
                KvValue::String(_) => None,
            };
            if let Some(path) = path
                && !folders.contains(&path)
            {
                folders.push(path);
            }
        }

        Ok(folders)
    }

    fn manifests(root: &Path, ctx: &ScanContext) -> Result<Vec<AppManifest>, ScanError> {
        let mut manifests = Vec::new();
        for folder in Self::library_folders(root)? {
            let steamapps = folder.join("steamapps");
            if !steamapps.is_dir() {
                tracing::debug!("Skipping missing Steam library {:?}", folder);
                continue;
            }

            for entry in super::readable_entries(&steamapps)? {
                ctx.checkpoint()?;
                let path = entry.path();
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
                if !(name.starts_with("appmanifest_") && name.ends_with(".acf")) {
                    continue;
                }
                match AppManifest::parse(&path) {
                    Ok(app) => manifests.push(app),
                    Err(ScanError::Io(e)) if super::is_inaccessible(&e) => {
                        tracing::warn!("Skipping unreadable {:?}: {}", path, e);
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        Ok(manifests)
    }

    fn icon_for(root: &Path, app_id: &str, ctx: &ScanContext) -> String {
        if !ctx.expensive_icons {
            return String::new();
        }

        let cache = root.join("appcache").join("librarycache");
        [
            cache.join(format!("{app_id}_icon.jpg")),
            cache.join(app_id).join("icon.jpg"),
            cache.join(app_id).join("logo.png"),
        ]
        .into_iter()
        .find(|p| p.is_file())
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default()
    }

    fn to_record(
        root: &Path,
        platform_id: i64,
        app: AppManifest,
        ctx: &ScanContext,
    ) -> GameRecord {
        let icon = Self::icon_for(root, &app.app_id, ctx);
        let installed = app.is_installed();
        GameRecord::new(platform_id, app.app_id.clone(), app.name)
            .with_alias(app.install_dir)
            .with_launch_command(format!("steam://rungameid/{}", app.app_id))
            .with_icon_path(icon)
            .with_tag(STEAM_TAG)
            .with_installed(installed)
    }

    /// Records for every manifest, or only those whose install state is `installed`
    fn collect(
        &self,
        platform_id: i64,
        ctx: &ScanContext,
        installed: Option<bool>,
    ) -> Result<HashSet<GameRecord>, ScanError> {
        let mut games = HashSet::new();
        let Some(root) = self.root() else {
            tracing::debug!("Steam root not found");
            return Ok(games);
        };

        for app in Self::manifests(&root, ctx)? {
            if installed.is_none_or(|wanted| app.is_installed() == wanted) {
                ctx.checkpoint()?;
                games.insert(Self::to_record(&root, platform_id, app, ctx));
            }
        }
        Ok(games)
    }
}

impl PlatformScanner for SteamScanner {
    fn installed_games(
        &self,
        platform_id: i64,
        ctx: &ScanContext,
    ) -> Result<HashSet<GameRecord>, ScanError> {
        self.collect(platform_id, ctx, Some(true))
    }

    fn non_installed_games(
        &self,
        platform_id: i64,
        ctx: &ScanContext,
    ) -> Result<HashSet<GameRecord>, ScanError> {
        self.collect(platform_id, ctx, Some(false))
    }

    /// One pass over the manifests; each record carries its own install state
    fn all_games(
        &self,
        platform_id: i64,
        ctx: &ScanContext,
    ) -> Result<HashSet<GameRecord>, ScanError> {
        self.collect(platform_id, ctx, None)
    }
}

pub struct SteamFactory {
    root: Option<PathBuf>,
    launcher: Arc<dyn GameLauncher>,
}

impl SteamFactory {
    pub fn new(root: Option<PathBuf>, launcher: Arc<dyn GameLauncher>) -> Self {
        Self { root, launcher }
    }

    fn build(&self, root: Option<PathBuf>) -> Platform {
        let path = root.clone().or_else(detect_root).unwrap_or_default();
        Platform::new(
            STEAM_PLATFORM_NAME,
            Arc::new(SteamScanner::new(root)),
            Arc::clone(&self.launcher),
        )
        .with_description("Steam games")
        .with_path(path)
    }
}

impl PlatformFactory for SteamFactory {
    fn platform_name(&self) -> &str {
        STEAM_PLATFORM_NAME
    }

    fn create_default(&self) -> Platform {
        self.build(self.root.clone())
    }

    fn create_from_database(&self, row: &PlatformRow) -> Platform {
        let root = self
            .root
            .clone()
            .or_else(|| Some(row.path.clone()).filter(|p| !p.as_os_str().is_empty()));
        self.build(root)
            .with_id(row.id)
            .with_description(row.description.clone())
            .with_enabled(row.is_active)
    }
}
