//! Integration tests running the built-in platforms against fixture trees

use gamehub_config::PlatformsConfig;
use gamehub_library::mock::RecordingLauncher;
use gamehub_library::platforms::{self, GOG_PLATFORM_NAME, REFERENCE_PLATFORM_NAME, STEAM_PLATFORM_NAME};
use gamehub_library::{GameDatabase, GameLauncher, Library, ScanContext, SpecialPlatformType};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Fake Steam, GOG and reference installs under one temp directory
struct FixtureEnv {
    temp_dir: TempDir,
    steam: PathBuf,
    gog: PathBuf,
    reference: PathBuf,
}

impl FixtureEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let steam = temp_dir.path().join("steam");
        let gog = temp_dir.path().join("gog");
        let reference = temp_dir.path().join("reference");

        fs::create_dir_all(steam.join("steamapps")).unwrap();
        fs::create_dir_all(&gog).unwrap();
        fs::create_dir_all(&reference).unwrap();

        Self {
            temp_dir,
            steam,
            gog,
            reference,
        }
    }

    fn db_path(&self) -> PathBuf {
        self.temp_dir.path().join("data").join("library.db")
    }

    fn config(&self) -> PlatformsConfig {
        let mut config = PlatformsConfig::default();
        config.steam.path = Some(self.steam.clone());
        config.gog.path = Some(self.gog.clone());
        config.reference.path = Some(self.reference.clone());
        config
    }

    fn steam_app(&self, id: &str, name: &str, flags: u32) {
        fs::write(
            self.steam.join("steamapps").join(format!("appmanifest_{id}.acf")),
            format!(
                "\"AppState\"\n{{\n\t\"appid\"\t\t\"{id}\"\n\t\"name\"\t\t\"{name}\"\n\t\"StateFlags\"\t\t\"{flags}\"\n\t\"installdir\"\t\t\"{name}\"\n}}\n"
            ),
        )
        .unwrap();
    }

    fn gog_game(&self, dir: &str, id: &str, name: &str) {
        let game_dir = self.gog.join(dir);
        fs::create_dir_all(&game_dir).unwrap();
        fs::write(
            game_dir.join(format!("goggame-{id}.info")),
            format!(
                r#"{{"gameId":"{id}","name":"{name}","playTasks":[{{"isPrimary":true,"path":"start.sh","type":"FileTask"}}]}}"#
            ),
        )
        .unwrap();
    }

    fn reference_game(&self, relative: &str) -> PathBuf {
        let path = self.reference.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"#!/bin/sh\n").unwrap();
        path
    }

    fn open(&self, launcher: Arc<dyn GameLauncher>) -> Library<GameDatabase> {
        let registry = platforms::builtin_registry(&self.config(), launcher);
        let db = GameDatabase::open(self.db_path()).unwrap();
        Library::open(db, &registry).unwrap()
    }
}

fn titles(library: &Library<GameDatabase>, platform: &str) -> Vec<String> {
    let mut titles: Vec<String> = library
        .platform_by_name(platform)
        .unwrap()
        .games()
        .iter_games()
        .map(|g| g.title.clone())
        .collect();
    titles.sort();
    titles
}

#[tokio::test]
async fn test_scan_all_builtin_platforms() {
    let env = FixtureEnv::new();
    env.steam_app("440", "Team Fortress 2", 4);
    env.steam_app("570", "Dota 2", 0);
    env.gog_game("Unreal", "1207658924", "Unreal Tournament");
    env.reference_game("shooters/quake (v1.08).sh");

    let mut library = env.open(Arc::new(RecordingLauncher::new()));
    assert_eq!(library.platforms().len(), 3);

    let outcomes = library.scan_all(&ScanContext::default()).await;
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|o| o.result.is_ok()));

    assert_eq!(
        titles(&library, STEAM_PLATFORM_NAME),
        vec!["Dota 2", "Team Fortress 2"]
    );
    assert_eq!(titles(&library, GOG_PLATFORM_NAME), vec!["Unreal Tournament"]);
    assert_eq!(titles(&library, REFERENCE_PLATFORM_NAME), vec!["quake"]);

    let steam = library.platform_by_name(STEAM_PLATFORM_NAME).unwrap();
    assert!(!steam.find_game("570").unwrap().installed);
    assert!(steam.find_game("440").unwrap().installed);
}

#[tokio::test]
async fn test_sequential_scan_matches_parallel() {
    let env = FixtureEnv::new();
    env.steam_app("440", "Team Fortress 2", 4);
    env.reference_game("doom.sh");

    let mut library = env
        .open(Arc::new(RecordingLauncher::new()))
        .with_parallel_scans(false);
    let outcomes = library.scan_all(&ScanContext::default()).await;

    let added: usize = outcomes
        .iter()
        .map(|o| o.result.as_ref().map(|r| r.added.len()).unwrap_or(0))
        .sum();
    assert_eq!(added, 2);
}

#[test]
fn test_library_survives_restart() {
    let env = FixtureEnv::new();
    env.reference_game("rpg/morrowind.sh");
    env.reference_game("doom.sh");

    {
        let mut library = env.open(Arc::new(RecordingLauncher::new()));
        library
            .scan_platform(REFERENCE_PLATFORM_NAME, &ScanContext::default())
            .unwrap();
        library
            .set_favourite(REFERENCE_PLATFORM_NAME, "rpg/morrowind.sh", true)
            .unwrap();
    }

    let library = env.open(Arc::new(RecordingLauncher::new()));
    let reference = library.platform_by_name(REFERENCE_PLATFORM_NAME).unwrap();
    assert_eq!(reference.game_count(), 2);
    assert_eq!(reference.games().tags(), vec!["default", "rpg"]);
    assert_eq!(library.favourites().game_count(), 1);

    // Platform ids are stable across restarts
    let ids: Vec<i64> = library.platforms().iter().map(|p| p.id()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn test_removed_file_is_dropped_on_rescan() {
    let env = FixtureEnv::new();
    let doom = env.reference_game("doom.sh");
    env.reference_game("quake.sh");

    let mut library = env.open(Arc::new(RecordingLauncher::new()));
    let ctx = ScanContext::default();
    library.scan_platform(REFERENCE_PLATFORM_NAME, &ctx).unwrap();

    fs::remove_file(&doom).unwrap();
    let report = library.scan_platform(REFERENCE_PLATFORM_NAME, &ctx).unwrap();
    assert_eq!(report.removed.len(), 1);
    assert_eq!(titles(&library, REFERENCE_PLATFORM_NAME), vec!["quake"]);
}

#[test]
fn test_launch_and_search_through_library() {
    let env = FixtureEnv::new();
    env.steam_app("440", "Team Fortress 2", 4);
    let quake = env.reference_game("quake.sh");

    let launcher = Arc::new(RecordingLauncher::new());
    let mut library = env.open(launcher.clone());
    let ctx = ScanContext::default();
    library.scan_platform(STEAM_PLATFORM_NAME, &ctx).unwrap();
    library.scan_platform(REFERENCE_PLATFORM_NAME, &ctx).unwrap();

    library.launch(STEAM_PLATFORM_NAME, "440").unwrap();
    library.launch(REFERENCE_PLATFORM_NAME, "quake.sh").unwrap();
    assert_eq!(
        launcher.launched(),
        vec![
            "steam://rungameid/440".to_string(),
            quake.to_string_lossy().to_string()
        ]
    );

    assert_eq!(library.search("FORTRESS").len(), 1);
    let search = library
        .entries()
        .into_iter()
        .find(|e| e.id() == SpecialPlatformType::Search.id())
        .unwrap();
    assert_eq!(search.game_count(), 1);
}

#[test]
fn test_disabled_platform_is_not_searched() {
    let env = FixtureEnv::new();
    env.reference_game("quake.sh");

    let mut library = env.open(Arc::new(RecordingLauncher::new()));
    library
        .scan_platform(REFERENCE_PLATFORM_NAME, &ScanContext::default())
        .unwrap();
    assert_eq!(library.search("quake").len(), 1);

    library.set_enabled(REFERENCE_PLATFORM_NAME, false).unwrap();
    assert!(library.search("quake").is_empty());
}

#[test]
fn test_missing_install_roots_yield_empty_scans() {
    let env = FixtureEnv::new();
    let mut config = env.config();
    config.gog.path = Some(Path::new("/nonexistent/gog").to_path_buf());

    let registry = platforms::builtin_registry(&config, Arc::new(RecordingLauncher::new()));
    let mut library = Library::open(GameDatabase::in_memory().unwrap(), &registry).unwrap();
    let report = library
        .scan_platform(GOG_PLATFORM_NAME, &ScanContext::default())
        .unwrap();
    assert!(report.is_noop());
}

#[cfg(unix)]
#[test]
fn test_unreadable_folder_does_not_fail_platform() {
    use std::os::unix::fs::PermissionsExt;

    let env = FixtureEnv::new();
    env.reference_game("quake.sh");
    let private = env.reference.join("private");
    fs::create_dir(&private).unwrap();
    fs::set_permissions(&private, fs::Permissions::from_mode(0o000)).unwrap();

    let mut library = env.open(Arc::new(RecordingLauncher::new()));
    let result = library.scan_platform(REFERENCE_PLATFORM_NAME, &ScanContext::default());
    fs::set_permissions(&private, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(result.unwrap().added.len(), 1);
    assert_eq!(titles(&library, REFERENCE_PLATFORM_NAME), vec!["quake"]);
}
