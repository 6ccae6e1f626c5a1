//! Mock collaborators for testing without real launchers or a database
//!
//! These stand in for a platform's scanner, the persistence layer and the
//! launch routine, so the sync engine and the library facade can be
//! exercised with scripted results and injected failures.
//!
//! # Usage
//!
//! ```
//! use gamehub_library::mock::{MemoryGateway, MockScanner};
//! use gamehub_library::GameRecord;
//!
//! let scanner = MockScanner::new().with_installed(vec![GameRecord::new(1, "a", "A")]);
//! let gateway = MemoryGateway::new();
//! gateway.fail_on(1, "b");
//! ```

use crate::factory::PlatformFactory;
use crate::launch::{GameLauncher, LaunchResult};
use crate::persistence::{CatalogStore, PersistenceGateway, PlatformRow};
use crate::scanner::{PlatformScanner, ScanContext, ScanError};
use crate::{GameKey, GameRecord, LibraryError, Platform};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Scanner returning scripted results
#[derive(Debug, Default)]
pub struct MockScanner {
    installed: Mutex<Vec<GameRecord>>,
    non_installed: Mutex<Vec<GameRecord>>,
    fault: Mutex<Option<String>>,
    scans: AtomicUsize,
}

impl MockScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_installed(self, games: Vec<GameRecord>) -> Self {
        self.set_installed(games);
        self
    }

    pub fn with_non_installed(self, games: Vec<GameRecord>) -> Self {
        self.set_non_installed(games);
        self
    }

    /// Make every scan fail with a corrupt-data fault
    pub fn with_fault(self, reason: impl Into<String>) -> Self {
        self.set_fault(Some(reason.into()));
        self
    }

    pub fn set_installed(&self, games: Vec<GameRecord>) {
        *lock(&self.installed) = games;
    }

    pub fn set_non_installed(&self, games: Vec<GameRecord>) {
        *lock(&self.non_installed) = games;
    }

    pub fn set_fault(&self, reason: Option<String>) {
        *lock(&self.fault) = reason;
    }

    /// Number of `installed_games` calls so far
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    fn emit(
        &self,
        games: &Mutex<Vec<GameRecord>>,
        platform_id: i64,
        ctx: &ScanContext,
    ) -> Result<HashSet<GameRecord>, ScanError> {
        if let Some(reason) = lock(&self.fault).clone() {
            return Err(ScanError::Fault(reason));
        }

        let mut found = HashSet::new();
        for game in lock(games).iter() {
            ctx.checkpoint()?;
            let mut game = game.clone();
            game.platform_id = platform_id;
            found.insert(game);
        }
        Ok(found)
    }
}

impl PlatformScanner for MockScanner {
    fn installed_games(
        &self,
        platform_id: i64,
        ctx: &ScanContext,
    ) -> Result<HashSet<GameRecord>, ScanError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        self.emit(&self.installed, platform_id, ctx)
    }

    fn non_installed_games(
        &self,
        platform_id: i64,
        ctx: &ScanContext,
    ) -> Result<HashSet<GameRecord>, ScanError> {
        self.emit(&self.non_installed, platform_id, ctx)
    }
}

/// In-memory persistence with per-record failure injection
#[derive(Debug, Default)]
pub struct MemoryGateway {
    games: Mutex<HashMap<GameKey, GameRecord>>,
    platforms: Mutex<BTreeMap<i64, PlatformRow>>,
    failing: Mutex<HashSet<GameKey>>,
    inserts: AtomicUsize,
    deletes: AtomicUsize,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate stored games
    pub fn with_games(self, games: Vec<GameRecord>) -> Self {
        {
            let mut stored = lock(&self.games);
            for game in games {
                stored.insert(game.key(), game);
            }
        }
        self
    }

    /// Make inserts and deletes of this key fail
    pub fn fail_on(&self, platform_id: i64, external_id: &str) {
        lock(&self.failing).insert(GameKey {
            platform_id,
            external_id: external_id.to_string(),
        });
    }

    pub fn clear_failures(&self) {
        lock(&self.failing).clear();
    }

    /// Stored games for a platform, without going through the trait
    pub fn stored(&self, platform_id: i64) -> HashSet<GameRecord> {
        lock(&self.games)
            .values()
            .filter(|g| g.platform_id == platform_id)
            .cloned()
            .collect()
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn check(&self, game: &GameRecord) -> Result<(), LibraryError> {
        if lock(&self.failing).contains(&game.key()) {
            return Err(LibraryError::Database(format!("injected failure for {}", game.key())));
        }
        Ok(())
    }
}

impl PersistenceGateway for MemoryGateway {
    fn load_games(&self, platform_id: i64) -> Result<HashSet<GameRecord>, LibraryError> {
        Ok(self.stored(platform_id))
    }

    fn insert(&self, game: &GameRecord) -> Result<(), LibraryError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.check(game)?;

        let mut games = lock(&self.games);
        if games.contains_key(&game.key()) {
            return Err(LibraryError::Database(format!("duplicate game {}", game.key())));
        }
        games.insert(game.key(), game.clone());
        Ok(())
    }

    fn delete(&self, game: &GameRecord) -> Result<(), LibraryError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check(game)?;

        lock(&self.games)
            .remove(&game.key())
            .map(|_| ())
            .ok_or_else(|| LibraryError::GameNotFound(game.key().to_string()))
    }
}

impl CatalogStore for MemoryGateway {
    fn load_platforms(&self) -> Result<Vec<PlatformRow>, LibraryError> {
        Ok(lock(&self.platforms).values().cloned().collect())
    }

    fn insert_platform(&self, platform: &Platform) -> Result<i64, LibraryError> {
        let mut platforms = lock(&self.platforms);
        if platforms.values().any(|row| row.name == platform.name()) {
            return Err(LibraryError::Database(format!(
                "duplicate platform {}",
                platform.name()
            )));
        }

        let id = platforms.keys().next_back().copied().unwrap_or(0) + 1;
        platforms.insert(
            id,
            PlatformRow {
                id,
                name: platform.name().to_string(),
                description: platform.description().to_string(),
                path: platform.path().to_path_buf(),
                is_active: platform.is_enabled(),
            },
        );
        Ok(id)
    }

    fn set_platform_enabled(&self, id: i64, enabled: bool) -> Result<(), LibraryError> {
        let mut platforms = lock(&self.platforms);
        let row = platforms
            .get_mut(&id)
            .ok_or_else(|| LibraryError::PlatformNotFound(id.to_string()))?;
        row.is_active = enabled;
        Ok(())
    }

    fn set_favourite(
        &self,
        platform_id: i64,
        external_id: &str,
        favourite: bool,
    ) -> Result<(), LibraryError> {
        let key = GameKey {
            platform_id,
            external_id: external_id.to_string(),
        };
        let mut games = lock(&self.games);
        let game = games
            .get_mut(&key)
            .ok_or_else(|| LibraryError::GameNotFound(key.to_string()))?;
        game.favourite = favourite;
        Ok(())
    }
}

/// Launcher that records launch commands instead of spawning processes
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    launched: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A launcher whose every launch fails
    pub fn failing() -> Self {
        Self {
            launched: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn launched(&self) -> Vec<String> {
        lock(&self.launched).clone()
    }
}

impl GameLauncher for RecordingLauncher {
    fn launch(&self, game: &GameRecord) -> Result<LaunchResult, LibraryError> {
        if self.fail {
            return Err(LibraryError::Launch(format!("refusing to launch {}", game)));
        }

        let mut launched = lock(&self.launched);
        launched.push(game.launch_command.clone());
        Ok(LaunchResult {
            pid: launched.len() as u32,
            program: PathBuf::from(&game.launch_command),
            child: None,
        })
    }
}

/// Factory producing platforms backed by a shared [`MockScanner`]
pub struct MockFactory {
    name: String,
    scanner: Arc<MockScanner>,
    launcher: Arc<RecordingLauncher>,
}

impl MockFactory {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_scanner(name, Arc::new(MockScanner::new()))
    }

    pub fn with_scanner(name: impl Into<String>, scanner: Arc<MockScanner>) -> Self {
        Self {
            name: name.into(),
            scanner,
            launcher: Arc::new(RecordingLauncher::new()),
        }
    }

    pub fn scanner(&self) -> Arc<MockScanner> {
        Arc::clone(&self.scanner)
    }

    pub fn launcher(&self) -> Arc<RecordingLauncher> {
        Arc::clone(&self.launcher)
    }
}

impl PlatformFactory for MockFactory {
    fn platform_name(&self) -> &str {
        &self.name
    }

    fn create_default(&self) -> Platform {
        Platform::new(
            self.name.clone(),
            self.scanner.clone(),
            self.launcher.clone(),
        )
        .with_description(format!("{} (mock)", self.name))
    }

    fn create_from_database(&self, row: &PlatformRow) -> Platform {
        Platform::new(row.name.clone(), self.scanner.clone(), self.launcher.clone())
            .with_id(row.id)
            .with_description(row.description.clone())
            .with_path(row.path.clone())
            .with_enabled(row.is_active)
    }
}
