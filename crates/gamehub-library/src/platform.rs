//! Platform aggregate

use crate::launch::{GameLauncher, LaunchResult};
use crate::scanner::{self, PlatformScanner, ScanContext};
use crate::{GameRecord, LibraryError, TagIndex};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A source of games (Steam, GOG, ...) with its tag-indexed collection.
///
/// Real platforms have a positive id assigned by the database. Until a
/// default instance is persisted it carries [`Platform::UNPERSISTED_ID`]
/// and is not a reconciliation target.
pub struct Platform {
    id: i64,
    name: String,
    description: String,
    path: PathBuf,
    enabled: bool,
    games: TagIndex,
    scanner: Arc<dyn PlatformScanner>,
    launcher: Arc<dyn GameLauncher>,
}

impl Platform {
    /// Sentinel id for a platform that has no database row yet
    pub const UNPERSISTED_ID: i64 = -1;

    /// Create an enabled, unpersisted platform
    pub fn new(
        name: impl Into<String>,
        scanner: Arc<dyn PlatformScanner>,
        launcher: Arc<dyn GameLauncher>,
    ) -> Self {
        Self {
            id: Self::UNPERSISTED_ID,
            name: name.into(),
            description: String::new(),
            path: PathBuf::new(),
            enabled: true,
            games: TagIndex::new(),
            scanner,
            launcher,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether the platform has a database row
    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }

    /// Record the id the database assigned to this platform.
    ///
    /// Games already in the index are re-keyed to the new id.
    pub fn assign_id(&mut self, id: i64) {
        self.id = id;
        let games: Vec<(String, GameRecord)> = self
            .games
            .iter_games()
            .map(|g| (g.tag.clone(), g.clone()))
            .collect();
        self.games.clear();
        for (tag, mut game) in games {
            game.platform_id = id;
            self.games.insert(&tag, game);
        }
    }

    /// Read-only access to the tag index
    pub fn games(&self) -> &TagIndex {
        &self.games
    }

    /// Games under `tag`, creating the tag on first use
    pub fn tag_mut(&mut self, tag: &str) -> &mut HashSet<GameRecord> {
        self.games.get_or_create(tag)
    }

    /// Insert a game under `tag`. Returns false if it was already present.
    pub fn add_game(&mut self, tag: &str, game: GameRecord) -> bool {
        self.games.insert(tag, game)
    }

    /// Remove a game from `tag`. Returns false if it was not present.
    pub fn remove_game(&mut self, tag: &str, game: &GameRecord) -> bool {
        self.games.remove(tag, game)
    }

    /// Number of distinct games held
    pub fn game_count(&self) -> usize {
        self.games.game_count()
    }

    pub fn find_game(&self, external_id: &str) -> Option<&GameRecord> {
        self.games.find(external_id)
    }

    /// Flip the favourite flag on an indexed game. Returns false if unknown.
    pub fn set_favourite(&mut self, external_id: &str, favourite: bool) -> bool {
        match self.find_game(external_id) {
            Some(game) => {
                let updated = game.clone().with_favourite(favourite);
                self.games.replace(updated)
            }
            None => false,
        }
    }

    /// Shared handle to the scanner, for scans run off this thread
    pub fn scanner(&self) -> Arc<dyn PlatformScanner> {
        Arc::clone(&self.scanner)
    }

    /// Installed plus non-installed games. Does not touch the index.
    pub fn scan(&self, ctx: &ScanContext) -> Result<HashSet<GameRecord>, LibraryError> {
        tracing::debug!("Scanning platform {} ({})", self.name, self.id);
        scanner::scan_all(self.scanner.as_ref(), self.id, ctx)
            .map_err(|e| LibraryError::from_scan(self.id, e))
    }

    /// Start a game through this platform's launch routine
    pub fn launch(&self, game: &GameRecord) -> Result<LaunchResult, LibraryError> {
        self.launcher.launch(game)
    }

    pub fn compare_by_id(&self, other: &Platform) -> Ordering {
        self.id.cmp(&other.id)
    }

    pub fn compare_by_game_count(&self, other: &Platform) -> Ordering {
        self.game_count().cmp(&other.game_count())
    }
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("path", &self.path)
            .field("enabled", &self.enabled)
            .field("games", &self.game_count())
            .finish()
    }
}
