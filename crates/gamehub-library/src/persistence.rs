//! Persistence capability consumed by the sync engine

use crate::{GameRecord, LibraryError, Platform};
use std::collections::HashSet;
use std::path::PathBuf;

/// Stores games per platform.
///
/// Each call is atomic for the single record it touches; the sync engine
/// assumes nothing about batching across calls.
pub trait PersistenceGateway {
    /// Every stored game for a platform
    fn load_games(&self, platform_id: i64) -> Result<HashSet<GameRecord>, LibraryError>;

    /// Store a new game
    fn insert(&self, game: &GameRecord) -> Result<(), LibraryError>;

    /// Delete a game by its `(platform_id, external_id)` identity
    fn delete(&self, game: &GameRecord) -> Result<(), LibraryError>;
}

/// Stores platform rows and user-set flags
pub trait CatalogStore {
    /// Every persisted platform row
    fn load_platforms(&self) -> Result<Vec<PlatformRow>, LibraryError>;

    /// Persist a platform and return its new id
    fn insert_platform(&self, platform: &Platform) -> Result<i64, LibraryError>;

    /// Enable or disable a platform
    fn set_platform_enabled(&self, id: i64, enabled: bool) -> Result<(), LibraryError>;

    /// Set or clear the favourite flag on a stored game
    fn set_favourite(
        &self,
        platform_id: i64,
        external_id: &str,
        favourite: bool,
    ) -> Result<(), LibraryError>;
}

/// A persisted platform configuration row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub path: PathBuf,
    pub is_active: bool,
}
