//! Game library service for GameHub
//!
//! Aggregates games from several storefronts and launchers (Steam, GOG,
//! plain directories) into one catalog. Each platform scans the host for
//! games; the sync engine reconciles those scans with the SQLite store and
//! the in-memory tag index.

mod database;
mod factory;
mod game;
mod launch;
mod library;
mod persistence;
mod platform;
pub mod platforms;
mod scanner;
mod special;
mod sync;
mod tag_index;

pub mod mock;

pub use database::GameDatabase;
pub use factory::{PlatformFactory, PlatformRegistry};
pub use game::{GameKey, GameRecord};
pub use launch::{GameLauncher, LaunchResult, LaunchTarget, ProcessLauncher};
pub use library::{Library, PlatformScan};
pub use persistence::{CatalogStore, PersistenceGateway, PlatformRow};
pub use platform::Platform;
pub use scanner::{PlatformScanner, ScanContext, ScanError, scan_all};
pub use special::{
    DerivedPlatform, FavouritesPlatform, PlatformEntry, SearchPlatform, SpecialPlatformType,
};
pub use sync::{SyncDelta, SyncEngine, SyncFailure, SyncReport};
pub use tag_index::TagIndex;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Scan of platform {platform_id} failed: {source}")]
    ScanFailure {
        platform_id: i64,
        #[source]
        source: ScanError,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Platform {0} has no database row")]
    NotPersisted(String),

    #[error("Game not found: {0}")]
    GameNotFound(String),

    #[error("Platform not found: {0}")]
    PlatformNotFound(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Launch failed: {0}")]
    Launch(String),

    #[error("Task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl LibraryError {
    /// Wrap a scanner error, keeping cancellation distinguishable
    pub fn from_scan(platform_id: i64, error: ScanError) -> Self {
        match error {
            ScanError::Cancelled => LibraryError::Cancelled,
            source => LibraryError::ScanFailure {
                platform_id,
                source,
            },
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, LibraryError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_scan_maps_to_cancelled() {
        let err = LibraryError::from_scan(3, ScanError::Cancelled);
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_scan_fault_keeps_platform() {
        let err = LibraryError::from_scan(3, ScanError::Fault("bad".into()));
        match err {
            LibraryError::ScanFailure { platform_id, .. } => assert_eq!(platform_id, 3),
            other => panic!("unexpected error: {other}"),
        }
        assert!(
            LibraryError::from_scan(3, ScanError::Fault("bad".into()))
                .to_string()
                .contains("bad")
        );
    }
}
