//! Reconciliation of scanned games against persisted state

use crate::persistence::PersistenceGateway;
use crate::scanner::ScanContext;
use crate::{GameRecord, LibraryError, Platform};
use std::collections::HashSet;

/// A single record the engine could not persist
#[derive(Debug)]
pub struct SyncFailure {
    pub game: GameRecord,
    pub cause: LibraryError,
}

/// Outcome of one reconciliation
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Games inserted into storage and the index
    pub added: HashSet<GameRecord>,
    /// Games deleted from storage and the index
    pub removed: HashSet<GameRecord>,
    /// Records skipped because their insert or delete failed
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    /// True when nothing changed and nothing failed
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.failures.is_empty()
    }
}

/// Games to add and remove, compared by `(platform_id, external_id)` only
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncDelta {
    pub to_add: HashSet<GameRecord>,
    pub to_remove: HashSet<GameRecord>,
}

impl SyncDelta {
    /// `scanned - persisted` and `persisted - scanned`.
    ///
    /// A game whose key is in both sets counts as present even when its
    /// title, icon or launch command changed.
    pub fn compute(scanned: &HashSet<GameRecord>, persisted: &HashSet<GameRecord>) -> Self {
        Self {
            to_add: scanned.difference(persisted).cloned().collect(),
            to_remove: persisted.difference(scanned).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Keeps a platform's stored games in line with what its scanner finds.
///
/// Callers must not reconcile the same platform from two places at once;
/// `&mut Platform` enforces that within one process.
pub struct SyncEngine<'a, G: PersistenceGateway + ?Sized> {
    gateway: &'a G,
}

impl<'a, G: PersistenceGateway + ?Sized> SyncEngine<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    /// Scan the platform and apply the difference.
    ///
    /// A failed or cancelled scan returns before any persistence call.
    pub fn reconcile(
        &self,
        platform: &mut Platform,
        ctx: &ScanContext,
    ) -> Result<SyncReport, LibraryError> {
        Self::ensure_persisted(platform)?;

        let scanned = platform.scan(ctx)?;
        self.apply(platform, scanned)
    }

    /// Apply an already completed scan.
    ///
    /// Each record is persisted on its own; the index is only updated for
    /// records whose persistence call succeeded.
    pub fn apply(
        &self,
        platform: &mut Platform,
        scanned: HashSet<GameRecord>,
    ) -> Result<SyncReport, LibraryError> {
        Self::ensure_persisted(platform)?;

        let persisted = self.gateway.load_games(platform.id())?;
        let delta = SyncDelta::compute(&scanned, &persisted);

        let mut report = SyncReport::default();

        for game in delta.to_add {
            match self.gateway.insert(&game) {
                Ok(()) => {
                    platform.add_game(&game.tag, game.clone());
                    report.added.insert(game);
                }
                Err(cause) => {
                    tracing::warn!("Failed to store {}: {}", game, cause);
                    report.failures.push(SyncFailure { game, cause });
                }
            }
        }

        for game in delta.to_remove {
            match self.gateway.delete(&game) {
                Ok(()) => {
                    platform.remove_game(&game.tag, &game);
                    report.removed.insert(game);
                }
                Err(cause) => {
                    tracing::warn!("Failed to delete {}: {}", game, cause);
                    report.failures.push(SyncFailure { game, cause });
                }
            }
        }

        tracing::info!(
            "Reconciled {}: {} added, {} removed, {} failed",
            platform.name(),
            report.added.len(),
            report.removed.len(),
            report.failures.len()
        );

        Ok(report)
    }

    /// Fill an empty index from storage (startup)
    pub fn load_index(&self, platform: &mut Platform) -> Result<usize, LibraryError> {
        Self::ensure_persisted(platform)?;

        let games = self.gateway.load_games(platform.id())?;
        let count = games.len();
        for game in games {
            platform.add_game(&game.tag.clone(), game);
        }
        Ok(count)
    }

    fn ensure_persisted(platform: &Platform) -> Result<(), LibraryError> {
        if platform.is_persisted() {
            Ok(())
        } else {
            Err(LibraryError::NotPersisted(platform.name().to_string()))
        }
    }
}
