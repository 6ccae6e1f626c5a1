//! Platform scanning capability

use crate::GameRecord;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Hard scanner faults. "Nothing found" is never an error.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Scan cancelled")]
    Cancelled,

    #[error("Corrupt manifest {path}: {reason}")]
    Manifest { path: PathBuf, reason: String },

    #[error("Scanner fault: {0}")]
    Fault(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScanError {
    pub fn manifest(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Manifest {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Options and cancellation shared by every scanner call
#[derive(Debug, Clone, Default)]
pub struct ScanContext {
    /// Do icon lookups that cost extra filesystem work
    pub expensive_icons: bool,

    cancel: CancellationToken,
}

impl ScanContext {
    pub fn new(expensive_icons: bool) -> Self {
        Self {
            expensive_icons,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned token (e.g. one tied to Ctrl-C)
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Bail out between discoveries if the scan was cancelled
    pub fn checkpoint(&self) -> Result<(), ScanError> {
        if self.is_cancelled() {
            Err(ScanError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Discovers games for one platform variant.
///
/// Implementations only read the host environment. A missing install
/// directory yields empty sets; only unreadable or corrupt data is an error.
pub trait PlatformScanner: Send + Sync {
    /// Games present on this machine
    fn installed_games(
        &self,
        platform_id: i64,
        ctx: &ScanContext,
    ) -> Result<HashSet<GameRecord>, ScanError>;

    /// Games the account owns but that are not installed
    fn non_installed_games(
        &self,
        platform_id: i64,
        ctx: &ScanContext,
    ) -> Result<HashSet<GameRecord>, ScanError>;

    /// Both sets at once. Override when one pass over the data can
    /// produce both; the result must match the two calls combined.
    fn all_games(
        &self,
        platform_id: i64,
        ctx: &ScanContext,
    ) -> Result<HashSet<GameRecord>, ScanError> {
        let mut games = self.installed_games(platform_id, ctx)?;
        ctx.checkpoint()?;

        for game in self.non_installed_games(platform_id, ctx)? {
            games.insert(game.with_installed(false));
        }
        Ok(games)
    }
}

/// Installed games plus non-installed ones, flagged accordingly.
///
/// A game reported by both calls keeps its installed entry.
pub fn scan_all(
    scanner: &dyn PlatformScanner,
    platform_id: i64,
    ctx: &ScanContext,
) -> Result<HashSet<GameRecord>, ScanError> {
    let games = scanner.all_games(platform_id, ctx)?;
    ctx.checkpoint()?;
    Ok(games)
}
