//! Built-in platform variants

pub mod gog;
pub mod reference;
pub mod steam;
pub mod vdf;

pub use gog::{GOG_PLATFORM_NAME, GogFactory, GogScanner};
pub use reference::{REFERENCE_PLATFORM_NAME, ReferenceFactory, ReferenceScanner};
pub use steam::{STEAM_PLATFORM_NAME, SteamFactory, SteamScanner};

use crate::PlatformRegistry;
use crate::launch::GameLauncher;
use crate::scanner::ScanError;
use gamehub_config::PlatformsConfig;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Registry holding a factory for every platform enabled in `config`
pub fn builtin_registry(
    config: &PlatformsConfig,
    launcher: Arc<dyn GameLauncher>,
) -> PlatformRegistry {
    let mut registry = PlatformRegistry::new();

    if config.steam.enabled {
        registry.register(Arc::new(SteamFactory::new(
            config.steam.path.clone(),
            Arc::clone(&launcher),
        )));
    }
    if config.gog.enabled {
        registry.register(Arc::new(GogFactory::new(
            config.gog.path.clone(),
            Arc::clone(&launcher),
        )));
    }
    if config.reference.enabled {
        registry.register(Arc::new(ReferenceFactory::new(&config.reference, launcher)));
    }

    tracing::debug!("Registered platforms: {:?}", registry.names());
    registry
}

/// Errors meaning "cannot look here" rather than corrupt data
pub(crate) fn is_inaccessible(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound
    )
}

/// Entries of `dir` that can be read.
///
/// An unreadable directory yields no entries, and unreadable entries are
/// skipped. Both are logged. Any other IO error fails the scan.
pub(crate) fn readable_entries(dir: &Path) -> Result<Vec<fs::DirEntry>, ScanError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if is_inaccessible(&e) => {
            tracing::warn!("Skipping unreadable directory {:?}: {}", dir, e);
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut readable = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => readable.push(entry),
            Err(e) if is_inaccessible(&e) => {
                tracing::warn!("Skipping unreadable entry in {:?}: {}", dir, e);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(readable)
}
