//! Library facade tying platforms, storage and derived views together

use crate::launch::LaunchResult;
use crate::persistence::{CatalogStore, PersistenceGateway};
use crate::scanner::{self, ScanContext};
use crate::special::{DerivedPlatform, FavouritesPlatform, PlatformEntry, SearchPlatform};
use crate::sync::{SyncEngine, SyncReport};
use crate::{GameRecord, LibraryError, Platform, PlatformRegistry};
use std::collections::HashSet;

/// Result of reconciling one platform during [`Library::scan_all`]
#[derive(Debug)]
pub struct PlatformScan {
    pub platform: String,
    pub result: Result<SyncReport, LibraryError>,
}

/// Every real platform plus the search and favourites views.
///
/// Platforms are created through the registry on [`Library::open`]; any
/// platform without a database row is persisted there and then, so every
/// platform held here has a positive id.
pub struct Library<G: PersistenceGateway + CatalogStore> {
    store: G,
    platforms: Vec<Platform>,
    search: SearchPlatform,
    favourites: FavouritesPlatform,
    parallel: bool,
}

impl<G: PersistenceGateway + CatalogStore> Library<G> {
    /// Build platforms from the registry and load their stored games
    pub fn open(store: G, registry: &PlatformRegistry) -> Result<Self, LibraryError> {
        let rows = store.load_platforms()?;
        let mut platforms = registry.enumerate_platforms(&rows);

        for platform in platforms.iter_mut().filter(|p| !p.is_persisted()) {
            let id = store.insert_platform(platform)?;
            tracing::info!("Registered platform {} with id {}", platform.name(), id);
            platform.assign_id(id);
        }

        {
            let engine = SyncEngine::new(&store);
            for platform in platforms.iter_mut() {
                let count = engine.load_index(platform)?;
                tracing::debug!("Loaded {} games for {}", count, platform.name());
            }
        }

        platforms.sort_by(|a, b| a.compare_by_id(b));

        let mut library = Self {
            store,
            platforms,
            search: SearchPlatform::new(),
            favourites: FavouritesPlatform::new(),
            parallel: true,
        };
        library.favourites.rebuild(&library.platforms);
        Ok(library)
    }

    /// Scan platforms concurrently in [`Library::scan_all`]
    pub fn with_parallel_scans(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn store(&self) -> &G {
        &self.store
    }

    /// Real platforms, sorted by id
    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn platform(&self, id: i64) -> Option<&Platform> {
        self.platforms.iter().find(|p| p.id() == id)
    }

    /// Look a platform up by name, ignoring case
    pub fn platform_by_name(&self, name: &str) -> Option<&Platform> {
        self.platforms
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    fn position(&self, name: &str) -> Result<usize, LibraryError> {
        self.platforms
            .iter()
            .position(|p| p.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| LibraryError::PlatformNotFound(name.to_string()))
    }

    /// Real and derived platforms, sorted by id
    pub fn entries(&self) -> Vec<PlatformEntry<'_>> {
        let mut entries: Vec<PlatformEntry<'_>> =
            self.platforms.iter().map(PlatformEntry::Real).collect();
        entries.push(PlatformEntry::Derived(DerivedPlatform::Search(&self.search)));
        entries.push(PlatformEntry::Derived(DerivedPlatform::Favourites(
            &self.favourites,
        )));
        entries.sort_by(|a, b| a.compare_by_id(b));
        entries
    }

    /// Reconcile a single platform, enabled or not
    pub fn scan_platform(
        &mut self,
        name: &str,
        ctx: &ScanContext,
    ) -> Result<SyncReport, LibraryError> {
        let index = self.position(name)?;
        let engine = SyncEngine::new(&self.store);
        let report = engine.reconcile(&mut self.platforms[index], ctx);
        self.favourites.rebuild(&self.platforms);
        report
    }

    /// Reconcile every enabled platform.
    ///
    /// Scans run on the blocking pool, concurrently when parallel scans
    /// are on. Results are applied one platform at a time; a failing
    /// platform does not stop the others.
    pub async fn scan_all(&mut self, ctx: &ScanContext) -> Vec<PlatformScan> {
        let targets: Vec<usize> = self
            .platforms
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_enabled())
            .map(|(i, _)| i)
            .collect();

        let mut scans = Vec::with_capacity(targets.len());
        if self.parallel {
            let handles: Vec<_> = targets
                .iter()
                .map(|&i| (i, self.spawn_scan(i, ctx)))
                .collect();
            for (i, handle) in handles {
                scans.push((i, Self::join_scan(&self.platforms[i], handle).await));
            }
        } else {
            for &i in &targets {
                let handle = self.spawn_scan(i, ctx);
                scans.push((i, Self::join_scan(&self.platforms[i], handle).await));
            }
        }

        let engine = SyncEngine::new(&self.store);
        let mut outcomes = Vec::with_capacity(scans.len());
        for (i, scanned) in scans {
            let platform = &mut self.platforms[i];
            let result = scanned.and_then(|games| engine.apply(platform, games));
            if let Err(e) = &result {
                tracing::warn!("Scan of {} failed: {}", platform.name(), e);
            }
            outcomes.push(PlatformScan {
                platform: platform.name().to_string(),
                result,
            });
        }

        self.favourites.rebuild(&self.platforms);
        outcomes
    }

    fn spawn_scan(
        &self,
        index: usize,
        ctx: &ScanContext,
    ) -> tokio::task::JoinHandle<Result<HashSet<GameRecord>, scanner::ScanError>> {
        let platform = &self.platforms[index];
        let scanner = platform.scanner();
        let id = platform.id();
        let ctx = ctx.clone();
        tokio::task::spawn_blocking(move || scanner::scan_all(scanner.as_ref(), id, &ctx))
    }

    async fn join_scan(
        platform: &Platform,
        handle: tokio::task::JoinHandle<Result<HashSet<GameRecord>, scanner::ScanError>>,
    ) -> Result<HashSet<GameRecord>, LibraryError> {
        match handle.await {
            Ok(scanned) => scanned.map_err(|e| LibraryError::from_scan(platform.id(), e)),
            Err(e) => Err(LibraryError::Task(format!(
                "scan of {} panicked or was aborted: {}",
                platform.name(),
                e
            ))),
        }
    }

    /// Search enabled platforms; results are kept under `term`
    pub fn search(&mut self, term: &str) -> &[GameRecord] {
        self.search.search(term, &self.platforms)
    }

    pub fn search_results(&self) -> &SearchPlatform {
        &self.search
    }

    pub fn favourites(&self) -> &FavouritesPlatform {
        &self.favourites
    }

    /// Flag or unflag a game as favourite, in storage and in memory
    pub fn set_favourite(
        &mut self,
        platform_name: &str,
        external_id: &str,
        favourite: bool,
    ) -> Result<(), LibraryError> {
        let index = self.position(platform_name)?;
        let platform = &mut self.platforms[index];

        self.store
            .set_favourite(platform.id(), external_id, favourite)?;
        if !platform.set_favourite(external_id, favourite) {
            tracing::warn!(
                "Game {} stored but not indexed on {}",
                external_id,
                platform.name()
            );
        }

        self.favourites.rebuild(&self.platforms);
        Ok(())
    }

    /// Enable or disable a platform, in storage and in memory
    pub fn set_enabled(&mut self, platform_name: &str, enabled: bool) -> Result<(), LibraryError> {
        let index = self.position(platform_name)?;
        let platform = &mut self.platforms[index];

        self.store.set_platform_enabled(platform.id(), enabled)?;
        platform.set_enabled(enabled);
        tracing::info!(
            "{} platform {}",
            if enabled { "Enabled" } else { "Disabled" },
            platform.name()
        );

        self.favourites.rebuild(&self.platforms);
        Ok(())
    }

    /// Start a game through its platform's launcher
    pub fn launch(
        &self,
        platform_name: &str,
        external_id: &str,
    ) -> Result<LaunchResult, LibraryError> {
        let platform = &self.platforms[self.position(platform_name)?];
        let game = platform.find_game(external_id).ok_or_else(|| {
            LibraryError::GameNotFound(format!("{}:{}", platform.name(), external_id))
        })?;

        if !game.installed {
            tracing::warn!("Launching {} which is not installed", game);
        }
        let result = platform.launch(game)?;
        tracing::info!("Launched {} (pid {})", game, result.pid);
        Ok(result)
    }
}
