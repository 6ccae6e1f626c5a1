//! Derived platforms built from the real ones

use crate::{GameRecord, Platform};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Reserved ids for derived platforms. Persisted ids are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialPlatformType {
    Search = -1,
    Favourites = -2,
}

impl SpecialPlatformType {
    pub fn id(self) -> i64 {
        self as i64
    }

    pub fn name(self) -> &'static str {
        match self {
            SpecialPlatformType::Search => "Search",
            SpecialPlatformType::Favourites => "Favourites",
        }
    }

    pub fn all() -> &'static [SpecialPlatformType] {
        &[SpecialPlatformType::Search, SpecialPlatformType::Favourites]
    }
}

impl TryFrom<i64> for SpecialPlatformType {
    type Error = i64;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        match id {
            -1 => Ok(SpecialPlatformType::Search),
            -2 => Ok(SpecialPlatformType::Favourites),
            other => Err(other),
        }
    }
}

/// Search results keyed by search term
#[derive(Debug, Clone, Default)]
pub struct SearchPlatform {
    results: HashMap<String, Vec<GameRecord>>,
}

impl SearchPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store results for a term, replacing whatever was there
    pub fn add_search_term(&mut self, term: impl Into<String>, games: Vec<GameRecord>) {
        self.results.insert(term.into(), games);
    }

    /// Stored results; unknown terms are not created
    pub fn get(&self, term: &str) -> Option<&[GameRecord]> {
        self.results.get(term).map(Vec::as_slice)
    }

    /// Run a search over enabled platforms and store the result under `term`
    pub fn search(&mut self, term: &str, platforms: &[Platform]) -> &[GameRecord] {
        let mut games: Vec<GameRecord> = platforms
            .iter()
            .filter(|p| p.is_enabled())
            .flat_map(|p| p.games().iter_games())
            .filter(|g| g.matches(term))
            .cloned()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        games.sort_by(|a, b| a.title.cmp(&b.title).then(a.platform_id.cmp(&b.platform_id)));

        tracing::debug!("Search '{}' matched {} games", term, games.len());
        self.add_search_term(term, games);
        self.results.get(term).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn terms(&self) -> Vec<&str> {
        let mut terms: Vec<&str> = self.results.keys().map(String::as_str).collect();
        terms.sort_unstable();
        terms
    }

    /// Distinct games across all stored terms
    pub fn game_count(&self) -> usize {
        self.results.values().flatten().collect::<HashSet<_>>().len()
    }

    pub fn clear(&mut self) {
        self.results.clear();
    }
}

/// Games flagged as favourite on any real platform
#[derive(Debug, Clone, Default)]
pub struct FavouritesPlatform {
    games: HashSet<GameRecord>,
}

impl FavouritesPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute from the source platforms
    pub fn rebuild(&mut self, platforms: &[Platform]) {
        self.games = platforms
            .iter()
            .filter(|p| p.is_enabled())
            .flat_map(|p| p.games().iter_games())
            .filter(|g| g.favourite)
            .cloned()
            .collect();
    }

    pub fn games(&self) -> &HashSet<GameRecord> {
        &self.games
    }

    /// Favourites sorted by title
    pub fn sorted(&self) -> Vec<&GameRecord> {
        let mut games: Vec<&GameRecord> = self.games.iter().collect();
        games.sort_by(|a, b| a.title.cmp(&b.title));
        games
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }
}

/// A scanner-less platform. Never reconciled or persisted.
#[derive(Debug, Clone, Copy)]
pub enum DerivedPlatform<'a> {
    Search(&'a SearchPlatform),
    Favourites(&'a FavouritesPlatform),
}

impl DerivedPlatform<'_> {
    pub fn kind(&self) -> SpecialPlatformType {
        match self {
            DerivedPlatform::Search(_) => SpecialPlatformType::Search,
            DerivedPlatform::Favourites(_) => SpecialPlatformType::Favourites,
        }
    }

    pub fn id(&self) -> i64 {
        self.kind().id()
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn game_count(&self) -> usize {
        match self {
            DerivedPlatform::Search(search) => search.game_count(),
            DerivedPlatform::Favourites(favourites) => favourites.game_count(),
        }
    }
}

/// Either kind of platform, for listings
#[derive(Debug, Clone, Copy)]
pub enum PlatformEntry<'a> {
    Real(&'a Platform),
    Derived(DerivedPlatform<'a>),
}

impl PlatformEntry<'_> {
    pub fn id(&self) -> i64 {
        match self {
            PlatformEntry::Real(p) => p.id(),
            PlatformEntry::Derived(d) => d.id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PlatformEntry::Real(p) => p.name(),
            PlatformEntry::Derived(d) => d.name(),
        }
    }

    pub fn game_count(&self) -> usize {
        match self {
            PlatformEntry::Real(p) => p.game_count(),
            PlatformEntry::Derived(d) => d.game_count(),
        }
    }

    pub fn is_derived(&self) -> bool {
        matches!(self, PlatformEntry::Derived(_))
    }

    pub fn compare_by_id(&self, other: &PlatformEntry<'_>) -> Ordering {
        self.id().cmp(&other.id())
    }

    pub fn compare_by_game_count(&self, other: &PlatformEntry<'_>) -> Ordering {
        self.game_count().cmp(&other.game_count())
    }
}
