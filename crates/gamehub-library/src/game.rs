//! Game records

use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a game: the owning platform plus the platform's own id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameKey {
    pub platform_id: i64,
    pub external_id: String,
}

impl fmt::Display for GameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.platform_id, self.external_id)
    }
}

/// A game discovered by a scanner or loaded from the database.
///
/// Equality and hashing only look at `(platform_id, external_id)`, so
/// sets of records collapse duplicates of the same game even when their
/// metadata differs.
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub title: String,
    pub platform_id: i64,
    pub external_id: String,
    pub alias: String,
    pub launch_command: String,
    pub icon_path: String,
    pub tag: String,
    pub installed: bool,
    pub favourite: bool,
}

impl GameRecord {
    /// Tag used when a scanner has no better grouping
    pub const DEFAULT_TAG: &'static str = "default";

    /// Create an installed, untagged record
    pub fn new(
        platform_id: i64,
        external_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            platform_id,
            external_id: external_id.into(),
            alias: String::new(),
            launch_command: String::new(),
            icon_path: String::new(),
            tag: Self::DEFAULT_TAG.to_string(),
            installed: true,
            favourite: false,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn with_launch_command(mut self, command: impl Into<String>) -> Self {
        self.launch_command = command.into();
        self
    }

    pub fn with_icon_path(mut self, icon_path: impl Into<String>) -> Self {
        self.icon_path = icon_path.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_installed(mut self, installed: bool) -> Self {
        self.installed = installed;
        self
    }

    pub fn with_favourite(mut self, favourite: bool) -> Self {
        self.favourite = favourite;
        self
    }

    /// Identity key
    pub fn key(&self) -> GameKey {
        GameKey {
            platform_id: self.platform_id,
            external_id: self.external_id.clone(),
        }
    }

    /// Case-insensitive match against title and alias
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term) || self.alias.to_lowercase().contains(&term)
    }
}

impl PartialEq for GameRecord {
    fn eq(&self, other: &Self) -> bool {
        self.platform_id == other.platform_id && self.external_id == other.external_id
    }
}

impl Eq for GameRecord {}

impl Hash for GameRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.platform_id.hash(state);
        self.external_id.hash(state);
    }
}

impl fmt::Display for GameRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.title, self.platform_id, self.external_id)
    }
}
