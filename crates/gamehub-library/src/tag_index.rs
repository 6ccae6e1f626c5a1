//! Tag-indexed game collection

use crate::GameRecord;
use std::collections::{HashMap, HashSet};

/// Groups a platform's games by tag.
///
/// Lookups through [`TagIndex::get_or_create`] never fail: an unknown tag
/// gets an empty set on first access. [`TagIndex::get`] is the read-only
/// variant that leaves the index untouched.
#[derive(Debug, Clone, Default)]
pub struct TagIndex {
    tags: HashMap<String, HashSet<GameRecord>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the set for `tag`, creating an empty one if needed
    pub fn get_or_create(&mut self, tag: &str) -> &mut HashSet<GameRecord> {
        self.tags.entry(tag.to_string()).or_default()
    }

    /// Get the set for `tag` without creating it
    pub fn get(&self, tag: &str) -> Option<&HashSet<GameRecord>> {
        self.tags.get(tag)
    }

    /// Insert a game under `tag`. Returns false if it was already there.
    pub fn insert(&mut self, tag: &str, game: GameRecord) -> bool {
        self.get_or_create(tag).insert(game)
    }

    /// Remove a game from `tag`. Returns false if it was not there.
    pub fn remove(&mut self, tag: &str, game: &GameRecord) -> bool {
        self.tags.get_mut(tag).is_some_and(|set| set.remove(game))
    }

    /// Whether any tag holds this game
    pub fn contains(&self, game: &GameRecord) -> bool {
        self.tags.values().any(|set| set.contains(game))
    }

    /// Find a game by its platform-specific id
    pub fn find(&self, external_id: &str) -> Option<&GameRecord> {
        self.iter_games().find(|game| game.external_id == external_id)
    }

    /// Known tags, sorted
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.tags.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Every record across all tags
    pub fn iter_games(&self) -> impl Iterator<Item = &GameRecord> {
        self.tags.values().flatten()
    }

    /// Number of distinct records across all tags
    pub fn game_count(&self) -> usize {
        self.iter_games().collect::<HashSet<_>>().len()
    }

    /// Replace a record in place under every tag holding it. Returns false if absent.
    pub fn replace(&mut self, game: GameRecord) -> bool {
        let mut found = false;
        for set in self.tags.values_mut() {
            if set.remove(&game) {
                set.insert(game.clone());
                found = true;
            }
        }
        found
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tag_is_empty() {
        let mut index = TagIndex::new();
        assert!(index.get("rpg").is_none());
        assert!(index.get_or_create("rpg").is_empty());
        assert!(index.get("rpg").is_some());
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut index = TagIndex::new();
        assert!(index.insert("rpg", GameRecord::new(1, "a", "A")));
        assert!(!index.insert("rpg", GameRecord::new(1, "a", "A again")));
        assert_eq!(index.get("rpg").unwrap().len(), 1);
    }

    #[test]
    fn test_remove_keeps_empty_tag() {
        let mut index = TagIndex::new();
        let game = GameRecord::new(1, "a", "A");
        index.insert("rpg", game.clone());

        assert!(index.remove("rpg", &game));
        assert!(!index.remove("rpg", &game));
        assert!(!index.remove("unknown", &game));
        assert_eq!(index.tags(), vec!["rpg"]);
        assert!(index.get("rpg").unwrap().is_empty());
    }

    #[test]
    fn test_game_count_is_distinct() {
        let mut index = TagIndex::new();
        index.insert("rpg", GameRecord::new(1, "a", "A"));
        index.insert("action", GameRecord::new(1, "a", "A"));
        index.insert("action", GameRecord::new(1, "b", "B"));
        assert_eq!(index.game_count(), 2);
        assert_eq!(index.tags(), vec!["action", "rpg"]);
    }

    #[test]
    fn test_replace_and_find() {
        let mut index = TagIndex::new();
        index.insert("rpg", GameRecord::new(1, "a", "A"));

        assert!(index.replace(GameRecord::new(1, "a", "A").with_favourite(true)));
        assert!(index.find("a").unwrap().favourite);
        assert!(!index.replace(GameRecord::new(1, "zzz", "Z")));
    }

    #[test]
    fn test_replace_updates_every_tag() {
        let mut index = TagIndex::new();
        index.insert("rpg", GameRecord::new(1, "a", "A"));
        index.insert("action", GameRecord::new(1, "a", "A"));

        assert!(index.replace(GameRecord::new(1, "a", "A").with_favourite(true)));
        for tag in ["rpg", "action"] {
            assert!(index.get(tag).unwrap().iter().all(|g| g.favourite));
        }
    }
}
