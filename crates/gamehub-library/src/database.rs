//! Game database using SQLite

use crate::persistence::{CatalogStore, PersistenceGateway, PlatformRow};
use crate::{GameRecord, LibraryError, Platform};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Game database manager
pub struct GameDatabase {
    conn: Connection,
}

impl GameDatabase {
    /// Open or create a database
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        let db = Self { conn };
        db.init_schema()?;

        tracing::debug!("Opened game database {}", path.display());
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self, LibraryError> {
        let conn = Connection::open_in_memory()?;

        let db = Self { conn };
        db.init_schema()?;

        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<(), LibraryError> {
        self.conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS platforms (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                path TEXT NOT NULL DEFAULT '',
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS games (
                id INTEGER PRIMARY KEY,
                platform_id INTEGER NOT NULL,
                external_id TEXT NOT NULL,
                title TEXT NOT NULL,
                alias TEXT NOT NULL DEFAULT '',
                launch_command TEXT NOT NULL DEFAULT '',
                icon_path TEXT NOT NULL DEFAULT '',
                tag TEXT NOT NULL DEFAULT 'default',
                installed INTEGER NOT NULL DEFAULT 1,
                favourite INTEGER NOT NULL DEFAULT 0,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (platform_id, external_id),
                FOREIGN KEY (platform_id) REFERENCES platforms(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_games_platform ON games(platform_id);
            CREATE INDEX IF NOT EXISTS idx_games_title ON games(title);
            CREATE INDEX IF NOT EXISTS idx_games_favourite ON games(favourite);
        "#,
        )?;

        Ok(())
    }

    /// Get a game by its identity
    pub fn get_game(
        &self,
        platform_id: i64,
        external_id: &str,
    ) -> Result<Option<GameRecord>, LibraryError> {
        let game = self
            .conn
            .query_row(
                "SELECT * FROM games WHERE platform_id = ?1 AND external_id = ?2",
                params![platform_id, external_id],
                Self::row_to_game,
            )
            .optional()?;

        Ok(game)
    }

    /// Get favourite games across platforms
    pub fn get_favourites(&self) -> Result<Vec<GameRecord>, LibraryError> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM games WHERE favourite = 1 ORDER BY title")?;

        let games = stmt
            .query_map([], Self::row_to_game)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(games)
    }

    /// Search games by title or alias
    pub fn search_games(&self, query: &str) -> Result<Vec<GameRecord>, LibraryError> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM games WHERE title LIKE ?1 OR alias LIKE ?1 ORDER BY title")?;

        let pattern = format!("%{}%", query);
        let games = stmt
            .query_map(params![pattern], Self::row_to_game)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(games)
    }

    /// Get total game count
    pub fn game_count(&self) -> Result<i64, LibraryError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM games", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get game count for one platform
    pub fn game_count_by_platform(&self, platform_id: i64) -> Result<i64, LibraryError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM games WHERE platform_id = ?1",
            params![platform_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Convert a row to a GameRecord
    fn row_to_game(row: &rusqlite::Row) -> rusqlite::Result<GameRecord> {
        Ok(GameRecord {
            title: row.get("title")?,
            platform_id: row.get("platform_id")?,
            external_id: row.get("external_id")?,
            alias: row.get("alias")?,
            launch_command: row.get("launch_command")?,
            icon_path: row.get("icon_path")?,
            tag: row.get("tag")?,
            installed: row.get("installed")?,
            favourite: row.get("favourite")?,
        })
    }
}

impl CatalogStore for GameDatabase {
    fn load_platforms(&self) -> Result<Vec<PlatformRow>, LibraryError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, path, is_active FROM platforms ORDER BY id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(PlatformRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    path: PathBuf::from(row.get::<_, String>(3)?),
                    is_active: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn insert_platform(&self, platform: &Platform) -> Result<i64, LibraryError> {
        self.conn.execute(
            "INSERT INTO platforms (name, description, path, is_active) VALUES (?1, ?2, ?3, ?4)",
            params![
                platform.name(),
                platform.description(),
                platform.path().to_string_lossy(),
                platform.is_enabled(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn set_platform_enabled(&self, id: i64, enabled: bool) -> Result<(), LibraryError> {
        let changed = self.conn.execute(
            "UPDATE platforms SET is_active = ?1 WHERE id = ?2",
            params![enabled, id],
        )?;
        if changed == 0 {
            return Err(LibraryError::PlatformNotFound(id.to_string()));
        }
        Ok(())
    }

    fn set_favourite(
        &self,
        platform_id: i64,
        external_id: &str,
        favourite: bool,
    ) -> Result<(), LibraryError> {
        let changed = self.conn.execute(
            r#"UPDATE games SET favourite = ?1, updated_at = CURRENT_TIMESTAMP
               WHERE platform_id = ?2 AND external_id = ?3"#,
            params![favourite, platform_id, external_id],
        )?;
        if changed == 0 {
            return Err(LibraryError::GameNotFound(format!(
                "{}:{}",
                platform_id, external_id
            )));
        }
        Ok(())
    }
}

impl PersistenceGateway for GameDatabase {
    fn load_games(&self, platform_id: i64) -> Result<HashSet<GameRecord>, LibraryError> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM games WHERE platform_id = ?1")?;

        let games = stmt
            .query_map(params![platform_id], Self::row_to_game)?
            .collect::<Result<HashSet<_>, _>>()?;

        Ok(games)
    }

    fn insert(&self, game: &GameRecord) -> Result<(), LibraryError> {
        self.conn.execute(
            r#"INSERT INTO games
               (platform_id, external_id, title, alias, launch_command, icon_path,
                tag, installed, favourite)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
            params![
                game.platform_id,
                game.external_id,
                game.title,
                game.alias,
                game.launch_command,
                game.icon_path,
                game.tag,
                game.installed,
                game.favourite,
            ],
        )?;

        Ok(())
    }

    fn delete(&self, game: &GameRecord) -> Result<(), LibraryError> {
        let changed = self.conn.execute(
            "DELETE FROM games WHERE platform_id = ?1 AND external_id = ?2",
            params![game.platform_id, game.external_id],
        )?;
        if changed == 0 {
            return Err(LibraryError::GameNotFound(game.key().to_string()));
        }
        Ok(())
    }
}
