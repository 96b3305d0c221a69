use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

use crate::error::Result;
use crate::spotify::Playlist;

/// One summary row of the `playlists` table.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistRecord {
    pub name: String,
    pub track_count: i64,
    pub created_at: NaiveDateTime,
}

impl PlaylistRecord {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(0)?,
            track_count: row.get(1)?,
            created_at: row.get(2)?,
        })
    }
}

/// Local history of generated playlists, backed by SQLite.
pub struct PlaylistStore {
    conn: Connection,
}

impl PlaylistStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!("Opened playlist store at {}", path.display());
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Creates the `playlists` table when it does not exist yet.
    pub fn ensure_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS playlists (
                name TEXT PRIMARY KEY,
                track_count INTEGER,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        Ok(())
    }

    /// Replaces any row named after the playlist. `created_at` is reset, so it
    /// records when the playlist was last generated.
    pub fn upsert_playlist(&self, playlist: &Playlist) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO playlists (name, track_count) VALUES (?1, ?2)",
            params![playlist.name, playlist.track_count() as i64],
        )?;
        debug!(
            "Stored playlist '{}' with {} tracks",
            playlist.name,
            playlist.track_count()
        );
        Ok(())
    }

    pub fn load_playlist(&self, name: &str) -> Result<Option<PlaylistRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT name, track_count, created_at FROM playlists WHERE name = ?1",
                params![name],
                PlaylistRecord::from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// All stored rows, most recently generated first.
    pub fn list_playlists(&self) -> Result<Vec<PlaylistRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, track_count, created_at FROM playlists
             ORDER BY created_at DESC, name ASC",
        )?;
        let records = stmt
            .query_map([], PlaylistRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}
