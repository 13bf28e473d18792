//! Metadata store: images, tags and the associations between them.

mod error;
mod images;
mod schema;
mod tags;

use rusqlite::Connection;
use std::path::Path;

pub use error::{StoreError, StoreResult};
pub use images::ImageRecord;
pub use schema::SCHEMA;
pub use tags::Tag;

/// Format for `created_date` / `updated_date`. Fixed width so that string
/// order and chronological order agree.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

fn now_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Row counts for the status bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LibraryStats {
    pub image_count: i64,
    pub tag_count: i64,
    pub association_count: i64,
}

/// SQLite-backed metadata store.
///
/// One connection is held for the lifetime of the store; every operation
/// is a single statement so no explicit transactions are needed.
pub struct Database {
    pub(crate) conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }

    /// Open a throwaway in-memory store (tests).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }

    pub fn initialize(&self) -> StoreResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn stats(&self) -> StoreResult<LibraryStats> {
        let count = |table: &str| -> StoreResult<i64> {
            let sql = format!("SELECT COUNT(*) FROM {}", table);
            Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
        };

        Ok(LibraryStats {
            image_count: count("images")?,
            tag_count: count("tags")?,
            association_count: count("image_tags")?,
        })
    }
}

#[cfg(test)]
pub(crate) fn test_db() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.initialize().unwrap();
    db
}
