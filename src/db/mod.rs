mod migrations;
pub mod queries;

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::Connection;
use thiserror::Error;

use crate::state::{PersistError, SettingsStore};

pub use migrations::latest_version as latest_schema_version;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("migration failed: {0}")]
    Migration(String),
}

/// SQLite store for settings (the persisted state snapshot among them) and
/// daily focus history.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database file at `path`, enable WAL mode, and run migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    #[cfg(test)]
    /// Open an in-memory database for tests.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, DbError> {
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire a lock on the connection for queries.
    pub fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }
}

#[async_trait]
impl SettingsStore for Database {
    async fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(queries::get_setting(self, key)?)
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), PersistError> {
        let updated_at = chrono::Utc::now().to_rfc3339();
        queries::upsert_setting(self, key, value, &updated_at)?;
        Ok(())
    }
}
