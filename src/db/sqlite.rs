//! SQLite database wrapper
//!
//! Owns the connection behind a mutex so the store, ledger and agent can
//! share one handle across threads. Statement-level locking is the only
//! exclusion this core needs: upserts are single statements (all-or-nothing),
//! and readers tolerate interleaving with writers.

use anyhow::{Context, Result};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::Connection;
use std::path::Path;

use crate::error::RecallError;

/// SQLite database shared by the recall core
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a SQLite database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(&path).map_err(|e| {
            RecallError::StorageUnavailable(format!(
                "cannot open {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory database for testing
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| RecallError::StorageUnavailable(format!("in-memory open: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create all tables the core uses
    ///
    /// The summaries/tasks/responses tables belong to the upstream text
    /// producers; they are created here so the reindexer has something to
    /// enumerate in a fresh database.
    pub fn init_schema(&self) -> Result<()> {
        self.execute_batch(
            "CREATE TABLE IF NOT EXISTS embeddings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_type TEXT NOT NULL,
                item_id TEXT NOT NULL,
                vector BLOB NOT NULL,
                encoder_version TEXT NOT NULL,
                dim INTEGER NOT NULL,
                updated_at TEXT NOT NULL,
                text_content TEXT,
                UNIQUE(item_type, item_id)
            );

            CREATE TABLE IF NOT EXISTS summaries (
                summary_id TEXT PRIMARY KEY,
                user_id TEXT,
                message_text TEXT,
                summary_text TEXT,
                timestamp TEXT
            );

            CREATE TABLE IF NOT EXISTS tasks (
                task_id TEXT PRIMARY KEY,
                summary_id TEXT,
                user_id TEXT,
                task_text TEXT,
                priority TEXT,
                timestamp TEXT
            );

            CREATE TABLE IF NOT EXISTS responses (
                response_id TEXT PRIMARY KEY,
                task_id TEXT,
                user_id TEXT,
                response_text TEXT,
                tone TEXT,
                status TEXT,
                timestamp TEXT
            );

            -- Item references are informational: feedback may arrive before
            -- (or without) the upstream row, so no foreign keys here.
            CREATE TABLE IF NOT EXISTS coach_feedback (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                summary_id TEXT,
                task_id TEXT,
                response_id TEXT,
                score INTEGER NOT NULL,
                comment TEXT,
                timestamp TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS component_weights (
                component TEXT PRIMARY KEY,
                weight REAL NOT NULL,
                last_updated TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS agent_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                watermark TEXT,
                feedback_count INTEGER NOT NULL,
                ran_at TEXT NOT NULL
            );",
        )
        .context("Failed to initialize schema")
    }

    /// Lock the connection for a sequence of statements
    ///
    /// Held only for the duration of one logical operation; long loops
    /// (rebuild, scans) re-acquire per item.
    pub fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    /// Execute a single SQL statement
    pub fn execute(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<usize> {
        let conn = self.conn.lock();
        let count = conn
            .execute(sql, params)
            .map_err(storage_error)
            .with_context(|| format!("Failed to execute: {}", sql))?;
        Ok(count)
    }

    /// Execute a batch of SQL statements
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(sql)
            .map_err(storage_error)
            .context("Failed to execute batch")?;
        Ok(())
    }
}

/// Classify a statement failure as a storage outage
///
/// Everything the engine reports at statement time lands here; callers
/// that need a definitive answer (missing record, rejected feedback)
/// return their own `RecallError` variants before touching SQLite.
pub fn storage_error(e: rusqlite::Error) -> RecallError {
    RecallError::StorageUnavailable(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_initializes() -> Result<()> {
        let db = Database::open_in_memory()?;
        db.init_schema()?;
        // Repeated initialization is a no-op
        db.init_schema()?;

        let count: i64 =
            db.lock()
                .query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))?;
        assert_eq!(count, 0);
        Ok(())
    }

    #[test]
    fn test_basic_operations() -> Result<()> {
        let db = Database::open_in_memory()?;

        db.execute("CREATE TABLE test (id INTEGER, name TEXT)", &[])?;
        let count = db.execute("INSERT INTO test VALUES (?, ?)", &[&1, &"test"])?;
        assert_eq!(count, 1);

        let name: String = db
            .lock()
            .query_row("SELECT name FROM test WHERE id = ?", [1], |row| row.get(0))?;
        assert_eq!(name, "test");
        Ok(())
    }
}
