//! Database layer for recall
//!
//! Thin SQLite wrapper shared across the embedding store, feedback ledger
//! and adaptation agent. The connection sits behind a `parking_lot::Mutex`
//! so concurrent upserts to the same key serialize cleanly; reads hold the
//! lock only per statement, so scans interleave with writers and may see
//! slightly stale data (eventual consistency, by contract).
//!
//! # Example
//! ```no_run
//! use recall::db::Database;
//!
//! let db = Database::open("recall.db")?;
//! db.init_schema()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod retry;
pub mod sqlite;

pub use retry::with_retry;
pub use sqlite::{storage_error, Database};
