//! Embedding store - keyed persistence of vectors with metadata
//!
//! One row per `(category, item id)` pair, enforced by a UNIQUE constraint
//! with INSERT OR REPLACE semantics: upserts are single statements, so a
//! record is replaced wholesale or not at all - readers never observe a
//! half-written vector.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::db::{storage_error, Database};

/// Category of an embeddable item
///
/// Matches the item_type strings in the embeddings table: a condensed
/// message is a summary, an action item a task, a generated reply a
/// response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Summary,
    Task,
    Response,
}

impl ItemCategory {
    pub const ALL: [ItemCategory; 3] = [
        ItemCategory::Summary,
        ItemCategory::Task,
        ItemCategory::Response,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCategory::Summary => "summary",
            ItemCategory::Task => "task",
            ItemCategory::Response => "response",
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "summary" => Ok(ItemCategory::Summary),
            "task" => Ok(ItemCategory::Task),
            "response" => Ok(ItemCategory::Response),
            other => anyhow::bail!(
                "unknown item category '{}' (expected summary, task or response)",
                other
            ),
        }
    }
}

/// A stored embedding with its metadata
#[derive(Debug, Clone)]
pub struct EmbeddingRecord {
    pub category: ItemCategory,
    pub item_id: String,
    pub vector: Vec<f32>,
    pub encoder_version: String,
    pub dim: usize,
    pub updated_at: DateTime<Utc>,
    pub text: Option<String>,
}

/// Store statistics: totals, per-category counts, encoder-version histogram
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub total: i64,
    pub by_category: HashMap<String, i64>,
    pub by_version: HashMap<String, i64>,
}

/// Keyed persistence for embedding records
#[derive(Clone)]
pub struct EmbeddingStore {
    db: Arc<Database>,
}

impl EmbeddingStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Insert or replace the record for `(category, item_id)`
    ///
    /// Idempotent: repeating the same upsert leaves exactly one record.
    /// Refreshes `updated_at` on every call.
    pub fn upsert(
        &self,
        category: ItemCategory,
        item_id: &str,
        vector: &[f32],
        encoder_version: &str,
        text: Option<&str>,
    ) -> Result<()> {
        let conn = self.db.lock();
        conn.execute(
            "INSERT OR REPLACE INTO embeddings
             (item_type, item_id, vector, encoder_version, dim, updated_at, text_content)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                category.as_str(),
                item_id,
                vec_f32_to_bytes(vector),
                encoder_version,
                vector.len() as i64,
                Utc::now().to_rfc3339(),
                text,
            ],
        )
        .map_err(storage_error)
        .with_context(|| format!("Failed to upsert embedding for {} {}", category, item_id))?;
        Ok(())
    }

    /// Fetch one record, or None if absent
    pub fn get(&self, category: ItemCategory, item_id: &str) -> Result<Option<EmbeddingRecord>> {
        let conn = self.db.lock();
        let mut stmt = conn
            .prepare(
                "SELECT item_type, item_id, vector, encoder_version, dim, updated_at, text_content
             FROM embeddings WHERE item_type = ? AND item_id = ?",
            )
            .map_err(storage_error)?;

        let mut rows = stmt
            .query_map(params![category.as_str(), item_id], row_to_record)
            .map_err(storage_error)?;
        match rows.next() {
            Some(record) => Ok(Some(record.map_err(storage_error)?)),
            None => Ok(None),
        }
    }

    /// Enumerate all records, optionally filtered by category
    ///
    /// No guaranteed ordering; restart by calling again.
    pub fn scan(&self, category: Option<ItemCategory>) -> Result<Vec<EmbeddingRecord>> {
        let conn = self.db.lock();

        let sql_all =
            "SELECT item_type, item_id, vector, encoder_version, dim, updated_at, text_content
             FROM embeddings";
        let sql_filtered =
            "SELECT item_type, item_id, vector, encoder_version, dim, updated_at, text_content
             FROM embeddings WHERE item_type = ?";

        let records = if let Some(cat) = category {
            let mut stmt = conn.prepare(sql_filtered).map_err(storage_error)?;
            let rows = stmt
                .query_map(params![cat.as_str()], row_to_record)
                .map_err(storage_error)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(storage_error)?
        } else {
            let mut stmt = conn.prepare(sql_all).map_err(storage_error)?;
            let rows = stmt.query_map([], row_to_record).map_err(storage_error)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(storage_error)?
        };

        Ok(records)
    }

    /// Remove one record; no-op if absent
    pub fn delete(&self, category: ItemCategory, item_id: &str) -> Result<()> {
        self.db.execute(
            "DELETE FROM embeddings WHERE item_type = ? AND item_id = ?",
            &[&category.as_str(), &item_id],
        )?;
        Ok(())
    }

    /// Remove every record in a category (used before a clear-first rebuild)
    pub fn clear(&self, category: ItemCategory) -> Result<usize> {
        self.db.execute(
            "DELETE FROM embeddings WHERE item_type = ?",
            &[&category.as_str()],
        )
    }

    /// Count embeddings per category and per encoder version
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.db.lock();

        let total: i64 = conn
            .query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))
            .map_err(storage_error)?;

        let mut by_category = HashMap::new();
        let mut stmt = conn
            .prepare("SELECT item_type, COUNT(*) FROM embeddings GROUP BY item_type")
            .map_err(storage_error)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(storage_error)?;
        for row in rows {
            let (category, count) = row.map_err(storage_error)?;
            by_category.insert(category, count);
        }

        let mut by_version = HashMap::new();
        let mut stmt = conn
            .prepare("SELECT encoder_version, COUNT(*) FROM embeddings GROUP BY encoder_version")
            .map_err(storage_error)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(storage_error)?;
        for row in rows {
            let (version, count) = row.map_err(storage_error)?;
            by_version.insert(version, count);
        }

        Ok(StoreStats {
            total,
            by_category,
            by_version,
        })
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<EmbeddingRecord> {
    let category_str: String = row.get(0)?;
    let item_id: String = row.get(1)?;
    let blob: Vec<u8> = row.get(2)?;
    let encoder_version: String = row.get(3)?;
    let dim: i64 = row.get(4)?;
    let updated_at: String = row.get(5)?;
    let text: Option<String> = row.get(6)?;

    let category = ItemCategory::from_str(&category_str).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("bad item_type: {}", category_str).into(),
        )
    })?;

    let updated_at = DateTime::parse_from_rfc3339(&updated_at)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?
        .with_timezone(&Utc);

    Ok(EmbeddingRecord {
        category,
        item_id,
        vector: bytes_to_vec_f32(&blob),
        encoder_version,
        dim: dim as usize,
        updated_at,
        text,
    })
}

/// Encode a vector as a little-endian f32 blob
///
/// Explicit byte order keeps a database file readable across targets.
pub fn vec_f32_to_bytes(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for v in vector {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a little-endian f32 blob back into a vector
pub fn bytes_to_vec_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
