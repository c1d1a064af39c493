//! Reindexer - recompute stored vectors with verification and safe cutover
//!
//! Rebuilds are per-item independent and idempotent: an interrupted run
//! leaves processed items correctly upserted and the rest at their prior
//! version. Concurrent similarity queries keep running throughout and may
//! observe a mix of old and new vectors; dimension filtering in search
//! makes that safe.

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::embeddings::EmbeddingEngine;
use crate::error::RecallError;
use crate::store::{EmbeddingStore, ItemCategory};

/// A source item to (re)encode: id plus its current text
#[derive(Debug, Clone)]
pub struct SourceItem {
    pub item_id: String,
    pub text: String,
}

/// Access to the external item store the upstream producers own
///
/// The core never creates or deletes items; it only reads their text.
pub trait ItemSource: Send + Sync {
    fn items(&self, category: ItemCategory) -> Result<Vec<SourceItem>>;
}

/// Reads items from the summaries/tasks/responses tables
pub struct SqliteItemSource {
    db: Arc<crate::db::Database>,
}

impl SqliteItemSource {
    pub fn new(db: Arc<crate::db::Database>) -> Self {
        Self { db }
    }
}

impl ItemSource for SqliteItemSource {
    fn items(&self, category: ItemCategory) -> Result<Vec<SourceItem>> {
        let sql = match category {
            ItemCategory::Summary => "SELECT summary_id, summary_text FROM summaries",
            ItemCategory::Task => "SELECT task_id, task_text FROM tasks",
            ItemCategory::Response => "SELECT response_id, response_text FROM responses",
        };

        let conn = self.db.lock();
        let mut stmt = conn
            .prepare(sql)
            .with_context(|| format!("Failed to enumerate {} items", category))?;
        let rows = stmt.query_map([], |row| {
            Ok(SourceItem {
                item_id: row.get(0)?,
                text: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

/// Options for a rebuild run
#[derive(Debug, Clone, Default)]
pub struct RebuildOptions {
    /// Categories to target; None means all
    pub categories: Option<Vec<ItemCategory>>,
    /// Delete existing records for the targeted categories first - used
    /// when the encoder version changed and old vectors are not comparable
    pub clear_first: bool,
    /// Report stale/inconsistent records without writing anything
    pub verify_only: bool,
    /// Only index items that have no stored embedding yet
    pub missing_only: bool,
}

/// Cooperative cancellation checked between items
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// A record whose stored metadata disagrees with the active encoder
#[derive(Debug, Clone, Serialize)]
pub struct Mismatch {
    pub category: ItemCategory,
    pub item_id: String,
    pub reason: String,
}

/// Per-category outcome of a rebuild
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryReport {
    pub processed: usize,
    pub errors: usize,
    pub cleared: usize,
}

/// Outcome of a rebuild or verification run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RebuildReport {
    pub per_category: Vec<(ItemCategory, CategoryReport)>,
    pub mismatches: Vec<Mismatch>,
    pub cancelled: bool,
}

impl RebuildReport {
    pub fn total_processed(&self) -> usize {
        self.per_category.iter().map(|(_, r)| r.processed).sum()
    }

    pub fn total_errors(&self) -> usize {
        self.per_category.iter().map(|(_, r)| r.errors).sum()
    }
}

/// Recomputes vectors for some or all stored items
pub struct Reindexer {
    store: EmbeddingStore,
    engine: Arc<dyn EmbeddingEngine>,
    source: Arc<dyn ItemSource>,
}

impl Reindexer {
    pub fn new(
        store: EmbeddingStore,
        engine: Arc<dyn EmbeddingEngine>,
        source: Arc<dyn ItemSource>,
    ) -> Self {
        Self {
            store,
            engine,
            source,
        }
    }

    /// Run a rebuild (or verification) over the targeted categories
    pub fn rebuild(&self, options: &RebuildOptions, cancel: &CancelToken) -> Result<RebuildReport> {
        let categories: Vec<ItemCategory> = options
            .categories
            .clone()
            .unwrap_or_else(|| ItemCategory::ALL.to_vec());

        if options.verify_only {
            return self.verify(&categories);
        }

        let mut report = RebuildReport::default();

        'categories: for category in categories {
            let mut cat_report = CategoryReport::default();

            if options.clear_first {
                cat_report.cleared = self
                    .store
                    .clear(category)
                    .with_context(|| format!("Failed to clear {} embeddings", category))?;
                log::info!("cleared {} {} embeddings", cat_report.cleared, category);
            }

            let items = self.source.items(category)?;
            log::info!("found {} {} items to process", items.len(), category);

            for item in items {
                if cancel.is_cancelled() {
                    report.cancelled = true;
                    report.per_category.push((category, cat_report));
                    break 'categories;
                }

                if options.missing_only && self.store.get(category, &item.item_id)?.is_some() {
                    continue;
                }

                // Encoding never hard-fails (degrades to fallback); only a
                // failed write counts as an error, and it does not abort
                // the remaining items.
                let vector = self.engine.embed_or_fallback(&item.text);
                match self.store.upsert(
                    category,
                    &item.item_id,
                    &vector,
                    self.engine.version(),
                    Some(&item.text),
                ) {
                    Ok(()) => cat_report.processed += 1,
                    Err(e) => {
                        log::warn!("failed to store embedding for {} {}: {}", category, item.item_id, e);
                        cat_report.errors += 1;
                    }
                }
            }

            if !report.cancelled {
                report.per_category.push((category, cat_report));
            }
        }

        Ok(report)
    }

    /// Report records whose encoder version or dimensionality disagrees
    /// with the active encoder, without modifying anything.
    fn verify(&self, categories: &[ItemCategory]) -> Result<RebuildReport> {
        let mut report = RebuildReport::default();

        for &category in categories {
            let mut cat_report = CategoryReport::default();

            for record in self.store.scan(Some(category))? {
                cat_report.processed += 1;

                if record.encoder_version != self.engine.version() {
                    report.mismatches.push(Mismatch {
                        category,
                        item_id: record.item_id.clone(),
                        reason: format!(
                            "encoder version {} (active: {})",
                            record.encoder_version,
                            self.engine.version()
                        ),
                    });
                } else if record.vector.len() != record.dim
                    || record.dim != self.engine.dimension()
                {
                    report.mismatches.push(Mismatch {
                        category,
                        item_id: record.item_id.clone(),
                        reason: RecallError::DimensionMismatch {
                            category,
                            item_id: record.item_id.clone(),
                            stored: record.vector.len(),
                            expected: self.engine.dimension(),
                        }
                        .to_string(),
                    });
                }
            }

            report.per_category.push((category, cat_report));
        }

        Ok(report)
    }
}
