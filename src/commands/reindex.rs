//! Reindex command - rebuild or verify the embedding index

use anyhow::Result;
use std::sync::Arc;

use recall::config::Config;
use recall::embeddings::HashingEmbedder;
use recall::reindex::{CancelToken, RebuildOptions, Reindexer, SqliteItemSource};
use recall::store::EmbeddingStore;

pub fn execute(
    config: &Config,
    categories: Option<Vec<String>>,
    clear: bool,
    verify_only: bool,
    missing_only: bool,
    json: bool,
) -> Result<()> {
    let db = super::open_database(config)?;
    let store = EmbeddingStore::new(Arc::clone(&db));
    let source = Arc::new(SqliteItemSource::new(Arc::clone(&db)));
    let reindexer = Reindexer::new(
        store,
        Arc::new(HashingEmbedder::new(config.embedding.dim)),
        source,
    );

    let options = RebuildOptions {
        categories: categories.as_deref().map(super::parse_categories).transpose()?,
        clear_first: clear,
        verify_only,
        missing_only,
    };

    let report = reindexer.rebuild(&options, &CancelToken::new())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if verify_only {
        println!("🔎 Verified {} records", report.total_processed());
        if report.mismatches.is_empty() {
            println!("   All embeddings match the active encoder");
        } else {
            println!("   {} mismatches found:", report.mismatches.len());
            for mismatch in &report.mismatches {
                println!(
                    "   • {} {}: {}",
                    mismatch.category, mismatch.item_id, mismatch.reason
                );
            }
            println!("\nRun `recall reindex --clear` to rebuild them.");
        }
        return Ok(());
    }

    for (category, cat_report) in &report.per_category {
        if cat_report.cleared > 0 {
            println!("🗑️  {}: cleared {}", category, cat_report.cleared);
        }
        println!(
            "   {}: {} processed, {} errors",
            category, cat_report.processed, cat_report.errors
        );
    }
    if report.cancelled {
        println!("⚠️  Rebuild cancelled partway; processed items are up to date");
    } else {
        println!(
            "✅ Reindex complete: {} processed, {} errors",
            report.total_processed(),
            report.total_errors()
        );
    }
    Ok(())
}
