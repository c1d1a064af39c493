//! Store command - manually store an embedding for one item

use anyhow::Result;
use std::str::FromStr;
use std::sync::Arc;

use recall::config::Config;
use recall::db::with_retry;
use recall::embeddings::{EmbeddingEngine, HashingEmbedder};
use recall::store::{EmbeddingStore, ItemCategory};

pub fn execute(config: &Config, category: &str, id: &str, text: &str) -> Result<()> {
    let category = ItemCategory::from_str(category)?;
    let db = super::open_database(config)?;
    let store = EmbeddingStore::new(Arc::clone(&db));

    let embedder = HashingEmbedder::new(config.embedding.dim);
    let vector = embedder.embed_or_fallback(text);

    // Transient storage failures retry invisibly, then surface once
    with_retry(&config.retry, || {
        store.upsert(category, id, &vector, embedder.version(), Some(text))
    })?;

    println!("✅ Stored embedding for {} {}", category, id);
    Ok(())
}
