//! Stats command - embedding counts and encoder-version breakdown

use anyhow::Result;
use std::sync::Arc;

use recall::config::Config;
use recall::store::EmbeddingStore;

pub fn execute(config: &Config, json: bool) -> Result<()> {
    let db = super::open_database(config)?;
    let store = EmbeddingStore::new(Arc::clone(&db));
    let stats = store.stats()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("📊 {} embeddings stored", stats.total);
    let mut categories: Vec<_> = stats.by_category.iter().collect();
    categories.sort();
    for (category, count) in categories {
        println!("   {}: {}", category, count);
    }

    if !stats.by_version.is_empty() {
        println!("\nEncoder versions:");
        let mut versions: Vec<_> = stats.by_version.iter().collect();
        versions.sort();
        for (version, count) in versions {
            println!("   {}: {}", version, count);
        }
    }
    Ok(())
}
