//! Search command - similarity query by text or by existing item

use anyhow::Result;
use std::str::FromStr;
use std::sync::Arc;

use recall::config::Config;
use recall::db::with_retry;
use recall::embeddings::HashingEmbedder;
use recall::search::{RecallEngine, SearchRequest};
use recall::store::{EmbeddingStore, ItemCategory};

#[allow(clippy::too_many_arguments)]
pub fn execute(
    config: &Config,
    text: Option<String>,
    id: Option<String>,
    category: Option<String>,
    top_k: usize,
    filter: Option<String>,
    json: bool,
) -> Result<()> {
    if top_k < 1 {
        anyhow::bail!("--top-k must be at least 1");
    }

    let request = match (text, id) {
        (Some(text), None) => SearchRequest::by_text(text),
        (None, Some(id)) => {
            let category = category
                .ok_or_else(|| anyhow::anyhow!("--category is required with --id"))?;
            SearchRequest::by_item(ItemCategory::from_str(&category)?, id)
        }
        _ => anyhow::bail!("Provide exactly one of --text or --id"),
    };
    let filter = filter.map(|f| ItemCategory::from_str(&f)).transpose()?;
    let request = request.top_k(top_k).filter(filter);

    let db = super::open_database(config)?;
    let store = EmbeddingStore::new(Arc::clone(&db));
    let engine = RecallEngine::new(store, Arc::new(HashingEmbedder::new(config.embedding.dim)));

    let response = with_retry(&config.retry, || engine.search(&request))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!(
        "🔍 Found {} related items ({})",
        response.total_found, response.query_type
    );
    for item in &response.related {
        match &item.text {
            Some(text) => println!(
                "   {:.3}  {} {}  {}",
                item.score, item.category, item.item_id, text
            ),
            None => println!("   {:.3}  {} {}", item.score, item.category, item.item_id),
        }
    }
    Ok(())
}
