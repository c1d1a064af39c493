//! Similarity search over stored embeddings
//!
//! Brute-force cosine scan over the candidate set, scored in parallel.
//! O(n) per query is a deliberate tradeoff at this scale (tens of
//! thousands of items); an indexed nearest-neighbor structure can replace
//! the internals later without changing the `search` contract.

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::embeddings::{confidence, cosine_similarity, EmbeddingEngine};
use crate::error::RecallError;
use crate::store::{EmbeddingStore, ItemCategory};

/// Result text is truncated to this many characters for display
const TEXT_PREVIEW_CHARS: usize = 200;

/// What to search by
#[derive(Debug, Clone)]
pub enum QueryInput {
    /// Encode this text on the fly (no store mutation); always succeeds
    Text(String),
    /// Use the stored vector of an existing item; the item itself is
    /// excluded from the results. Missing subject is an error.
    Item {
        category: ItemCategory,
        item_id: String,
    },
}

/// A similarity query
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub input: QueryInput,
    /// Number of results to return; clamped to at least 1
    pub top_k: usize,
    /// Restrict candidates to one category
    pub category_filter: Option<ItemCategory>,
}

impl SearchRequest {
    pub fn by_text(text: impl Into<String>) -> Self {
        Self {
            input: QueryInput::Text(text.into()),
            top_k: 3,
            category_filter: None,
        }
    }

    pub fn by_item(category: ItemCategory, item_id: impl Into<String>) -> Self {
        Self {
            input: QueryInput::Item {
                category,
                item_id: item_id.into(),
            },
            top_k: 3,
            category_filter: None,
        }
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn filter(mut self, category: Option<ItemCategory>) -> Self {
        self.category_filter = category;
        self
    }
}

/// One ranked result
#[derive(Debug, Clone, Serialize)]
pub struct RelatedItem {
    pub category: ItemCategory,
    pub item_id: String,
    /// Cosine similarity clamped to [0, 1]
    pub score: f32,
    /// Stored text, truncated for display
    pub text: Option<String>,
}

/// Response shape of the similarity query surface
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub related: Vec<RelatedItem>,
    pub query_type: String,
    pub total_found: usize,
}

/// Ranks stored vectors against a query vector by cosine similarity
pub struct RecallEngine {
    store: EmbeddingStore,
    engine: Arc<dyn EmbeddingEngine>,
}

impl RecallEngine {
    pub fn new(store: EmbeddingStore, engine: Arc<dyn EmbeddingEngine>) -> Self {
        Self { store, engine }
    }

    /// Run a similarity query and return the top-k ranked candidates
    ///
    /// Candidates whose stored dimensionality disagrees with the query
    /// vector are silently skipped - a mixed-version store degrades search
    /// coverage, it never crashes a query. Fewer than top_k candidates
    /// returns all of them.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let top_k = request.top_k.max(1);

        let (query_vector, exclude, query_type) = match &request.input {
            QueryInput::Text(text) => {
                let vector = self.engine.embed_or_fallback(text);
                (vector, None, "message_text")
            }
            QueryInput::Item { category, item_id } => {
                let record = self
                    .store
                    .get(*category, item_id)
                    .context("Failed to fetch query subject")?
                    .ok_or_else(|| RecallError::NotFound {
                        category: *category,
                        item_id: item_id.clone(),
                    })?;
                (record.vector, Some((*category, item_id.clone())), "item_id")
            }
        };

        let candidates = self
            .store
            .scan(request.category_filter)
            .context("Failed to scan candidates")?;

        let mut scored: Vec<RelatedItem> = candidates
            .par_iter()
            .filter(|record| record.vector.len() == query_vector.len())
            .filter(|record| match &exclude {
                Some((category, item_id)) => {
                    !(record.category == *category && record.item_id == *item_id)
                }
                None => true,
            })
            .map(|record| {
                let raw = cosine_similarity(&query_vector, &record.vector);
                (record, raw)
            })
            .map(|(record, raw)| RelatedItem {
                category: record.category,
                item_id: record.item_id.clone(),
                score: confidence(raw),
                text: record.text.as_deref().map(truncate_preview),
            })
            .collect();

        // Deterministic ranking: score desc, then freshest updated_at,
        // then id as a stable final tie-break.
        let updated_at: std::collections::HashMap<(ItemCategory, &str), _> = candidates
            .iter()
            .map(|r| ((r.category, r.item_id.as_str()), r.updated_at))
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    let a_at = updated_at.get(&(a.category, a.item_id.as_str()));
                    let b_at = updated_at.get(&(b.category, b.item_id.as_str()));
                    b_at.cmp(&a_at)
                })
                .then_with(|| a.item_id.cmp(&b.item_id))
        });

        scored.truncate(top_k);
        let total_found = scored.len();

        Ok(SearchResponse {
            related: scored,
            query_type: query_type.to_string(),
            total_found,
        })
    }
}

fn truncate_preview(text: &str) -> String {
    if text.chars().count() <= TEXT_PREVIEW_CHARS {
        text.to_string()
    } else {
        let mut preview: String = text.chars().take(TEXT_PREVIEW_CHARS).collect();
        preview.push_str("...");
        preview
    }
}
