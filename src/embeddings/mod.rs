//! Embeddings module - Generate semantic embeddings for text
//!
//! Provides trait-based abstraction for embedding generation with a
//! deterministic hashing backend. The engine is constructed once at startup
//! and injected by reference; it is never re-initialized mid-request.

mod hashing;
mod similarity;

pub use hashing::HashingEmbedder;
pub use similarity::{confidence, cosine_similarity};

use anyhow::Result;

/// Trait for embedding generation engines
///
/// Pure given a fixed version: the same text always produces the same
/// vector. Requires Send + Sync for sharing across query threads.
pub trait EmbeddingEngine: Send + Sync {
    /// Generate embedding for a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get embedding dimension (e.g. 64 for the default hashing encoder)
    fn dimension(&self) -> usize;

    /// Version tag recorded alongside every vector this engine produces,
    /// so reindex/verification can detect stale records later.
    fn version(&self) -> &str;

    /// Generate an embedding, degrading to a deterministic fallback vector
    /// instead of failing the caller's write path.
    ///
    /// Empty or whitespace-only text always takes the fallback. An encoder
    /// error is logged as a warning and degrades the same way - a usable
    /// embedding beats blocking the pipeline.
    fn embed_or_fallback(&self, text: &str) -> Vec<f32> {
        if text.trim().is_empty() {
            return fallback_vector(self.dimension());
        }
        match self.embed(text) {
            Ok(vector) => vector,
            Err(e) => {
                log::warn!("encoding failed, using fallback vector: {}", e);
                fallback_vector(self.dimension())
            }
        }
    }
}

/// Deterministic pseudo-random unit vector for degraded encoding
///
/// Seeded from the dimension alone, so every caller sees the same fallback
/// for a given encoder and repeated degraded writes stay idempotent.
pub fn fallback_vector(dim: usize) -> Vec<f32> {
    let mut rng = fastrand::Rng::with_seed(0x5EED ^ dim as u64);
    let mut vector: Vec<f32> = (0..dim).map(|_| rng.f32() * 2.0 - 1.0).collect();

    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}
