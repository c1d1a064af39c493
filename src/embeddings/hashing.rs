//! Hashing-based embedding engine
//!
//! Token-hash bag-of-words embedding: each whitespace token is hashed
//! (FNV-1a) into one of `dim` buckets, then the vector is L2-normalized.
//! No model files, no network - deterministic by construction, which is
//! what makes search results reproducible and reindex verification exact.
//!
//! Semantic fidelity is deliberately modest; the engine sits behind
//! `EmbeddingEngine` so a stronger encoder can replace it without touching
//! the store or the search contract.

use anyhow::Result;

use super::EmbeddingEngine;

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Deterministic token-hashing embedder
pub struct HashingEmbedder {
    dim: usize,
    version: String,
}

impl HashingEmbedder {
    /// Create an embedder with the given dimensionality
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            version: format!("hashing-v1-d{}", dim),
        }
    }
}

impl EmbeddingEngine for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dim];

        for token in text.split_whitespace() {
            let bucket = (fnv1a(token.to_lowercase().as_bytes()) % self.dim as u64) as usize;
            vector[bucket] += 1.0;
        }

        // L2 normalize; all-zero stays all-zero (cosine handles it as 0.0)
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn version(&self) -> &str {
        &self.version
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
