//! Similarity metrics for embeddings

/// Compute cosine similarity between two embedding vectors
///
/// Returns a value between -1.0 and 1.0, where:
/// - 1.0 = identical direction
/// - 0.0 = orthogonal vectors
/// - -1.0 = opposite direction
///
/// Zero-magnitude vectors yield 0.0. Callers must guarantee equal
/// dimensions (search filters mismatched candidates before scoring).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same dimension");

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

/// Clamp a raw cosine similarity to the [0, 1] confidence range used on
/// the external search surface.
pub fn confidence(similarity: f32) -> f32 {
    similarity.clamp(0.0, 1.0)
}
