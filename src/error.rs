//! Error taxonomy for the recall core
//!
//! Operational code uses `anyhow::Result` throughout; these variants exist so
//! callers can tell the failure classes apart (retry storage errors, reject
//! bad feedback at the boundary, distinguish a missing query subject from an
//! empty result set).

use thiserror::Error;

use crate::store::ItemCategory;

#[derive(Debug, Error)]
pub enum RecallError {
    /// Persistence layer unreachable. Callers apply bounded retry with
    /// backoff before surfacing (see `db::with_retry`).
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Stored vector dimensionality disagrees with the active encoder.
    /// Never raised from search (mismatched candidates are skipped);
    /// surfaced as the reason text in verify reports.
    #[error("dimension mismatch for {category} {item_id}: stored {stored}, expected {expected}")]
    DimensionMismatch {
        category: ItemCategory,
        item_id: String,
        stored: usize,
        expected: usize,
    },

    /// Feedback entry missing all item references, or score outside the
    /// allowed polarity set. Nothing is written.
    #[error("invalid feedback: {0}")]
    InvalidFeedback(String),

    /// Query-by-id against a record that does not exist. Distinct from an
    /// empty result set, which is valid.
    #[error("no stored embedding for {category} {item_id}")]
    NotFound {
        category: ItemCategory,
        item_id: String,
    },
}
