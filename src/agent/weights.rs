//! Published component weights as an atomically swapped snapshot
//!
//! Copy-on-write: the agent builds a complete new set and swaps the Arc in
//! one step. Readers hold the Arc they grabbed, so they always see a
//! consistent snapshot even while a publish is in flight.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// One immutable published weight set
#[derive(Debug, Clone, Serialize)]
pub struct WeightSnapshot {
    pub weights: HashMap<String, f64>,
    pub published_at: DateTime<Utc>,
}

impl WeightSnapshot {
    fn empty() -> Self {
        Self {
            weights: HashMap::new(),
            published_at: Utc::now(),
        }
    }
}

/// Versioned holder of the current weight snapshot
pub struct WeightBoard {
    current: RwLock<Arc<WeightSnapshot>>,
}

impl WeightBoard {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(WeightSnapshot::empty())),
        }
    }

    /// Replace the snapshot wholesale
    pub fn publish(&self, weights: HashMap<String, f64>) {
        let snapshot = Arc::new(WeightSnapshot {
            weights,
            published_at: Utc::now(),
        });
        *self.current.write() = snapshot;
    }

    /// Grab the current snapshot; cheap, never blocks a publisher for long
    pub fn current(&self) -> Arc<WeightSnapshot> {
        self.current.read().clone()
    }
}

impl Default for WeightBoard {
    fn default() -> Self {
        Self::new()
    }
}
