pub mod agent;
pub mod config;
pub mod db;
pub mod embeddings;
pub mod error;
pub mod feedback;
pub mod reindex;
pub mod search;
pub mod store;

// Re-export commonly used types
pub use agent::AdaptationAgent;
pub use config::Config;
pub use error::RecallError;
pub use search::RecallEngine;
pub use store::EmbeddingStore;
