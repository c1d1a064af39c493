pub mod adapt;
pub mod demo_data;
pub mod feedback;
pub mod init;
pub mod reindex;
pub mod search;
pub mod stats;
pub mod store;
pub mod weights;

use anyhow::Result;
use std::str::FromStr;
use std::sync::Arc;

use recall::config::Config;
use recall::db::Database;
use recall::store::ItemCategory;

/// Open the configured database, refusing to run against a missing file
fn open_database(config: &Config) -> Result<Arc<Database>> {
    if !config.db_path.exists() {
        anyhow::bail!(
            "Database not found at {}\n\nRun `recall init` first to create it.",
            config.db_path.display()
        );
    }
    Ok(Arc::new(Database::open(&config.db_path)?))
}

/// Parse a list of category names from the CLI
fn parse_categories(names: &[String]) -> Result<Vec<ItemCategory>> {
    names.iter().map(|n| ItemCategory::from_str(n)).collect()
}
