//! Init command - create the recall database and its schema

use anyhow::Result;
use std::sync::Arc;

use recall::config::Config;
use recall::db::Database;

pub fn execute(config: &Config) -> Result<()> {
    let db = Arc::new(Database::open(&config.db_path)?);
    db.init_schema()?;

    println!("✅ Database initialized at {}", config.db_path.display());
    Ok(())
}
