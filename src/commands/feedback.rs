//! Feedback command - record scored feedback for one or more items

use anyhow::Result;
use std::sync::Arc;

use recall::config::Config;
use recall::feedback::{FeedbackLedger, NewFeedback};

pub fn execute(
    config: &Config,
    summary_id: Option<String>,
    task_id: Option<String>,
    response_id: Option<String>,
    score: i64,
    comment: Option<String>,
) -> Result<()> {
    let db = super::open_database(config)?;
    let ledger = FeedbackLedger::new(Arc::clone(&db));

    let id = ledger.record(&NewFeedback {
        summary_id,
        task_id,
        response_id,
        score,
        comment,
    })?;

    println!("✅ Feedback recorded (entry f{})", id);
    Ok(())
}
