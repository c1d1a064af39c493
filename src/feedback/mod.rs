//! Feedback ledger - append-only record of scored user feedback
//!
//! Entries are immutable once written; there is no update or delete path.
//! Validation happens before anything touches the table, so a rejected
//! entry is never partially recorded.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::Serialize;
use std::sync::Arc;

use crate::db::Database;
use crate::error::RecallError;

/// Allowed feedback polarities: thumbs up / thumbs down
pub const ALLOWED_SCORES: [i64; 2] = [1, -1];

/// An immutable ledger entry
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackEntry {
    pub id: i64,
    pub summary_id: Option<String>,
    pub task_id: Option<String>,
    pub response_id: Option<String>,
    pub score: i64,
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Feedback to record: at least one item reference must be set
#[derive(Debug, Clone, Default)]
pub struct NewFeedback {
    pub summary_id: Option<String>,
    pub task_id: Option<String>,
    pub response_id: Option<String>,
    pub score: i64,
    pub comment: Option<String>,
}

/// Which item a query should be limited to
#[derive(Debug, Clone)]
pub enum ItemFilter {
    Summary(String),
    Task(String),
    Response(String),
}

/// Append-only feedback store
#[derive(Clone)]
pub struct FeedbackLedger {
    db: Arc<Database>,
}

impl FeedbackLedger {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Append one entry, returning its id
    ///
    /// Rejects scores outside the polarity set and entries with no item
    /// reference (`InvalidFeedback`); nothing is written on rejection.
    pub fn record(&self, feedback: &NewFeedback) -> Result<i64> {
        if !ALLOWED_SCORES.contains(&feedback.score) {
            return Err(RecallError::InvalidFeedback(format!(
                "score {} is not in the allowed set {:?}",
                feedback.score, ALLOWED_SCORES
            ))
            .into());
        }

        if feedback.summary_id.is_none()
            && feedback.task_id.is_none()
            && feedback.response_id.is_none()
        {
            return Err(RecallError::InvalidFeedback(
                "at least one of summary_id, task_id, response_id must be set".to_string(),
            )
            .into());
        }

        let conn = self.db.lock();
        conn.execute(
            "INSERT INTO coach_feedback
             (summary_id, task_id, response_id, score, comment, timestamp)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                feedback.summary_id,
                feedback.task_id,
                feedback.response_id,
                feedback.score,
                feedback.comment,
                Utc::now().to_rfc3339(),
            ],
        )
        .context("Failed to record feedback")?;

        Ok(conn.last_insert_rowid())
    }

    /// Read entries, oldest first, optionally bounded by a watermark and
    /// filtered to one item. Entries with timestamp < since are never
    /// returned.
    pub fn query(
        &self,
        since: Option<DateTime<Utc>>,
        filter: Option<&ItemFilter>,
    ) -> Result<Vec<FeedbackEntry>> {
        let mut sql = String::from(
            "SELECT id, summary_id, task_id, response_id, score, comment, timestamp
             FROM coach_feedback WHERE 1=1",
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(since) = since {
            sql.push_str(" AND timestamp >= ?");
            params.push(Box::new(since.to_rfc3339()));
        }
        match filter {
            Some(ItemFilter::Summary(id)) => {
                sql.push_str(" AND summary_id = ?");
                params.push(Box::new(id.clone()));
            }
            Some(ItemFilter::Task(id)) => {
                sql.push_str(" AND task_id = ?");
                params.push(Box::new(id.clone()));
            }
            Some(ItemFilter::Response(id)) => {
                sql.push_str(" AND response_id = ?");
                params.push(Box::new(id.clone()));
            }
            None => {}
        }
        sql.push_str(" ORDER BY timestamp ASC, id ASC");

        let conn = self.db.lock();
        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            let timestamp: String = row.get(6)?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        6,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?
                .with_timezone(&Utc);

            Ok(FeedbackEntry {
                id: row.get(0)?,
                summary_id: row.get(1)?,
                task_id: row.get(2)?,
                response_id: row.get(3)?,
                score: row.get(4)?,
                comment: row.get(5)?,
                timestamp,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_ledger() -> Result<FeedbackLedger> {
        let db = Arc::new(Database::open_in_memory()?);
        db.init_schema()?;
        Ok(FeedbackLedger::new(db))
    }

    fn thumbs_up(summary_id: &str) -> NewFeedback {
        NewFeedback {
            summary_id: Some(summary_id.to_string()),
            score: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_record_and_query() -> Result<()> {
        let ledger = test_ledger()?;

        let id = ledger.record(&thumbs_up("s1"))?;
        assert!(id > 0);

        let entries = ledger.query(None, None)?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].summary_id.as_deref(), Some("s1"));
        assert_eq!(entries[0].score, 1);
        Ok(())
    }

    #[test]
    fn test_record_accepts_ids_without_upstream_rows() -> Result<()> {
        // summaries/tasks/responses are empty; references are informational
        // and must not gate the write
        let ledger = test_ledger()?;

        let id = ledger.record(&NewFeedback {
            summary_id: Some("never-stored".to_string()),
            task_id: Some("also-never-stored".to_string()),
            score: -1,
            ..Default::default()
        })?;
        assert!(id > 0);

        let entries = ledger.query(None, None)?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].summary_id.as_deref(), Some("never-stored"));
        Ok(())
    }

    #[test]
    fn test_rejects_missing_references() -> Result<()> {
        let ledger = test_ledger()?;

        let err = ledger
            .record(&NewFeedback {
                score: 1,
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RecallError>(),
            Some(RecallError::InvalidFeedback(_))
        ));

        // Nothing was written
        assert!(ledger.query(None, None)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_rejects_out_of_range_score() -> Result<()> {
        let ledger = test_ledger()?;

        for bad_score in [0, 2, -5] {
            let err = ledger
                .record(&NewFeedback {
                    summary_id: Some("s1".to_string()),
                    score: bad_score,
                    ..Default::default()
                })
                .unwrap_err();
            assert!(matches!(
                err.downcast_ref::<RecallError>(),
                Some(RecallError::InvalidFeedback(_))
            ));
        }
        Ok(())
    }

    #[test]
    fn test_entries_are_immutable_across_reads() -> Result<()> {
        let ledger = test_ledger()?;
        ledger.record(&NewFeedback {
            task_id: Some("t1".to_string()),
            score: -1,
            comment: Some("not helpful".to_string()),
            ..Default::default()
        })?;

        let first = ledger.query(None, None)?;
        let second = ledger.query(None, None)?;
        assert_eq!(first[0].id, second[0].id);
        assert_eq!(first[0].score, second[0].score);
        assert_eq!(first[0].comment, second[0].comment);
        assert_eq!(first[0].timestamp, second[0].timestamp);
        Ok(())
    }

    #[test]
    fn test_query_respects_watermark() -> Result<()> {
        let ledger = test_ledger()?;
        ledger.record(&thumbs_up("s1"))?;

        let after_first = Utc::now() + chrono::Duration::seconds(1);
        let entries = ledger.query(Some(after_first), None)?;
        assert!(entries.is_empty());

        let before_first = Utc::now() - chrono::Duration::seconds(60);
        let entries = ledger.query(Some(before_first), None)?;
        assert_eq!(entries.len(), 1);
        Ok(())
    }

    #[test]
    fn test_query_filters_by_item() -> Result<()> {
        let ledger = test_ledger()?;
        ledger.record(&thumbs_up("s1"))?;
        ledger.record(&NewFeedback {
            task_id: Some("t1".to_string()),
            score: -1,
            ..Default::default()
        })?;

        let summaries = ledger.query(None, Some(&ItemFilter::Summary("s1".to_string())))?;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].summary_id.as_deref(), Some("s1"));

        let tasks = ledger.query(None, Some(&ItemFilter::Task("t1".to_string())))?;
        assert_eq!(tasks.len(), 1);
        Ok(())
    }
}
