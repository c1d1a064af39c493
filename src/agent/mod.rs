//! Adaptation agent - turns accumulated feedback into component weights
//!
//! Discrete runs, not a continuous loop: Idle -> Collecting -> Computing ->
//! Publishing -> Idle. Each run reads the ledger past the last watermark,
//! computes one bounded adjustment per text-generation component, and
//! publishes the whole weight set atomically. A single run can never move a
//! weight by more than the configured maximum delta, which keeps the loop
//! stable under bursty feedback.
//!
//! The agent only publishes weights; upstream components pull them on their
//! next invocation. It never calls into them.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::params;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::AgentConfig;
use crate::db::Database;
use crate::feedback::{FeedbackEntry, FeedbackLedger};

mod weights;

pub use weights::{WeightBoard, WeightSnapshot};

/// Text-generation components the agent adjusts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Summarization,
    TaskGeneration,
    Response,
}

impl Component {
    pub const ALL: [Component; 3] = [
        Component::Summarization,
        Component::TaskGeneration,
        Component::Response,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Summarization => "summarization",
            Component::TaskGeneration => "task_generation",
            Component::Response => "response",
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phases a run passes through, recorded for observability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Collecting,
    Computing,
    Publishing,
}

/// How a triggered run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Weights updated and watermark advanced
    Published,
    /// No new feedback since the watermark; nothing changed
    NoOp,
    /// Another run was already in progress
    AlreadyRunning,
}

/// Report of one adaptation run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub state_trace: Vec<RunState>,
    pub feedback_processed: usize,
    /// Signed weight change applied per component this run
    pub adjustments: HashMap<String, f64>,
    /// Weight set after the run
    pub weights: HashMap<String, f64>,
    /// Feedback trend over the collected window
    pub trend: String,
    pub recommendations: Vec<String>,
}

/// Summary of run history for the performance surface
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub current_weights: HashMap<String, f64>,
    pub total_runs: i64,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_feedback_count: Option<i64>,
}

/// Consumes feedback history and publishes per-component weights
pub struct AdaptationAgent {
    db: Arc<Database>,
    ledger: FeedbackLedger,
    config: AgentConfig,
    board: WeightBoard,
    run_guard: Mutex<()>,
}

impl AdaptationAgent {
    /// Create an agent, loading any persisted weights into the board
    pub fn new(db: Arc<Database>, config: AgentConfig) -> Result<Self> {
        let ledger = FeedbackLedger::new(db.clone());
        let board = WeightBoard::new();

        let persisted = load_weights(&db)?;
        if !persisted.is_empty() {
            board.publish(persisted);
        }

        Ok(Self {
            db,
            ledger,
            config,
            board,
            run_guard: Mutex::new(()),
        })
    }

    /// Read-only access to the published weight snapshot
    pub fn board(&self) -> &WeightBoard {
        &self.board
    }

    /// Current weight for one component, falling back to the neutral
    /// default for components never adjusted.
    pub fn weight(&self, component: Component) -> f64 {
        self.board
            .current()
            .weights
            .get(component.as_str())
            .copied()
            .unwrap_or(self.config.initial_weight)
    }

    /// Execute one adaptation run
    ///
    /// Mutually exclusive with itself: a concurrent trigger returns
    /// `AlreadyRunning` without touching anything.
    pub fn run(&self) -> Result<RunReport> {
        let _guard = match self.run_guard.try_lock() {
            Some(guard) => guard,
            None => {
                return Ok(RunReport {
                    outcome: RunOutcome::AlreadyRunning,
                    state_trace: vec![RunState::Idle],
                    feedback_processed: 0,
                    adjustments: HashMap::new(),
                    weights: self.board.current().weights.clone(),
                    trend: "not_computed".to_string(),
                    recommendations: Vec::new(),
                })
            }
        };

        let mut state_trace = vec![RunState::Idle, RunState::Collecting];

        // Collecting: everything past the last successful watermark
        let watermark = self.last_watermark()?;
        let mut entries = self.ledger.query(watermark, None)?;
        if let Some(watermark) = watermark {
            entries.retain(|e| e.timestamp > watermark);
        }

        if entries.is_empty() {
            log::info!("adaptation run: no new feedback, leaving weights untouched");
            return Ok(RunReport {
                outcome: RunOutcome::NoOp,
                state_trace,
                feedback_processed: 0,
                adjustments: HashMap::new(),
                weights: self.board.current().weights.clone(),
                trend: "insufficient_data".to_string(),
                recommendations: Vec::new(),
            });
        }

        // Computing: one bounded delta per component
        state_trace.push(RunState::Computing);
        let current = self.board.current();
        let mut adjustments = HashMap::new();
        let mut new_weights: HashMap<String, f64> = current.weights.clone();

        for component in Component::ALL {
            let (positive, negative) = component_tally(&entries, component);
            let total = positive + negative;
            if total == 0 {
                continue;
            }

            let old = new_weights
                .get(component.as_str())
                .copied()
                .unwrap_or(self.config.initial_weight);

            let signal = (positive as f64 - negative as f64) / total as f64;
            let delta = (self.config.learning_rate * signal)
                .clamp(-self.config.max_delta, self.config.max_delta);
            let updated = (old + delta).clamp(self.config.min_weight, self.config.max_weight);

            adjustments.insert(component.as_str().to_string(), updated - old);
            new_weights.insert(component.as_str().to_string(), updated);
        }

        // Components with no feedback yet still get the neutral default so
        // readers always see a complete set.
        for component in Component::ALL {
            new_weights
                .entry(component.as_str().to_string())
                .or_insert(self.config.initial_weight);
        }

        let trend = feedback_trend(&entries);
        let new_watermark = entries.iter().map(|e| e.timestamp).max();

        // Publishing: weights + run row in one transaction, then swap the
        // in-memory snapshot. Readers see the old set or the new one,
        // never a mix.
        state_trace.push(RunState::Publishing);
        self.persist(&new_weights, new_watermark, entries.len())?;
        self.board.publish(new_weights.clone());

        state_trace.push(RunState::Idle);

        let recommendations = self.recommendations(&new_weights);
        log::info!(
            "adaptation run: processed {} entries, adjusted {} components",
            entries.len(),
            adjustments.len()
        );

        Ok(RunReport {
            outcome: RunOutcome::Published,
            state_trace,
            feedback_processed: entries.len(),
            adjustments,
            weights: new_weights,
            trend,
            recommendations,
        })
    }

    /// Run history summary backing the performance surface
    pub fn performance_report(&self) -> Result<PerformanceReport> {
        let conn = self.db.lock();
        let total_runs: i64 =
            conn.query_row("SELECT COUNT(*) FROM agent_runs", [], |row| row.get(0))?;

        let last: Option<(String, i64)> = conn
            .query_row(
                "SELECT ran_at, feedback_count FROM agent_runs ORDER BY id DESC LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        let (last_run_at, last_feedback_count) = match last {
            Some((ran_at, count)) => {
                let at = DateTime::parse_from_rfc3339(&ran_at)
                    .context("bad ran_at timestamp")?
                    .with_timezone(&Utc);
                (Some(at), Some(count))
            }
            None => (None, None),
        };

        Ok(PerformanceReport {
            current_weights: self.board.current().weights.clone(),
            total_runs,
            last_run_at,
            last_feedback_count,
        })
    }

    fn last_watermark(&self) -> Result<Option<DateTime<Utc>>> {
        let conn = self.db.lock();
        let watermark: Option<String> = conn
            .query_row(
                "SELECT watermark FROM agent_runs
                 WHERE watermark IS NOT NULL ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        match watermark {
            Some(ts) => Ok(Some(
                DateTime::parse_from_rfc3339(&ts)
                    .context("bad watermark timestamp")?
                    .with_timezone(&Utc),
            )),
            None => Ok(None),
        }
    }

    fn persist(
        &self,
        weights: &HashMap<String, f64>,
        watermark: Option<DateTime<Utc>>,
        feedback_count: usize,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let mut conn = self.db.lock();
        let tx = conn.transaction().context("Failed to begin transaction")?;

        for (component, weight) in weights {
            tx.execute(
                "INSERT OR REPLACE INTO component_weights (component, weight, last_updated)
                 VALUES (?, ?, ?)",
                params![component, weight, now],
            )?;
        }
        tx.execute(
            "INSERT INTO agent_runs (watermark, feedback_count, ran_at) VALUES (?, ?, ?)",
            params![
                watermark.map(|w| w.to_rfc3339()),
                feedback_count as i64,
                now
            ],
        )?;

        tx.commit().context("Failed to commit weight update")?;
        Ok(())
    }

    fn recommendations(&self, weights: &HashMap<String, f64>) -> Vec<String> {
        let mut recommendations = Vec::new();
        let below = |component: Component| {
            weights
                .get(component.as_str())
                .map(|w| *w < self.config.focus_threshold)
                .unwrap_or(false)
        };

        if below(Component::Summarization) {
            recommendations
                .push("summarization: focus on improving summary accuracy and relevance".into());
        }
        if below(Component::TaskGeneration) {
            recommendations
                .push("task_generation: improve task generation to better match user needs".into());
        }
        if below(Component::Response) {
            recommendations.push("response: enhance response quality and helpfulness".into());
        }
        recommendations
    }
}

/// Count positive/negative entries referencing a component's item kind
fn component_tally(entries: &[FeedbackEntry], component: Component) -> (usize, usize) {
    let mut positive = 0;
    let mut negative = 0;
    for entry in entries {
        let referenced = match component {
            Component::Summarization => entry.summary_id.is_some(),
            Component::TaskGeneration => entry.task_id.is_some(),
            Component::Response => entry.response_id.is_some(),
        };
        if !referenced {
            continue;
        }
        if entry.score > 0 {
            positive += 1;
        } else if entry.score < 0 {
            negative += 1;
        }
    }
    (positive, negative)
}

/// Classify the feedback window: recent third vs the rest
fn feedback_trend(entries: &[FeedbackEntry]) -> String {
    if entries.len() < 10 {
        return "insufficient_data".to_string();
    }

    let mut ordered: Vec<&FeedbackEntry> = entries.iter().collect();
    ordered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let split_point = ordered.len() / 3;
    let recent = &ordered[..split_point];
    let older = &ordered[split_point..];

    let positive_ratio =
        |window: &[&FeedbackEntry]| window.iter().filter(|e| e.score > 0).count() as f64 / window.len() as f64;

    let recent_ratio = positive_ratio(recent);
    let older_ratio = positive_ratio(older);

    if recent_ratio > older_ratio + 0.1 {
        "improving".to_string()
    } else if recent_ratio < older_ratio - 0.1 {
        "declining".to_string()
    } else {
        "stable".to_string()
    }
}

fn load_weights(db: &Database) -> Result<HashMap<String, f64>> {
    let conn = db.lock();
    let mut stmt = conn.prepare("SELECT component, weight FROM component_weights")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
    })?;

    let mut weights = HashMap::new();
    for row in rows {
        let (component, weight) = row?;
        weights.insert(component, weight);
    }
    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::NewFeedback;

    fn fixture() -> Result<(Arc<Database>, FeedbackLedger, AdaptationAgent)> {
        let db = Arc::new(Database::open_in_memory()?);
        db.init_schema()?;
        let ledger = FeedbackLedger::new(db.clone());
        let agent = AdaptationAgent::new(db.clone(), AgentConfig::default())?;
        Ok((db, ledger, agent))
    }

    fn feedback(summary: Option<&str>, task: Option<&str>, score: i64) -> NewFeedback {
        NewFeedback {
            summary_id: summary.map(String::from),
            task_id: task.map(String::from),
            score,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_feedback_is_noop() -> Result<()> {
        let (_db, _ledger, agent) = fixture()?;

        let report = agent.run()?;
        assert_eq!(report.outcome, RunOutcome::NoOp);
        assert_eq!(report.feedback_processed, 0);
        assert!(report.adjustments.is_empty());
        assert_eq!(agent.performance_report()?.total_runs, 0);
        Ok(())
    }

    #[test]
    fn test_positive_feedback_raises_component_weight() -> Result<()> {
        let (_db, ledger, agent) = fixture()?;

        for _ in 0..5 {
            ledger.record(&feedback(Some("s1"), None, 1))?;
        }

        let report = agent.run()?;
        assert_eq!(report.outcome, RunOutcome::Published);
        assert_eq!(report.feedback_processed, 5);

        let weight = agent.weight(Component::Summarization);
        assert!(weight > 0.5, "weight should rise, got {}", weight);
        // Untouched components stay at the neutral default
        assert_eq!(agent.weight(Component::Response), 0.5);
        Ok(())
    }

    #[test]
    fn test_single_run_bounded_by_max_delta() -> Result<()> {
        let (_db, ledger, agent) = fixture()?;

        // A burst of one-sided feedback cannot move a weight more than
        // max_delta in one run
        for _ in 0..100 {
            ledger.record(&feedback(None, Some("t1"), -1))?;
        }

        let report = agent.run()?;
        let delta = report.adjustments.get("task_generation").copied().unwrap();
        assert!(delta.abs() <= AgentConfig::default().max_delta + 1e-9);
        assert_eq!(report.outcome, RunOutcome::Published);
        Ok(())
    }

    #[test]
    fn test_weights_stay_within_bounds() -> Result<()> {
        let (_db, ledger, agent) = fixture()?;

        // Many runs of all-negative feedback: weight converges to the
        // lower bound, never past it
        for _ in 0..10 {
            ledger.record(&feedback(Some("s1"), None, -1))?;
            agent.run()?;
        }
        let config = AgentConfig::default();
        let weight = agent.weight(Component::Summarization);
        assert!(weight >= config.min_weight && weight <= config.max_weight);
        Ok(())
    }

    #[test]
    fn test_watermark_prevents_reprocessing() -> Result<()> {
        let (_db, ledger, agent) = fixture()?;

        ledger.record(&feedback(Some("s1"), None, 1))?;
        let first = agent.run()?;
        assert_eq!(first.feedback_processed, 1);

        // Same ledger, no new entries: the second run is a no-op
        let second = agent.run()?;
        assert_eq!(second.outcome, RunOutcome::NoOp);
        assert_eq!(second.feedback_processed, 0);
        Ok(())
    }

    #[test]
    fn test_state_trace_covers_full_cycle() -> Result<()> {
        let (_db, ledger, agent) = fixture()?;
        ledger.record(&feedback(Some("s1"), None, 1))?;

        let report = agent.run()?;
        assert_eq!(
            report.state_trace,
            vec![
                RunState::Idle,
                RunState::Collecting,
                RunState::Computing,
                RunState::Publishing,
                RunState::Idle
            ]
        );
        Ok(())
    }

    #[test]
    fn test_weights_survive_restart() -> Result<()> {
        let (db, ledger, agent) = fixture()?;

        for _ in 0..3 {
            ledger.record(&feedback(Some("s1"), None, 1))?;
        }
        agent.run()?;
        let before = agent.weight(Component::Summarization);

        // New agent over the same database picks up the persisted set
        let reloaded = AdaptationAgent::new(db, AgentConfig::default())?;
        assert_eq!(reloaded.weight(Component::Summarization), before);
        Ok(())
    }

    #[test]
    fn test_recommendation_below_threshold() -> Result<()> {
        let config = AgentConfig {
            initial_weight: 0.35,
            ..Default::default()
        };
        let db = Arc::new(Database::open_in_memory()?);
        db.init_schema()?;
        let ledger = FeedbackLedger::new(db.clone());
        let agent = AdaptationAgent::new(db, config)?;

        ledger.record(&feedback(Some("s1"), None, -1))?;
        let report = agent.run()?;

        assert!(report
            .recommendations
            .iter()
            .any(|r| r.starts_with("summarization:")));
        Ok(())
    }

    #[test]
    fn test_trend_classification() {
        use chrono::Duration;

        let base = Utc::now();
        let entry = |offset: i64, score: i64| FeedbackEntry {
            id: offset,
            summary_id: Some("s1".to_string()),
            task_id: None,
            response_id: None,
            score,
            comment: None,
            timestamp: base + Duration::seconds(offset),
        };

        // Older two-thirds negative, recent third positive
        let mut entries: Vec<FeedbackEntry> = (0..8).map(|i| entry(i, -1)).collect();
        entries.extend((8..12).map(|i| entry(i, 1)));
        assert_eq!(feedback_trend(&entries), "improving");

        // Uniformly positive
        let entries: Vec<FeedbackEntry> = (0..12).map(|i| entry(i, 1)).collect();
        assert_eq!(feedback_trend(&entries), "stable");

        // Too few to call
        let entries: Vec<FeedbackEntry> = (0..5).map(|i| entry(i, 1)).collect();
        assert_eq!(feedback_trend(&entries), "insufficient_data");
    }
}
