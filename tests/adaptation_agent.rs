//! Integration tests for the feedback ledger and adaptation agent cycle

use std::sync::Arc;

use recall::agent::{AdaptationAgent, Component, RunOutcome, RunState};
use recall::config::AgentConfig;
use recall::db::Database;
use recall::feedback::{FeedbackLedger, NewFeedback};

fn fresh_database() -> Arc<Database> {
    let db = Arc::new(Database::open_in_memory().expect("in-memory database"));
    db.init_schema().expect("schema");
    db
}

fn feedback_for_summary(id: &str, score: i64) -> NewFeedback {
    NewFeedback {
        summary_id: Some(id.to_string()),
        score,
        ..Default::default()
    }
}

fn feedback_for_response(id: &str, score: i64) -> NewFeedback {
    NewFeedback {
        response_id: Some(id.to_string()),
        score,
        ..Default::default()
    }
}

#[test]
fn test_run_adjusts_weights_from_feedback_polarity() {
    let db = fresh_database();
    let ledger = FeedbackLedger::new(Arc::clone(&db));

    // Positive on summaries, negative on responses
    for i in 0..4 {
        ledger
            .record(&feedback_for_summary(&format!("s{}", i), 1))
            .expect("record");
    }
    for i in 0..4 {
        ledger
            .record(&feedback_for_response(&format!("r{}", i), -1))
            .expect("record");
    }

    let agent = AdaptationAgent::new(Arc::clone(&db), AgentConfig::default()).expect("agent");
    let report = agent.run().expect("run");

    assert_eq!(report.outcome, RunOutcome::Published);
    assert_eq!(report.feedback_processed, 8);
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

    // learning_rate 0.1 on unanimous polarity moves each weight by 0.1
    let up = agent.weight(Component::Summarization);
    let down = agent.weight(Component::Response);
    assert!((up - 0.6).abs() < 1e-9, "summarization weight {}", up);
    assert!((down - 0.4).abs() < 1e-9, "response weight {}", down);

    // Untouched component keeps the neutral default
    let neutral = agent.weight(Component::TaskGeneration);
    assert!((neutral - 0.5).abs() < 1e-9);
}

#[test]
fn test_second_run_without_new_feedback_is_a_noop() {
    let db = fresh_database();
    let ledger = FeedbackLedger::new(Arc::clone(&db));
    ledger
        .record(&feedback_for_summary("s1", 1))
        .expect("record");

    let agent = AdaptationAgent::new(Arc::clone(&db), AgentConfig::default()).expect("agent");
    assert_eq!(agent.run().expect("first run").outcome, RunOutcome::Published);

    let second = agent.run().expect("second run");
    assert_eq!(second.outcome, RunOutcome::NoOp);
    assert_eq!(second.feedback_processed, 0);

    // Weights unchanged by the no-op
    let w = agent.weight(Component::Summarization);
    assert!((w - 0.6).abs() < 1e-9);
}

#[test]
fn test_watermark_limits_each_run_to_new_feedback() {
    let db = fresh_database();
    let ledger = FeedbackLedger::new(Arc::clone(&db));
    let agent = AdaptationAgent::new(Arc::clone(&db), AgentConfig::default()).expect("agent");

    ledger
        .record(&feedback_for_summary("s1", 1))
        .expect("record");
    assert_eq!(agent.run().expect("run").feedback_processed, 1);

    ledger
        .record(&feedback_for_summary("s2", 1))
        .expect("record");
    ledger
        .record(&feedback_for_summary("s3", 1))
        .expect("record");

    let report = agent.run().expect("run");
    assert_eq!(report.outcome, RunOutcome::Published);
    assert_eq!(report.feedback_processed, 2);
}

#[test]
fn test_weights_survive_agent_restart() {
    let db = fresh_database();
    let ledger = FeedbackLedger::new(Arc::clone(&db));
    for i in 0..3 {
        ledger
            .record(&feedback_for_summary(&format!("s{}", i), 1))
            .expect("record");
    }

    {
        let agent = AdaptationAgent::new(Arc::clone(&db), AgentConfig::default()).expect("agent");
        agent.run().expect("run");
    }

    // A new agent over the same database sees the persisted weights
    let revived = AdaptationAgent::new(Arc::clone(&db), AgentConfig::default()).expect("agent");
    let w = revived.weight(Component::Summarization);
    assert!((w - 0.6).abs() < 1e-9, "persisted weight {}", w);

    // And its first run has nothing new to consume
    assert_eq!(revived.run().expect("run").outcome, RunOutcome::NoOp);
}

#[test]
fn test_weight_floor_is_respected() {
    let db = fresh_database();
    let ledger = FeedbackLedger::new(Arc::clone(&db));
    let agent = AdaptationAgent::new(Arc::clone(&db), AgentConfig::default()).expect("agent");

    // Drive the response weight to the floor over repeated runs
    for round in 0..8 {
        ledger
            .record(&feedback_for_response(&format!("r{}", round), -1))
            .expect("record");
        agent.run().expect("run");
    }

    // 0.5 minus eight unanimous -0.1 deltas clamps at the 0.0 floor
    let w = agent.weight(Component::Response);
    assert!(w.abs() < 1e-9, "weight {} did not clamp at the floor", w);
}

#[test]
fn test_low_weight_produces_focus_recommendation() {
    let db = fresh_database();
    let ledger = FeedbackLedger::new(Arc::clone(&db));
    let agent = AdaptationAgent::new(Arc::clone(&db), AgentConfig::default()).expect("agent");

    // Two unanimous negative rounds push the weight to 0.3, under the
    // default 0.4 focus threshold
    let mut report = None;
    for round in 0..2 {
        ledger
            .record(&feedback_for_response(&format!("r{}", round), -1))
            .expect("record");
        report = Some(agent.run().expect("run"));
    }

    let report = report.expect("at least one run");
    assert!(
        report
            .recommendations
            .iter()
            .any(|r| r.contains("response")),
        "expected a response recommendation, got {:?}",
        report.recommendations
    );
}

#[test]
fn test_performance_report_tracks_run_history() {
    let db = fresh_database();
    let ledger = FeedbackLedger::new(Arc::clone(&db));
    let agent = AdaptationAgent::new(Arc::clone(&db), AgentConfig::default()).expect("agent");

    let empty = agent.performance_report().expect("report");
    assert_eq!(empty.total_runs, 0);
    assert!(empty.last_run_at.is_none());

    ledger
        .record(&feedback_for_summary("s1", 1))
        .expect("record");
    agent.run().expect("run");

    let after = agent.performance_report().expect("report");
    assert_eq!(after.total_runs, 1);
    assert_eq!(after.last_feedback_count, Some(1));
    assert!(after.last_run_at.is_some());
    assert_eq!(
        after.current_weights.len(),
        Component::ALL.len(),
        "every component gets a published weight"
    );
}

#[test]
fn test_concurrent_runs_never_double_apply() {
    let db = fresh_database();
    let ledger = FeedbackLedger::new(Arc::clone(&db));
    for i in 0..6 {
        ledger
            .record(&feedback_for_summary(&format!("s{}", i), 1))
            .expect("record");
    }

    let agent = Arc::new(AdaptationAgent::new(Arc::clone(&db), AgentConfig::default()).expect("agent"));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let agent = Arc::clone(&agent);
        handles.push(std::thread::spawn(move || agent.run().expect("run")));
    }
    let outcomes: Vec<RunOutcome> = handles
        .into_iter()
        .map(|h| h.join().expect("join").outcome)
        .collect();

    let published = outcomes
        .iter()
        .filter(|o| **o == RunOutcome::Published)
        .count();
    assert_eq!(published, 1, "outcomes: {:?}", outcomes);

    // Single unanimous batch applied exactly once
    let w = agent.weight(Component::Summarization);
    assert!((w - 0.6).abs() < 1e-9, "weight {}", w);
}
