//! Adapt command - run the adaptation agent or show its run history

use anyhow::Result;
use std::sync::Arc;

use recall::agent::{AdaptationAgent, RunOutcome};
use recall::config::Config;

pub fn execute(config: &Config, report: bool, json: bool) -> Result<()> {
    let db = super::open_database(config)?;
    let agent = AdaptationAgent::new(Arc::clone(&db), config.agent.clone())?;

    if report {
        let performance = agent.performance_report()?;
        if json {
            println!("{}", serde_json::to_string_pretty(&performance)?);
        } else {
            println!("📈 {} adaptation runs", performance.total_runs);
            if let Some(at) = performance.last_run_at {
                println!("   Last run: {}", at.to_rfc3339());
            }
            print_weights(&performance.current_weights);
        }
        return Ok(());
    }

    let run = agent.run()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&run)?);
        return Ok(());
    }

    match run.outcome {
        RunOutcome::NoOp => println!("💤 No new feedback since the last run"),
        RunOutcome::AlreadyRunning => println!("⚠️  An adaptation run is already in progress"),
        RunOutcome::Published => {
            println!(
                "✅ Processed {} feedback entries (trend: {})",
                run.feedback_processed, run.trend
            );
            print_weights(&run.weights);
            if !run.recommendations.is_empty() {
                println!("\nRecommendations:");
                for recommendation in &run.recommendations {
                    println!("   • {}", recommendation);
                }
            }
        }
    }
    Ok(())
}

fn print_weights(weights: &std::collections::HashMap<String, f64>) {
    let mut sorted: Vec<_> = weights.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    println!("\nComponent weights:");
    for (component, weight) in sorted {
        println!("   {}: {:.3}", component, weight);
    }
}
