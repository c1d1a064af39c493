//! Weights command - read-only view of the published component weights

use anyhow::Result;
use std::sync::Arc;

use recall::agent::{AdaptationAgent, Component};
use recall::config::Config;

pub fn execute(config: &Config, component: Option<String>, json: bool) -> Result<()> {
    let db = super::open_database(config)?;
    let agent = AdaptationAgent::new(Arc::clone(&db), config.agent.clone())?;

    if let Some(name) = component {
        let component = Component::ALL
            .into_iter()
            .find(|c| c.as_str() == name)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "unknown component '{}' (expected summarization, task_generation or response)",
                    name
                )
            })?;
        let weight = agent.weight(component);
        if json {
            println!("{}", serde_json::json!({ "component": component.as_str(), "weight": weight }));
        } else {
            println!("{}: {:.3}", component, weight);
        }
        return Ok(());
    }

    let snapshot = agent.board().current();
    if json {
        println!("{}", serde_json::to_string_pretty(&*snapshot)?);
        return Ok(());
    }

    if snapshot.weights.is_empty() {
        println!("No weights published yet; components use the default {:.2}", config.agent.initial_weight);
        return Ok(());
    }
    let mut sorted: Vec<_> = snapshot.weights.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    for (component, weight) in sorted {
        println!("{}: {:.3}", component, weight);
    }
    Ok(())
}
