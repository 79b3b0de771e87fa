use std::fs::File;
use std::io::{BufRead, BufReader};
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::warn;

use crate::agent::agent::Agent;
use crate::agent::agent_config::AgentConfig;
use crate::agent::sources::DomEvent;
use crate::event::enrich::PageContext;
use crate::identity::registry::IdentityRegistry;
use crate::signature::element::ElementFacts;
use crate::signature::extractor::extract_signature;

// ============================================================================
// replay subcommand
// ============================================================================

#[derive(Debug, Default)]
pub struct ReplaySummary {
    pub replayed: u64,
    pub skipped: u64,
}

pub fn cmd_replay(
    events_path: &str,
    config: AgentConfig,
    url: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut agent = Agent::new();
    let summary = run_replay(&mut agent, events_path, config, url)?;

    println!(
        "Replayed {} events ({} skipped)",
        summary.replayed, summary.skipped
    );
    Ok(())
}

/// Feed a JSONL file of events through `agent`, driving the flush timer
/// from the optional `at_ms` offset on each line, then stop the agent so
/// the final partial batch goes out.
///
/// Lines are either normalized DOM events (`{"kind":"click",...}`) or
/// custom events (`{"kind":"custom","name":...,"data":{...}}`). Malformed
/// lines are skipped with a warning; a bad line never aborts the replay.
pub fn run_replay(
    agent: &mut Agent,
    events_path: &str,
    config: AgentConfig,
    url: Option<&str>,
) -> Result<ReplaySummary, Box<dyn std::error::Error>> {
    let file = File::open(events_path)?;
    let reader = BufReader::new(file);

    let mut context = PageContext::default();
    if let Some(url) = url {
        context.url = url.to_string();
    }

    let epoch = Instant::now();
    agent.start_at(config, context, epoch);

    let mut summary = ReplaySummary::default();

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut value: Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(e) => {
                warn!(line = number + 1, error = %e, "skipping malformed replay line");
                summary.skipped += 1;
                continue;
            }
        };

        // Lines may carry an explicit timeline offset; without one the
        // wall clock drives throttling and the flush timer.
        let at_ms = value
            .as_object_mut()
            .and_then(|map| map.remove("at_ms"))
            .and_then(|v| v.as_u64());
        let now = match at_ms {
            Some(ms) => epoch + Duration::from_millis(ms),
            None => Instant::now(),
        };

        agent.tick(now);

        if value.get("kind").and_then(Value::as_str) == Some("custom") {
            let name = value
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("custom")
                .to_string();
            let data = value.get("data").and_then(Value::as_object).cloned();
            agent.track_custom(&name, data);
            summary.replayed += 1;
            continue;
        }

        match serde_json::from_value::<DomEvent>(value) {
            Ok(event) => {
                agent.observe_at(event, now);
                summary.replayed += 1;
            }
            Err(e) => {
                warn!(line = number + 1, error = %e, "skipping unrecognized replay line");
                summary.skipped += 1;
            }
        }
    }

    agent.stop();
    Ok(summary)
}

// ============================================================================
// label subcommand
// ============================================================================

pub fn cmd_label(element_json: &str) -> Result<(), Box<dyn std::error::Error>> {
    let facts: ElementFacts = serde_json::from_str(element_json)?;

    match extract_signature(&facts) {
        Some(signature) => {
            let mut registry = IdentityRegistry::new();
            println!("signature: {}", signature);
            println!("stable id: {}", registry.assign(&signature));
        }
        None => println!("element has no tag name, no signature"),
    }

    Ok(())
}
