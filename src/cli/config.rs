use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::agent::agent_config::{AgentConfig, DEFAULT_COLLECTOR_URL};

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "zen-agent",
    version,
    about = "Client instrumentation agent: stable element ids, batched event delivery"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: zen-agent.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a JSONL file of normalized DOM events through a live agent
    Replay {
        /// Path to the events file (one JSON event per line)
        #[arg(long)]
        events: String,

        /// Tenant site id stamped onto every event
        #[arg(long)]
        site_id: String,

        /// Collector endpoint URL
        #[arg(long)]
        collector: Option<String>,

        /// Periodic flush cadence in milliseconds
        #[arg(long)]
        flush_interval_ms: Option<u64>,

        /// Directory for the persisted user id
        #[arg(long)]
        storage_dir: Option<String>,

        /// Page URL stamped onto the replayed events
        #[arg(long)]
        url: Option<String>,
    },

    /// Compute the signature and stable id for element facts given as JSON
    Label {
        /// Element facts as a JSON object, e.g. '{"tag":"button","id":"go"}'
        element: String,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `zen-agent.yaml`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub agent: AgentFileConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentFileConfig {
    #[serde(default = "default_flush_ms")]
    pub flush_interval_ms: u64,

    pub storage_dir: Option<String>,
}

impl Default for AgentFileConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: default_flush_ms(),
            storage_dir: None,
        }
    }
}

// Serde default helpers
fn default_endpoint() -> String {
    DEFAULT_COLLECTOR_URL.to_string()
}
fn default_flush_ms() -> u64 {
    10_000
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("zen-agent.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Build an AgentConfig from resolved values. CLI args win over the config
/// file, the config file over built-in defaults.
pub fn build_agent_config(
    site_id: &str,
    collector: Option<&str>,
    flush_interval_ms: Option<u64>,
    storage_dir: Option<&str>,
    file: &AppConfig,
) -> AgentConfig {
    let mut config = AgentConfig::new(site_id)
        .collector_url(collector.unwrap_or(&file.collector.endpoint))
        .flush_interval_ms(flush_interval_ms.unwrap_or(file.agent.flush_interval_ms));

    if let Some(dir) = storage_dir.or(file.agent.storage_dir.as_deref()) {
        config = config.storage_dir(dir);
    }

    config
}
