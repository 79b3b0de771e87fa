use std::path::PathBuf;
use std::time::Duration;

/// Periodic flush cadence when the host does not specify one.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(10);

/// Collector endpoint used when neither CLI nor config file name one.
pub const DEFAULT_COLLECTOR_URL: &str = "https://collect.zenanalytics.io/events";

/// Directory for the persisted user id when the host does not pick one.
pub const DEFAULT_STORAGE_DIR: &str = ".zen-agent";

/// Options accepted by `Agent::start`.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Tenant identifier stamped onto every event and batch.
    pub site_id: String,
    /// Periodic flush cadence.
    pub flush_interval: Duration,
    /// Collector endpoint for the default HTTP transport.
    pub collector_url: String,
    /// Directory for the persisted user id, when using the default store.
    pub storage_dir: Option<PathBuf>,
}

impl AgentConfig {
    pub fn new(site_id: impl Into<String>) -> Self {
        AgentConfig {
            site_id: site_id.into(),
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            collector_url: DEFAULT_COLLECTOR_URL.to_string(),
            storage_dir: None,
        }
    }

    pub fn flush_interval_ms(mut self, ms: u64) -> Self {
        self.flush_interval = Duration::from_millis(ms);
        self
    }

    pub fn collector_url(mut self, url: impl Into<String>) -> Self {
        self.collector_url = url.into();
        self
    }

    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }
}
