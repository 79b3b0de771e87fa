use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::agent::agent_config::{AgentConfig, DEFAULT_STORAGE_DIR};
use crate::agent::sources::{ALL_SOURCES, DomEvent, SourceKind, Throttle, runtime_error_payload};
use crate::event::enrich::{Enricher, PageContext};
use crate::identity::registry::IdentityRegistry;
use crate::identity::user::{
    FileIdentityStore, IdentityStore, RandomSource, SystemRandom, load_or_create_user_id,
};
use crate::pipeline::buffer::EventBuffer;
use crate::pipeline::flush::{FlushScheduler, flush};
use crate::pipeline::transport::{HttpTransport, Transport};
use crate::signature::element::ElementFacts;
use crate::signature::extractor::extract_signature;

/// Scroll occurrences are throttled to at most one tracked event per second.
const SCROLL_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Click text is carried on the event only up to this many characters.
const CLICK_TEXT_MAX: usize = 50;

/// Lifecycle of one agent instance. `Stopped` is terminal: an instance is
/// never restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Uninitialized,
    Active,
    Stopped,
}

/// One instrumentation agent instance.
///
/// All registries and buffers are instance state, mutated only from the
/// host's single execution context; nothing here locks. Instrumentation
/// must never break the page it observes, so no operation on this type
/// panics or propagates an error to the host.
pub struct Agent {
    pub state: AgentState,
    registry: IdentityRegistry,
    buffer: EventBuffer,
    scheduler: Option<FlushScheduler>,
    enricher: Option<Enricher>,
    sources: Vec<SourceKind>,
    scroll_throttle: Throttle,
    transport: Option<Box<dyn Transport>>,
    store: Option<Box<dyn IdentityStore>>,
    random: Box<dyn RandomSource>,
}

impl Agent {
    /// Agent with production collaborators: HTTP delivery to the configured
    /// collector and a file-backed identity store, both wired up at `start`.
    pub fn new() -> Agent {
        Agent {
            state: AgentState::Uninitialized,
            registry: IdentityRegistry::new(),
            buffer: EventBuffer::new(),
            scheduler: None,
            enricher: None,
            sources: Vec::new(),
            scroll_throttle: Throttle::new(SCROLL_MIN_INTERVAL),
            transport: None,
            store: None,
            random: Box::new(SystemRandom),
        }
    }

    /// Agent with injected collaborators (tests, alternative delivery).
    pub fn with_collaborators(
        transport: Box<dyn Transport>,
        store: Box<dyn IdentityStore>,
        random: Box<dyn RandomSource>,
    ) -> Agent {
        Agent {
            transport: Some(transport),
            store: Some(store),
            random,
            ..Agent::new()
        }
    }

    /// Start the agent: acquire identity, register the event sources, arm
    /// the flush timer.
    ///
    /// Starting an agent that is already active (or already stopped) warns
    /// and does nothing. When the page context reports the document as
    /// already loaded, one page-load event is recorded immediately, since
    /// the load listener will never fire for this page view.
    pub fn start(&mut self, config: AgentConfig, context: PageContext) {
        self.start_at(config, context, Instant::now());
    }

    /// `start` with an explicit scheduler epoch, for hosts and tests that
    /// drive time themselves.
    pub fn start_at(&mut self, config: AgentConfig, context: PageContext, now: Instant) {
        match self.state {
            AgentState::Active => {
                warn!("start called on an already active agent, ignoring");
                return;
            }
            AgentState::Stopped => {
                warn!("start called on a stopped agent, ignoring");
                return;
            }
            AgentState::Uninitialized => {}
        }

        if self.transport.is_none() {
            self.transport = Some(Box::new(HttpTransport::new(&config.collector_url)));
        }

        let mut store = self.store.take().unwrap_or_else(|| {
            let dir = config
                .storage_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR));
            Box::new(FileIdentityStore::new(dir))
        });
        let user_id = load_or_create_user_id(store.as_mut(), self.random.as_ref());
        self.store = Some(store);

        let document_loaded = context.document_loaded;
        self.enricher = Some(Enricher::new(config.site_id.clone(), user_id, context));
        self.scheduler = Some(FlushScheduler::start_at(config.flush_interval, now));
        self.sources = ALL_SOURCES.to_vec();
        self.state = AgentState::Active;
        debug!(site_id = %config.site_id, "agent started");

        // Late start: the load event already fired, record it ourselves.
        if document_loaded {
            self.record("page_load", None);
        }
    }

    /// Stop the agent: detach every event source, deliver the final partial
    /// batch synchronously, disarm the timer. Terminal.
    ///
    /// Safe to call at any time; stopping an agent that is not active warns
    /// and does nothing.
    pub fn stop(&mut self) {
        self.stop_at(Instant::now());
    }

    pub fn stop_at(&mut self, now: Instant) {
        if self.state != AgentState::Active {
            warn!("stop called while agent is not active, ignoring");
            return;
        }

        self.sources.clear();
        self.flush_now(now);
        self.scheduler = None;
        self.state = AgentState::Stopped;
        debug!("agent stopped");
    }

    /// Record a caller-defined event. Warns and does nothing unless the
    /// agent is active.
    pub fn track_custom(&mut self, event_name: &str, data: Option<Map<String, Value>>) {
        if self.state != AgentState::Active {
            warn!(event = event_name, "trackCustom called while agent is not active, dropping");
            return;
        }
        self.record(event_name, data);
    }

    /// Intake for normalized DOM events.
    pub fn observe(&mut self, event: DomEvent) {
        self.observe_at(event, Instant::now());
    }

    /// `observe` with an explicit clock; `now` drives the scroll throttle
    /// and the unload flush.
    pub fn observe_at(&mut self, event: DomEvent, now: Instant) {
        if self.state != AgentState::Active {
            // Sources are detached on stop; a straggler is dropped quietly.
            debug!(source = ?event.source(), "dom event observed while inactive, dropping");
            return;
        }

        match event {
            DomEvent::Click { element } => self.observe_click(element),
            DomEvent::Load => self.record("page_load", None),
            DomEvent::BeforeUnload => {
                // Last chance before the page goes away: record, then flush
                // the partial batch synchronously.
                self.record("page_unload", None);
                self.flush_now(now);
            }
            DomEvent::Scroll => {
                if self.scroll_throttle.admit(now) {
                    self.record("scroll", None);
                }
            }
            DomEvent::Resize { width, height } => {
                let mut data = Map::new();
                data.insert("width".into(), Value::from(width));
                data.insert("height".into(), Value::from(height));
                self.record("resize", Some(data));
            }
            DomEvent::VisibilityChange { hidden } => {
                let mut data = Map::new();
                data.insert("hidden".into(), Value::from(hidden));
                self.record("visibility_change", Some(data));
            }
            DomEvent::RuntimeError {
                message,
                source,
                line,
            } => {
                let data = runtime_error_payload(&message, source.as_deref(), line);
                self.record("runtime_error", Some(data));
            }
        }
    }

    /// Drive the periodic flush. Called from the host loop; cheap when
    /// nothing is due.
    pub fn tick(&mut self, now: Instant) {
        if self.state != AgentState::Active {
            return;
        }
        let due = match &mut self.scheduler {
            Some(scheduler) => scheduler.due(now),
            None => false,
        };
        if due {
            self.flush_now(now);
        }
    }

    /// Flush on demand. No-op when the buffer is empty. Returns the number
    /// of events handed to the transport.
    pub fn flush_now(&mut self, now: Instant) -> usize {
        let Some(enricher) = &self.enricher else {
            return 0;
        };
        let Some(transport) = &self.transport else {
            return 0;
        };

        let delivered = flush(
            &mut self.buffer,
            transport.as_ref(),
            enricher.user_id(),
            enricher.site_id(),
        );

        if let Some(scheduler) = &mut self.scheduler {
            scheduler.reset(now);
        }
        delivered
    }

    fn observe_click(&mut self, element: ElementFacts) {
        let mut data = Map::new();
        data.insert("tagName".into(), Value::from(element.tag.to_uppercase()));

        // An element labeled by an earlier pass keeps its label; the
        // registry must see each concrete element at most once.
        let label = match element.existing_label.clone() {
            Some(existing) => Some(existing),
            None => extract_signature(&element).map(|sig| self.registry.assign(&sig)),
        };
        if let Some(id) = label {
            data.insert("dataZenId".into(), Value::from(id));
        }

        if let Some(text) = element.text.as_deref() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                data.insert(
                    "text".into(),
                    Value::from(trimmed.chars().take(CLICK_TEXT_MAX).collect::<String>()),
                );
            }
        }

        self.record("click", Some(data));
    }

    fn record(&mut self, event_name: &str, data: Option<Map<String, Value>>) {
        let Some(enricher) = &self.enricher else {
            return;
        };
        self.buffer.record(enricher.enrich(event_name, data));
    }

    /// Sources currently attached; empty unless active.
    pub fn registered_sources(&self) -> &[SourceKind] {
        &self.sources
    }

    /// Events recorded but not yet flushed.
    pub fn pending_events(&self) -> usize {
        self.buffer.len()
    }

    /// The user id in effect for this session, once started.
    pub fn user_id(&self) -> Option<&str> {
        self.enricher.as_ref().map(|e| e.user_id())
    }

    /// Distinct element signatures labeled so far.
    pub fn known_signatures(&self) -> usize {
        self.registry.len()
    }
}

impl Default for Agent {
    fn default() -> Self {
        Agent::new()
    }
}
