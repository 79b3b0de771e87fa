use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::signature::element::ElementFacts;

/// Normalized DOM event descriptions handed in by the host-side listeners
/// (one JSON object per occurrence on the wire).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomEvent {
    Click {
        element: ElementFacts,
    },
    Load,
    BeforeUnload,
    Scroll,
    Resize {
        width: u32,
        height: u32,
    },
    VisibilityChange {
        hidden: bool,
    },
    RuntimeError {
        message: String,
        #[serde(default)]
        source: Option<String>,
        #[serde(default)]
        line: Option<u64>,
    },
}

impl DomEvent {
    pub fn source(&self) -> SourceKind {
        match self {
            DomEvent::Click { .. } => SourceKind::Click,
            DomEvent::Load => SourceKind::Load,
            DomEvent::BeforeUnload => SourceKind::BeforeUnload,
            DomEvent::Scroll => SourceKind::Scroll,
            DomEvent::Resize { .. } => SourceKind::Resize,
            DomEvent::VisibilityChange { .. } => SourceKind::VisibilityChange,
            DomEvent::RuntimeError { .. } => SourceKind::RuntimeError,
        }
    }
}

/// The event sources the agent wires up on start. Tracked explicitly so
/// `stop` can detach every one of them deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Click,
    Load,
    BeforeUnload,
    Scroll,
    Resize,
    VisibilityChange,
    RuntimeError,
}

pub const ALL_SOURCES: [SourceKind; 7] = [
    SourceKind::Click,
    SourceKind::Load,
    SourceKind::BeforeUnload,
    SourceKind::Scroll,
    SourceKind::Resize,
    SourceKind::VisibilityChange,
    SourceKind::RuntimeError,
];

/// Minimum spacing between admitted occurrences; anything faster is dropped.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Throttle {
            min_interval,
            last: None,
        }
    }

    /// Admit or drop an occurrence at `now`. The first occurrence always
    /// passes.
    pub fn admit(&mut self, now: Instant) -> bool {
        match self.last {
            Some(prev) if now.duration_since(prev) < self.min_interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// Event-specific payload for a runtime error occurrence.
pub fn runtime_error_payload(
    message: &str,
    source: Option<&str>,
    line: Option<u64>,
) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("message".into(), Value::from(message));
    if let Some(source) = source {
        data.insert("source".into(), Value::from(source));
    }
    if let Some(line) = line {
        data.insert("line".into(), Value::from(line));
    }
    data
}
