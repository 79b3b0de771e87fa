use serde::Serialize;
use serde_json::{Map, Value};

/// An enriched event, frozen at record time. Serializes as a flat JSON
/// object: base context fields plus whatever the caller supplied.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct TrackedEvent {
    pub fields: Map<String, Value>,
}

impl TrackedEvent {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn event_name(&self) -> Option<&str> {
        self.fields.get("eventName").and_then(Value::as_str)
    }
}
