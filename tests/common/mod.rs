#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use zen_agent::identity::user::{IdentityStore, RandomSource};
use zen_agent::pipeline::transport::{DeliveryPayload, Transport, TransportError};
use zen_agent::signature::element::ElementFacts;

/// One batch as seen by the mock collector.
#[derive(Debug, Clone)]
pub struct RecordedBatch {
    pub user_id: String,
    pub site_id: String,
    pub events: Vec<Value>,
}

/// Transport that records every delivery, optionally failing each one.
#[derive(Clone, Default)]
pub struct MockTransport {
    pub deliveries: Arc<Mutex<Vec<RecordedBatch>>>,
    pub fail: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport::default()
    }

    pub fn failing() -> Self {
        MockTransport {
            fail: true,
            ..MockTransport::default()
        }
    }

    pub fn batches(&self) -> Vec<RecordedBatch> {
        self.deliveries.lock().unwrap().clone()
    }

    pub fn delivery_count(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }
}

impl Transport for MockTransport {
    fn deliver(&self, payload: &DeliveryPayload) -> Result<(), TransportError> {
        let events = payload
            .events
            .iter()
            .map(|e| serde_json::to_value(e).unwrap())
            .collect();

        self.deliveries.lock().unwrap().push(RecordedBatch {
            user_id: payload.user_id.clone(),
            site_id: payload.site_id.clone(),
            events,
        });

        if self.fail {
            Err(TransportError::Status(500))
        } else {
            Ok(())
        }
    }
}

/// In-memory identity store.
#[derive(Default)]
pub struct MemoryStore {
    pub values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn with_value(key: &str, value: &str) -> Self {
        let mut store = MemoryStore::default();
        store.values.insert(key.to_string(), value.to_string());
        store
    }
}

impl IdentityStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        self.values.insert(key.to_string(), value.to_string());
        true
    }
}

/// Store that is permanently unavailable: reads answer nothing, writes fail.
pub struct BrokenStore;

impl IdentityStore for BrokenStore {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&mut self, _key: &str, _value: &str) -> bool {
        false
    }
}

/// Random source yielding a fixed value.
pub struct FixedRandom(pub u128);

impl RandomSource for FixedRandom {
    fn random_u128(&self) -> Option<u128> {
        Some(self.0)
    }
}

/// Random source that is unavailable.
pub struct NoRandom;

impl RandomSource for NoRandom {
    fn random_u128(&self) -> Option<u128> {
        None
    }
}

/// `<button id="go">Go</button>`
pub fn go_button() -> ElementFacts {
    let mut el = ElementFacts::with_tag("button");
    el.id = Some("go".to_string());
    el.text = Some("Go".to_string());
    el
}
