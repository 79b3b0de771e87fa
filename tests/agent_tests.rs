mod common;

use std::time::{Duration, Instant};

use common::{FixedRandom, MemoryStore, MockTransport, go_button};
use serde_json::Value;
use zen_agent::agent::agent::{Agent, AgentState};
use zen_agent::agent::agent_config::AgentConfig;
use zen_agent::agent::sources::DomEvent;
use zen_agent::event::enrich::PageContext;
use zen_agent::identity::hash::{fnv32a, to_base36};
use zen_agent::signature::element::ElementFacts;

fn test_agent(transport: &MockTransport) -> Agent {
    Agent::with_collaborators(
        Box::new(transport.clone()),
        Box::new(MemoryStore::default()),
        Box::new(FixedRandom(1)),
    )
}

fn started_agent(transport: &MockTransport, epoch: Instant) -> Agent {
    let mut agent = test_agent(transport);
    agent.start_at(AgentConfig::new("abc"), PageContext::default(), epoch);
    agent
}

// =========================================================================
// Click labeling scenarios
// =========================================================================

#[test]
fn click_on_a_button_records_one_labeled_event() {
    let transport = MockTransport::new();
    let epoch = Instant::now();
    let mut agent = started_agent(&transport, epoch);

    agent.observe_at(DomEvent::Click { element: go_button() }, epoch);
    assert_eq!(agent.pending_events(), 1);

    agent.stop_at(epoch);
    let batches = transport.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].site_id, "abc");

    let event = &batches[0].events[0];
    let expected_id = format!("zen-{}", to_base36(fnv32a("button|id:go|text:Go")));
    assert_eq!(event.get("eventName"), Some(&Value::from("click")));
    assert_eq!(event.get("dataZenId"), Some(&Value::from(expected_id)));
    assert_eq!(event.get("tagName"), Some(&Value::from("BUTTON")));
    assert_eq!(event.get("siteId"), Some(&Value::from("abc")));
}

#[test]
fn sibling_with_different_attributes_gets_a_different_base_hash_not_a_suffix() {
    let transport = MockTransport::new();
    let epoch = Instant::now();
    let mut agent = started_agent(&transport, epoch);

    agent.observe_at(DomEvent::Click { element: go_button() }, epoch);

    // Same text, but no id: different signature, so a fresh base hash.
    let mut sibling = ElementFacts::with_tag("button");
    sibling.text = Some("Go".into());
    agent.observe_at(DomEvent::Click { element: sibling }, epoch);

    agent.stop_at(epoch);
    let events = &transport.batches()[0].events;

    let first = events[0].get("dataZenId").and_then(Value::as_str).unwrap();
    let second = events[1].get("dataZenId").and_then(Value::as_str).unwrap();

    assert_eq!(second, format!("zen-{}", to_base36(fnv32a("button|text:Go"))));
    assert_ne!(first, second);
    assert!(!second.contains("-2"), "Different signature is not a collision case");
}

#[test]
fn identical_signatures_disambiguate_with_the_suffix_scheme() {
    let transport = MockTransport::new();
    let epoch = Instant::now();
    let mut agent = started_agent(&transport, epoch);

    // Two distinct DOM elements, byte-identical static attributes.
    let mut twin = ElementFacts::with_tag("button");
    twin.text = Some("Go".into());

    agent.observe_at(DomEvent::Click { element: twin.clone() }, epoch);
    agent.observe_at(DomEvent::Click { element: twin }, epoch);

    agent.stop_at(epoch);
    let events = &transport.batches()[0].events;
    let base = format!("zen-{}", to_base36(fnv32a("button|text:Go")));

    assert_eq!(events[0].get("dataZenId"), Some(&Value::from(base.clone())));
    assert_eq!(events[1].get("dataZenId"), Some(&Value::from(format!("{}-2", base))));
}

#[test]
fn an_already_labeled_element_keeps_its_label() {
    let transport = MockTransport::new();
    let epoch = Instant::now();
    let mut agent = started_agent(&transport, epoch);

    let mut labeled = go_button();
    labeled.existing_label = Some("zen-preexisting".into());
    agent.observe_at(DomEvent::Click { element: labeled }, epoch);

    assert_eq!(agent.known_signatures(), 0, "Registry never consulted for labeled elements");

    // A later fresh element with the same attributes still gets the base id.
    agent.observe_at(DomEvent::Click { element: go_button() }, epoch);

    agent.stop_at(epoch);
    let events = &transport.batches()[0].events;
    assert_eq!(events[0].get("dataZenId"), Some(&Value::from("zen-preexisting")));
    assert_eq!(
        events[1].get("dataZenId"),
        Some(&Value::from(format!("zen-{}", to_base36(fnv32a("button|id:go|text:Go"))))),
        "No suffix: the labeled element never touched the registry"
    );
}

// =========================================================================
// Lifecycle state machine
// =========================================================================

#[test]
fn start_twice_is_a_warned_no_op() {
    let transport = MockTransport::new();
    let epoch = Instant::now();
    let mut agent = started_agent(&transport, epoch);

    assert_eq!(agent.registered_sources().len(), 7);

    // Second start must not double-register or reconfigure.
    agent.start_at(AgentConfig::new("other-site"), PageContext::default(), epoch);
    assert_eq!(agent.state, AgentState::Active);
    assert_eq!(agent.registered_sources().len(), 7, "Exactly one set of listeners");

    agent.track_custom("probe", None);
    agent.stop_at(epoch);

    let batches = transport.batches();
    assert_eq!(batches.len(), 1, "One timer, one final flush");
    assert_eq!(batches[0].site_id, "abc", "Original configuration stays in effect");
}

#[test]
fn stop_detaches_sources_delivers_the_final_batch_and_is_terminal() {
    let transport = MockTransport::new();
    let epoch = Instant::now();
    let mut agent = started_agent(&transport, epoch);

    agent.track_custom("one", None);
    agent.track_custom("two", None);

    // Stop before the flush timer ever fires.
    agent.stop_at(epoch + Duration::from_millis(50));

    assert_eq!(agent.state, AgentState::Stopped);
    assert_eq!(agent.registered_sources().len(), 0, "No dangling listeners");
    assert_eq!(agent.pending_events(), 0);

    let batches = transport.batches();
    assert_eq!(batches.len(), 1, "Buffered events delivered exactly once");
    assert_eq!(batches[0].events.len(), 2);

    // Stop again: no-op, no extra delivery.
    agent.stop_at(epoch + Duration::from_secs(1));
    assert_eq!(transport.delivery_count(), 1);

    // Terminal: no restart.
    agent.start_at(AgentConfig::new("abc"), PageContext::default(), epoch);
    assert_eq!(agent.state, AgentState::Stopped);
}

#[test]
fn stop_before_start_is_a_no_op() {
    let transport = MockTransport::new();
    let mut agent = test_agent(&transport);

    agent.stop_at(Instant::now());
    assert_eq!(agent.state, AgentState::Uninitialized);
    assert_eq!(transport.delivery_count(), 0);
}

#[test]
fn track_custom_outside_the_active_state_is_dropped() {
    let transport = MockTransport::new();
    let epoch = Instant::now();
    let mut agent = test_agent(&transport);

    agent.track_custom("too-early", None);
    assert_eq!(agent.pending_events(), 0);

    agent.start_at(AgentConfig::new("abc"), PageContext::default(), epoch);
    agent.stop_at(epoch);

    agent.track_custom("too-late", None);
    assert_eq!(agent.pending_events(), 0);
    assert_eq!(transport.delivery_count(), 0, "Nothing was ever recorded");
}

#[test]
fn dom_events_after_stop_are_dropped() {
    let transport = MockTransport::new();
    let epoch = Instant::now();
    let mut agent = started_agent(&transport, epoch);
    agent.stop_at(epoch);

    agent.observe_at(DomEvent::Click { element: go_button() }, epoch);
    assert_eq!(agent.pending_events(), 0);
}

#[test]
fn starting_on_an_already_loaded_document_records_one_page_load() {
    let transport = MockTransport::new();
    let epoch = Instant::now();
    let mut agent = test_agent(&transport);

    let context = PageContext {
        document_loaded: true,
        ..PageContext::default()
    };
    agent.start_at(AgentConfig::new("abc"), context, epoch);

    assert_eq!(agent.pending_events(), 1);
    agent.stop_at(epoch);

    let event = &transport.batches()[0].events[0];
    assert_eq!(event.get("eventName"), Some(&Value::from("page_load")));
}

// =========================================================================
// Flush timer and unload
// =========================================================================

#[test]
fn tick_flushes_periodically_but_not_early() {
    let transport = MockTransport::new();
    let epoch = Instant::now();
    let mut agent = test_agent(&transport);
    agent.start_at(
        AgentConfig::new("abc").flush_interval_ms(1_000),
        PageContext::default(),
        epoch,
    );

    agent.track_custom("buffered", None);

    agent.tick(epoch + Duration::from_millis(500));
    assert_eq!(transport.delivery_count(), 0, "Interval not reached yet");

    agent.tick(epoch + Duration::from_millis(1_000));
    assert_eq!(transport.delivery_count(), 1, "Periodic flush fired");
    assert_eq!(agent.pending_events(), 0);

    // Nothing new to send: the next due tick delivers nothing.
    agent.tick(epoch + Duration::from_millis(2_000));
    assert_eq!(transport.delivery_count(), 1, "Empty buffer, no delivery");
}

#[test]
fn before_unload_records_page_unload_and_flushes_synchronously() {
    let transport = MockTransport::new();
    let epoch = Instant::now();
    let mut agent = started_agent(&transport, epoch);

    agent.track_custom("pending", None);
    agent.observe_at(DomEvent::BeforeUnload, epoch);

    let batches = transport.batches();
    assert_eq!(batches.len(), 1, "Unload flushes without waiting for the timer");

    let names: Vec<&str> = batches[0]
        .events
        .iter()
        .map(|e| e.get("eventName").and_then(Value::as_str).unwrap())
        .collect();
    assert_eq!(names, ["pending", "page_unload"]);

    // The host's stop afterwards finds nothing left to send.
    agent.stop_at(epoch);
    assert_eq!(transport.delivery_count(), 1);
}

#[test]
fn failed_delivery_does_not_disturb_subsequent_recording() {
    let transport = MockTransport::failing();
    let epoch = Instant::now();
    let mut agent = test_agent(&transport);
    agent.start_at(
        AgentConfig::new("abc").flush_interval_ms(1_000),
        PageContext::default(),
        epoch,
    );

    agent.track_custom("lost", None);
    agent.tick(epoch + Duration::from_secs(1));
    assert_eq!(agent.pending_events(), 0, "Failed batch is discarded, not re-queued");

    agent.track_custom("later", None);
    agent.stop_at(epoch + Duration::from_secs(1));

    let batches = transport.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[1].events.len(), 1, "Only the new event rides the final flush");
}

// =========================================================================
// Source-specific normalization
// =========================================================================

#[test]
fn scroll_events_are_throttled_to_one_per_second() {
    let transport = MockTransport::new();
    let epoch = Instant::now();
    let mut agent = started_agent(&transport, epoch);

    agent.observe_at(DomEvent::Scroll, epoch);
    agent.observe_at(DomEvent::Scroll, epoch + Duration::from_millis(200));
    agent.observe_at(DomEvent::Scroll, epoch + Duration::from_millis(900));
    assert_eq!(agent.pending_events(), 1, "Burst collapses to one event");

    agent.observe_at(DomEvent::Scroll, epoch + Duration::from_millis(1_200));
    assert_eq!(agent.pending_events(), 2, "Past the window, admitted again");
}

#[test]
fn resize_visibility_and_error_events_carry_their_payloads() {
    let transport = MockTransport::new();
    let epoch = Instant::now();
    let mut agent = started_agent(&transport, epoch);

    agent.observe_at(DomEvent::Resize { width: 1024, height: 768 }, epoch);
    agent.observe_at(DomEvent::VisibilityChange { hidden: true }, epoch);
    agent.observe_at(
        DomEvent::RuntimeError {
            message: "boom".into(),
            source: Some("app.js".into()),
            line: Some(42),
        },
        epoch,
    );
    agent.observe_at(DomEvent::Load, epoch);

    agent.stop_at(epoch);
    let events = &transport.batches()[0].events;

    assert_eq!(events[0].get("eventName"), Some(&Value::from("resize")));
    assert_eq!(events[0].get("width"), Some(&Value::from(1024u32)));
    assert_eq!(events[0].get("height"), Some(&Value::from(768u32)));

    assert_eq!(events[1].get("eventName"), Some(&Value::from("visibility_change")));
    assert_eq!(events[1].get("hidden"), Some(&Value::from(true)));

    assert_eq!(events[2].get("eventName"), Some(&Value::from("runtime_error")));
    assert_eq!(events[2].get("message"), Some(&Value::from("boom")));
    assert_eq!(events[2].get("source"), Some(&Value::from("app.js")));
    assert_eq!(events[2].get("line"), Some(&Value::from(42u64)));

    assert_eq!(events[3].get("eventName"), Some(&Value::from("page_load")));
}

#[test]
fn user_identity_survives_for_the_whole_session() {
    let transport = MockTransport::new();
    let epoch = Instant::now();
    let mut agent = started_agent(&transport, epoch);

    let user_id = agent.user_id().unwrap().to_string();
    assert_eq!(user_id, "00000000-0000-0000-0000-000000000001");

    agent.track_custom("a", None);
    agent.observe_at(DomEvent::Click { element: go_button() }, epoch);
    agent.stop_at(epoch);

    let batch = &transport.batches()[0];
    assert_eq!(batch.user_id, user_id, "Batch metadata carries the session identity");
    for event in &batch.events {
        assert_eq!(event.get("userId"), Some(&Value::from(user_id.as_str())));
    }
}
