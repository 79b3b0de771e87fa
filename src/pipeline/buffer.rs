use crate::event::event_model::TrackedEvent;

/// Ordered, unbounded in-memory queue of enriched events awaiting delivery.
///
/// Append order is occurrence order; a flush always takes a gap-free prefix
/// of everything recorded so far.
#[derive(Debug, Default)]
pub struct EventBuffer {
    events: Vec<TrackedEvent>,
}

impl EventBuffer {
    pub fn new() -> Self {
        EventBuffer::default()
    }

    /// Append an event at the tail.
    pub fn record(&mut self, event: TrackedEvent) {
        self.events.push(event);
    }

    /// Detach the current contents, leaving the buffer empty.
    ///
    /// Events recorded after the swap belong to the next batch; the detached
    /// sequence is never referenced by the buffer again.
    pub fn drain(&mut self) -> Vec<TrackedEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
