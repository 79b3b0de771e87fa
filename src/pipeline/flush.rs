use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::pipeline::buffer::EventBuffer;
use crate::pipeline::transport::{DeliveryPayload, Transport};

/// Periodic flush bookkeeping.
///
/// Driven cooperatively through `due` from the host's execution context; no
/// background timer thread exists, so flushes are serialized by
/// construction and never overlap.
#[derive(Debug)]
pub struct FlushScheduler {
    interval: Duration,
    last_flush: Instant,
}

impl FlushScheduler {
    pub fn new(interval: Duration) -> Self {
        FlushScheduler::start_at(interval, Instant::now())
    }

    /// Scheduler armed at an explicit epoch. Tests drive time through this.
    pub fn start_at(interval: Duration, now: Instant) -> Self {
        FlushScheduler {
            interval,
            last_flush: now,
        }
    }

    /// True when a periodic flush is due. Re-arms on every hit.
    pub fn due(&mut self, now: Instant) -> bool {
        if now.duration_since(self.last_flush) >= self.interval {
            self.last_flush = now;
            true
        } else {
            false
        }
    }

    /// Re-arm after an on-demand flush so the periodic timer does not fire
    /// again immediately.
    pub fn reset(&mut self, now: Instant) {
        self.last_flush = now;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Hand the buffered events to the transport and clear the buffer.
///
/// No-op on an empty buffer. Otherwise the buffer is detached first and the
/// detached batch delivered at most once: a failed delivery is logged and
/// the events are dropped, never re-queued. Delivery outcome cannot touch
/// events recorded after the detach. Returns the number of events handed to
/// the transport.
pub fn flush(
    buffer: &mut EventBuffer,
    transport: &dyn Transport,
    user_id: &str,
    site_id: &str,
) -> usize {
    if buffer.is_empty() {
        return 0;
    }

    let events = buffer.drain();
    let batch_len = events.len();
    let payload = DeliveryPayload {
        user_id: user_id.to_string(),
        site_id: site_id.to_string(),
        events,
    };

    match transport.deliver(&payload) {
        Ok(()) => debug!(events = batch_len, "batch delivered"),
        Err(e) => warn!(events = batch_len, error = %e, "batch delivery failed, events dropped"),
    }

    batch_len
}
