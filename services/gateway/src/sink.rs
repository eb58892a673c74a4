//! Event sink seam
//!
//! The gateway publishes every engine event, in order, to all registered
//! sinks once the pair's lock has been released. Hosts plug in their
//! persistence or market-data fan-out here; the core never blocks on
//! external I/O inside the matching pipeline.

use std::sync::Mutex;

use matching_engine::ExchangeEvent;

/// Consumer of the ordered engine event stream
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &ExchangeEvent);
}

/// In-memory sink collecting events in arrival order
///
/// Useful for tests and for hosts that drain events in batches.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<ExchangeEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events published so far
    pub fn events(&self) -> Vec<ExchangeEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl EventSink for MemorySink {
    fn publish(&self, event: &ExchangeEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}
