//! Event sinks
//!
//! Delivery is best-effort: sinks cannot fail an operation, and they only see
//! events of operations that have already committed.

use pair_types::{Address, PairEvent};
use parking_lot::Mutex;
use tracing::{info, warn};

/// Receiver of committed pair events
pub trait EventSink: Send + Sync {
    fn emit(&self, pair: Address, event: &PairEvent);
}

/// Writes every event as a structured `tracing` record with a JSON payload
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, pair: Address, event: &PairEvent) {
        match event.to_json() {
            Ok(payload) => info!(target: "pair_events", %pair, event = event.name(), %payload),
            Err(e) => warn!(target: "pair_events", %pair, event = event.name(), "Failed to encode event: {}", e),
        }
    }
}

/// Keeps events in memory, in emission order
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<(Address, PairEvent)>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded event
    pub fn events(&self) -> Vec<PairEvent> {
        self.events.lock().iter().map(|(_, e)| e.clone()).collect()
    }

    /// Drain recorded events
    pub fn take(&self) -> Vec<PairEvent> {
        self.events.lock().drain(..).map(|(_, e)| e).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, pair: Address, event: &PairEvent) {
        self.events.lock().push((pair, event.clone()));
    }
}
