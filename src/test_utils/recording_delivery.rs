//! A delivery that stores every payload in memory for test assertions.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::telegram::{Delivery, SendOutcome};

/// Delivery recording payloads and answering with scripted outcomes.
///
/// Clones share the same storage, so a test keeps one clone and hands the
/// other to the client or handler.
#[derive(Clone, Default)]
pub struct RecordingDelivery {
    payloads: Arc<Mutex<Vec<Map<String, Value>>>>,
    outcomes: Arc<Mutex<VecDeque<SendOutcome>>>,
    delay: Option<Duration>,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an outcome for the next delivery; later deliveries succeed.
    pub fn with_outcome(self, outcome: SendOutcome) -> Self {
        self.outcomes.lock().push_back(outcome);
        self
    }

    /// Sleep for `delay` inside every delivery to simulate network latency.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Snapshot of all payloads delivered so far.
    pub fn payloads(&self) -> Vec<Map<String, Value>> {
        self.payloads.lock().clone()
    }

    /// `(chat_id, text)` pairs in delivery order.
    pub fn sent(&self) -> Vec<(Value, String)> {
        self.payloads
            .lock()
            .iter()
            .map(|p| {
                let text = p.get("text").and_then(Value::as_str).unwrap_or_default();
                (p["chat_id"].clone(), text.to_owned())
            })
            .collect()
    }
}

impl Delivery for RecordingDelivery {
    fn deliver(&mut self, payload: &Map<String, Value>) -> SendOutcome {
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        self.payloads.lock().push(payload.clone());
        self.outcomes
            .lock()
            .pop_front()
            .unwrap_or(SendOutcome::Delivered)
    }
}
