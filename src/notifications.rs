// SPDX-License-Identifier: GPL-3.0-only

//! Notification sink for user-visible events
//!
//! Every action of the pipeline reports a named event with a JSON payload.
//! The default sink writes them to the log; a surface can plug in toasts or
//! an analytics client instead.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// A named event with its payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackEvent {
    pub name: String,
    pub payload: Value,
    pub at: DateTime<Utc>,
}

impl TrackEvent {
    pub fn new(name: &str, payload: Value) -> Self {
        Self {
            name: name.to_string(),
            payload,
            at: Utc::now(),
        }
    }
}

/// Receiver of track events
pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: TrackEvent);

    fn track(&self, name: &str, payload: Value) {
        self.notify(TrackEvent::new(name, payload));
    }
}

/// Logs events through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, event: TrackEvent) {
        info!(
            event = %event.name,
            payload = %event.payload,
            at = %event.at.to_rfc3339(),
            "track"
        );
    }
}

/// Keeps events in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<TrackEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TrackEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Event names in arrival order
    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|event| event.name).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events().iter().filter(|event| event.name == name).count()
    }
}

impl NotificationSink for MemorySink {
    fn notify(&self, event: TrackEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
