// SPDX-License-Identifier: GPL-3.0-only

//! Connectivity-driven sync of the upload queue
//!
//! A sync starts only on an offline to online edge with a non-empty queue and
//! nothing already in flight. It snapshots the queue, sleeps for the
//! processing latency and then commits exactly the snapshotted items. Going
//! offline again does not cancel it; only [`SyncEngine::shutdown`] does.

use super::connectivity::LinkState;
use super::queue::UploadLedger;
use crate::constants::SYNC_EVENT_CAPACITY;
use crate::notifications::NotificationSink;
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Progress of a sync operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A snapshot of `count` queued items is being processed
    Started { count: usize },
    /// The snapshot was committed; `ids` are the newly assigned ids
    Completed { count: usize, ids: Vec<u64> },
}

#[derive(Default)]
struct SyncState {
    /// Last connectivity value seen, used for edge detection
    online: bool,
    in_flight: Option<JoinHandle<()>>,
    observer: Option<JoinHandle<()>>,
    stopped: bool,
}

struct SyncShared {
    ledger: UploadLedger,
    latency: Duration,
    notifier: Arc<dyn NotificationSink>,
    events: broadcast::Sender<SyncEvent>,
    state: Mutex<SyncState>,
}

impl SyncShared {
    fn state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a connectivity update, replaying an online edge the channel collapsed
    fn apply_link(self: &Arc<Self>, link: LinkState, seen_reconnects: &mut u64) {
        if link.reconnects != *seen_reconnects {
            *seen_reconnects = link.reconnects;
            self.handle_transition(false);
            self.handle_transition(true);
        }
        self.handle_transition(link.online);
    }

    fn handle_transition(self: &Arc<Self>, online: bool) -> bool {
        let mut state = self.state();
        if state.stopped {
            return false;
        }

        let was_online = std::mem::replace(&mut state.online, online);
        if !online || was_online {
            return false;
        }

        if state.in_flight.as_ref().is_some_and(|task| !task.is_finished()) {
            debug!("Sync already in flight, ignoring online transition");
            return false;
        }

        let snapshot = self.ledger.snapshot();
        if snapshot.is_empty() {
            debug!("Online with an empty queue, nothing to sync");
            return false;
        }

        let count = snapshot.len();
        info!(count, latency_ms = self.latency.as_millis() as u64, "Sync started");

        let shared = Arc::clone(self);
        state.in_flight = Some(tokio::spawn(async move {
            tokio::time::sleep(shared.latency).await;

            let committed = {
                let mut state = shared.state();
                if state.stopped {
                    debug!("Sync finished after teardown, discarded");
                    return;
                }
                let committed = shared.ledger.commit(&snapshot);
                state.in_flight = None;
                committed
            };

            let ids: Vec<u64> = committed.iter().map(|item| item.id).collect();
            info!(count = committed.len(), ?ids, "Sync complete");
            shared
                .notifier
                .track("sync_complete", json!({ "count": committed.len() }));
            let _ = shared.events.send(SyncEvent::Completed {
                count: committed.len(),
                ids,
            });
        }));
        drop(state);

        self.notifier.track("sync_started", json!({ "count": count }));
        let _ = self.events.send(SyncEvent::Started { count });
        true
    }
}

/// Drains the upload queue when connectivity comes back
///
/// Must be used from within a tokio runtime. Dropping the engine tears it
/// down like [`SyncEngine::shutdown`].
pub struct SyncEngine {
    shared: Arc<SyncShared>,
}

impl SyncEngine {
    pub fn new(
        ledger: UploadLedger,
        latency: Duration,
        notifier: Arc<dyn NotificationSink>,
        initially_online: bool,
    ) -> Self {
        let (events, _) = broadcast::channel(SYNC_EVENT_CAPACITY);

        Self {
            shared: Arc::new(SyncShared {
                ledger,
                latency,
                notifier,
                events,
                state: Mutex::new(SyncState {
                    online: initially_online,
                    ..Default::default()
                }),
            }),
        }
    }

    /// Feed a connectivity value
    ///
    /// Returns true if this call started a sync.
    pub fn handle_transition(&self, online: bool) -> bool {
        self.shared.handle_transition(online)
    }

    /// Follow a connectivity channel until shutdown
    ///
    /// The channel's current value is applied right away. Replaces any
    /// previously observed channel.
    pub fn observe(&self, mut connectivity: watch::Receiver<LinkState>) {
        let current = *connectivity.borrow_and_update();
        let mut seen_reconnects = current.reconnects;
        self.shared.handle_transition(current.online);

        let shared = Arc::clone(&self.shared);
        let observer = tokio::spawn(async move {
            while connectivity.changed().await.is_ok() {
                let link = *connectivity.borrow_and_update();
                shared.apply_link(link, &mut seen_reconnects);
            }
            debug!("Connectivity channel closed");
        });

        let mut state = self.shared.state();
        if state.stopped {
            observer.abort();
            return;
        }
        if let Some(previous) = state.observer.replace(observer) {
            previous.abort();
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.shared.events.subscribe()
    }

    pub fn is_syncing(&self) -> bool {
        self.shared
            .state()
            .in_flight
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub fn latency(&self) -> Duration {
        self.shared.latency
    }

    /// Stop observing and abort an in-flight sync without committing it
    pub fn shutdown(&self) {
        let (in_flight, observer) = {
            let mut state = self.shared.state();
            if state.stopped {
                return;
            }
            state.stopped = true;
            (state.in_flight.take(), state.observer.take())
        };

        if let Some(task) = in_flight {
            if !task.is_finished() {
                info!("In-flight sync cancelled by teardown");
            }
            task.abort();
        }
        if let Some(task) = observer {
            task.abort();
        }
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("latency", &self.shared.latency)
            .field("syncing", &self.is_syncing())
            .finish()
    }
}
