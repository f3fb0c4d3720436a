// SPDX-License-Identifier: GPL-3.0-only

//! Upload queue and confirmed collection
//!
//! Both collections sit behind one lock so that an item moves between them
//! in a single step. Enqueue only ever appends and only a sync commit ever
//! removes, which keeps a snapshot of the first N queued items valid until
//! the commit.

use super::item::{UploadItem, UploadStatus};
use crate::errors::AppResult;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct LedgerState {
    /// Arrival order, oldest first
    queue: VecDeque<UploadItem>,
    /// Newest first
    confirmed: VecDeque<UploadItem>,
    /// Highest id handed out so far
    last_id: u64,
}

/// Queue snapshot taken when a sync starts
#[derive(Debug, Clone)]
pub struct QueueSnapshot {
    ids: Vec<u64>,
}

impl QueueSnapshot {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Offline upload queue plus the confirmed uploads collection
///
/// Cheap to clone; all clones share the same collections.
#[derive(Clone, Default)]
pub struct UploadLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl UploadLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger seeded with already confirmed uploads (newest first)
    pub fn with_confirmed(items: Vec<UploadItem>) -> Self {
        let last_id = items.iter().map(|item| item.id).max().unwrap_or(0);
        Self {
            state: Arc::new(Mutex::new(LedgerState {
                queue: VecDeque::new(),
                confirmed: items.into(),
                last_id,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserve an id for a new item
    pub fn next_id(&self) -> u64 {
        let mut state = self.state();
        state.last_id += 1;
        state.last_id
    }

    /// Append an item to the tail of the queue as `Pending`
    ///
    /// Returns the queue length after the append.
    pub fn enqueue(&self, mut item: UploadItem) -> usize {
        item.status = UploadStatus::Pending;

        let mut state = self.state();
        state.last_id = state.last_id.max(item.id);
        debug!(id = item.id, kind = %item.kind, "Upload queued");
        state.queue.push_back(item);
        state.queue.len()
    }

    /// Put an item straight into the confirmed collection (online path)
    pub fn confirm(&self, item: UploadItem) {
        let mut state = self.state();
        state.last_id = state.last_id.max(item.id);
        debug!(id = item.id, kind = %item.kind, status = %item.status, "Upload confirmed");
        state.confirmed.push_front(item);
    }

    /// Status change from an external reviewer
    pub fn set_status(&self, id: u64, status: UploadStatus) -> bool {
        let mut state = self.state();
        match state.confirmed.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                info!(id, from = %item.status, to = %status, "Upload status changed");
                item.status = status;
                true
            }
            None => {
                warn!(id, "Status change for unknown upload");
                false
            }
        }
    }

    pub fn queue_len(&self) -> usize {
        self.state().queue.len()
    }

    pub fn confirmed_len(&self) -> usize {
        self.state().confirmed.len()
    }

    /// Queued items, oldest first
    pub fn queued(&self) -> Vec<UploadItem> {
        self.state().queue.iter().cloned().collect()
    }

    /// Confirmed items, newest first
    pub fn confirmed(&self) -> Vec<UploadItem> {
        self.state().confirmed.iter().cloned().collect()
    }

    /// Confirmed items as a JSON array in export field order
    pub fn export_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(&self.confirmed())?)
    }

    /// Record which items a sync is about to drain
    pub(crate) fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            ids: self.state().queue.iter().map(|item| item.id).collect(),
        }
    }

    /// Move the snapshotted items to the head of the confirmed collection
    ///
    /// Items get fresh sequential ids after the highest confirmed id and are
    /// marked `Pending`. Items queued after the snapshot stay queued.
    pub(crate) fn commit(&self, snapshot: &QueueSnapshot) -> Vec<UploadItem> {
        let mut state = self.state();

        let count = snapshot.len().min(state.queue.len());
        if count < snapshot.len() {
            warn!(
                expected = snapshot.len(),
                available = count,
                "Queue shrank while a sync was in flight"
            );
        }

        let mut drained: Vec<UploadItem> = state.queue.drain(..count).collect();
        debug_assert!(
            drained
                .iter()
                .zip(&snapshot.ids)
                .all(|(item, id)| item.id == *id),
            "queue head diverged from the sync snapshot"
        );

        let base = state.confirmed.iter().map(|item| item.id).max().unwrap_or(0);
        for (offset, item) in drained.iter_mut().enumerate() {
            item.id = base + offset as u64 + 1;
            item.status = UploadStatus::Pending;
        }

        for item in drained.iter().rev() {
            state.confirmed.push_front(item.clone());
        }
        state.last_id = state.last_id.max(base + drained.len() as u64);

        info!(
            count = drained.len(),
            remaining = state.queue.len(),
            "Sync snapshot committed"
        );
        drained
    }
}

impl std::fmt::Debug for UploadLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("UploadLedger")
            .field("queued", &state.queue.len())
            .field("confirmed", &state.confirmed.len())
            .finish()
    }
}
