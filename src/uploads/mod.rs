// SPDX-License-Identifier: GPL-3.0-only

//! Offline upload queue and connectivity-driven sync
//!
//! Items created while offline wait in the queue of an [`UploadLedger`].
//! When connectivity flips to online, the [`SyncEngine`] snapshots the queue,
//! waits out a simulated processing latency and then moves exactly the
//! snapshotted items into the confirmed collection.
//!
//! An item is always in exactly one of the two collections.

pub mod connectivity;
pub mod item;
pub mod queue;
pub mod sync;

pub use connectivity::{Connectivity, LinkState};
pub use item::{UploadItem, UploadStatus};
pub use queue::UploadLedger;
pub use sync::{SyncEngine, SyncEvent};
