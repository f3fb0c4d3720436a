// SPDX-License-Identifier: GPL-3.0-only

//! Turning captured artifacts into upload records

use crate::artifact::Artifact;
use crate::geolocation::GeolocationProvider;
use crate::notifications::NotificationSink;
use crate::uploads::{Connectivity, UploadItem, UploadLedger, UploadStatus};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Routes new uploads to the queue (offline) or the confirmed collection (online)
#[derive(Clone)]
pub struct SubmissionDesk {
    ledger: UploadLedger,
    connectivity: Connectivity,
    geolocation: Arc<dyn GeolocationProvider>,
    notifier: Arc<dyn NotificationSink>,
}

impl SubmissionDesk {
    pub fn new(
        ledger: UploadLedger,
        connectivity: Connectivity,
        geolocation: Arc<dyn GeolocationProvider>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            ledger,
            connectivity,
            geolocation,
            notifier,
        }
    }

    /// Record an artifact as a new upload
    ///
    /// The record is dated today and carries the provider's current location.
    /// Online submissions land in the confirmed collection as `Verified`;
    /// offline ones are queued as `Pending`.
    pub fn submit(&self, artifact: &Artifact) -> UploadItem {
        let online = self.connectivity.is_online();

        let item = UploadItem {
            id: self.ledger.next_id(),
            kind: artifact.kind,
            created_at: chrono::Local::now().date_naive(),
            status: if online {
                UploadStatus::Verified
            } else {
                UploadStatus::Pending
            },
            label: artifact.kind.label().to_string(),
            location: self.geolocation.current_location(),
        };

        if online {
            self.ledger.confirm(item.clone());
            info!(id = item.id, kind = %item.kind, size = artifact.len(), "Capture saved");
            self.notifier.track(
                "capture_saved",
                json!({ "type": item.kind, "id": item.id }),
            );
        } else {
            let queued = self.ledger.enqueue(item.clone());
            info!(id = item.id, kind = %item.kind, queued, "Capture queued for sync");
            self.notifier.track(
                "capture_queued",
                json!({ "type": item.kind, "queued": queued }),
            );
        }

        item
    }
}

impl std::fmt::Debug for SubmissionDesk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionDesk")
            .field("online", &self.connectivity.is_online())
            .field("ledger", &self.ledger)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactKind;
    use crate::constants::{PHOTO_MIME, VIDEO_MIME};
    use crate::geolocation::{Coordinates, FixedLocation};
    use crate::notifications::MemorySink;
    use crate::storage::ArtifactStore;

    fn desk(online: bool) -> (SubmissionDesk, UploadLedger, Arc<MemorySink>) {
        let ledger = UploadLedger::new();
        let sink = Arc::new(MemorySink::new());
        let desk = SubmissionDesk::new(
            ledger.clone(),
            Connectivity::new(online),
            Arc::new(FixedLocation(Coordinates::new(19.07, 72.87))),
            sink.clone(),
        );
        (desk, ledger, sink)
    }

    #[test]
    fn test_offline_submission_is_queued() {
        let (desk, ledger, sink) = desk(false);
        let store = ArtifactStore::new();
        let artifact = Artifact::register(&store, ArtifactKind::Photo, PHOTO_MIME, vec![1, 2, 3]);

        let item = desk.submit(&artifact);
        assert_eq!(item.status, UploadStatus::Pending);
        assert_eq!(item.label, "New Photo Evidence");
        assert_eq!(item.created_at, chrono::Local::now().date_naive());
        assert_eq!(item.location, Some(Coordinates::new(19.07, 72.87)));

        assert_eq!(ledger.queue_len(), 1);
        assert_eq!(ledger.confirmed_len(), 0);
        assert_eq!(sink.names(), vec!["capture_queued"]);
        assert_eq!(sink.events()[0].payload["queued"], 1);
    }

    #[test]
    fn test_online_submission_is_confirmed() {
        let (desk, ledger, sink) = desk(true);
        let store = ArtifactStore::new();
        let artifact = Artifact::register(&store, ArtifactKind::Video, VIDEO_MIME, Vec::new());

        let item = desk.submit(&artifact);
        assert_eq!(item.status, UploadStatus::Verified);
        assert_eq!(item.label, "New Video Evidence");

        assert_eq!(ledger.queue_len(), 0);
        assert_eq!(ledger.confirmed(), vec![item]);
        assert_eq!(sink.names(), vec!["capture_saved"]);
        assert_eq!(sink.events()[0].payload["type"], "video");
    }
}
