// SPDX-License-Identifier: GPL-3.0-only

//! Application wiring
//!
//! [`AssetCaptureApp`] owns everything that outlives a single capture
//! surface: the artifact store, the upload ledger, the connectivity flag and
//! the sync engine observing it.
//!
//! ```text
//! CaptureSurface ──► SubmissionDesk ──► UploadLedger ◄── SyncEngine ◄── Connectivity
//! ```

pub mod capture_surface;
pub mod submissions;

pub use capture_surface::{CameraMode, CaptureSurface, Submission};
pub use submissions::SubmissionDesk;

use crate::backends::camera::{CaptureSession, MediaDevices, PreviewSink};
use crate::config::Config;
use crate::geolocation::{FixedLocation, GeolocationProvider, NoLocation};
use crate::notifications::NotificationSink;
use crate::pipelines::photo::{PhotoCapture, PhotoEncoder};
use crate::storage::ArtifactStore;
use crate::uploads::{Connectivity, SyncEngine, UploadLedger};
use std::sync::Arc;
use tracing::info;

pub struct AssetCaptureApp {
    config: Config,
    devices: Arc<dyn MediaDevices>,
    store: ArtifactStore,
    ledger: UploadLedger,
    connectivity: Connectivity,
    notifier: Arc<dyn NotificationSink>,
    desk: SubmissionDesk,
    sync: SyncEngine,
}

impl AssetCaptureApp {
    /// Wire up the app and start observing connectivity
    ///
    /// Must be called from within a tokio runtime. The location attached to
    /// uploads comes from `config.stub_location`.
    pub fn new(
        config: Config,
        devices: Arc<dyn MediaDevices>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let geolocation: Arc<dyn GeolocationProvider> = match config.stub_location {
            Some(coordinates) => Arc::new(FixedLocation(coordinates)),
            None => Arc::new(NoLocation),
        };
        Self::with_geolocation(config, devices, notifier, geolocation)
    }

    pub fn with_geolocation(
        config: Config,
        devices: Arc<dyn MediaDevices>,
        notifier: Arc<dyn NotificationSink>,
        geolocation: Arc<dyn GeolocationProvider>,
    ) -> Self {
        let online = !config.start_offline;
        let store = ArtifactStore::new();
        let ledger = UploadLedger::new();
        let connectivity = Connectivity::new(online);

        let desk = SubmissionDesk::new(
            ledger.clone(),
            connectivity.clone(),
            geolocation,
            Arc::clone(&notifier),
        );

        let sync = SyncEngine::new(
            ledger.clone(),
            config.sync_latency(),
            Arc::clone(&notifier),
            online,
        );
        sync.observe(connectivity.subscribe());

        info!(
            backend = devices.backend_name(),
            online,
            latency_ms = config.sync_latency_ms,
            "Asset capture app ready"
        );

        Self {
            config,
            devices,
            store,
            ledger,
            connectivity,
            notifier,
            desk,
            sync,
        }
    }

    /// A new capture surface with its own camera session
    pub fn capture_surface(&self, mode: CameraMode) -> CaptureSurface {
        self.build_surface(mode, None)
    }

    /// Like [`Self::capture_surface`], with a preview attached to the stream
    pub fn capture_surface_with_preview(
        &self,
        mode: CameraMode,
        preview: Arc<dyn PreviewSink>,
    ) -> CaptureSurface {
        self.build_surface(mode, Some(preview))
    }

    fn build_surface(&self, mode: CameraMode, preview: Option<Arc<dyn PreviewSink>>) -> CaptureSurface {
        let session = CaptureSession::new(Arc::clone(&self.devices));
        if let Some(preview) = preview {
            session.set_preview(preview);
        }

        let photo = PhotoCapture::with_encoder(
            self.store.clone(),
            PhotoEncoder::with_quality(self.config.jpeg_quality),
        );

        CaptureSurface::new(
            mode,
            self.config.constraints,
            session,
            photo,
            self.desk.clone(),
            self.store.clone(),
            Arc::clone(&self.notifier),
        )
    }

    /// Flip the connectivity flag. Returns true if it changed.
    pub fn set_online(&self, online: bool) -> bool {
        self.connectivity.set_online(online)
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn ledger(&self) -> &UploadLedger {
        &self.ledger
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    pub fn desk(&self) -> &SubmissionDesk {
        &self.desk
    }

    pub fn sync(&self) -> &SyncEngine {
        &self.sync
    }

    /// Stop syncing; an in-flight sync is discarded
    pub fn shutdown(&self) {
        self.sync.shutdown();
    }
}

impl std::fmt::Debug for AssetCaptureApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetCaptureApp")
            .field("backend", &self.devices.backend_name())
            .field("connectivity", &self.connectivity)
            .field("ledger", &self.ledger)
            .field("sync", &self.sync)
            .finish()
    }
}
