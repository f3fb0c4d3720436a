// SPDX-License-Identifier: MPL-2.0

//! Photo capture from an active camera session
//!
//! Grabbing reads the current frame at the stream's native resolution
//! without interrupting the preview; encoding happens afterwards.

use super::encoding::PhotoEncoder;
use crate::artifact::{Artifact, ArtifactKind};
use crate::backends::camera::types::{CameraFrame, Resolution};
use crate::backends::camera::{CaptureSession, SessionToken};
use crate::constants::{FALLBACK_FRAME_SIZE, PHOTO_MIME};
use crate::errors::{AppResult, PhotoError};
use crate::storage::ArtifactStore;
use tracing::{debug, info};

/// Photo capture handler
#[derive(Debug, Clone)]
pub struct PhotoCapture {
    encoder: PhotoEncoder,
    store: ArtifactStore,
}

/// A grabbed frame waiting to be encoded
#[derive(Debug)]
pub struct PendingPhoto {
    frame: CameraFrame,
    token: SessionToken,
    encoder: PhotoEncoder,
    store: ArtifactStore,
}

impl PhotoCapture {
    pub fn new(store: ArtifactStore) -> Self {
        Self::with_encoder(store, PhotoEncoder::new())
    }

    pub fn with_encoder(store: ArtifactStore, encoder: PhotoEncoder) -> Self {
        Self { encoder, store }
    }

    /// Read the current frame of an active session
    ///
    /// Uses the stream's reported resolution, or 1280x720 when the stream
    /// reports none.
    pub fn grab(&self, session: &CaptureSession) -> AppResult<PendingPhoto> {
        let token = session.token();

        let frame = session.with_stream(|stream| {
            let size = stream
                .dimensions()
                .filter(|size| !size.is_empty())
                .unwrap_or_else(|| Resolution::new(FALLBACK_FRAME_SIZE.0, FALLBACK_FRAME_SIZE.1));
            stream.grab_frame(size)
        })?;

        let frame = frame
            .filter(CameraFrame::is_complete)
            .ok_or(PhotoError::FrameUnavailable)?;

        debug!(width = frame.width, height = frame.height, "Frame grabbed");

        Ok(PendingPhoto {
            frame,
            token,
            encoder: self.encoder,
            store: self.store.clone(),
        })
    }

    /// Grab and encode in one step
    ///
    /// Returns `Ok(None)` if the session was closed before encoding finished;
    /// nothing is registered in that case.
    pub async fn capture(&self, session: &CaptureSession) -> AppResult<Option<Artifact>> {
        self.grab(session)?.encode().await
    }
}

impl PendingPhoto {
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.frame.width, self.frame.height)
    }

    /// Encode the frame and deliver the artifact if its session is still open
    pub async fn encode(self) -> AppResult<Option<Artifact>> {
        let encoded = self.encoder.encode(self.frame).await?;

        if !self.token.is_current() {
            debug!("Session closed during encoding, photo discarded");
            return Ok(None);
        }

        let artifact = Artifact::register(&self.store, ArtifactKind::Photo, PHOTO_MIME, encoded.data);
        info!(
            handle = %artifact.handle,
            size = artifact.len(),
            width = encoded.width,
            height = encoded.height,
            "Photo captured"
        );

        Ok(Some(artifact))
    }
}
