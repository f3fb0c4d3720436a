// SPDX-License-Identifier: GPL-3.0-only

//! Capture modal
//!
//! A surface owns one camera session for as long as it is shown. Dismissing
//! it (explicitly or by dropping it) closes the session, which cancels a
//! running recording and suppresses any photo still being encoded.

use super::submissions::SubmissionDesk;
use crate::artifact::{Artifact, ArtifactHandle};
use crate::backends::camera::{CaptureConstraints, CaptureSession, OpenOutcome, SessionState};
use crate::errors::{AppError, AppResult};
use crate::notifications::NotificationSink;
use crate::pipelines::photo::PhotoCapture;
use crate::pipelines::video::{RecorderState, VideoRecorder};
use crate::storage::ArtifactStore;
use crate::uploads::UploadItem;
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// What the surface captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CameraMode {
    #[default]
    Photo,
    Video,
}

impl CameraMode {
    pub fn title(&self) -> &'static str {
        match self {
            CameraMode::Photo => "Capture Photo",
            CameraMode::Video => "Record Video",
        }
    }
}

/// An artifact together with the upload record created for it
#[derive(Debug, Clone)]
pub struct Submission {
    pub artifact: Artifact,
    pub item: UploadItem,
}

#[derive(Default)]
struct SurfaceState {
    last_error: Option<String>,
    /// Handles of artifacts this surface still displays
    shown: Vec<ArtifactHandle>,
}

pub struct CaptureSurface {
    mode: CameraMode,
    constraints: CaptureConstraints,
    session: CaptureSession,
    photo: PhotoCapture,
    recorder: VideoRecorder,
    desk: SubmissionDesk,
    store: ArtifactStore,
    notifier: Arc<dyn NotificationSink>,
    state: Mutex<SurfaceState>,
}

impl CaptureSurface {
    pub(crate) fn new(
        mode: CameraMode,
        constraints: CaptureConstraints,
        session: CaptureSession,
        photo: PhotoCapture,
        desk: SubmissionDesk,
        store: ArtifactStore,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            mode,
            constraints,
            session,
            photo,
            recorder: VideoRecorder::new(store.clone()),
            desk,
            store,
            notifier,
            state: Mutex::new(SurfaceState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn report(&self, error: &AppError, event: &str) {
        let message = error.user_message();
        warn!(mode = ?self.mode, error = %error, "{}", event);
        self.notifier.track(event, json!({ "message": &message }));
        self.state().last_error = Some(message);
    }

    fn keep(&self, artifact: &Artifact) {
        self.state().shown.push(artifact.handle);
    }

    /// Open the camera
    pub async fn show(&self) -> AppResult<OpenOutcome> {
        info!(mode = ?self.mode, "Capture surface shown");
        self.state().last_error = None;

        match self.session.open(self.constraints).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.report(&e, "camera_error");
                Err(e)
            }
        }
    }

    /// Take a photo and submit it
    ///
    /// `Ok(None)` means the surface was dismissed while the photo was being
    /// encoded; nothing was submitted.
    pub async fn capture_photo(&self) -> AppResult<Option<Submission>> {
        let result = match self.photo.grab(&self.session) {
            Ok(pending) => pending.encode().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(Some(artifact)) => {
                self.keep(&artifact);
                let item = self.desk.submit(&artifact);
                Ok(Some(Submission { artifact, item }))
            }
            Ok(None) => {
                debug!("Photo finished after dismissal, discarded");
                Ok(None)
            }
            Err(e) => {
                self.report(&e, "capture_error");
                Err(e)
            }
        }
    }

    pub fn start_recording(&self) -> AppResult<()> {
        self.recorder.start(&self.session).inspect_err(|e| {
            self.report(e, "recording_error");
        })
    }

    /// Stop recording and submit the video
    ///
    /// `None` when nothing was recording or the surface was dismissed before
    /// the recording finalized.
    pub async fn stop_recording(&self) -> Option<Submission> {
        let artifact = self.recorder.stop().await?;
        self.keep(&artifact);
        let item = self.desk.submit(&artifact);
        Some(Submission { artifact, item })
    }

    /// Close the camera and release every artifact this surface displays
    ///
    /// Idempotent.
    pub fn dismiss(&self) {
        self.session.close();

        let shown = std::mem::take(&mut self.state().shown);
        for handle in shown {
            self.store.release(handle);
        }
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn title(&self) -> &'static str {
        self.mode.title()
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn recorder_state(&self) -> RecorderState {
        self.recorder.state()
    }

    /// Message for the last failure, cleared by `show()`
    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }
}

impl Drop for CaptureSurface {
    fn drop(&mut self) {
        self.dismiss();
    }
}

impl std::fmt::Debug for CaptureSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSurface")
            .field("mode", &self.mode)
            .field("session", &self.session)
            .field("recorder", &self.recorder.state())
            .finish()
    }
}
