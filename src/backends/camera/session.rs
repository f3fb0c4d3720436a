// SPDX-License-Identifier: GPL-3.0-only

//! Camera session lifecycle
//!
//! The session provides:
//! - Stream acquisition and teardown bound to the hosting surface
//! - A generation counter acting as the "stopped" guard for late completions
//! - Track accounting so that every acquired track is stopped exactly once

use super::types::*;
use super::{MediaDevices, MediaStream, PreviewSink};
use crate::errors::{AppResult, CameraError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, info, warn};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Closed,
    Opening,
    Active,
    Failed,
}

/// How an `open()` request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// The stream is live and attached
    Opened,
    /// The session was closed (or re-opened) before the platform answered
    Cancelled,
}

/// Tracks acquired and stopped over the session's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackStats {
    pub acquired: usize,
    pub stopped: usize,
}

impl TrackStats {
    /// Tracks that are currently running
    pub fn live(&self) -> usize {
        self.acquired.saturating_sub(self.stopped)
    }
}

/// Work that lives only as long as the session generation it was started in
pub(crate) trait SessionBound: Send + Sync {
    fn cancel(&self);

    /// Identity of the underlying work; clones of one handle share it
    fn key(&self) -> usize;

    /// Whether there is nothing left to cancel
    fn is_finished(&self) -> bool;
}

struct SessionInner {
    state: SessionState,
    /// Bumped by every open and close; continuations compare against it
    generation: u64,
    stream: Option<Box<dyn MediaStream>>,
    preview: Option<Arc<dyn PreviewSink>>,
    preview_attached: bool,
    bound: Vec<Box<dyn SessionBound>>,
    stats: TrackStats,
    last_error: Option<BackendError>,
}

/// Snapshot of a session generation
///
/// Captured before a suspension point; `is_current()` turns false as soon as
/// the session is closed, re-opened or dropped.
#[derive(Clone)]
pub struct SessionToken {
    inner: Weak<Mutex<SessionInner>>,
    generation: u64,
}

impl SessionToken {
    pub fn is_current(&self) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| {
                let generation = lock(&inner).generation;
                generation == self.generation
            })
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("generation", &self.generation)
            .field("current", &self.is_current())
            .finish()
    }
}

/// Camera session bound to a UI surface's open/closed lifecycle
///
/// Cheap to clone; all clones share the same stream and state.
#[derive(Clone)]
pub struct CaptureSession {
    devices: Arc<dyn MediaDevices>,
    inner: Arc<Mutex<SessionInner>>,
}

fn lock(inner: &Mutex<SessionInner>) -> MutexGuard<'_, SessionInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CaptureSession {
    pub fn new(devices: Arc<dyn MediaDevices>) -> Self {
        info!(backend = devices.backend_name(), "Creating capture session");

        Self {
            devices,
            inner: Arc::new(Mutex::new(SessionInner {
                state: SessionState::Closed,
                generation: 0,
                stream: None,
                preview: None,
                preview_attached: false,
                bound: Vec::new(),
                stats: TrackStats::default(),
                last_error: None,
            })),
        }
    }

    /// Set the preview sink that receives the stream once it is live
    pub fn set_preview(&self, sink: Arc<dyn PreviewSink>) {
        lock(&self.inner).preview = Some(sink);
    }

    /// Acquire a camera stream
    ///
    /// An already active session is left untouched. A request that is still
    /// pending is superseded: its stream, if it ever arrives, is stopped.
    pub async fn open(&self, constraints: CaptureConstraints) -> AppResult<OpenOutcome> {
        let (generation, request) = {
            let mut inner = lock(&self.inner);
            if inner.state == SessionState::Active {
                debug!("Session already active");
                return Ok(OpenOutcome::Opened);
            }

            inner.generation += 1;
            inner.state = SessionState::Opening;
            inner.last_error = None;

            info!(
                facing = %constraints.facing,
                width = constraints.ideal_width,
                height = constraints.ideal_height,
                audio = constraints.audio,
                "Requesting camera stream"
            );

            (inner.generation, self.devices.get_user_media(&constraints))
        };

        let result = request.await;

        let mut inner = lock(&self.inner);

        match result {
            Ok(mut stream) => {
                inner.stats.acquired += stream.track_count();

                if inner.generation != generation {
                    let stopped = stream.stop_tracks();
                    inner.stats.stopped += stopped;
                    debug!(stopped, "Stream arrived after teardown, discarded");
                    return Ok(OpenOutcome::Cancelled);
                }

                let stream_id = stream.id().to_string();
                let resolution = stream.dimensions();
                info!(
                    stream = %stream_id,
                    tracks = stream.track_count(),
                    resolution = ?resolution,
                    "Camera stream active"
                );

                inner.stream = Some(stream);
                inner.state = SessionState::Active;
                if let Some(preview) = inner.preview.clone() {
                    preview.attach(&stream_id, resolution);
                    inner.preview_attached = true;
                }
                Ok(OpenOutcome::Opened)
            }
            Err(e) => {
                if inner.generation != generation {
                    debug!(error = %e, "Stream request failed after teardown");
                    return Ok(OpenOutcome::Cancelled);
                }

                warn!(error = %e, "Camera unavailable");
                inner.state = SessionState::Failed;
                inner.last_error = Some(e.clone());
                Err(CameraError::Unavailable(e).into())
            }
        }
    }

    /// Stop every track, detach the preview and return to `Closed`
    ///
    /// Idempotent and valid from any state, including a pending `open()`.
    pub fn close(&self) {
        let (bound, preview) = {
            let mut inner = lock(&self.inner);
            let previous = inner.state;
            inner.generation += 1;

            if let Some(mut stream) = inner.stream.take() {
                let stopped = stream.stop_tracks();
                inner.stats.stopped += stopped;
                debug!(stream = stream.id(), stopped, "Stopped stream tracks");
            }

            inner.state = SessionState::Closed;

            let preview = if inner.preview_attached {
                inner.preview_attached = false;
                inner.preview.clone()
            } else {
                None
            };

            if previous != SessionState::Closed {
                info!(from = ?previous, "Capture session closed");
            }

            (std::mem::take(&mut inner.bound), preview)
        };

        for work in bound {
            work.cancel();
        }

        if let Some(preview) = preview {
            preview.detach();
        }
    }

    pub fn state(&self) -> SessionState {
        lock(&self.inner).state
    }

    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    /// Token for the current generation
    pub fn token(&self) -> SessionToken {
        SessionToken {
            inner: Arc::downgrade(&self.inner),
            generation: lock(&self.inner).generation,
        }
    }

    pub fn track_stats(&self) -> TrackStats {
        lock(&self.inner).stats
    }

    /// Cause of the last failed `open()`
    pub fn last_error(&self) -> Option<BackendError> {
        lock(&self.inner).last_error.clone()
    }

    /// Run `f` against the live stream
    pub(crate) fn with_stream<R>(
        &self,
        f: impl FnOnce(&dyn MediaStream) -> R,
    ) -> Result<R, CameraError> {
        let inner = lock(&self.inner);
        match (&inner.stream, inner.state) {
            (Some(stream), SessionState::Active) => Ok(f(stream.as_ref())),
            (_, state) => Err(CameraError::NotActive(state)),
        }
    }

    /// Tie `work` to the generation of `token`
    ///
    /// Replaces an earlier binding with the same key and prunes finished
    /// ones. Returns false (and cancels `work` right away) if that
    /// generation is already over.
    pub(crate) fn bind(&self, token: &SessionToken, work: Box<dyn SessionBound>) -> bool {
        let mut inner = lock(&self.inner);
        if inner.generation != token.generation {
            drop(inner);
            work.cancel();
            return false;
        }
        let key = work.key();
        inner
            .bound
            .retain(|bound| bound.key() != key && !bound.is_finished());
        inner.bound.push(work);
        true
    }

    #[cfg(test)]
    pub(crate) fn bound_len(&self) -> usize {
        lock(&self.inner).bound.len()
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("CaptureSession")
            .field("backend", &self.devices.backend_name())
            .field("state", &inner.state)
            .field("stats", &inner.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_camera::{VirtualCamera, VirtualCameraConfig};
    use crate::errors::AppError;
    use std::time::Duration;

    fn session(config: VirtualCameraConfig) -> (CaptureSession, VirtualCamera) {
        let camera = VirtualCamera::new(config);
        (CaptureSession::new(Arc::new(camera.clone())), camera)
    }

    #[tokio::test]
    async fn test_open_and_close() {
        let (session, camera) = session(VirtualCameraConfig::default());

        let outcome = session.open(CaptureConstraints::default()).await.unwrap();
        assert_eq!(outcome, OpenOutcome::Opened);
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.track_stats().live(), 1);

        session.close();
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.track_stats().live(), 0);
        assert_eq!(camera.stats().tracks_stopped, camera.stats().tracks_acquired);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (session, camera) = session(VirtualCameraConfig::default());

        session.close();
        session.open(CaptureConstraints::default()).await.unwrap();
        session.close();
        session.close();

        let stats = session.track_stats();
        assert_eq!(stats.acquired, 1);
        assert_eq!(stats.stopped, 1);
        assert_eq!(camera.stats().tracks_stopped, 1);
    }

    #[tokio::test]
    async fn test_open_failure_marks_failed() {
        let (session, _camera) = session(VirtualCameraConfig {
            deny_permission: true,
            ..Default::default()
        });

        let err = session.open(CaptureConstraints::default()).await.unwrap_err();
        assert_eq!(
            err,
            AppError::Camera(CameraError::Unavailable(BackendError::PermissionDenied))
        );
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.last_error(), Some(BackendError::PermissionDenied));

        session.close();
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_before_resolution_discards_stream() {
        let (session, camera) = session(VirtualCameraConfig {
            acquire_delay: Some(Duration::from_millis(500)),
            ..Default::default()
        });

        let pending = {
            let session = session.clone();
            tokio::spawn(async move { session.open(CaptureConstraints::default()).await })
        };
        tokio::task::yield_now().await;
        assert_eq!(session.state(), SessionState::Opening);

        session.close();
        let outcome = pending.await.unwrap().unwrap();

        assert_eq!(outcome, OpenOutcome::Cancelled);
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(camera.stats().tracks_acquired, 1);
        assert_eq!(camera.stats().tracks_stopped, 1);
    }

    #[tokio::test]
    async fn test_token_invalidated_by_close() {
        let (session, _camera) = session(VirtualCameraConfig::default());
        session.open(CaptureConstraints::default()).await.unwrap();

        let token = session.token();
        assert!(token.is_current());
        session.close();
        assert!(!token.is_current());
    }

    #[tokio::test]
    async fn test_stream_access_requires_active() {
        let (session, _camera) = session(VirtualCameraConfig::default());
        let err = session.with_stream(|s| s.track_count()).unwrap_err();
        assert_eq!(err, CameraError::NotActive(SessionState::Closed));
    }
}
