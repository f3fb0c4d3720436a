// SPDX-License-Identifier: MPL-2.0

//! Video recorder state machine
//!
//! Only one platform recorder exists per [`VideoRecorder`] at a time. The
//! recorder ties itself to the session generation it was started in, so
//! closing the session cancels it and suppresses its artifact.

use crate::artifact::{Artifact, ArtifactKind};
use crate::backends::camera::session::SessionBound;
use crate::backends::camera::types::{BackendError, RecorderEvent};
use crate::backends::camera::{CaptureSession, MediaRecorder, SessionToken};
use crate::constants::{RECORDER_MIME, VIDEO_MIME};
use crate::errors::{AppResult, RecordingError};
use crate::storage::ArtifactStore;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Recorder lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderState {
    #[default]
    Idle,
    Recording,
    Finalizing,
    Stopped,
}

struct RecorderInner {
    state: RecorderState,
    /// Chunks of the current (or last) recording in arrival order
    chunks: Vec<Vec<u8>>,
    platform: Option<Box<dyn MediaRecorder>>,
    /// Bumped on every start and cancel; stale chunk pumps exit on mismatch
    epoch: u64,
    waiter: Option<oneshot::Sender<Artifact>>,
    token: Option<SessionToken>,
}

/// Start/stop video recorder bound to a capture session
///
/// Cheap to clone; all clones drive the same recording.
#[derive(Clone)]
pub struct VideoRecorder {
    inner: Arc<Mutex<RecorderInner>>,
    store: ArtifactStore,
}

fn lock(inner: &Mutex<RecorderInner>) -> MutexGuard<'_, RecorderInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl VideoRecorder {
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RecorderInner {
                state: RecorderState::Idle,
                chunks: Vec::new(),
                platform: None,
                epoch: 0,
                waiter: None,
                token: None,
            })),
            store,
        }
    }

    pub fn state(&self) -> RecorderState {
        lock(&self.inner).state
    }

    pub fn is_recording(&self) -> bool {
        self.state() == RecorderState::Recording
    }

    /// Bytes buffered for the current (or last) recording
    pub fn buffered_bytes(&self) -> usize {
        lock(&self.inner).chunks.iter().map(Vec::len).sum()
    }

    /// Begin recording the session's stream
    ///
    /// A no-op while already recording. Fails with `RecorderUnsupported` if
    /// the platform cannot build a `video/webm;codecs=vp9` recorder; the
    /// session stays active in that case.
    pub fn start(&self, session: &CaptureSession) -> AppResult<()> {
        // Held from the state check to the Recording transition.
        // Lock order: recorder, then session.
        let mut inner = lock(&self.inner);
        match inner.state {
            RecorderState::Recording => {
                debug!("Recording already in progress, start ignored");
                return Ok(());
            }
            RecorderState::Finalizing => {
                return Err(RecordingError::StartFailed(
                    "previous recording is still finalizing".into(),
                )
                .into());
            }
            RecorderState::Idle | RecorderState::Stopped => {}
        }

        let token = session.token();

        let mut platform = session
            .with_stream(|stream| {
                if !stream.is_type_supported(RECORDER_MIME) {
                    return Err(BackendError::FormatNotSupported(RECORDER_MIME.into()));
                }
                stream.create_recorder(RECORDER_MIME)
            })?
            .map_err(|e| {
                warn!(error = %e, "Platform cannot record this stream");
                RecordingError::RecorderUnsupported(e.to_string())
            })?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        platform
            .start(events_tx)
            .map_err(|e| RecordingError::StartFailed(e.to_string()))?;

        inner.epoch += 1;
        inner.chunks.clear();
        inner.state = RecorderState::Recording;
        inner.platform = Some(platform);
        inner.waiter = None;
        inner.token = Some(token.clone());
        let epoch = inner.epoch;
        drop(inner);

        session.bind(&token, Box::new(self.clone()));

        tokio::spawn(pump_events(
            Arc::clone(&self.inner),
            self.store.clone(),
            events_rx,
            epoch,
        ));

        info!(mime = RECORDER_MIME, "Recording started");
        Ok(())
    }

    /// Stop recording and wait for the finalized artifact
    ///
    /// Returns `None` without side effects when not recording, and `None`
    /// when the session is torn down before the platform finalizes.
    pub async fn stop(&self) -> Option<Artifact> {
        let finalized = {
            let mut inner = lock(&self.inner);
            if inner.state != RecorderState::Recording {
                debug!(state = ?inner.state, "Stop ignored, not recording");
                return None;
            }

            inner.state = RecorderState::Finalizing;
            let (tx, rx) = oneshot::channel();
            inner.waiter = Some(tx);
            if let Some(platform) = inner.platform.as_mut() {
                platform.stop();
            }
            rx
        };

        info!("Recording stopping, waiting for finalize");

        match finalized.await {
            Ok(artifact) => Some(artifact),
            Err(_) => {
                debug!("Recording cancelled before finalize");
                None
            }
        }
    }

    /// Abandon the current recording without producing an artifact
    pub fn abort(&self) {
        let mut inner = lock(&self.inner);
        if !matches!(
            inner.state,
            RecorderState::Recording | RecorderState::Finalizing
        ) {
            return;
        }

        inner.epoch += 1;
        if let Some(mut platform) = inner.platform.take() {
            platform.stop();
        }
        inner.waiter = None;
        inner.token = None;
        inner.state = RecorderState::Idle;

        info!("Recording aborted");
    }
}

impl SessionBound for VideoRecorder {
    fn cancel(&self) {
        self.abort();
    }

    fn key(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    fn is_finished(&self) -> bool {
        !matches!(
            self.state(),
            RecorderState::Recording | RecorderState::Finalizing
        )
    }
}

impl std::fmt::Debug for VideoRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("VideoRecorder")
            .field("state", &inner.state)
            .field("chunks", &inner.chunks.len())
            .finish()
    }
}

/// Apply platform events of one recording epoch in arrival order
async fn pump_events(
    inner: Arc<Mutex<RecorderInner>>,
    store: ArtifactStore,
    mut events: mpsc::UnboundedReceiver<RecorderEvent>,
    epoch: u64,
) {
    while let Some(event) = events.recv().await {
        let mut guard = lock(&inner);
        if guard.epoch != epoch {
            debug!(epoch, "Dropping events of an abandoned recording");
            return;
        }

        match event {
            RecorderEvent::Data(chunk) => {
                if chunk.is_empty() {
                    continue;
                }
                if matches!(
                    guard.state,
                    RecorderState::Recording | RecorderState::Finalizing
                ) {
                    guard.chunks.push(chunk);
                }
            }
            RecorderEvent::Stopped => {
                let waiter = guard.waiter.take();
                let session_open = guard.token.as_ref().is_some_and(SessionToken::is_current);
                guard.platform = None;
                guard.state = RecorderState::Stopped;
                let chunk_count = guard.chunks.len();
                let payload = guard.chunks.concat();
                drop(guard);

                let Some(waiter) = waiter else {
                    warn!(chunk_count, "Recorder finalized without a stop request");
                    return;
                };
                if !session_open {
                    debug!("Session closed before finalize, video discarded");
                    return;
                }

                let artifact = Artifact::register(&store, ArtifactKind::Video, VIDEO_MIME, payload);
                info!(
                    handle = %artifact.handle,
                    size = artifact.len(),
                    chunk_count,
                    "Video finalized"
                );

                if let Err(artifact) = waiter.send(artifact) {
                    store.release(artifact.handle);
                }
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::{CaptureConstraints, SessionState};
    use crate::backends::virtual_camera::{ChunkPlan, VirtualCamera, VirtualCameraConfig};
    use crate::errors::{AppError, CameraError};

    async fn setup(config: VirtualCameraConfig) -> (CaptureSession, VideoRecorder, VirtualCamera) {
        let camera = VirtualCamera::new(config);
        let session = CaptureSession::new(Arc::new(camera.clone()));
        let _ = session.open(CaptureConstraints::default()).await;
        (session, VideoRecorder::new(ArtifactStore::new()), camera)
    }

    fn scripted(on_start: Vec<usize>, on_stop: Vec<usize>) -> VirtualCameraConfig {
        VirtualCameraConfig {
            chunks: ChunkPlan::Scripted { on_start, on_stop },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_chunks_concatenated_in_order() {
        let (session, recorder, _camera) = setup(scripted(vec![10, 20, 15], vec![])).await;

        recorder.start(&session).unwrap();
        assert_eq!(recorder.state(), RecorderState::Recording);

        let artifact = recorder.stop().await.unwrap();
        assert_eq!(artifact.len(), 45);
        assert_eq!(artifact.mime_type, "video/webm");
        assert_eq!(artifact.kind, ArtifactKind::Video);
        assert_eq!(recorder.state(), RecorderState::Stopped);
    }

    #[tokio::test]
    async fn test_zero_length_chunks_ignored_and_flush_included() {
        let (session, recorder, _camera) = setup(scripted(vec![5, 0, 7], vec![0, 3])).await;

        recorder.start(&session).unwrap();
        let artifact = recorder.stop().await.unwrap();

        assert_eq!(artifact.len(), 15);
    }

    #[tokio::test]
    async fn test_double_start_creates_one_recorder() {
        let (session, recorder, camera) = setup(scripted(vec![4], vec![])).await;

        recorder.start(&session).unwrap();
        recorder.start(&session).unwrap();
        assert_eq!(camera.stats().recorders_created, 1);

        assert!(recorder.stop().await.is_some());
        assert!(recorder.stop().await.is_none());
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let (_session, recorder, _camera) = setup(scripted(vec![4], vec![])).await;

        assert!(recorder.stop().await.is_none());
        assert_eq!(recorder.state(), RecorderState::Idle);
    }

    #[tokio::test]
    async fn test_empty_recording_still_emits() {
        let (session, recorder, _camera) = setup(scripted(vec![], vec![])).await;

        recorder.start(&session).unwrap();
        let artifact = recorder.stop().await.unwrap();
        assert!(artifact.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_codec_keeps_session_active() {
        let (session, recorder, _camera) = setup(VirtualCameraConfig {
            supported_mime_types: vec!["video/mp4".into()],
            ..Default::default()
        })
        .await;

        let err = recorder.start(&session).unwrap_err();
        assert!(matches!(
            err,
            AppError::Recording(RecordingError::RecorderUnsupported(_))
        ));
        assert_eq!(recorder.state(), RecorderState::Idle);
        assert_eq!(session.state(), SessionState::Active);
    }

    #[tokio::test]
    async fn test_start_requires_active_session() {
        let (session, recorder, _camera) = setup(scripted(vec![1], vec![])).await;
        session.close();

        let err = recorder.start(&session).unwrap_err();
        assert_eq!(
            err,
            AppError::Camera(CameraError::NotActive(SessionState::Closed))
        );
    }

    #[tokio::test]
    async fn test_close_cancels_recording() {
        let store = ArtifactStore::new();
        let camera = VirtualCamera::new(scripted(vec![8, 8], vec![]));
        let session = CaptureSession::new(Arc::new(camera.clone()));
        session.open(CaptureConstraints::default()).await.unwrap();
        let recorder = VideoRecorder::new(store.clone());

        recorder.start(&session).unwrap();
        session.close();

        assert_eq!(recorder.state(), RecorderState::Idle);
        assert!(recorder.stop().await.is_none());
        assert_eq!(store.live_count(), 0);
        assert_eq!(camera.stats().tracks_stopped, camera.stats().tracks_acquired);
    }

    #[tokio::test]
    async fn test_restart_clears_buffer() {
        let (session, recorder, _camera) = setup(scripted(vec![6], vec![])).await;

        recorder.start(&session).unwrap();
        recorder.stop().await.unwrap();
        recorder.start(&session).unwrap();
        let second = recorder.stop().await.unwrap();

        assert_eq!(second.len(), 6);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_starts_create_one_recorder() {
        let (session, recorder, camera) = setup(scripted(vec![3], vec![])).await;
        let barrier = Arc::new(tokio::sync::Barrier::new(8));

        let starts: Vec<_> = (0..8)
            .map(|_| {
                let session = session.clone();
                let recorder = recorder.clone();
                let barrier = Arc::clone(&barrier);
                tokio::spawn(async move {
                    barrier.wait().await;
                    recorder.start(&session)
                })
            })
            .collect();

        for start in starts {
            start.await.unwrap().unwrap();
        }

        assert_eq!(camera.stats().recorders_created, 1);
        assert_eq!(session.bound_len(), 1);
        assert_eq!(recorder.stop().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_repeated_recordings_keep_one_binding() {
        let (session, recorder, _camera) = setup(scripted(vec![2], vec![])).await;

        for _ in 0..3 {
            recorder.start(&session).unwrap();
            recorder.stop().await.unwrap();
        }
        assert_eq!(session.bound_len(), 1);

        let other = VideoRecorder::new(ArtifactStore::new());
        other.start(&session).unwrap();
        assert_eq!(session.bound_len(), 1);

        session.close();
        assert_eq!(other.state(), RecorderState::Idle);
        assert_eq!(session.bound_len(), 0);
    }
}
