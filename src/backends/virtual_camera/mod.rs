// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backend
//!
//! A deterministic stand-in for a platform media API. It renders a test
//! pattern instead of sensor frames and produces synthetic recorder chunks,
//! which makes it usable both for the CLI demo and for exercising the
//! session, photo and video pipelines in tests.
//!
//! Every acquired, stopped and recorder-creating call is counted in
//! [`VirtualCameraStats`] so track leaks are observable from the outside.

use crate::backends::camera::types::{
    BackendError, BackendResult, CameraFrame, CaptureConstraints, RecorderEvent, Resolution,
};
use crate::backends::camera::{MediaDevices, MediaRecorder, MediaStream, PreviewSink};
use crate::constants::{RECORDER_MIME, virtual_camera as defaults};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// How the virtual recorder produces chunks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkPlan {
    /// Chunks of the given sizes, emitted in order
    ///
    /// `on_start` chunks are delivered as soon as recording starts, `on_stop`
    /// chunks are flushed after a stop request and before the finalize signal.
    Scripted {
        on_start: Vec<usize>,
        on_stop: Vec<usize>,
    },
    /// One chunk of `size` bytes every `every`
    Periodic { size: usize, every: Duration },
}

impl Default for ChunkPlan {
    fn default() -> Self {
        ChunkPlan::Periodic {
            size: defaults::CHUNK_SIZE,
            every: defaults::CHUNK_INTERVAL,
        }
    }
}

/// Behaviour of a virtual camera
#[derive(Debug, Clone)]
pub struct VirtualCameraConfig {
    /// Refuse every stream request with `PermissionDenied`
    pub deny_permission: bool,
    /// Pretend no camera is attached
    pub no_device: bool,
    /// Delay before a stream request resolves
    pub acquire_delay: Option<Duration>,
    /// Native resolution reported by streams (`None` = not reported)
    pub native_size: Option<(u32, u32)>,
    /// Whether a frame has been presented
    pub frame_ready: bool,
    /// Recorder MIME types the virtual encoder accepts
    pub supported_mime_types: Vec<String>,
    pub chunks: ChunkPlan,
}

impl Default for VirtualCameraConfig {
    fn default() -> Self {
        Self {
            deny_permission: false,
            no_device: false,
            acquire_delay: None,
            native_size: Some(defaults::NATIVE_SIZE),
            frame_ready: true,
            supported_mime_types: vec![RECORDER_MIME.to_string()],
            chunks: ChunkPlan::default(),
        }
    }
}

/// Counters shared by every stream and recorder of a virtual camera
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VirtualCameraStats {
    pub streams_opened: usize,
    pub tracks_acquired: usize,
    pub tracks_stopped: usize,
    pub recorders_created: usize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Virtual media device
#[derive(Clone)]
pub struct VirtualCamera {
    config: Arc<VirtualCameraConfig>,
    stats: Arc<Mutex<VirtualCameraStats>>,
    next_stream: Arc<AtomicU64>,
}

impl VirtualCamera {
    pub fn new(config: VirtualCameraConfig) -> Self {
        Self {
            config: Arc::new(config),
            stats: Arc::new(Mutex::new(VirtualCameraStats::default())),
            next_stream: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn stats(&self) -> VirtualCameraStats {
        *lock(&self.stats)
    }
}

impl Default for VirtualCamera {
    fn default() -> Self {
        Self::new(VirtualCameraConfig::default())
    }
}

impl MediaDevices for VirtualCamera {
    fn get_user_media(
        &self,
        constraints: &CaptureConstraints,
    ) -> BoxFuture<'static, BackendResult<Box<dyn MediaStream>>> {
        let config = Arc::clone(&self.config);
        let stats = Arc::clone(&self.stats);
        let stream_number = self.next_stream.fetch_add(1, Ordering::Relaxed);
        let tracks = defaults::VIDEO_TRACKS + usize::from(constraints.audio);

        Box::pin(async move {
            if let Some(delay) = config.acquire_delay {
                tokio::time::sleep(delay).await;
            }

            if config.deny_permission {
                return Err(BackendError::PermissionDenied);
            }
            if config.no_device {
                return Err(BackendError::DeviceNotFound("virtual camera unplugged".into()));
            }

            {
                let mut stats = lock(&stats);
                stats.streams_opened += 1;
                stats.tracks_acquired += tracks;
            }

            let id = format!("virtual-{}", stream_number);
            debug!(stream = %id, tracks, "Virtual stream acquired");

            Ok(Box::new(VirtualStream {
                id,
                tracks,
                live_tracks: tracks,
                config,
                stats,
            }) as Box<dyn MediaStream>)
        })
    }

    fn backend_name(&self) -> &str {
        "virtual"
    }
}

struct VirtualStream {
    id: String,
    tracks: usize,
    live_tracks: usize,
    config: Arc<VirtualCameraConfig>,
    stats: Arc<Mutex<VirtualCameraStats>>,
}

impl MediaStream for VirtualStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn track_count(&self) -> usize {
        self.tracks
    }

    fn stop_tracks(&mut self) -> usize {
        let stopped = std::mem::take(&mut self.live_tracks);
        if stopped > 0 {
            lock(&self.stats).tracks_stopped += stopped;
        }
        stopped
    }

    fn dimensions(&self) -> Option<Resolution> {
        self.config
            .native_size
            .map(|(width, height)| Resolution::new(width, height))
    }

    fn grab_frame(&self, size: Resolution) -> Option<CameraFrame> {
        if !self.config.frame_ready || self.live_tracks == 0 || size.is_empty() {
            return None;
        }

        Some(CameraFrame {
            width: size.width,
            height: size.height,
            data: Arc::from(test_pattern(size)),
            captured_at: Instant::now(),
        })
    }

    fn is_type_supported(&self, mime_type: &str) -> bool {
        self.config
            .supported_mime_types
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(mime_type))
    }

    fn create_recorder(&self, mime_type: &str) -> BackendResult<Box<dyn MediaRecorder>> {
        if !self.is_type_supported(mime_type) {
            return Err(BackendError::FormatNotSupported(mime_type.to_string()));
        }

        lock(&self.stats).recorders_created += 1;
        info!(stream = %self.id, mime = mime_type, "Virtual recorder created");

        Ok(Box::new(VirtualRecorder {
            plan: self.config.chunks.clone(),
            events: None,
            ticker: None,
        }))
    }
}

/// Horizontal RGB gradient, fully opaque
fn test_pattern(size: Resolution) -> Vec<u8> {
    let mut data = Vec::with_capacity(size.width as usize * size.height as usize * 4);
    for y in 0..size.height {
        for x in 0..size.width {
            let r = (x * 255 / size.width.max(1)) as u8;
            let g = (y * 255 / size.height.max(1)) as u8;
            data.extend_from_slice(&[r, g, 128, 255]);
        }
    }
    data
}

struct VirtualRecorder {
    plan: ChunkPlan,
    events: Option<mpsc::UnboundedSender<RecorderEvent>>,
    ticker: Option<tokio::task::JoinHandle<()>>,
}

impl MediaRecorder for VirtualRecorder {
    fn start(&mut self, events: mpsc::UnboundedSender<RecorderEvent>) -> BackendResult<()> {
        if self.events.is_some() {
            return Err(BackendError::Other("virtual recorder already started".into()));
        }

        match &self.plan {
            ChunkPlan::Scripted { on_start, .. } => {
                for &size in on_start {
                    let _ = events.send(RecorderEvent::Data(vec![0u8; size]));
                }
            }
            ChunkPlan::Periodic { size, every } => {
                let (size, every) = (*size, *every);
                let ticker_events = events.clone();
                self.ticker = Some(tokio::spawn(async move {
                    let mut interval = tokio::time::interval(every);
                    // First tick completes immediately
                    interval.tick().await;
                    loop {
                        interval.tick().await;
                        if ticker_events.send(RecorderEvent::Data(vec![0u8; size])).is_err() {
                            break;
                        }
                    }
                }));
            }
        }

        self.events = Some(events);
        Ok(())
    }

    fn stop(&mut self) {
        let Some(events) = self.events.take() else {
            warn!("Stop requested on a virtual recorder that never started");
            return;
        };

        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }

        if let ChunkPlan::Scripted { on_stop, .. } = &self.plan {
            for &size in on_stop {
                let _ = events.send(RecorderEvent::Data(vec![0u8; size]));
            }
        }

        let _ = events.send(RecorderEvent::Stopped);
    }
}

impl Drop for VirtualRecorder {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

/// Preview sink that only counts attach/detach calls
#[derive(Debug, Default)]
pub struct PreviewProbe {
    state: Mutex<PreviewProbeState>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PreviewProbeState {
    pub attached: Option<String>,
    pub attach_count: usize,
    pub detach_count: usize,
}

impl PreviewProbe {
    pub fn snapshot(&self) -> PreviewProbeState {
        lock(&self.state).clone()
    }
}

impl PreviewSink for PreviewProbe {
    fn attach(&self, stream_id: &str, resolution: Option<Resolution>) {
        debug!(stream = stream_id, resolution = ?resolution, "Preview attached");
        let mut state = lock(&self.state);
        state.attached = Some(stream_id.to_string());
        state.attach_count += 1;
    }

    fn detach(&self) {
        let mut state = lock(&self.state);
        state.attached = None;
        state.detach_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_size() {
        let data = test_pattern(Resolution::new(4, 3));
        assert_eq!(data.len(), 4 * 3 * 4);
        assert!(data.chunks(4).all(|px| px[3] == 255));
    }

    #[tokio::test]
    async fn test_denied_permission() {
        let camera = VirtualCamera::new(VirtualCameraConfig {
            deny_permission: true,
            ..Default::default()
        });

        let result = camera.get_user_media(&CaptureConstraints::default()).await;
        assert_eq!(result.err(), Some(BackendError::PermissionDenied));
        assert_eq!(camera.stats(), VirtualCameraStats::default());
    }

    #[tokio::test]
    async fn test_stop_tracks_counts_once() {
        let camera = VirtualCamera::default();
        let mut stream = camera
            .get_user_media(&CaptureConstraints::default())
            .await
            .unwrap();

        assert_eq!(stream.stop_tracks(), 1);
        assert_eq!(stream.stop_tracks(), 0);
        assert_eq!(camera.stats().tracks_stopped, 1);
        assert!(stream.grab_frame(Resolution::new(2, 2)).is_none());
    }

    #[tokio::test]
    async fn test_scripted_recorder_order() {
        let camera = VirtualCamera::new(VirtualCameraConfig {
            chunks: ChunkPlan::Scripted {
                on_start: vec![3, 1],
                on_stop: vec![2],
            },
            ..Default::default()
        });
        let stream = camera
            .get_user_media(&CaptureConstraints::default())
            .await
            .unwrap();

        let mut recorder = stream.create_recorder(RECORDER_MIME).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        recorder.start(tx).unwrap();
        recorder.stop();

        let mut sizes = Vec::new();
        while let Some(event) = rx.recv().await {
            match event {
                RecorderEvent::Data(chunk) => sizes.push(chunk.len()),
                RecorderEvent::Stopped => break,
            }
        }
        assert_eq!(sizes, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_unsupported_mime() {
        let camera = VirtualCamera::new(VirtualCameraConfig {
            supported_mime_types: Vec::new(),
            ..Default::default()
        });
        let stream = camera
            .get_user_media(&CaptureConstraints::default())
            .await
            .unwrap();

        assert!(matches!(
            stream.create_recorder(RECORDER_MIME),
            Err(BackendError::FormatNotSupported(_))
        ));
        assert_eq!(camera.stats().recorders_created, 0);
    }
}
