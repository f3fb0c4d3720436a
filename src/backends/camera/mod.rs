// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! The capture pipeline never talks to a device directly. It goes through
//! three small traits that mirror what a platform media API hands out:
//!
//! ```text
//! ┌─────────────────────┐
//! │   CaptureSurface    │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │   CaptureSession    │  ← open/close lifecycle, stopped guard
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  MediaDevices trait │  ← stream acquisition
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  MediaStream trait  │  ← tracks, frames, recorders
//! └─────────────────────┘
//! ```

pub mod session;
pub mod types;

pub use session::{CaptureSession, OpenOutcome, SessionState, SessionToken, TrackStats};
pub use types::*;

use futures::future::BoxFuture;
use tokio::sync::mpsc;

/// Entry point into the platform's media API
pub trait MediaDevices: Send + Sync {
    /// Request a camera stream matching the constraints
    ///
    /// Resolution may take arbitrarily long (a pending permission prompt);
    /// no timeout is applied by the session.
    fn get_user_media(
        &self,
        constraints: &CaptureConstraints,
    ) -> BoxFuture<'static, BackendResult<Box<dyn MediaStream>>>;

    /// Human readable backend name for logs
    fn backend_name(&self) -> &str;
}

/// A live camera stream made of one or more tracks
pub trait MediaStream: Send {
    /// Platform identifier of the stream
    fn id(&self) -> &str;

    /// Number of tracks the stream was acquired with
    fn track_count(&self) -> usize;

    /// Stop every track that is still live
    ///
    /// Must be idempotent. Returns how many tracks this call stopped.
    fn stop_tracks(&mut self) -> usize;

    /// Native resolution, if the stream reports one
    fn dimensions(&self) -> Option<Resolution>;

    /// Draw the current frame at the given size
    ///
    /// Returns `None` when no frame has been presented yet.
    fn grab_frame(&self, size: Resolution) -> Option<CameraFrame>;

    /// Whether a recorder can be built for this MIME type
    fn is_type_supported(&self, mime_type: &str) -> bool;

    /// Build a recorder for this stream
    fn create_recorder(&self, mime_type: &str) -> BackendResult<Box<dyn MediaRecorder>>;
}

/// Platform video recorder bound to a stream
pub trait MediaRecorder: Send {
    /// Begin recording. Chunks and the final `Stopped` signal are sent to `events`.
    fn start(&mut self, events: mpsc::UnboundedSender<RecorderEvent>) -> BackendResult<()>;

    /// Request finalization. The platform answers with `RecorderEvent::Stopped`.
    fn stop(&mut self);
}

/// Video preview attached to an active session
pub trait PreviewSink: Send + Sync {
    fn attach(&self, stream_id: &str, resolution: Option<Resolution>);
    fn detach(&self);
}
