// SPDX-License-Identifier: MPL-2.0

//! Asset Capture - media capture and offline upload pipeline
//!
//! Photos and videos are taken from a camera session bound to a capture
//! surface, turned into upload records, and either confirmed right away
//! (online) or queued until connectivity returns.
//!
//! # Architecture
//!
//! - [`backends`]: Platform media abstraction and the virtual camera
//! - [`pipelines`]: Photo capture and video recording
//! - [`uploads`]: Upload ledger, connectivity flag and sync engine
//! - [`app`]: Capture surface, submission desk and application wiring
//! - [`config`]: User configuration handling
//! - [`storage`]: Ephemeral artifact references and saving to disk
//!
//! # Example
//!
//! ```ignore
//! let app = AssetCaptureApp::new(Config::load(), Arc::new(VirtualCamera::default()), Arc::new(TracingSink));
//! let surface = app.capture_surface(CameraMode::Photo);
//! surface.show().await?;
//! let submission = surface.capture_photo().await?;
//! surface.dismiss();
//! ```

pub mod app;
pub mod artifact;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod geolocation;
pub mod notifications;
pub mod pipelines;
pub mod storage;
pub mod uploads;

// Re-export commonly used types
pub use app::{AssetCaptureApp, CameraMode, CaptureSurface, Submission, SubmissionDesk};
pub use artifact::{Artifact, ArtifactHandle, ArtifactKind};
pub use backends::camera::{CaptureConstraints, CaptureSession, FacingMode, SessionState};
pub use backends::virtual_camera::{VirtualCamera, VirtualCameraConfig};
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use pipelines::photo::PhotoCapture;
pub use pipelines::video::{RecorderState, VideoRecorder};
pub use storage::ArtifactStore;
pub use uploads::{
    Connectivity, LinkState, SyncEngine, SyncEvent, UploadItem, UploadLedger, UploadStatus,
};
