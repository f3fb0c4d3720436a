// SPDX-License-Identifier: MPL-2.0

//! Error types for the capture pipeline
//!
//! None of these are fatal: every variant describes a local, recoverable
//! condition that is reported back to the calling surface for display.

use crate::backends::camera::{BackendError, SessionState};
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main error type
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Camera session errors
    Camera(CameraError),
    /// Video recording errors
    Recording(RecordingError),
    /// Photo capture errors
    Photo(PhotoError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Camera session errors
#[derive(Debug, Clone, PartialEq)]
pub enum CameraError {
    /// Permission denied, no device, or platform API missing at open
    Unavailable(BackendError),
    /// Operation requires an active session
    NotActive(SessionState),
}

/// Video recording errors
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingError {
    /// The platform cannot construct a recorder for the session's stream
    RecorderUnsupported(String),
    /// The platform recorder refused to start
    StartFailed(String),
}

/// Photo capture errors
#[derive(Debug, Clone, PartialEq)]
pub enum PhotoError {
    /// No frame has been presented yet
    FrameUnavailable,
    /// Encoding failed
    EncodingFailed(String),
}

impl AppError {
    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        use crate::constants::messages;

        match self {
            AppError::Camera(CameraError::Unavailable(_)) => {
                messages::CAMERA_UNAVAILABLE.to_string()
            }
            AppError::Recording(RecordingError::RecorderUnsupported(_)) => {
                messages::RECORDER_UNSUPPORTED.to_string()
            }
            AppError::Photo(PhotoError::FrameUnavailable) => {
                messages::FRAME_UNAVAILABLE.to_string()
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Recording(e) => write!(f, "Recording error: {}", e),
            AppError::Photo(e) => write!(f, "Photo error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::Unavailable(cause) => write!(f, "Camera unavailable: {}", cause),
            CameraError::NotActive(state) => write!(f, "Camera session is {:?}", state),
        }
    }
}

impl fmt::Display for RecordingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingError::RecorderUnsupported(msg) => {
                write!(f, "Recorder unsupported: {}", msg)
            }
            RecordingError::StartFailed(msg) => write!(f, "Failed to start recording: {}", msg),
        }
    }
}

impl fmt::Display for PhotoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoError::FrameUnavailable => write!(f, "No frame available for capture"),
            PhotoError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for RecordingError {}
impl std::error::Error for PhotoError {}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<RecordingError> for AppError {
    fn from(err: RecordingError) -> Self {
        AppError::Recording(err)
    }
}

impl From<PhotoError> for AppError {
    fn from(err: PhotoError) -> Self {
        AppError::Photo(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
