// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::constants::{IDEAL_HEIGHT, IDEAL_WIDTH};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Which camera the session prefers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front-facing camera
    User,
    /// Back camera
    #[default]
    Environment,
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacingMode::User => write!(f, "user"),
            FacingMode::Environment => write!(f, "environment"),
        }
    }
}

/// Constraints passed to the platform when a session opens
///
/// Facing and resolution are ideals, not requirements: the platform may hand
/// back a stream from another camera or at another size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConstraints {
    pub facing: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub audio: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            ideal_width: IDEAL_WIDTH,
            ideal_height: IDEAL_HEIGHT,
            audio: false,
        }
    }
}

/// Frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Zero-sized resolutions count as "not reported"
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A single RGBA frame read from the stream
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA, 4 bytes per pixel
    pub data: Arc<[u8]>,
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Check that the buffer holds exactly `width * height` pixels
    pub fn is_complete(&self) -> bool {
        !self.data.is_empty()
            && self.data.len() == self.width as usize * self.height as usize * 4
    }
}

/// Events delivered by a platform recorder, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderEvent {
    /// An encoded chunk became available
    Data(Vec<u8>),
    /// Finalize signal: no more chunks will follow
    Stopped,
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The user or the system refused camera access
    PermissionDenied,
    /// No camera device matched the constraints
    DeviceNotFound(String),
    /// The platform has no media capture API
    NotAvailable(String),
    /// Requested recorder format is not supported
    FormatNotSupported(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::PermissionDenied => write!(f, "Permission denied"),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}
