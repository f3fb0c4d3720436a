// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Ideal capture width requested from the camera
pub const IDEAL_WIDTH: u32 = 1280;

/// Ideal capture height requested from the camera
pub const IDEAL_HEIGHT: u32 = 720;

/// Frame size used when the stream does not report its native dimensions
pub const FALLBACK_FRAME_SIZE: (u32, u32) = (IDEAL_WIDTH, IDEAL_HEIGHT);

/// JPEG quality for captured photos (0.9 on a 0-1 scale)
pub const JPEG_QUALITY: u8 = 90;

/// MIME type of encoded photos
pub const PHOTO_MIME: &str = "image/jpeg";

/// Recorder configuration requested from the platform
pub const RECORDER_MIME: &str = "video/webm;codecs=vp9";

/// MIME type of finalized video payloads
pub const VIDEO_MIME: &str = "video/webm";

/// Simulated processing latency of a sync operation
pub const SYNC_LATENCY: Duration = Duration::from_millis(1200);

/// Capacity of the sync event broadcast channel
pub const SYNC_EVENT_CAPACITY: usize = 32;

/// Default label attached to photo submissions
pub const PHOTO_LABEL: &str = "New Photo Evidence";

/// Default label attached to video submissions
pub const VIDEO_LABEL: &str = "New Video Evidence";

/// User-visible messages for recoverable failures
pub mod messages {
    pub const CAMERA_UNAVAILABLE: &str = "Camera access denied or unavailable";
    pub const RECORDER_UNSUPPORTED: &str = "Video recording not supported on this device";
    pub const FRAME_UNAVAILABLE: &str = "Camera preview is not ready yet";
}

/// Virtual camera defaults
pub mod virtual_camera {
    use std::time::Duration;

    /// Native resolution reported by the virtual camera
    pub const NATIVE_SIZE: (u32, u32) = (1280, 720);

    /// Number of tracks in a virtual stream (video only, audio disabled)
    pub const VIDEO_TRACKS: usize = 1;

    /// Interval between periodic recorder chunks
    pub const CHUNK_INTERVAL: Duration = Duration::from_millis(250);

    /// Size of each periodic recorder chunk
    pub const CHUNK_SIZE: usize = 4096;
}
