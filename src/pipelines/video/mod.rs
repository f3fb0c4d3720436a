// SPDX-License-Identifier: MPL-2.0

//! Video recording pipeline
//!
//! The platform recorder pushes encoded chunks while recording; the
//! [`VideoRecorder`] buffers them in arrival order and concatenates them into
//! a single `video/webm` payload once the platform signals finalization.
//!
//! ```text
//!   start()            stop()             finalize signal
//! Idle ──▶ Recording ──────▶ Finalizing ─────────────────▶ Stopped
//!   ▲                                                         │
//!   └──────────────────── start() again ──────────────────────┘
//! ```

pub mod recorder;

pub use recorder::{RecorderState, VideoRecorder};
