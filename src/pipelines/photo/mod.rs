// SPDX-License-Identifier: MPL-2.0

//! Async photo capture pipeline
//!
//! ```text
//! CaptureSession → Grab frame → JPEG encode (blocking pool) → Artifact
//!                      ↓
//!               Preview continues uninterrupted
//! ```
//!
//! The grab is synchronous; encoding runs on tokio's blocking pool. The
//! artifact is only delivered if the session generation that produced the
//! frame is still current once encoding finishes.

pub mod capture;
pub mod encoding;

pub use capture::{PendingPhoto, PhotoCapture};
pub use encoding::{EncodedImage, PhotoEncoder};
