// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines for photo and video capture
//!
//! Both pipelines consume an active [`CaptureSession`](crate::backends::camera::CaptureSession)
//! and produce an [`Artifact`](crate::artifact::Artifact) without interrupting
//! the live preview.
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Camera Frame │ ──▶ │  Photo Pipeline   │ ──▶ │  image/jpeg  │
//! │   (RGBA)     │     │  - JPEG q=90      │     │   Artifact   │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//!
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Recorder     │ ──▶ │  Video Pipeline   │ ──▶ │  video/webm  │
//! │ chunks       │     │  - ordered concat │     │   Artifact   │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```

pub mod photo;
pub mod video;
