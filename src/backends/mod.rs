// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera capture
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │           Capture surface / pipelines        │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌──────────────────┐  ┌─────────────────┐  │
//! │  │  Camera traits   │◄─┤ Virtual Camera  │  │
//! │  │ (MediaDevices…)  │  │ (test pattern)  │  │
//! │  └──────────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Platform media traits, shared types and the capture session
//! - [`virtual_camera`]: In-process camera used by the CLI and the tests

pub mod camera;
pub mod virtual_camera;
