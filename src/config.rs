// SPDX-License-Identifier: GPL-3.0-only

//! Persistent settings
//!
//! Stored as JSON in `<config dir>/asset-capture/config.json`. Missing keys
//! take their default; a missing or unreadable file yields the defaults.

use crate::backends::camera::CaptureConstraints;
use crate::constants::{JPEG_QUALITY, SYNC_LATENCY};
use crate::errors::{AppError, AppResult};
use crate::geolocation::Coordinates;
use crate::storage::default_capture_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

const APP_DIR: &str = "asset-capture";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Constraints requested when a capture surface opens
    pub constraints: CaptureConstraints,
    /// JPEG quality for photos (1-100)
    pub jpeg_quality: u8,
    /// Simulated sync processing latency in milliseconds
    pub sync_latency_ms: u64,
    /// Location attached to uploads when no real provider exists
    pub stub_location: Option<Coordinates>,
    /// Where the CLI writes captured files (`None` = Pictures/asset-capture)
    pub output_dir: Option<PathBuf>,
    /// Start with connectivity flagged offline
    pub start_offline: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            constraints: CaptureConstraints::default(),
            jpeg_quality: JPEG_QUALITY,
            sync_latency_ms: SYNC_LATENCY.as_millis() as u64,
            stub_location: None,
            output_dir: None,
            start_offline: false,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join(CONFIG_FILE)
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        match Self::read(path) {
            Ok(config) => {
                debug!(path = %path.display(), "Loaded config");
                config
            }
            Err(e) => {
                if path.exists() {
                    warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                } else {
                    debug!(path = %path.display(), "No config file, using defaults");
                }
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write to `path` (temp file + rename)
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, path)?;

        debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    pub fn sync_latency(&self) -> Duration {
        Duration::from_millis(self.sync_latency_ms)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(default_capture_dir)
    }
}
