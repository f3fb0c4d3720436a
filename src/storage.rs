// SPDX-License-Identifier: MPL-2.0

//! Storage for captured payloads
//!
//! Artifacts live in memory behind ephemeral handles until the surface that
//! displays them releases them. Payloads can also be written to disk.

use crate::artifact::{Artifact, ArtifactHandle};
use crate::errors::AppResult;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Registry of ephemeral artifact references
///
/// Cheap to clone; all clones share the same registry.
#[derive(Clone, Default)]
pub struct ArtifactStore {
    entries: Arc<Mutex<HashMap<ArtifactHandle, Arc<[u8]>>>>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<ArtifactHandle, Arc<[u8]>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn register(&self, payload: Arc<[u8]>) -> ArtifactHandle {
        let handle = ArtifactHandle::new();
        debug!(handle = %handle, size = payload.len(), "Registered artifact reference");
        self.entries().insert(handle, payload);
        handle
    }

    /// Look up the payload behind a handle
    pub fn resolve(&self, handle: ArtifactHandle) -> Option<Arc<[u8]>> {
        self.entries().get(&handle).cloned()
    }

    /// Release an ephemeral reference. Returns false if it was already released.
    pub fn release(&self, handle: ArtifactHandle) -> bool {
        let released = self.entries().remove(&handle).is_some();
        if !released {
            warn!(handle = %handle, "Artifact reference released twice");
        }
        released
    }

    /// Number of references not yet released
    pub fn live_count(&self) -> usize {
        self.entries().len()
    }
}

impl std::fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("live", &self.live_count())
            .finish()
    }
}

/// Default directory for saved captures
pub fn default_capture_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("asset-capture")
}

/// Write an artifact payload to a timestamped file in `output_dir`
pub async fn save_artifact(artifact: &Artifact, output_dir: &Path) -> AppResult<PathBuf> {
    tokio::fs::create_dir_all(output_dir).await?;

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let prefix = match artifact.kind {
        crate::artifact::ArtifactKind::Photo => "IMG",
        crate::artifact::ArtifactKind::Video => "VID",
    };

    // Two captures within the same second get a numeric suffix
    let mut filepath = output_dir.join(format!(
        "{}_{}.{}",
        prefix,
        timestamp,
        artifact.kind.extension()
    ));
    let mut suffix = 1;
    while tokio::fs::try_exists(&filepath).await? {
        filepath = output_dir.join(format!(
            "{}_{}_{}.{}",
            prefix,
            timestamp,
            suffix,
            artifact.kind.extension()
        ));
        suffix += 1;
    }

    tokio::fs::write(&filepath, &artifact.payload).await?;
    info!(path = %filepath.display(), size = artifact.len(), "Artifact saved");

    Ok(filepath)
}
