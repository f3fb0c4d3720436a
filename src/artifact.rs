// SPDX-License-Identifier: GPL-3.0-only

//! Captured media handed from the pipelines to the hosting surface

use crate::storage::ArtifactStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// What kind of media an artifact (or upload) carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Photo,
    Video,
}

impl ArtifactKind {
    /// Default submission label for this kind
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::Photo => crate::constants::PHOTO_LABEL,
            ArtifactKind::Video => crate::constants::VIDEO_LABEL,
        }
    }

    /// File extension used when saving a payload
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Photo => "jpg",
            ArtifactKind::Video => "webm",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Photo => write!(f, "photo"),
            ArtifactKind::Video => write!(f, "video"),
        }
    }
}

/// Ephemeral reference to an artifact payload, rendered as `blob:<uuid>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArtifactHandle(Uuid);

impl ArtifactHandle {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ArtifactHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "blob:{}", self.0)
    }
}

/// A captured photo or video
///
/// The caller owns the artifact as soon as it is delivered and must release
/// its handle through the [`ArtifactStore`] once it is no longer displayed.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub mime_type: &'static str,
    pub payload: Arc<[u8]>,
    pub handle: ArtifactHandle,
}

impl Artifact {
    /// Build an artifact and register its ephemeral reference
    pub(crate) fn register(
        store: &ArtifactStore,
        kind: ArtifactKind,
        mime_type: &'static str,
        payload: Vec<u8>,
    ) -> Self {
        let payload: Arc<[u8]> = Arc::from(payload);
        let handle = store.register(Arc::clone(&payload));
        Self {
            kind,
            mime_type,
            payload,
            handle,
        }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
