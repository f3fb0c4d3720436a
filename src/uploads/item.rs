// SPDX-License-Identifier: GPL-3.0-only

//! Upload records

use crate::artifact::ArtifactKind;
use crate::geolocation::Coordinates;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Verification status of an upload
///
/// `Verified` and `Approved` are labels assigned by external reviewers; the
/// pipeline itself only ever sets `Pending` (offline or freshly synced) and
/// `Verified` (submitted while online).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Verified,
    Approved,
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadStatus::Pending => write!(f, "pending"),
            UploadStatus::Verified => write!(f, "verified"),
            UploadStatus::Approved => write!(f, "approved"),
        }
    }
}

/// A submitted artifact's verification record
///
/// Field order is the export order: `id, kind, createdAt, status, label, location`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadItem {
    pub id: u64,
    pub kind: ArtifactKind,
    pub created_at: NaiveDate,
    pub status: UploadStatus,
    pub label: String,
    pub location: Option<Coordinates>,
}
