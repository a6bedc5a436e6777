use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Lifecycle of a review. Only `Pending -> Completed` exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Completed,
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewStatus::Pending => write!(f, "pending"),
            ReviewStatus::Completed => write!(f, "completed"),
        }
    }
}

/// One document submitted for review.
///
/// The local key is not stored in the record itself; it is the key of the
/// ledger map the record lives under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Remote path the rendered artifact was uploaded to
    pub device_path: String,
    pub status: ReviewStatus,
    #[serde(rename = "timestamp")]
    pub submitted_at: DateTime<Utc>,
    /// Set if and only if `status == Completed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Absolute form of the source document path
    #[serde(rename = "original_path")]
    pub original_local_path: PathBuf,
}

impl ReviewRecord {
    pub fn pending(device_path: impl Into<String>, original_local_path: PathBuf) -> Self {
        Self {
            device_path: device_path.into(),
            status: ReviewStatus::Pending,
            submitted_at: Utc::now(),
            completed_at: None,
            original_local_path,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ReviewStatus::Pending
    }

    /// File name component of `device_path`.
    pub fn device_file_name(&self) -> &str {
        self.device_path
            .rsplit('/')
            .next()
            .unwrap_or(self.device_path.as_str())
    }
}

/// Whole-ledger snapshot as persisted on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub reviews: BTreeMap<String, ReviewRecord>,
}
