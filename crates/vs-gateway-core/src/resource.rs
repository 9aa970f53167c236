//! Remote resources observed by the poller
//!
//! The provider owns every status transition. These types are read-only
//! snapshots; the only behavior they carry is the per-kind terminal predicate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which kind of remote resource a poll session targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Container: a vector store
    VectorStore,
    /// Member: one file inside a vector store
    VectorStoreFile,
    /// Batch of files added to a vector store
    FileBatch,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VectorStore => "vector_store",
            Self::VectorStoreFile => "vector_store_file",
            Self::FileBatch => "file_batch",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a resource whose status can be polled
pub trait PollableResource: fmt::Debug + Send + Sync {
    const KIND: ResourceKind;

    fn id(&self) -> &str;

    /// Wire name of the current status
    fn status_label(&self) -> &'static str;

    /// No further transition will happen
    fn is_terminal(&self) -> bool;
}

// ============================================================================
// Statuses
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorStoreStatus {
    InProgress,
    Completed,
    Expired,
}

impl VectorStoreStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Expired)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl FileStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    InProgress,
    Completed,
    Cancelled,
    Failed,
}

impl BatchStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

// ============================================================================
// Resources
// ============================================================================

/// Per-status file tallies reported on stores and batches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCounts {
    #[serde(default)]
    pub in_progress: u64,
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default)]
    pub cancelled: u64,
    #[serde(default)]
    pub total: u64,
}

/// Why a file failed to index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorStore {
    pub id: String,
    pub status: VectorStoreStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub file_counts: FileCounts,

    #[serde(default)]
    pub usage_bytes: u64,

    /// Echoed by the provider; not re-validated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl PollableResource for VectorStore {
    const KIND: ResourceKind = ResourceKind::VectorStore;

    fn id(&self) -> &str {
        &self.id
    }

    fn status_label(&self) -> &'static str {
        self.status.as_str()
    }

    fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorStoreFile {
    pub id: String,
    pub vector_store_id: String,
    pub status: FileStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<LastError>,

    #[serde(default)]
    pub usage_bytes: u64,

    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl PollableResource for VectorStoreFile {
    const KIND: ResourceKind = ResourceKind::VectorStoreFile;

    fn id(&self) -> &str {
        &self.id
    }

    fn status_label(&self) -> &'static str {
        self.status.as_str()
    }

    fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileBatch {
    pub id: String,
    pub vector_store_id: String,
    pub status: BatchStatus,

    #[serde(default)]
    pub file_counts: FileCounts,

    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl PollableResource for FileBatch {
    const KIND: ResourceKind = ResourceKind::FileBatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn status_label(&self) -> &'static str {
        self.status.as_str()
    }

    fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vector_store_terminal_statuses() {
        assert!(!VectorStoreStatus::InProgress.is_terminal());
        assert!(VectorStoreStatus::Completed.is_terminal());
        assert!(VectorStoreStatus::Expired.is_terminal());
    }

    #[test]
    fn file_terminal_statuses() {
        assert!(!FileStatus::InProgress.is_terminal());
        assert!(FileStatus::Completed.is_terminal());
        assert!(FileStatus::Failed.is_terminal());
        assert!(FileStatus::Cancelled.is_terminal());
    }

    #[test]
    fn batch_terminal_statuses() {
        assert!(!BatchStatus::InProgress.is_terminal());
        assert!(BatchStatus::Completed.is_terminal());
        assert!(BatchStatus::Cancelled.is_terminal());
        assert!(BatchStatus::Failed.is_terminal());
    }

    #[test]
    fn parses_provider_vector_store() {
        let store: VectorStore = serde_json::from_value(json!({
            "id": "vs_abc",
            "object": "vector_store",
            "name": "docs",
            "status": "in_progress",
            "created_at": 1_700_000_000,
            "expires_at": null,
            "file_counts": {"in_progress": 2, "completed": 1, "failed": 0, "cancelled": 0, "total": 3},
            "usage_bytes": 1024,
            "metadata": {"team": "search"}
        }))
        .unwrap();

        assert_eq!(store.id(), "vs_abc");
        assert_eq!(store.status_label(), "in_progress");
        assert!(!store.is_terminal());
        assert_eq!(store.file_counts.total, 3);
        assert_eq!(store.created_at.map(|t| t.timestamp()), Some(1_700_000_000));
        assert!(store.expires_at.is_none());
    }

    #[test]
    fn parses_failed_file_with_error() {
        let file: VectorStoreFile = serde_json::from_value(json!({
            "id": "file_1",
            "vector_store_id": "vs_abc",
            "status": "failed",
            "last_error": {"code": "unsupported_file", "message": "bad mime"}
        }))
        .unwrap();

        assert!(file.is_terminal());
        assert_eq!(file.last_error.unwrap().code, "unsupported_file");
        assert_eq!(VectorStoreFile::KIND, ResourceKind::VectorStoreFile);
    }

    #[test]
    fn unknown_status_is_a_protocol_error() {
        let res = serde_json::from_value::<FileBatch>(json!({
            "id": "vsfb_1",
            "vector_store_id": "vs_abc",
            "status": "paused"
        }));
        assert!(res.is_err());
    }
}
