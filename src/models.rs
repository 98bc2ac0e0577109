//! Core data models used throughout the curation pipeline.
//!
//! These types represent the documents, chunks, and review metadata that
//! flow through the three curation stages (raw → cleaned → chunked) and
//! out to the dataset repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A curation stage of the dataset pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Raw,
    Cleaned,
    Chunked,
}

impl Stage {
    /// Directory name under `pending/` and `approved/`.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Stage::Raw => "raw",
            Stage::Cleaned => "cleaned",
            Stage::Chunked => "chunked",
        }
    }

    /// Parse the `type` field of admin requests (`raw`, `cleaned`, `chunk`).
    pub fn from_request_type(s: &str) -> Option<Stage> {
        match s {
            "raw" => Some(Stage::Raw),
            "cleaned" => Some(Stage::Cleaned),
            "chunk" | "chunks" | "chunked" => Some(Stage::Chunked),
            _ => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Stored review status of an item. Absence of any record is the implicit
/// third state, surfaced as [`StageStatus::NotStarted`] by lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Approved,
}

impl ItemStatus {
    pub fn dir_name(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Approved => "approved",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Derived per-filename status against a stage, including the computed
/// "no record exists" state. Never stored — always recomputed from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    NotStarted,
    Pending,
    Approved,
}

/// Metadata sidecar persisted next to each raw/cleaned document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemMeta {
    /// Unique submission id, for audit only.
    pub id: String,
    pub filename: String,
    pub language: String,
    pub source: String,
    pub content_length: usize,
    pub submitted_at: DateTime<Utc>,
    pub submitted_by: String,
    pub status: ItemStatus,
    /// For cleaned items: the submission id of the raw document they derive from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_raw_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl ItemMeta {
    /// Fresh pending metadata for a new submission.
    pub fn new(
        filename: &str,
        language: &str,
        source: &str,
        content_length: usize,
        submitted_by: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            language: language.to_string(),
            source: source.to_string(),
            content_length,
            submitted_at: Utc::now(),
            submitted_by: submitted_by.to_string(),
            status: ItemStatus::Pending,
            original_raw_id: None,
            approved_at: None,
            approved_by: None,
            updated_at: None,
            updated_by: None,
        }
    }
}

/// A document plus its metadata, as read back from the store.
#[derive(Debug, Clone, Serialize)]
pub struct StoredItem {
    pub filename: String,
    pub content: String,
    pub meta: ItemMeta,
    pub stage: Stage,
    pub status: ItemStatus,
}

/// A manually curated excerpt of a cleaned document.
///
/// Chunks live in a folder named after their source file and are approved
/// individually or as a set. `chunk_id` is a traceability label, not a
/// uniqueness key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub chunk_id: String,
    pub text: String,
    pub language: String,
    pub category: String,
    pub source: String,
    /// 1-based, strictly increasing per source file. Gaps are possible
    /// after rejections.
    pub chunk_index: u32,
    pub source_file: String,
    #[serde(default)]
    pub overlap_reference: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub text_length: usize,
    pub status: ItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
}

/// Per-stage counters aggregated from the store. Chunked counts are chunk
/// counts, not source-file counts.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct StageTotals {
    pub raw: usize,
    pub cleaned: usize,
    pub chunked: usize,
    pub total: usize,
}

impl StageTotals {
    pub fn new(raw: usize, cleaned: usize, chunked: usize) -> Self {
        Self {
            raw,
            cleaned,
            chunked,
            total: raw + cleaned + chunked,
        }
    }
}

/// Pending/approved counts for one stage.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct StageCounts {
    pub pending: usize,
    pub approved: usize,
}
