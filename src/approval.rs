//! Review actions and derived queue views.
//!
//! Each stage runs the same two-state machine: a submission sits in
//! `pending` until an admin approves it (moved to `approved`) or rejects
//! it (deleted). Edits only ever touch pending items. Counts and queue
//! listings are recomputed from the store on every call, never cached.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::models::{ChunkRecord, ItemMeta, ItemStatus, Stage, StageCounts, StageTotals, StoredItem};
use crate::store::Store;

/// Approve one pending document, overwriting any prior approved document
/// of the same filename.
pub fn approve_item(store: &Store, stage: Stage, filename: &str) -> Result<ItemMeta> {
    let meta = store.promote_item(stage, filename)?;
    tracing::info!(%stage, filename, "item approved");
    Ok(meta)
}

/// Reject one pending document. The reason is surfaced to the caller and
/// logged, never persisted.
pub fn reject_item(
    store: &Store,
    stage: Stage,
    filename: &str,
    reason: Option<&str>,
) -> Result<()> {
    store.delete_item(stage, ItemStatus::Pending, filename)?;
    tracing::info!(%stage, filename, reason = reason.unwrap_or("none"), "item rejected");
    Ok(())
}

/// Replace a pending document's content in place. Status is unchanged.
pub fn edit_item(store: &Store, stage: Stage, filename: &str, content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(Error::validation("Content must not be empty"));
    }
    store.update_item_content(stage, filename, content)
}

/// Edit then approve in one call.
///
/// The two effects are sequential, not transactional: if the approve step
/// fails after the edit succeeded, the edited content stays persisted in
/// the pending queue.
pub fn edit_and_approve_item(
    store: &Store,
    stage: Stage,
    filename: &str,
    content: &str,
) -> Result<ItemMeta> {
    edit_item(store, stage, filename, content)?;
    approve_item(store, stage, filename)
}

/// Approve every pending document of a stage. Fails if the queue is empty.
pub fn approve_all_items(store: &Store, stage: Stage) -> Result<usize> {
    let pending = store.list_items(stage, ItemStatus::Pending)?;
    if pending.is_empty() {
        return Err(Error::not_found(format!(
            "No pending {stage} items to approve"
        )));
    }
    let mut approved = 0;
    for meta in pending {
        store.promote_item(stage, &meta.filename)?;
        approved += 1;
    }
    tracing::info!(%stage, approved, "bulk item approval");
    Ok(approved)
}

/// Approve one pending chunk.
pub fn approve_chunk(store: &Store, filename: &str, index: u32) -> Result<ChunkRecord> {
    let chunk = store.promote_chunk(filename, index)?;
    tracing::info!(filename, index, chunk_id = %chunk.chunk_id, "chunk approved");
    Ok(chunk)
}

/// Reject one pending chunk.
pub fn reject_chunk(store: &Store, filename: &str, index: u32, reason: Option<&str>) -> Result<()> {
    store.delete_chunk(filename, index)?;
    tracing::info!(filename, index, reason = reason.unwrap_or("none"), "chunk rejected");
    Ok(())
}

/// Replace a pending chunk's text in place.
pub fn edit_chunk(store: &Store, filename: &str, index: u32, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::validation("Chunk text must not be empty"));
    }
    let mut chunk = store
        .get_chunk(ItemStatus::Pending, filename, index)?
        .ok_or_else(|| {
            Error::not_found(format!("No pending chunk {index} for \"{filename}\""))
        })?;
    chunk.text = text.to_string();
    chunk.text_length = text.chars().count();
    store.put_chunk(ItemStatus::Pending, &chunk)
}

/// Approve every pending chunk of one source file.
///
/// Chunks are moved one at a time; if the store fails mid-batch the
/// already-moved chunks stay approved.
pub fn approve_all_chunks(store: &Store, filename: &str) -> Result<usize> {
    let pending = store.list_chunks(ItemStatus::Pending, filename)?;
    if pending.is_empty() {
        return Err(Error::not_found(format!(
            "No pending chunks for \"{filename}\""
        )));
    }
    let mut approved = 0;
    for chunk in pending {
        store.promote_chunk(filename, chunk.chunk_index)?;
        approved += 1;
    }
    tracing::info!(filename, approved, "bulk chunk approval");
    Ok(approved)
}

/// One pending document for the admin review queue, annotated with
/// its body so the reviewer can read it inline.
pub fn get_pending_item(store: &Store, stage: Stage, filename: &str) -> Result<StoredItem> {
    store
        .get_item(stage, ItemStatus::Pending, filename)?
        .ok_or_else(|| Error::not_found(format!("No pending {stage} item named \"{filename}\"")))
}

/// Everything awaiting review, grouped the way the admin queue displays
/// it. Chunked entries are grouped by source file.
#[derive(Debug, Serialize)]
pub struct PendingOverview {
    pub raw: Vec<ItemMeta>,
    pub cleaned: Vec<ItemMeta>,
    pub chunked: BTreeMap<String, Vec<ChunkRecord>>,
    pub totals: StageTotals,
}

pub fn pending_overview(store: &Store) -> Result<PendingOverview> {
    let raw = store.list_items(Stage::Raw, ItemStatus::Pending)?;
    let cleaned = store.list_items(Stage::Cleaned, ItemStatus::Pending)?;
    let chunked = store.list_chunk_sets(ItemStatus::Pending)?;
    let chunk_total = chunked.values().map(|c| c.len()).sum();
    let totals = StageTotals::new(raw.len(), cleaned.len(), chunk_total);
    Ok(PendingOverview {
        raw,
        cleaned,
        chunked,
        totals,
    })
}

/// Pending item/chunk counts per stage. Chunked counts count chunks,
/// not source files.
pub fn pending_counts(store: &Store) -> Result<StageTotals> {
    counts_for(store, ItemStatus::Pending)
}

/// Approved item/chunk counts per stage.
pub fn approved_counts(store: &Store) -> Result<StageTotals> {
    counts_for(store, ItemStatus::Approved)
}

fn counts_for(store: &Store, status: ItemStatus) -> Result<StageTotals> {
    Ok(StageTotals::new(
        store.list_items(Stage::Raw, status)?.len(),
        store.list_items(Stage::Cleaned, status)?.len(),
        store.total_chunks(status)?,
    ))
}

/// Per-stage pending/approved breakdown plus combined totals.
#[derive(Debug, Serialize)]
pub struct CurationStats {
    pub raw: StageCounts,
    pub cleaned: StageCounts,
    pub chunked: StageCounts,
    pub totals: StatsTotals,
}

#[derive(Debug, Serialize)]
pub struct StatsTotals {
    pub pending: usize,
    pub approved: usize,
}

pub fn stats(store: &Store) -> Result<CurationStats> {
    let pending = pending_counts(store)?;
    let approved = approved_counts(store)?;
    Ok(CurationStats {
        raw: StageCounts {
            pending: pending.raw,
            approved: approved.raw,
        },
        cleaned: StageCounts {
            pending: pending.cleaned,
            approved: approved.cleaned,
        },
        chunked: StageCounts {
            pending: pending.chunked,
            approved: approved.chunked,
        },
        totals: StatsTotals {
            pending: pending.total,
            approved: approved.total,
        },
    })
}
