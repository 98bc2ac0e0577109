//! Chunking stage.
//!
//! Chunkers carve approved cleaned documents into retrieval-sized excerpts.
//! Each chunk gets a 1-based index that only ever increases for its source
//! file, and a derived `chunk_id` label for traceability:
//!
//! ```text
//! {language}_{category prefix}_{squashed filename}_{index}
//! ta_edu_grade10sci_01
//! ```

use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{ChunkRecord, ItemStatus, Stage};
use crate::store::Store;

/// Minimum trimmed chunk text length.
pub const MIN_CHUNK_CHARS: usize = 20;

/// An approved cleaned document annotated with its chunking progress.
#[derive(Debug, Clone, Serialize)]
pub struct CleanedFileView {
    pub filename: String,
    pub language: String,
    pub source: String,
    pub content: String,
    pub content_length: usize,
    pub pending_chunks: usize,
    pub approved_chunks: usize,
    pub total_chunks: usize,
}

/// A chunk submission as received from a chunker.
#[derive(Debug, Clone)]
pub struct ChunkSubmission {
    pub filename: String,
    pub text: String,
    pub category: String,
    pub source: Option<String>,
    /// Tail of the previous chunk, supplied by the client for context
    /// continuity. Stored verbatim.
    pub overlap_reference: Option<String>,
}

/// One entry of a batch submission.
#[derive(Debug, Clone)]
pub struct BatchChunkEntry {
    pub text: String,
    pub category: String,
    pub source: Option<String>,
    pub overlap_reference: Option<String>,
}

/// Derive the traceability label for a chunk.
///
/// Category is shortened to its first three characters, the source
/// filename is squashed (underscores removed) and truncated to ten.
pub fn chunk_id(language: &str, category: &str, filename: &str, index: u32) -> String {
    let cat_short: String = category.chars().take(3).collect();
    let file_short: String = filename.chars().filter(|c| *c != '_').take(10).collect();
    format!("{language}_{cat_short}_{file_short}_{index:02}")
}

/// List every approved cleaned document available for chunking, with
/// chunk counts aggregated from both the pending and approved sets.
pub fn list_cleaned_files(store: &Store) -> Result<Vec<CleanedFileView>> {
    let mut files = Vec::new();
    for meta in store.list_items(Stage::Cleaned, ItemStatus::Approved)? {
        let Some(item) = store.get_item(Stage::Cleaned, ItemStatus::Approved, &meta.filename)?
        else {
            continue;
        };
        let pending_chunks = store.chunk_count(ItemStatus::Pending, &meta.filename)?;
        let approved_chunks = store.chunk_count(ItemStatus::Approved, &meta.filename)?;
        files.push(CleanedFileView {
            content_length: item.content.chars().count(),
            content: item.content,
            filename: meta.filename,
            language: meta.language,
            source: meta.source,
            pending_chunks,
            approved_chunks,
            total_chunks: pending_chunks + approved_chunks,
        });
    }
    Ok(files)
}

/// All chunks for one source file, pending and approved, sorted by index.
pub fn list_chunks(store: &Store, filename: &str) -> Result<Vec<ChunkRecord>> {
    let mut chunks = store.list_chunks(ItemStatus::Pending, filename)?;
    chunks.extend(store.list_chunks(ItemStatus::Approved, filename)?);
    chunks.sort_by_key(|c| c.chunk_index);
    Ok(chunks)
}

fn validate_chunk_text(text: &str) -> Result<()> {
    if text.trim().chars().count() < MIN_CHUNK_CHARS {
        return Err(Error::validation(format!(
            "Chunk text must be at least {MIN_CHUNK_CHARS} characters"
        )));
    }
    Ok(())
}

/// Submit one chunk for an approved cleaned document.
///
/// The index is assigned as one past the highest index the file has seen
/// across pending and approved chunks, so indices keep increasing even
/// when earlier chunks were rejected.
pub fn submit(store: &Store, submission: &ChunkSubmission) -> Result<ChunkRecord> {
    let filename = submission.filename.trim();
    let cleaned = store
        .get_item(Stage::Cleaned, ItemStatus::Approved, filename)?
        .ok_or_else(|| {
            Error::validation(format!(
                "Cleaned file \"{filename}\" not found. Only approved cleaned files can be chunked."
            ))
        })?;

    validate_chunk_text(&submission.text)?;

    let index = store.max_chunk_index(filename)? + 1;
    let chunk = build_chunk(&cleaned.meta.language, filename, index, submission);
    store.put_chunk(ItemStatus::Pending, &chunk)?;
    tracing::info!(filename, index, chunk_id = %chunk.chunk_id, "chunk queued for review");
    Ok(chunk)
}

/// Submit several chunks for one file in a single call.
///
/// Entries with empty text or category are skipped; a non-empty entry
/// shorter than the minimum fails the whole batch before anything is
/// written. Indices are assigned sequentially across the batch.
pub fn submit_batch(
    store: &Store,
    filename: &str,
    entries: &[BatchChunkEntry],
) -> Result<Vec<ChunkRecord>> {
    let filename = filename.trim();
    let cleaned = store
        .get_item(Stage::Cleaned, ItemStatus::Approved, filename)?
        .ok_or_else(|| {
            Error::validation(format!(
                "Cleaned file \"{filename}\" not found. Only approved cleaned files can be chunked."
            ))
        })?;

    let usable: Vec<&BatchChunkEntry> = entries
        .iter()
        .filter(|e| !e.text.trim().is_empty() && !e.category.trim().is_empty())
        .collect();
    if usable.is_empty() {
        return Err(Error::validation("No usable chunks in batch"));
    }
    for entry in &usable {
        validate_chunk_text(&entry.text)?;
    }

    let mut index = store.max_chunk_index(filename)?;
    let mut created = Vec::with_capacity(usable.len());
    for entry in usable {
        index += 1;
        let chunk = build_chunk(
            &cleaned.meta.language,
            filename,
            index,
            &ChunkSubmission {
                filename: filename.to_string(),
                text: entry.text.clone(),
                category: entry.category.clone(),
                source: entry.source.clone(),
                overlap_reference: entry.overlap_reference.clone(),
            },
        );
        store.put_chunk(ItemStatus::Pending, &chunk)?;
        created.push(chunk);
    }
    tracing::info!(filename, count = created.len(), "chunk batch queued for review");
    Ok(created)
}

fn build_chunk(
    language: &str,
    filename: &str,
    index: u32,
    submission: &ChunkSubmission,
) -> ChunkRecord {
    ChunkRecord {
        chunk_id: chunk_id(language, &submission.category, filename, index),
        text: submission.text.clone(),
        language: language.to_string(),
        category: submission.category.clone(),
        source: submission
            .source
            .clone()
            .unwrap_or_else(|| "unknown".to_string()),
        chunk_index: index,
        source_file: filename.to_string(),
        overlap_reference: submission.overlap_reference.clone().unwrap_or_default(),
        created_at: chrono::Utc::now(),
        created_by: "chunker".to_string(),
        text_length: submission.text.chars().count(),
        status: ItemStatus::Pending,
        approved_at: None,
        approved_by: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaning;
    use crate::raw::{self, RawSubmission};
    use tempfile::TempDir;

    fn test_store() -> (TempDir, Store) {
        let tmp = TempDir::new().unwrap();
        let store = Store::new(tmp.path().join("data"));
        store.ensure_dirs().unwrap();
        (tmp, store)
    }

    fn approved_cleaned(store: &Store, filename: &str) {
        raw::submit(
            store,
            &RawSubmission {
                filename: filename.to_string(),
                language: "ta".to_string(),
                source: "gov_textbook".to_string(),
                content: "x".repeat(60),
            },
        )
        .unwrap();
        store.promote_item(Stage::Raw, filename).unwrap();
        cleaning::submit(store, filename, &"y".repeat(60)).unwrap();
        store.promote_item(Stage::Cleaned, filename).unwrap();
    }

    fn chunk_submission(filename: &str, text: &str) -> ChunkSubmission {
        ChunkSubmission {
            filename: filename.to_string(),
            text: text.to_string(),
            category: "education".to_string(),
            source: Some("gov_textbook".to_string()),
            overlap_reference: None,
        }
    }

    #[test]
    fn test_chunk_id_format() {
        assert_eq!(chunk_id("ta", "edu", "doc1", 1), "ta_edu_doc1_01");
        assert_eq!(
            chunk_id("ta", "education", "grade_10_science", 3),
            "ta_edu_grade10sci_03"
        );
    }

    #[test]
    fn test_submit_requires_approved_cleaned() {
        let (_tmp, store) = test_store();
        let err = submit(&store, &chunk_submission("ghost", &"z".repeat(25))).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_short_text_rejected() {
        let (_tmp, store) = test_store();
        approved_cleaned(&store, "doc1");
        let err = submit(&store, &chunk_submission("doc1", "too short")).unwrap_err();
        assert!(err.to_string().contains("at least 20 characters"));
    }

    #[test]
    fn test_index_and_id_assignment() {
        let (_tmp, store) = test_store();
        approved_cleaned(&store, "doc1");

        let first = submit(&store, &chunk_submission("doc1", &"z".repeat(25))).unwrap();
        assert_eq!(first.chunk_index, 1);
        assert_eq!(
            first.chunk_id,
            chunk_id("ta", "education", "doc1", 1)
        );

        let second = submit(&store, &chunk_submission("doc1", &"z".repeat(25))).unwrap();
        assert_eq!(second.chunk_index, 2);
    }

    #[test]
    fn test_text_length_counts_characters() {
        let (_tmp, store) = test_store();
        approved_cleaned(&store, "doc1");

        let text = "த".repeat(25);
        let chunk = submit(&store, &chunk_submission("doc1", &text)).unwrap();
        assert_eq!(chunk.text_length, 25);
    }

    #[test]
    fn test_indices_increase_past_rejections() {
        let (_tmp, store) = test_store();
        approved_cleaned(&store, "doc1");

        let first = submit(&store, &chunk_submission("doc1", &"z".repeat(25))).unwrap();
        assert_eq!(first.chunk_index, 1);
        store.delete_chunk("doc1", 1).unwrap();

        // Rejected index is not reused
        let second = submit(&store, &chunk_submission("doc1", &"z".repeat(25))).unwrap();
        assert_eq!(second.chunk_index, 2);
    }

    #[test]
    fn test_no_collision_after_mid_sequence_rejection() {
        let (_tmp, store) = test_store();
        approved_cleaned(&store, "doc1");

        for _ in 0..3 {
            submit(&store, &chunk_submission("doc1", &"z".repeat(25))).unwrap();
        }
        store.delete_chunk("doc1", 2).unwrap();

        let next = submit(&store, &chunk_submission("doc1", &"z".repeat(25))).unwrap();
        assert_eq!(next.chunk_index, 4);
        let indices: Vec<u32> = store
            .list_chunks(ItemStatus::Pending, "doc1")
            .unwrap()
            .iter()
            .map(|c| c.chunk_index)
            .collect();
        assert_eq!(indices, vec![1, 3, 4]);
    }

    #[test]
    fn test_batch_assigns_sequential_indices() {
        let (_tmp, store) = test_store();
        approved_cleaned(&store, "doc1");

        let entries = vec![
            BatchChunkEntry {
                text: "z".repeat(25),
                category: "education".to_string(),
                source: None,
                overlap_reference: None,
            },
            BatchChunkEntry {
                // Skipped: no category
                text: "z".repeat(25),
                category: String::new(),
                source: None,
                overlap_reference: None,
            },
            BatchChunkEntry {
                text: "z".repeat(30),
                category: "education".to_string(),
                source: None,
                overlap_reference: Some("tail of previous".to_string()),
            },
        ];
        let created = submit_batch(&store, "doc1", &entries).unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].chunk_index, 1);
        assert_eq!(created[1].chunk_index, 2);
        assert_eq!(created[1].overlap_reference, "tail of previous");
    }

    #[test]
    fn test_listing_counts_chunks() {
        let (_tmp, store) = test_store();
        approved_cleaned(&store, "doc1");
        submit(&store, &chunk_submission("doc1", &"z".repeat(25))).unwrap();
        submit(&store, &chunk_submission("doc1", &"z".repeat(25))).unwrap();
        store.promote_chunk("doc1", 1).unwrap();

        let files = list_cleaned_files(&store).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].pending_chunks, 1);
        assert_eq!(files[0].approved_chunks, 1);
        assert_eq!(files[0].total_chunks, 2);

        let chunks = list_chunks(&store, "doc1").unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].status, ItemStatus::Approved);
        assert_eq!(chunks[1].status, ItemStatus::Pending);
    }
}
