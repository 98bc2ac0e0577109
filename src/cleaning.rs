//! Cleaning stage.
//!
//! Cleaners work from approved raw documents: the listing here annotates
//! each one with its cleaning progress, and submissions must name an
//! approved raw file so lineage is preserved. Cleaned text lands in the
//! pending set for admin review.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{ItemMeta, ItemStatus, Stage, StageStatus};
use crate::raw::validate_document_content;
use crate::store::Store;

/// An approved raw document annotated with its cleaning progress.
#[derive(Debug, Clone, Serialize)]
pub struct RawFileView {
    pub filename: String,
    pub language: String,
    pub source: String,
    pub content: String,
    pub content_length: usize,
    pub cleaning_status: StageStatus,
}

/// Derived cleaning-stage status for one filename.
pub fn cleaning_status(store: &Store, filename: &str) -> StageStatus {
    if store.item_exists(Stage::Cleaned, ItemStatus::Approved, filename) {
        StageStatus::Approved
    } else if store.item_exists(Stage::Cleaned, ItemStatus::Pending, filename) {
        StageStatus::Pending
    } else {
        StageStatus::NotStarted
    }
}

/// List every approved raw document available for cleaning.
pub fn list_raw_files(store: &Store) -> Result<Vec<RawFileView>> {
    let mut files = Vec::new();
    for meta in store.list_items(Stage::Raw, ItemStatus::Approved)? {
        let Some(item) = store.get_item(Stage::Raw, ItemStatus::Approved, &meta.filename)? else {
            continue;
        };
        files.push(RawFileView {
            cleaning_status: cleaning_status(store, &meta.filename),
            content_length: item.content.chars().count(),
            content: item.content,
            filename: meta.filename,
            language: meta.language,
            source: meta.source,
        });
    }
    Ok(files)
}

/// Submit a cleaned version of an approved raw document.
///
/// The filename must match an approved raw file; language, source, and the
/// raw submission id are carried over from its metadata.
pub fn submit(store: &Store, filename: &str, content: &str) -> Result<ItemMeta> {
    let filename = filename.trim();
    let raw = store
        .get_item(Stage::Raw, ItemStatus::Approved, filename)?
        .ok_or_else(|| {
            Error::validation(format!(
                "Raw file \"{filename}\" not found. Only approved raw files can be cleaned."
            ))
        })?;

    validate_document_content(content)?;

    if store.item_exists(Stage::Cleaned, ItemStatus::Pending, filename) {
        return Err(Error::validation(format!(
            "File \"{filename}\" is already in the cleaning queue"
        )));
    }

    let mut meta = ItemMeta::new(
        filename,
        &raw.meta.language,
        &raw.meta.source,
        content.chars().count(),
        "cleaner",
    );
    meta.original_raw_id = Some(raw.meta.id.clone());

    store.put_item(Stage::Cleaned, ItemStatus::Pending, filename, content, &meta)?;
    tracing::info!(filename, "cleaned submission queued for review");
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{self, RawSubmission};
    use tempfile::TempDir;

    fn test_store() -> (TempDir, Store) {
        let tmp = TempDir::new().unwrap();
        let store = Store::new(tmp.path().join("data"));
        store.ensure_dirs().unwrap();
        (tmp, store)
    }

    fn approved_raw(store: &Store, filename: &str) {
        raw::submit(
            store,
            &RawSubmission {
                filename: filename.to_string(),
                language: "ta".to_string(),
                source: "wikipedia".to_string(),
                content: "x".repeat(60),
            },
        )
        .unwrap();
        store.promote_item(Stage::Raw, filename).unwrap();
    }

    #[test]
    fn test_submit_requires_approved_raw() {
        let (_tmp, store) = test_store();
        let err = submit(&store, "ghost", &"y".repeat(60)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_submit_carries_lineage() {
        let (_tmp, store) = test_store();
        approved_raw(&store, "doc1");

        let meta = submit(&store, "doc1", &"y".repeat(60)).unwrap();
        assert_eq!(meta.language, "ta");
        assert_eq!(meta.source, "wikipedia");
        assert_eq!(meta.submitted_by, "cleaner");
        assert!(meta.original_raw_id.is_some());
    }

    #[test]
    fn test_duplicate_pending_rejected() {
        let (_tmp, store) = test_store();
        approved_raw(&store, "doc1");
        submit(&store, "doc1", &"y".repeat(60)).unwrap();

        let err = submit(&store, "doc1", &"z".repeat(60)).unwrap_err();
        assert!(err.to_string().contains("already in the cleaning queue"));
    }

    #[test]
    fn test_listing_annotates_status() {
        let (_tmp, store) = test_store();
        approved_raw(&store, "doc1");
        approved_raw(&store, "doc2");
        approved_raw(&store, "doc3");

        submit(&store, "doc2", &"y".repeat(60)).unwrap();
        submit(&store, "doc3", &"y".repeat(60)).unwrap();
        store.promote_item(Stage::Cleaned, "doc3").unwrap();

        let files = list_raw_files(&store).unwrap();
        let status_of = |name: &str| {
            files
                .iter()
                .find(|f| f.filename == name)
                .unwrap()
                .cleaning_status
        };
        assert_eq!(status_of("doc1"), StageStatus::NotStarted);
        assert_eq!(status_of("doc2"), StageStatus::Pending);
        assert_eq!(status_of("doc3"), StageStatus::Approved);
    }

    #[test]
    fn test_pending_raw_not_listed() {
        let (_tmp, store) = test_store();
        raw::submit(
            &store,
            &RawSubmission {
                filename: "unreviewed".to_string(),
                language: "ta".to_string(),
                source: "blog".to_string(),
                content: "x".repeat(60),
            },
        )
        .unwrap();

        assert!(list_raw_files(&store).unwrap().is_empty());
    }
}
