//! Raw collection stage.
//!
//! Collectors submit raw Tamil text under a filename. Submissions are
//! validated here and land in the pending set, where they wait for an
//! admin decision before the cleaning stage can see them.

use crate::error::{Error, Result};
use crate::models::{ItemMeta, ItemStatus, Stage};
use crate::store::Store;

/// Filename length bounds, inclusive.
const FILENAME_MIN: usize = 3;
const FILENAME_MAX: usize = 50;

/// Minimum trimmed content length for raw and cleaned submissions.
pub const MIN_DOCUMENT_CHARS: usize = 50;

/// A raw submission as received from a collector.
#[derive(Debug, Clone)]
pub struct RawSubmission {
    pub filename: String,
    pub language: String,
    pub source: String,
    pub content: String,
}

/// Validate a filename: alphanumeric/underscore/hyphen, 3–50 chars.
pub fn validate_filename(filename: &str) -> Result<()> {
    if filename.len() < FILENAME_MIN {
        return Err(Error::validation(format!(
            "Filename must be at least {FILENAME_MIN} characters"
        )));
    }
    if filename.len() > FILENAME_MAX {
        return Err(Error::validation(format!(
            "Filename must be at most {FILENAME_MAX} characters"
        )));
    }
    if !filename
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(Error::validation(
            "Filename can only contain letters, numbers, underscores, and hyphens",
        ));
    }
    Ok(())
}

/// Validate the trimmed length of a document body.
pub fn validate_document_content(content: &str) -> Result<()> {
    if content.trim().chars().count() < MIN_DOCUMENT_CHARS {
        return Err(Error::validation(format!(
            "Content must be at least {MIN_DOCUMENT_CHARS} characters"
        )));
    }
    Ok(())
}

/// Submit a raw document for review.
///
/// The item lands in `(raw, pending)` on success. Re-submitting a filename
/// that is already pending is rejected — content is never silently merged
/// or overwritten.
pub fn submit(store: &Store, submission: &RawSubmission) -> Result<ItemMeta> {
    let filename = submission.filename.trim();
    validate_filename(filename)?;
    validate_document_content(&submission.content)?;

    if store.item_exists(Stage::Raw, ItemStatus::Pending, filename) {
        return Err(Error::validation(format!(
            "File \"{filename}\" already exists in the pending queue"
        )));
    }

    let meta = ItemMeta::new(
        filename,
        &submission.language,
        &submission.source,
        submission.content.chars().count(),
        "collector",
    );
    store.put_item(
        Stage::Raw,
        ItemStatus::Pending,
        filename,
        &submission.content,
        &meta,
    )?;
    tracing::info!(filename, "raw submission queued for review");
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, Store) {
        let tmp = TempDir::new().unwrap();
        let store = Store::new(tmp.path().join("data"));
        store.ensure_dirs().unwrap();
        (tmp, store)
    }

    fn submission(filename: &str, content: &str) -> RawSubmission {
        RawSubmission {
            filename: filename.to_string(),
            language: "ta".to_string(),
            source: "gov_textbook".to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_submit_lands_in_pending() {
        let (_tmp, store) = test_store();
        let meta = submit(&store, &submission("doc1", &"x".repeat(60))).unwrap();
        assert_eq!(meta.status, ItemStatus::Pending);
        assert_eq!(meta.submitted_by, "collector");

        let pending = store.list_items(Stage::Raw, ItemStatus::Pending).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].filename, "doc1");
    }

    #[test]
    fn test_content_length_counts_characters() {
        let (_tmp, store) = test_store();
        // Tamil characters are multi-byte in UTF-8
        let content = "த".repeat(60);
        assert!(content.len() > 60);

        let meta = submit(&store, &submission("doc1", &content)).unwrap();
        assert_eq!(meta.content_length, 60);
    }

    #[test]
    fn test_short_filename_rejected() {
        let (_tmp, store) = test_store();
        let err = submit(&store, &submission("ab", &"x".repeat(60))).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("at least 3 characters"));
    }

    #[test]
    fn test_long_filename_rejected() {
        let (_tmp, store) = test_store();
        let name = "a".repeat(51);
        let err = submit(&store, &submission(&name, &"x".repeat(60))).unwrap_err();
        assert!(err.to_string().contains("at most 50 characters"));
    }

    #[test]
    fn test_bad_characters_rejected() {
        let (_tmp, store) = test_store();
        let err = submit(&store, &submission("doc one!", &"x".repeat(60))).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_short_content_rejected() {
        let (_tmp, store) = test_store();
        let err = submit(&store, &submission("doc1", "too short")).unwrap_err();
        assert!(err.to_string().contains("at least 50 characters"));
    }

    #[test]
    fn test_whitespace_padding_does_not_count() {
        let (_tmp, store) = test_store();
        let padded = format!("{}{}", "x".repeat(30), " ".repeat(40));
        let err = submit(&store, &submission("doc1", &padded)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_duplicate_pending_rejected() {
        let (_tmp, store) = test_store();
        submit(&store, &submission("doc1", &"x".repeat(60))).unwrap();
        let err = submit(&store, &submission("doc1", &"y".repeat(60))).unwrap_err();
        assert!(err.to_string().contains("already exists"));

        // Original content untouched
        let item = store
            .get_item(Stage::Raw, ItemStatus::Pending, "doc1")
            .unwrap()
            .unwrap();
        assert_eq!(item.content, "x".repeat(60));
    }
}
