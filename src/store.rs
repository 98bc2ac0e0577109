//! File-backed content store.
//!
//! Persists every item under a `(stage, status)` directory keyed by
//! filename. Raw and cleaned documents are a `.txt` body plus a
//! `.meta.json` sidecar; chunks are one JSON file per chunk inside a
//! folder named after their source file.
//!
//! ```text
//! data/
//! ├── pending/
//! │   ├── raw/          grade_10_science.txt + grade_10_science.meta.json
//! │   ├── cleaned/
//! │   └── chunked/      grade_10_science/chunk_01.json
//! └── approved/
//!     ├── raw/
//!     ├── cleaned/
//!     └── chunked/
//! ```
//!
//! Every mutation is immediately visible to subsequent reads — there is
//! no caching layer. Moves overwrite the destination ("last approve wins").

use chrono::Utc;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::{ChunkRecord, ItemMeta, ItemStatus, Stage, StoredItem};

/// Handle on the data directory tree. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Store {
    data_dir: PathBuf,
}

impl Store {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Create the full pending/approved directory tree. Idempotent.
    pub fn ensure_dirs(&self) -> Result<()> {
        for status in [ItemStatus::Pending, ItemStatus::Approved] {
            for stage in [Stage::Raw, Stage::Cleaned, Stage::Chunked] {
                fs::create_dir_all(self.stage_dir(stage, status))?;
            }
        }
        Ok(())
    }

    /// Directory holding one `(stage, status)` set.
    pub fn stage_dir(&self, stage: Stage, status: ItemStatus) -> PathBuf {
        self.data_dir.join(status.dir_name()).join(stage.dir_name())
    }

    fn content_path(&self, stage: Stage, status: ItemStatus, filename: &str) -> PathBuf {
        self.stage_dir(stage, status).join(format!("{filename}.txt"))
    }

    fn meta_path(&self, stage: Stage, status: ItemStatus, filename: &str) -> PathBuf {
        self.stage_dir(stage, status)
            .join(format!("{filename}.meta.json"))
    }

    // ─── Raw/cleaned documents ──────────────────────────────────────

    /// Write a document body and its metadata sidecar.
    pub fn put_item(
        &self,
        stage: Stage,
        status: ItemStatus,
        filename: &str,
        content: &str,
        meta: &ItemMeta,
    ) -> Result<()> {
        let dir = self.stage_dir(stage, status);
        fs::create_dir_all(&dir)?;
        fs::write(self.content_path(stage, status, filename), content)?;
        write_json(&self.meta_path(stage, status, filename), meta)?;
        Ok(())
    }

    /// Whether a document body exists at `(stage, status, filename)`.
    pub fn item_exists(&self, stage: Stage, status: ItemStatus, filename: &str) -> bool {
        self.content_path(stage, status, filename).exists()
    }

    /// Read a document and its metadata, or `None` if absent.
    pub fn get_item(
        &self,
        stage: Stage,
        status: ItemStatus,
        filename: &str,
    ) -> Result<Option<StoredItem>> {
        let content_path = self.content_path(stage, status, filename);
        if !content_path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&content_path)?;
        let meta = read_json::<ItemMeta>(&self.meta_path(stage, status, filename))?;
        Ok(Some(StoredItem {
            filename: filename.to_string(),
            content,
            meta,
            stage,
            status,
        }))
    }

    /// List metadata for every document in a `(stage, status)` set,
    /// newest submission first. Unreadable sidecars are skipped with a
    /// warning rather than failing the listing.
    pub fn list_items(&self, stage: Stage, status: ItemStatus) -> Result<Vec<ItemMeta>> {
        let dir = self.stage_dir(stage, status);
        let mut items = Vec::new();
        if !dir.exists() {
            return Ok(items);
        }
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".meta.json"))
            {
                match read_json::<ItemMeta>(&path) {
                    Ok(meta) => items.push(meta),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping unreadable metadata")
                    }
                }
            }
        }
        items.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(items)
    }

    /// Replace a pending document's content in place, stamping the edit on
    /// its metadata. Status is unchanged.
    pub fn update_item_content(&self, stage: Stage, filename: &str, content: &str) -> Result<()> {
        let status = ItemStatus::Pending;
        if !self.item_exists(stage, status, filename) {
            return Err(Error::not_found(format!(
                "No pending {stage} item named \"{filename}\""
            )));
        }
        fs::write(self.content_path(stage, status, filename), content)?;

        let meta_path = self.meta_path(stage, status, filename);
        let mut meta = read_json::<ItemMeta>(&meta_path)?;
        meta.content_length = content.chars().count();
        meta.updated_at = Some(Utc::now());
        meta.updated_by = Some("admin".to_string());
        write_json(&meta_path, &meta)?;
        Ok(())
    }

    /// Move a document from pending to approved, stamping approval on its
    /// metadata. Overwrites any previously approved document of the same
    /// filename.
    pub fn promote_item(&self, stage: Stage, filename: &str) -> Result<ItemMeta> {
        let pending_content = self.content_path(stage, ItemStatus::Pending, filename);
        if !pending_content.exists() {
            return Err(Error::not_found(format!(
                "No pending {stage} item named \"{filename}\""
            )));
        }

        let pending_meta = self.meta_path(stage, ItemStatus::Pending, filename);
        let mut meta = read_json::<ItemMeta>(&pending_meta)?;
        meta.status = ItemStatus::Approved;
        meta.approved_at = Some(Utc::now());
        meta.approved_by = Some("admin".to_string());

        let approved_dir = self.stage_dir(stage, ItemStatus::Approved);
        fs::create_dir_all(&approved_dir)?;
        fs::rename(
            &pending_content,
            self.content_path(stage, ItemStatus::Approved, filename),
        )?;
        write_json(&self.meta_path(stage, ItemStatus::Approved, filename), &meta)?;
        fs::remove_file(&pending_meta)?;
        Ok(meta)
    }

    /// Delete a document and its sidecar.
    pub fn delete_item(&self, stage: Stage, status: ItemStatus, filename: &str) -> Result<()> {
        let content_path = self.content_path(stage, status, filename);
        if !content_path.exists() {
            return Err(Error::not_found(format!(
                "No {status} {stage} item named \"{filename}\""
            )));
        }
        fs::remove_file(&content_path)?;
        let meta_path = self.meta_path(stage, status, filename);
        if meta_path.exists() {
            fs::remove_file(&meta_path)?;
        }
        Ok(())
    }

    // ─── Chunks ─────────────────────────────────────────────────────

    fn chunk_dir(&self, status: ItemStatus, source_file: &str) -> PathBuf {
        self.stage_dir(Stage::Chunked, status).join(source_file)
    }

    fn chunk_path(&self, status: ItemStatus, source_file: &str, index: u32) -> PathBuf {
        self.chunk_dir(status, source_file)
            .join(format!("chunk_{index:02}.json"))
    }

    /// Write a chunk into its source file's folder.
    pub fn put_chunk(&self, status: ItemStatus, chunk: &ChunkRecord) -> Result<()> {
        let dir = self.chunk_dir(status, &chunk.source_file);
        fs::create_dir_all(&dir)?;
        write_json(
            &self.chunk_path(status, &chunk.source_file, chunk.chunk_index),
            chunk,
        )?;
        Ok(())
    }

    /// Read one chunk, or `None` if absent.
    pub fn get_chunk(
        &self,
        status: ItemStatus,
        source_file: &str,
        index: u32,
    ) -> Result<Option<ChunkRecord>> {
        let path = self.chunk_path(status, source_file, index);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(read_json(&path)?))
    }

    /// All chunks for one source file in a status, sorted by index.
    pub fn list_chunks(&self, status: ItemStatus, source_file: &str) -> Result<Vec<ChunkRecord>> {
        let dir = self.chunk_dir(status, source_file);
        let mut chunks = Vec::new();
        if !dir.exists() {
            return Ok(chunks);
        }
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                match read_json::<ChunkRecord>(&path) {
                    Ok(chunk) => chunks.push(chunk),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping unreadable chunk")
                    }
                }
            }
        }
        chunks.sort_by_key(|c| c.chunk_index);
        Ok(chunks)
    }

    /// All chunks in a status, grouped by source file and sorted by index.
    pub fn list_chunk_sets(&self, status: ItemStatus) -> Result<BTreeMap<String, Vec<ChunkRecord>>> {
        let base = self.stage_dir(Stage::Chunked, status);
        let mut sets = BTreeMap::new();
        if !base.exists() {
            return Ok(sets);
        }
        for entry in fs::read_dir(&base)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
                continue;
            };
            let chunks = self.list_chunks(status, &name)?;
            if !chunks.is_empty() {
                sets.insert(name, chunks);
            }
        }
        Ok(sets)
    }

    /// Number of chunks a source file has in a status.
    pub fn chunk_count(&self, status: ItemStatus, source_file: &str) -> Result<usize> {
        Ok(self.list_chunks(status, source_file)?.len())
    }

    /// Total chunk count across all source files in a status.
    pub fn total_chunks(&self, status: ItemStatus) -> Result<usize> {
        Ok(self
            .list_chunk_sets(status)?
            .values()
            .map(|c| c.len())
            .sum())
    }

    /// Highest chunk index a source file has across pending and approved,
    /// or 0 if it has none. The next submission gets this plus one, so
    /// indices keep increasing even after rejections.
    pub fn max_chunk_index(&self, source_file: &str) -> Result<u32> {
        let mut max = 0;
        for status in [ItemStatus::Pending, ItemStatus::Approved] {
            for chunk in self.list_chunks(status, source_file)? {
                max = max.max(chunk.chunk_index);
            }
        }
        Ok(max)
    }

    /// Move one chunk from pending to approved, stamping approval.
    /// Removes the pending folder once it empties out.
    pub fn promote_chunk(&self, source_file: &str, index: u32) -> Result<ChunkRecord> {
        let pending_path = self.chunk_path(ItemStatus::Pending, source_file, index);
        if !pending_path.exists() {
            return Err(Error::not_found(format!(
                "No pending chunk {index} for \"{source_file}\""
            )));
        }

        let mut chunk = read_json::<ChunkRecord>(&pending_path)?;
        chunk.status = ItemStatus::Approved;
        chunk.approved_at = Some(Utc::now());
        chunk.approved_by = Some("admin".to_string());

        let approved_dir = self.chunk_dir(ItemStatus::Approved, source_file);
        fs::create_dir_all(&approved_dir)?;
        write_json(
            &self.chunk_path(ItemStatus::Approved, source_file, index),
            &chunk,
        )?;
        fs::remove_file(&pending_path)?;
        self.remove_dir_if_empty(&self.chunk_dir(ItemStatus::Pending, source_file))?;
        Ok(chunk)
    }

    /// Delete one pending chunk.
    pub fn delete_chunk(&self, source_file: &str, index: u32) -> Result<()> {
        let path = self.chunk_path(ItemStatus::Pending, source_file, index);
        if !path.exists() {
            return Err(Error::not_found(format!(
                "No pending chunk {index} for \"{source_file}\""
            )));
        }
        fs::remove_file(&path)?;
        self.remove_dir_if_empty(&self.chunk_dir(ItemStatus::Pending, source_file))?;
        Ok(())
    }

    fn remove_dir_if_empty(&self, dir: &Path) -> Result<()> {
        if dir.exists() && fs::read_dir(dir)?.next().is_none() {
            fs::remove_dir(dir)?;
        }
        Ok(())
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, Store) {
        let tmp = TempDir::new().unwrap();
        let store = Store::new(tmp.path().join("data"));
        store.ensure_dirs().unwrap();
        (tmp, store)
    }

    fn sample_meta(filename: &str) -> ItemMeta {
        ItemMeta::new(filename, "ta", "gov_textbook", 60, "collector")
    }

    fn sample_chunk(source_file: &str, index: u32) -> ChunkRecord {
        ChunkRecord {
            chunk_id: format!("ta_edu_{source_file}_{index:02}"),
            text: "சோதனை ".repeat(10),
            language: "ta".to_string(),
            category: "education".to_string(),
            source: "gov_textbook".to_string(),
            chunk_index: index,
            source_file: source_file.to_string(),
            overlap_reference: String::new(),
            created_at: Utc::now(),
            created_by: "chunker".to_string(),
            text_length: 60,
            status: ItemStatus::Pending,
            approved_at: None,
            approved_by: None,
        }
    }

    #[test]
    fn test_put_get_roundtrip() {
        let (_tmp, store) = test_store();
        let meta = sample_meta("doc1");
        store
            .put_item(Stage::Raw, ItemStatus::Pending, "doc1", "body text", &meta)
            .unwrap();

        let item = store
            .get_item(Stage::Raw, ItemStatus::Pending, "doc1")
            .unwrap()
            .unwrap();
        assert_eq!(item.content, "body text");
        assert_eq!(item.meta.filename, "doc1");
        assert_eq!(item.meta.status, ItemStatus::Pending);
    }

    #[test]
    fn test_get_absent_is_none() {
        let (_tmp, store) = test_store();
        assert!(store
            .get_item(Stage::Raw, ItemStatus::Pending, "ghost")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_promote_moves_and_stamps() {
        let (_tmp, store) = test_store();
        store
            .put_item(
                Stage::Raw,
                ItemStatus::Pending,
                "doc1",
                "body",
                &sample_meta("doc1"),
            )
            .unwrap();

        let meta = store.promote_item(Stage::Raw, "doc1").unwrap();
        assert_eq!(meta.status, ItemStatus::Approved);
        assert!(meta.approved_at.is_some());

        assert!(!store.item_exists(Stage::Raw, ItemStatus::Pending, "doc1"));
        assert!(store.item_exists(Stage::Raw, ItemStatus::Approved, "doc1"));
    }

    #[test]
    fn test_promote_absent_is_not_found() {
        let (_tmp, store) = test_store();
        let err = store.promote_item(Stage::Raw, "ghost").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_promote_overwrites_prior_approved() {
        let (_tmp, store) = test_store();
        store
            .put_item(
                Stage::Raw,
                ItemStatus::Approved,
                "doc1",
                "old approved",
                &sample_meta("doc1"),
            )
            .unwrap();
        store
            .put_item(
                Stage::Raw,
                ItemStatus::Pending,
                "doc1",
                "new pending",
                &sample_meta("doc1"),
            )
            .unwrap();

        store.promote_item(Stage::Raw, "doc1").unwrap();
        let item = store
            .get_item(Stage::Raw, ItemStatus::Approved, "doc1")
            .unwrap()
            .unwrap();
        assert_eq!(item.content, "new pending");
    }

    #[test]
    fn test_list_items_newest_first() {
        let (_tmp, store) = test_store();
        let mut older = sample_meta("older");
        older.submitted_at = Utc::now() - chrono::Duration::hours(1);
        store
            .put_item(Stage::Raw, ItemStatus::Pending, "older", "x", &older)
            .unwrap();
        store
            .put_item(
                Stage::Raw,
                ItemStatus::Pending,
                "newer",
                "y",
                &sample_meta("newer"),
            )
            .unwrap();

        let items = store.list_items(Stage::Raw, ItemStatus::Pending).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].filename, "newer");
    }

    #[test]
    fn test_delete_item_and_absent() {
        let (_tmp, store) = test_store();
        store
            .put_item(
                Stage::Cleaned,
                ItemStatus::Pending,
                "doc1",
                "x",
                &sample_meta("doc1"),
            )
            .unwrap();
        store
            .delete_item(Stage::Cleaned, ItemStatus::Pending, "doc1")
            .unwrap();
        let err = store
            .delete_item(Stage::Cleaned, ItemStatus::Pending, "doc1")
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_chunk_roundtrip_and_promote() {
        let (_tmp, store) = test_store();
        store
            .put_chunk(ItemStatus::Pending, &sample_chunk("doc1", 1))
            .unwrap();
        store
            .put_chunk(ItemStatus::Pending, &sample_chunk("doc1", 2))
            .unwrap();

        assert_eq!(store.chunk_count(ItemStatus::Pending, "doc1").unwrap(), 2);
        assert_eq!(store.max_chunk_index("doc1").unwrap(), 2);

        let promoted = store.promote_chunk("doc1", 1).unwrap();
        assert_eq!(promoted.status, ItemStatus::Approved);
        assert_eq!(store.chunk_count(ItemStatus::Pending, "doc1").unwrap(), 1);
        assert_eq!(store.chunk_count(ItemStatus::Approved, "doc1").unwrap(), 1);
        // Max index spans both statuses
        assert_eq!(store.max_chunk_index("doc1").unwrap(), 2);
    }

    #[test]
    fn test_pending_chunk_dir_removed_when_empty() {
        let (_tmp, store) = test_store();
        store
            .put_chunk(ItemStatus::Pending, &sample_chunk("doc1", 1))
            .unwrap();
        store.delete_chunk("doc1", 1).unwrap();

        let dir = store.stage_dir(Stage::Chunked, ItemStatus::Pending).join("doc1");
        assert!(!dir.exists());
        assert!(store.list_chunk_sets(ItemStatus::Pending).unwrap().is_empty());
    }

    #[test]
    fn test_chunk_sets_grouped_and_sorted() {
        let (_tmp, store) = test_store();
        store
            .put_chunk(ItemStatus::Pending, &sample_chunk("doc_b", 2))
            .unwrap();
        store
            .put_chunk(ItemStatus::Pending, &sample_chunk("doc_b", 1))
            .unwrap();
        store
            .put_chunk(ItemStatus::Pending, &sample_chunk("doc_a", 1))
            .unwrap();

        let sets = store.list_chunk_sets(ItemStatus::Pending).unwrap();
        assert_eq!(sets.len(), 2);
        let doc_b = &sets["doc_b"];
        assert_eq!(doc_b[0].chunk_index, 1);
        assert_eq!(doc_b[1].chunk_index, 2);
        assert_eq!(store.total_chunks(ItemStatus::Pending).unwrap(), 3);
    }
}
