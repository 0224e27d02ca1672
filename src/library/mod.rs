//! Persistence collaborator boundary
//!
//! The ingestion pipeline owns no storage; it talks to a [`BookStore`]
//! for everything persistent. [`MemoryBookStore`] is the in-process
//! reference implementation, used in tests and small embeddings.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::document::{BookFile, BookMetadata, ContentManifest};

/// Storage-side error type
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Summary of a stored file, as returned by [`BookStore::list_files`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFileInfo {
    /// File record id
    pub id: String,
    /// Book record the file belongs to
    pub book_id: String,
    pub file_name: String,
    pub file_size: u64,
    pub added_date: DateTime<Utc>,
}

/// Persistence collaborator for ingested books
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Persist a book record with its file, returning the new book id
    async fn add_book(
        &self,
        file: BookFile,
        metadata: BookMetadata,
        manifest: ContentManifest,
    ) -> Result<String, StoreError>;

    /// List stored files (used by duplicate detection)
    async fn list_files(&self) -> Result<Vec<StoredFileInfo>, StoreError>;

    /// Fetch a stored file's bytes by file id
    async fn get_file(&self, id: &str) -> Result<BookFile, StoreError>;

    /// Delete a stored file by file id
    async fn delete_file(&self, id: &str) -> Result<(), StoreError>;
}

/// Scan stored files for a `(file_name, file_size)` match.
///
/// This is a cheap heuristic, not content-addressed: two distinct files
/// that coincidentally share name and size are treated as duplicates.
pub async fn find_duplicate(
    store: &dyn BookStore,
    file: &BookFile,
) -> Result<Option<StoredFileInfo>, StoreError> {
    let files = store.list_files().await?;
    Ok(files
        .into_iter()
        .find(|stored| stored.file_name == file.file_name && stored.file_size == file.file_size))
}

/// A full book record held by the in-memory store
#[derive(Debug, Clone)]
pub struct BookRecord {
    pub book_id: String,
    pub file_id: String,
    pub file: BookFile,
    pub metadata: BookMetadata,
    pub manifest: ContentManifest,
}

/// In-memory [`BookStore`] implementation
#[derive(Clone, Default)]
pub struct MemoryBookStore {
    books: Arc<RwLock<HashMap<String, BookRecord>>>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored book records
    pub async fn book_count(&self) -> usize {
        self.books.read().await.len()
    }

    /// Fetch a full book record by book id
    pub async fn get_book(&self, book_id: &str) -> Option<BookRecord> {
        self.books.read().await.get(book_id).cloned()
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn add_book(
        &self,
        file: BookFile,
        metadata: BookMetadata,
        manifest: ContentManifest,
    ) -> Result<String, StoreError> {
        let book_id = Uuid::new_v4().to_string();
        let record = BookRecord {
            book_id: book_id.clone(),
            file_id: Uuid::new_v4().to_string(),
            file,
            metadata,
            manifest,
        };
        self.books.write().await.insert(book_id.clone(), record);
        Ok(book_id)
    }

    async fn list_files(&self) -> Result<Vec<StoredFileInfo>, StoreError> {
        let books = self.books.read().await;
        Ok(books
            .values()
            .map(|record| StoredFileInfo {
                id: record.file_id.clone(),
                book_id: record.book_id.clone(),
                file_name: record.file.file_name.clone(),
                file_size: record.file.file_size,
                added_date: record.file.added_date,
            })
            .collect())
    }

    async fn get_file(&self, id: &str) -> Result<BookFile, StoreError> {
        let books = self.books.read().await;
        books
            .values()
            .find(|record| record.file_id == id)
            .map(|record| record.file.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn delete_file(&self, id: &str) -> Result<(), StoreError> {
        let mut books = self.books.write().await;
        let book_id = books
            .values()
            .find(|record| record.file_id == id)
            .map(|record| record.book_id.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        books.remove(&book_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_file(name: &str, size: usize) -> BookFile {
        BookFile::new(name, "application/octet-stream", vec![0u8; size])
    }

    #[tokio::test]
    async fn add_and_list() {
        let store = MemoryBookStore::new();
        let id = store
            .add_book(
                sample_file("a.epub", 10),
                BookMetadata::default(),
                ContentManifest::default(),
            )
            .await
            .unwrap();

        let files = store.list_files().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].book_id, id);
        assert_eq!(files[0].file_name, "a.epub");
    }

    #[tokio::test]
    async fn duplicate_matches_name_and_size_only() {
        let store = MemoryBookStore::new();
        store
            .add_book(
                sample_file("a.epub", 10),
                BookMetadata::default(),
                ContentManifest::default(),
            )
            .await
            .unwrap();

        assert!(find_duplicate(&store, &sample_file("a.epub", 10))
            .await
            .unwrap()
            .is_some());
        // Same name, different size: no match
        assert!(find_duplicate(&store, &sample_file("a.epub", 11))
            .await
            .unwrap()
            .is_none());
        // Same size, different name: no match
        assert!(find_duplicate(&store, &sample_file("b.epub", 10))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn get_and_delete_file() {
        let store = MemoryBookStore::new();
        store
            .add_book(
                sample_file("a.epub", 10),
                BookMetadata::default(),
                ContentManifest::default(),
            )
            .await
            .unwrap();

        let file_id = store.list_files().await.unwrap()[0].id.clone();
        assert_eq!(store.get_file(&file_id).await.unwrap().file_name, "a.epub");

        store.delete_file(&file_id).await.unwrap();
        assert!(store.list_files().await.unwrap().is_empty());
        assert!(matches!(
            store.get_file(&file_id).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
