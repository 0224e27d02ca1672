//! Ingestion orchestrator
//!
//! Drives a single file through the full pipeline: size gate, adapter
//! resolution, duplicate check, parse, cover normalization, manifest
//! normalization, metadata finalization, persistence. Batch ingestion
//! runs files strictly sequentially so a storm of uploads cannot pile
//! CPU-bound parses on top of each other, and every per-file outcome is
//! captured as a [`FileIngestionResult`] instead of aborting the batch.

use std::sync::Arc;

use serde::Serialize;

use crate::config::{DuplicateStrategy, IngestConfig};
use crate::cover::CoverNormalizer;
use crate::document::{normalize_manifest, BookFile, BookMetadata, ContentManifest};
use crate::error::IngestError;
use crate::formats::{AdapterRegistry, FormatAdapter};
use crate::library::{find_duplicate, BookStore};

/// Per-file outcome of an ingestion run
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum FileIngestionResult {
    /// Parsed and persisted
    Success {
        book_id: String,
        file_name: String,
        metadata: BookMetadata,
        manifest: ContentManifest,
    },
    /// Matched a stored file by name and size; nothing was written
    Duplicate { book_id: String, file_name: String },
    /// No registered adapter claims the file
    Unsupported { file_name: String, message: String },
    /// The file was rejected or failed to parse
    Error { file_name: String, message: String },
}

impl FileIngestionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, FileIngestionResult::Success { .. })
    }
}

/// The ingestion pipeline entry point
pub struct Ingestor {
    registry: AdapterRegistry,
    store: Arc<dyn BookStore>,
    covers: CoverNormalizer,
    config: IngestConfig,
}

impl Ingestor {
    pub fn new(store: Arc<dyn BookStore>, config: IngestConfig) -> Self {
        Self {
            registry: AdapterRegistry::with_defaults(config.text_layer_page_limit),
            store,
            covers: CoverNormalizer::new(),
            config,
        }
    }

    /// Replace the adapter for a format tag
    pub fn register_adapter(&mut self, adapter: Arc<dyn FormatAdapter>) {
        self.registry.register(adapter);
    }

    /// Ingest a batch of files sequentially, preserving input order.
    pub async fn ingest_files(&self, files: Vec<BookFile>) -> Vec<FileIngestionResult> {
        let mut results = Vec::with_capacity(files.len());
        for file in files {
            results.push(self.ingest_file(file).await);
        }
        results
    }

    /// Ingest one file end to end. Never errors: every failure mode is
    /// folded into the returned result.
    pub async fn ingest_file(&self, file: BookFile) -> FileIngestionResult {
        let file_name = file.file_name.clone();

        if file.file_size > self.config.max_file_size {
            let err = IngestError::SizeLimitExceeded {
                size: file.file_size,
                limit: self.config.max_file_size,
            };
            tracing::warn!(file = %file_name, %err, "file rejected");
            return FileIngestionResult::Error {
                file_name,
                message: err.to_string(),
            };
        }

        let Some(adapter) = self.registry.resolve(&file) else {
            let err = IngestError::UnsupportedFormat(file_name.clone());
            return FileIngestionResult::Unsupported {
                file_name,
                message: err.to_string(),
            };
        };

        if self.config.duplicate_strategy == DuplicateStrategy::Skip {
            match find_duplicate(self.store.as_ref(), &file).await {
                Ok(Some(existing)) => {
                    tracing::info!(file = %file_name, book_id = %existing.book_id, "duplicate skipped");
                    return FileIngestionResult::Duplicate {
                        book_id: existing.book_id,
                        file_name,
                    };
                }
                Ok(None) => {}
                // A listing failure must not block ingestion
                Err(err) => tracing::warn!(file = %file_name, %err, "duplicate check failed"),
            }
        }

        let format = adapter.format();
        let parsed = match adapter.parse(&file).await {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(file = %file_name, format = format.as_str(), %err, "parse failed");
                return FileIngestionResult::Error {
                    file_name,
                    message: err.to_string(),
                };
            }
        };

        let mut metadata = parsed.metadata;
        let mut manifest = parsed.manifest;
        let cover = self.covers.normalize(parsed.cover).await;

        normalize_manifest(&mut manifest, format, self.config.text_layer_page_limit);

        if metadata.title.trim().is_empty() {
            metadata.title = file.stem();
        }
        metadata.format = Some(format);
        if metadata.page_count.is_none() {
            metadata.page_count = manifest.page_count;
        }
        if metadata.cover_image.is_none() {
            metadata.cover_image = cover.data_url;
        }

        match self
            .store
            .add_book(file, metadata.clone(), manifest.clone())
            .await
        {
            Ok(book_id) => {
                tracing::info!(file = %file_name, %book_id, format = format.as_str(), "book ingested");
                FileIngestionResult::Success {
                    book_id,
                    file_name,
                    metadata,
                    manifest,
                }
            }
            Err(err) => {
                let err = IngestError::Store(err);
                tracing::warn!(file = %file_name, %err, "persist failed");
                FileIngestionResult::Error {
                    file_name,
                    message: err.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::MemoryBookStore;

    fn ingestor(store: Arc<MemoryBookStore>, config: IngestConfig) -> Ingestor {
        Ingestor::new(store, config)
    }

    #[tokio::test]
    async fn title_falls_back_to_file_stem() {
        let store = Arc::new(MemoryBookStore::new());
        let ingestor = ingestor(store.clone(), IngestConfig::default());

        let file = BookFile::new("untitled-draft.txt", "text/plain", b"   \n\n".to_vec());
        let metadata = match ingestor.ingest_file(file).await {
            FileIngestionResult::Success { metadata, .. } => metadata,
            other => panic!("expected success, got {other:?}"),
        };
        assert_eq!(metadata.title, "untitled-draft");
    }

    #[tokio::test]
    async fn duplicate_check_is_skipped_under_allow() {
        let store = Arc::new(MemoryBookStore::new());
        let config = IngestConfig {
            duplicate_strategy: DuplicateStrategy::Allow,
            ..Default::default()
        };
        let ingestor = ingestor(store.clone(), config);

        let make = || BookFile::new("same.txt", "text/plain", b"Title line".to_vec());
        assert!(ingestor.ingest_file(make()).await.is_success());
        assert!(ingestor.ingest_file(make()).await.is_success());
        assert_eq!(store.book_count().await, 2);
    }

    #[tokio::test]
    async fn batch_preserves_input_order() {
        let store = Arc::new(MemoryBookStore::new());
        let ingestor = ingestor(store, IngestConfig::default());

        let files = vec![
            BookFile::new("first.txt", "text/plain", b"First".to_vec()),
            BookFile::new("second.xyz", "application/x-unknown", vec![0u8; 4]),
            BookFile::new("third.txt", "text/plain", b"Third".to_vec()),
        ];
        let results = ingestor.ingest_files(files).await;
        assert_eq!(results.len(), 3);
        assert!(results[0].is_success());
        assert!(matches!(&results[1], FileIngestionResult::Unsupported { file_name, .. } if file_name == "second.xyz"));
        assert!(results[2].is_success());
    }

    #[tokio::test]
    async fn result_serializes_with_status_tag() {
        let result = FileIngestionResult::Unsupported {
            file_name: "x.xyz".into(),
            message: "unsupported format: x.xyz".into(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "unsupported");
        assert_eq!(json["fileName"], "x.xyz");
    }
}
