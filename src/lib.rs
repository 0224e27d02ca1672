//! # amnesia-ingest
//!
//! Document ingestion and normalization for ebook libraries. Takes raw
//! uploaded files (EPUB, PDF, plain text, HTML) and turns each into a
//! normalized [`document::BookMetadata`] plus a format-agnostic
//! [`document::ContentManifest`]: linear spine, nested table of
//! contents, cover image, and capped per-page text layers.
//!
//! The pipeline is built from independent pieces:
//! - [`formats`]: per-format adapters behind a [`formats::FormatAdapter`]
//!   trait, resolved through a [`formats::AdapterRegistry`]
//! - [`cover`]: cover normalization into a canonical bytes + data URL pair
//! - [`document`]: the shared data model and the manifest normalizer
//! - [`library`]: the [`library::BookStore`] persistence boundary and an
//!   in-memory implementation
//! - [`ingest`]: the [`ingest::Ingestor`] orchestrator tying it together
//!
//! ```no_run
//! use std::sync::Arc;
//! use amnesia_ingest::config::IngestConfig;
//! use amnesia_ingest::document::BookFile;
//! use amnesia_ingest::ingest::Ingestor;
//! use amnesia_ingest::library::MemoryBookStore;
//!
//! # async fn run() {
//! let store = Arc::new(MemoryBookStore::new());
//! let ingestor = Ingestor::new(store, IngestConfig::from_env());
//!
//! let file = BookFile::new("book.epub", "application/epub+zip", std::fs::read("book.epub").unwrap());
//! let result = ingestor.ingest_file(file).await;
//! println!("{}", serde_json::to_string_pretty(&result).unwrap());
//! # }
//! ```

pub mod config;
pub mod cover;
pub mod document;
pub mod error;
pub mod formats;
pub mod ingest;
pub mod library;

pub use config::{DuplicateStrategy, IngestConfig};
pub use document::{BookFile, BookMetadata, ContentManifest, DocumentFormat};
pub use error::{IngestError, Result};
pub use ingest::{FileIngestionResult, Ingestor};
pub use library::{BookStore, MemoryBookStore};
