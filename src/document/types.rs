//! Core document types
//!
//! Format-agnostic types produced by the ingestion pipeline and consumed
//! by the reading and search components.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cover::CoverSource;

/// Document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Epub,
    Text,
    Html,
}

impl DocumentFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "epub" => Some(Self::Epub),
            "txt" | "text" => Some(Self::Text),
            "html" | "htm" | "xhtml" => Some(Self::Html),
            _ => None,
        }
    }

    /// Detect format from MIME type
    pub fn from_mime(mime: &str) -> Option<Self> {
        // Ignore charset and other parameters
        let essence = mime.split(';').next().unwrap_or(mime).trim();
        match essence {
            "application/pdf" => Some(Self::Pdf),
            "application/epub+zip" => Some(Self::Epub),
            "text/plain" => Some(Self::Text),
            "text/html" | "application/xhtml+xml" => Some(Self::Html),
            _ => None,
        }
    }

    /// Detect format from magic bytes
    pub fn from_magic_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PDF magic: %PDF
        if bytes.starts_with(b"%PDF") {
            return Some(Self::Pdf);
        }

        // EPUB magic: PK (ZIP) with mimetype containing "epub"
        // Note: We don't assume all ZIPs are EPUBs to avoid false positives
        // with .docx, .xlsx, .apk, .jar and other ZIP-based formats
        if bytes.starts_with(b"PK") && bytes.len() > 30 {
            // EPUB files carry a "mimetype" entry at offset 30 with
            // "application/epub+zip" stored uncompressed
            let head = String::from_utf8_lossy(&bytes[..bytes.len().min(58)]);
            if head.contains("epub") {
                return Some(Self::Epub);
            }
        }

        None
    }

    /// Format tag used in manifests and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Epub => "epub",
            Self::Text => "text",
            Self::Html => "html",
        }
    }
}

/// An uploaded document file awaiting ingestion
///
/// Immutable once created; ownership passes to the persistence
/// collaborator when ingestion succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookFile {
    /// Raw file bytes
    #[serde(skip)]
    pub data: Vec<u8>,
    /// Original file name
    pub file_name: String,
    /// Declared content type (may be empty)
    pub file_type: String,
    /// Size in bytes
    pub file_size: u64,
    /// When the file entered the library
    pub added_date: DateTime<Utc>,
}

impl BookFile {
    /// Create a file record from raw bytes
    pub fn new(file_name: impl Into<String>, file_type: impl Into<String>, data: Vec<u8>) -> Self {
        let file_size = data.len() as u64;
        Self {
            data,
            file_name: file_name.into(),
            file_type: file_type.into(),
            file_size,
            added_date: Utc::now(),
        }
    }

    /// Lowercased file extension, without the dot
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default()
    }

    /// File name minus its extension
    pub fn stem(&self) -> String {
        std::path::Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file_name)
            .to_string()
    }
}

/// Normalized book metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMetadata {
    /// Book title (falls back to the file stem, never empty after
    /// normalization)
    pub title: String,
    /// Primary author
    pub author: Option<String>,
    /// Publisher
    pub publisher: Option<String>,
    /// Publication date
    pub published_date: Option<String>,
    /// Language code
    pub language: Option<String>,
    /// Description/summary
    pub description: Option<String>,
    /// Tags/subjects
    pub tags: Vec<String>,
    /// Identifiers keyed by scheme (isbn, doi, uuid, ...)
    pub identifiers: HashMap<String, String>,
    /// Source format
    pub format: Option<DocumentFormat>,
    /// Page count, when the format has pages
    pub page_count: Option<usize>,
    /// Cover image as a data URL
    pub cover_image: Option<String>,
}

/// A reading-order unit (chapter or page)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestResource {
    /// Unique id within the manifest
    pub id: String,
    /// Location inside the source container, if any
    pub href: Option<String>,
    /// MIME type of the resource
    pub media_type: Option<String>,
    /// Human-readable title
    pub title: Option<String>,
    /// Zero-based reading-order position
    pub order: usize,
}

/// A table-of-contents node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentManifestItem {
    /// Unique id within the manifest
    pub id: String,
    /// Entry label
    pub title: Option<String>,
    /// Navigation target
    pub href: Option<String>,
    /// Zero-based position among siblings
    pub order: usize,
    /// Nesting depth, zero at the root
    pub level: usize,
    /// Nested entries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ContentManifestItem>,
}

/// Extracted text for one page, used for search and selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayer {
    /// Unique id within the manifest
    pub id: String,
    /// Zero-based page index
    pub page: usize,
    /// Display label ("Page 3")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Extracted text content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Normalized, format-agnostic description of a document's structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentManifest {
    /// Source format; stamped by the normalizer when an adapter leaves
    /// it unset
    pub format: Option<DocumentFormat>,
    /// Linear reading order
    pub spine: Vec<ManifestResource>,
    /// Navigation tree
    pub table_of_contents: Vec<ContentManifestItem>,
    /// Page count, when the format has pages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
    /// Per-page text layers, capped to the configured limit
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub text_layers: Vec<TextLayer>,
}

/// Raw adapter output before normalization
#[derive(Debug)]
pub struct ParsedDocument {
    pub metadata: BookMetadata,
    pub manifest: ContentManifest,
    pub cover: Option<CoverSource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_format_from_extension() {
        assert_eq!(DocumentFormat::from_extension("EPUB"), Some(DocumentFormat::Epub));
        assert_eq!(DocumentFormat::from_extension("pdf"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_extension("htm"), Some(DocumentFormat::Html));
        assert_eq!(DocumentFormat::from_extension("xyz"), None);
    }

    #[test]
    fn detects_format_from_mime_with_params() {
        assert_eq!(
            DocumentFormat::from_mime("text/plain; charset=utf-8"),
            Some(DocumentFormat::Text)
        );
        assert_eq!(DocumentFormat::from_mime("application/pdf"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_mime("application/x-unknown"), None);
    }

    #[test]
    fn detects_pdf_magic() {
        assert_eq!(
            DocumentFormat::from_magic_bytes(b"%PDF-1.7\n%stuff"),
            Some(DocumentFormat::Pdf)
        );
        // Bare ZIP is not assumed to be an EPUB
        let mut zip = b"PK\x03\x04".to_vec();
        zip.extend_from_slice(&[0u8; 40]);
        assert_eq!(DocumentFormat::from_magic_bytes(&zip), None);
    }

    #[test]
    fn file_stem_and_extension() {
        let file = BookFile::new("My Book.epub", "application/epub+zip", vec![1, 2, 3]);
        assert_eq!(file.extension(), "epub");
        assert_eq!(file.stem(), "My Book");
        assert_eq!(file.file_size, 3);
    }
}
