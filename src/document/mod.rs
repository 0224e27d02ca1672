//! Unified document abstraction
//!
//! Format-agnostic data model for ingested documents, plus the
//! normalization pass that enforces the manifest invariants every
//! downstream consumer relies on.

mod normalizer;
mod types;

pub use normalizer::normalize_manifest;
pub use types::{
    BookFile, BookMetadata, ContentManifest, ContentManifestItem, DocumentFormat,
    ManifestResource, ParsedDocument, TextLayer,
};
