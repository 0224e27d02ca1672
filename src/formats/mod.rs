//! Format-specific document adapters
//!
//! Each supported format implements [`FormatAdapter`]; the
//! [`AdapterRegistry`] resolves which adapter claims a given file.
//! Adapters are independent and swappable: re-registering a format tag
//! replaces the previous adapter for that tag, so behavior can be
//! overridden without subclassing.

pub mod epub;
pub mod pdf;
pub mod text;

use std::sync::Arc;

use async_trait::async_trait;

use crate::document::{BookFile, DocumentFormat, ParsedDocument};
use crate::error::Result;

pub use epub::EpubAdapter;
pub use pdf::PdfAdapter;
pub use text::{HtmlAdapter, PlainTextAdapter};

/// A format-specific parser for ingested files
#[async_trait]
pub trait FormatAdapter: Send + Sync {
    /// Format tag this adapter produces
    fn format(&self) -> DocumentFormat;

    /// Whether this adapter claims the file
    fn supports(&self, file: &BookFile, extension: &str, mime: &str) -> bool;

    /// Parse the file into a metadata + manifest draft
    async fn parse(&self, file: &BookFile) -> Result<ParsedDocument>;
}

/// Registry of format adapters, owned by the orchestrator
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn FormatAdapter>>,
}

impl AdapterRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with all built-in adapters
    pub fn with_defaults(text_layer_page_limit: usize) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(EpubAdapter::new()));
        registry.register(Arc::new(PdfAdapter::new(text_layer_page_limit)));
        registry.register(Arc::new(PlainTextAdapter::new()));
        registry.register(Arc::new(HtmlAdapter::new()));
        registry
    }

    /// Register an adapter, replacing any previous adapter with the
    /// same format tag.
    pub fn register(&mut self, adapter: Arc<dyn FormatAdapter>) {
        let format = adapter.format();
        self.adapters.retain(|existing| existing.format() != format);
        self.adapters.push(adapter);
    }

    /// Find the adapter claiming this file, preferring the most
    /// recently registered one. Returns `None` when no adapter claims
    /// it, which becomes an `unsupported` result.
    pub fn resolve(&self, file: &BookFile) -> Option<Arc<dyn FormatAdapter>> {
        let extension = file.extension();
        let mime = if file.file_type.is_empty() {
            mime_guess::from_path(&file.file_name)
                .first_raw()
                .unwrap_or("")
                .to_string()
        } else {
            file.file_type.clone()
        };

        let adapter = self
            .adapters
            .iter()
            .rev()
            .find(|adapter| adapter.supports(file, &extension, &mime))
            .cloned();

        match &adapter {
            Some(a) => tracing::debug!(file = %file.file_name, format = a.format().as_str(), "adapter resolved"),
            None => tracing::debug!(file = %file.file_name, %extension, %mime, "no adapter claims file"),
        }
        adapter
    }

    /// Number of registered adapters
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BookMetadata, ContentManifest};

    struct StubAdapter {
        format: DocumentFormat,
        marker: &'static str,
    }

    #[async_trait]
    impl FormatAdapter for StubAdapter {
        fn format(&self) -> DocumentFormat {
            self.format
        }

        fn supports(&self, _file: &BookFile, extension: &str, _mime: &str) -> bool {
            DocumentFormat::from_extension(extension) == Some(self.format)
        }

        async fn parse(&self, _file: &BookFile) -> Result<ParsedDocument> {
            Ok(ParsedDocument {
                metadata: BookMetadata {
                    title: self.marker.to_string(),
                    ..Default::default()
                },
                manifest: ContentManifest::default(),
                cover: None,
            })
        }
    }

    #[test]
    fn resolves_by_extension() {
        let registry = AdapterRegistry::with_defaults(20);
        let file = BookFile::new("book.epub", "", vec![]);
        let adapter = registry.resolve(&file).unwrap();
        assert_eq!(adapter.format(), DocumentFormat::Epub);
    }

    #[test]
    fn unknown_extension_resolves_to_none() {
        let registry = AdapterRegistry::with_defaults(20);
        let file = BookFile::new("x.xyz", "application/x-unknown", vec![]);
        assert!(registry.resolve(&file).is_none());
    }

    #[tokio::test]
    async fn last_registration_for_a_format_wins() {
        let mut registry = AdapterRegistry::with_defaults(20);
        let count = registry.len();
        registry.register(Arc::new(StubAdapter {
            format: DocumentFormat::Epub,
            marker: "override",
        }));
        // Replaced, not appended
        assert_eq!(registry.len(), count);

        let file = BookFile::new("book.epub", "", vec![]);
        let adapter = registry.resolve(&file).unwrap();
        let parsed = adapter.parse(&file).await.unwrap();
        assert_eq!(parsed.metadata.title, "override");
    }
}
