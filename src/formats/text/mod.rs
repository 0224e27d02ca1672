//! Plain-text and HTML adapters
//!
//! Both formats carry no packaged metadata, so these adapters derive a
//! best-effort title and description from the content itself and emit a
//! single-entry spine with no table of contents.

use async_trait::async_trait;

use crate::document::{
    BookFile, BookMetadata, ContentManifest, DocumentFormat, ManifestResource, ParsedDocument,
};
use crate::error::Result;

use super::FormatAdapter;

const TITLE_MAX_CHARS: usize = 120;
const EXCERPT_MAX_CHARS: usize = 300;

/// Adapter for bare `.txt` files
#[derive(Debug, Default)]
pub struct PlainTextAdapter;

impl PlainTextAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FormatAdapter for PlainTextAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Text
    }

    fn supports(&self, _file: &BookFile, extension: &str, mime: &str) -> bool {
        extension == "txt" || mime == "text/plain"
    }

    async fn parse(&self, file: &BookFile) -> Result<ParsedDocument> {
        let text = String::from_utf8_lossy(&file.data);

        let title = text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(|line| truncate_chars(line, TITLE_MAX_CHARS))
            .unwrap_or_default();

        let metadata = BookMetadata {
            title,
            description: leading_excerpt(&text),
            format: Some(DocumentFormat::Text),
            ..Default::default()
        };

        Ok(ParsedDocument {
            metadata,
            manifest: single_entry_manifest(DocumentFormat::Text, "text/plain", &file.file_name),
            cover: None,
        })
    }
}

/// Adapter for standalone HTML documents
#[derive(Debug, Default)]
pub struct HtmlAdapter;

impl HtmlAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FormatAdapter for HtmlAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Html
    }

    fn supports(&self, _file: &BookFile, extension: &str, mime: &str) -> bool {
        matches!(extension, "html" | "htm" | "xhtml")
            || mime == "text/html"
            || mime == "application/xhtml+xml"
    }

    async fn parse(&self, file: &BookFile) -> Result<ParsedDocument> {
        let html = String::from_utf8_lossy(&file.data);

        let metadata = BookMetadata {
            title: title_element(&html).unwrap_or_default(),
            format: Some(DocumentFormat::Html),
            ..Default::default()
        };

        Ok(ParsedDocument {
            metadata,
            manifest: single_entry_manifest(DocumentFormat::Html, "text/html", &file.file_name),
            cover: None,
        })
    }
}

fn single_entry_manifest(format: DocumentFormat, media_type: &str, href: &str) -> ContentManifest {
    ContentManifest {
        format: Some(format),
        spine: vec![ManifestResource {
            id: "content".to_string(),
            href: Some(href.to_string()),
            media_type: Some(media_type.to_string()),
            title: None,
            order: 0,
        }],
        ..Default::default()
    }
}

/// The document's `<title>` text with entities decoded. Tag scan is
/// case-insensitive and tolerant of attributes on the opening tag.
/// Offsets are computed on the original bytes; a lowercased copy would
/// shift them for characters whose case change alters byte length.
fn title_element(html: &str) -> Option<String> {
    let bytes = html.as_bytes();
    let open = find_ignore_ascii_case(bytes, b"<title", 0)?;
    let open_end = open + bytes[open..].iter().position(|&b| b == b'>')?;
    let close = find_ignore_ascii_case(bytes, b"</title", open_end)?;
    let raw = html.get(open_end + 1..close)?;
    let decoded = html_escape::decode_html_entities(raw.trim()).into_owned();
    if decoded.is_empty() {
        None
    } else {
        Some(truncate_chars(&decoded, TITLE_MAX_CHARS))
    }
}

fn find_ignore_ascii_case(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
        .map(|pos| pos + from)
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

/// Leading excerpt used as the description, collapsed to single spaces.
fn leading_excerpt(text: &str) -> Option<String> {
    let collapsed: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    Some(truncate_chars(&collapsed, EXCERPT_MAX_CHARS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn plain_text_title_is_first_non_blank_line() {
        let file = BookFile::new(
            "notes.txt",
            "text/plain",
            b"\n\n  The Voyage Out  \n\nChapter one begins here.".to_vec(),
        );
        let parsed = PlainTextAdapter::new().parse(&file).await.unwrap();
        assert_eq!(parsed.metadata.title, "The Voyage Out");
        assert_eq!(
            parsed.metadata.description.as_deref(),
            Some("The Voyage Out Chapter one begins here.")
        );
        assert_eq!(parsed.manifest.spine.len(), 1);
        assert!(parsed.manifest.table_of_contents.is_empty());
    }

    #[tokio::test]
    async fn long_first_line_is_truncated() {
        let line = "x".repeat(500);
        let file = BookFile::new("big.txt", "text/plain", line.into_bytes());
        let parsed = PlainTextAdapter::new().parse(&file).await.unwrap();
        assert_eq!(parsed.metadata.title.chars().count(), TITLE_MAX_CHARS);
    }

    #[tokio::test]
    async fn html_title_decodes_entities() {
        let html = br#"<html><head><TITLE lang="en"> Crime &amp; Punishment </TITLE></head><body></body></html>"#;
        let file = BookFile::new("book.html", "text/html", html.to_vec());
        let parsed = HtmlAdapter::new().parse(&file).await.unwrap();
        assert_eq!(parsed.metadata.title, "Crime & Punishment");
        assert_eq!(parsed.manifest.format, Some(DocumentFormat::Html));
    }

    #[tokio::test]
    async fn html_title_after_length_shifting_characters() {
        // U+0130 grows from two to three bytes when lowercased, so a
        // lowercase-and-slice scan would misplace the title bounds
        let html = "<html lang=\"tr\"><!-- İÇİNDEKİLER --><head><title>Şehir Rehberi</title></head><body></body></html>";
        let file = BookFile::new("rehber.html", "text/html", html.as_bytes().to_vec());
        let parsed = HtmlAdapter::new().parse(&file).await.unwrap();
        assert_eq!(parsed.metadata.title, "Şehir Rehberi");
    }

    #[tokio::test]
    async fn html_without_title_leaves_it_empty() {
        let file = BookFile::new("page.htm", "", b"<html><body><p>hi</p></body></html>".to_vec());
        let parsed = HtmlAdapter::new().parse(&file).await.unwrap();
        assert!(parsed.metadata.title.is_empty());
    }
}
