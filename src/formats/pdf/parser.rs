//! PDF parsing via lopdf
//!
//! Metadata merges two sources: the trailer `Info` dictionary and the
//! catalog's XMP metadata stream, with `Info` winning on overlap. The
//! spine carries one resource per page; text layers are extracted for
//! pages up to the configured limit, and a per-page failure is logged
//! and skipped rather than aborting the document.

use std::collections::HashMap;

use async_trait::async_trait;
use lopdf::{Dictionary, Document, Object, ObjectId};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::document::{
    BookFile, BookMetadata, ContentManifest, DocumentFormat, ManifestResource, ParsedDocument,
    TextLayer,
};
use crate::error::{IngestError, Result};
use crate::formats::FormatAdapter;

use super::cover::extract_cover;
use super::outline::extract_outline;

/// Adapter for paged PDF documents
#[derive(Debug, Clone, Copy)]
pub struct PdfAdapter {
    text_layer_page_limit: usize,
}

impl PdfAdapter {
    pub fn new(text_layer_page_limit: usize) -> Self {
        Self { text_layer_page_limit }
    }
}

#[async_trait]
impl FormatAdapter for PdfAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn supports(&self, file: &BookFile, extension: &str, mime: &str) -> bool {
        extension == "pdf"
            || DocumentFormat::from_mime(mime) == Some(DocumentFormat::Pdf)
            || DocumentFormat::from_magic_bytes(&file.data) == Some(DocumentFormat::Pdf)
    }

    async fn parse(&self, file: &BookFile) -> Result<ParsedDocument> {
        let data = file.data.clone();
        let limit = self.text_layer_page_limit;
        tokio::task::spawn_blocking(move || parse_pdf(data, limit))
            .await
            .map_err(|e| IngestError::ParseError(format!("task join error: {e}")))?
    }
}

fn parse_pdf(data: Vec<u8>, text_layer_page_limit: usize) -> Result<ParsedDocument> {
    let doc = Document::load_mem(&data)?;
    let pages = doc.get_pages();
    let page_count = pages.len();

    // Page object id -> zero-based index, for destination resolution
    let page_index: HashMap<ObjectId, usize> = pages
        .values()
        .enumerate()
        .map(|(index, id)| (*id, index))
        .collect();

    let metadata = extract_metadata(&doc, page_count);

    let spine: Vec<ManifestResource> = (0..page_count)
        .map(|index| ManifestResource {
            id: String::new(),
            href: None,
            media_type: Some("application/pdf".to_string()),
            title: Some(format!("Page {}", index + 1)),
            order: index,
        })
        .collect();

    let text_layers = extract_text_layers(&doc, page_count, text_layer_page_limit);
    let table_of_contents = extract_outline(&doc, &page_index);
    let cover = Some(extract_cover(&doc, &pages));

    Ok(ParsedDocument {
        metadata,
        manifest: ContentManifest {
            format: Some(DocumentFormat::Pdf),
            spine,
            table_of_contents,
            page_count: Some(page_count),
            text_layers,
        },
        cover,
    })
}

// ── Text layers ─────────────────────────────────────────────────────────

fn extract_text_layers(doc: &Document, page_count: usize, limit: usize) -> Vec<TextLayer> {
    let mut layers = Vec::new();
    for page in 0..page_count.min(limit) {
        let page_number = (page + 1) as u32;
        match doc.extract_text(&[page_number]) {
            Ok(text) => layers.push(TextLayer {
                id: format!("text-{page}"),
                page,
                label: Some(format!("Page {page_number}")),
                text: Some(text),
            }),
            Err(err) => {
                tracing::warn!(page = page_number, %err, "page text extraction failed, skipping layer");
            }
        }
    }
    layers
}

// ── Metadata ────────────────────────────────────────────────────────────

fn extract_metadata(doc: &Document, page_count: usize) -> BookMetadata {
    let info = info_metadata(doc);
    let xmp = xmp_metadata(doc);

    // Info dictionary wins on overlapping keys
    BookMetadata {
        title: info.title.or(xmp.title).unwrap_or_default(),
        author: info.author.or(xmp.author),
        publisher: xmp.publisher,
        published_date: info.date,
        language: None,
        description: info.description.or(xmp.description),
        tags: info.tags,
        identifiers: HashMap::new(),
        format: Some(DocumentFormat::Pdf),
        page_count: Some(page_count),
        cover_image: None,
    }
}

#[derive(Debug, Default)]
struct RawMetadata {
    title: Option<String>,
    author: Option<String>,
    publisher: Option<String>,
    description: Option<String>,
    date: Option<String>,
    tags: Vec<String>,
}

fn info_metadata(doc: &Document) -> RawMetadata {
    let mut meta = RawMetadata::default();
    let Some(info) = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|obj| resolve_dict(doc, obj))
    else {
        return meta;
    };

    meta.title = info_string(doc, info, b"Title");
    meta.author = info_string(doc, info, b"Author");
    meta.description = info_string(doc, info, b"Subject");
    meta.date = info_string(doc, info, b"CreationDate").and_then(|d| pdf_date_to_iso(&d));
    if let Some(keywords) = info_string(doc, info, b"Keywords") {
        meta.tags = keywords
            .split([',', ';'])
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
    }
    meta
}

fn info_string(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    let obj = resolve(doc, dict.get(key).ok()?);
    match obj {
        Object::String(bytes, _) => {
            let text = decode_pdf_string(bytes);
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE when BOM-prefixed, otherwise one
/// byte per character (PDFDocEncoding is a Latin-1 superset for the
/// range that matters here).
pub(super) fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// "D:20240315120000Z" -> "2024-03-15"
fn pdf_date_to_iso(raw: &str) -> Option<String> {
    let digits = raw.strip_prefix("D:").unwrap_or(raw);
    if digits.len() < 8 || !digits.as_bytes()[..8].iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(format!("{}-{}-{}", &digits[0..4], &digits[4..6], &digits[6..8]))
}

/// Minimal XMP reader: pulls the Dublin Core fields out of the catalog
/// metadata stream. Anything malformed yields an empty result.
fn xmp_metadata(doc: &Document) -> RawMetadata {
    match xmp_stream(doc) {
        Some(xml) => parse_xmp(&xml),
        None => RawMetadata::default(),
    }
}

fn parse_xmp(xml: &str) -> RawMetadata {
    let mut meta = RawMetadata::default();
    let mut reader = Reader::from_str(xml);
    let mut pending: Option<&'static str> = None;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let field = match e.local_name().as_ref() {
                    b"title" => Some("title"),
                    b"creator" => Some("creator"),
                    b"description" => Some("description"),
                    b"publisher" => Some("publisher"),
                    _ => None,
                };
                if let Some(field) = field {
                    pending = Some(field);
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(field) = pending {
                    let text = t.unescape().unwrap_or_default();
                    let text = text.trim();
                    if !text.is_empty() {
                        let slot = match field {
                            "title" => &mut meta.title,
                            "creator" => &mut meta.author,
                            "description" => &mut meta.description,
                            _ => &mut meta.publisher,
                        };
                        if slot.is_none() {
                            *slot = Some(text.to_string());
                        }
                        pending = None;
                    }
                }
            }
            Ok(Event::End(e)) => {
                if let Some(field) = pending {
                    if e.local_name().as_ref() == field.as_bytes() {
                        pending = None;
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => break,
        }
    }
    meta
}

fn xmp_stream(doc: &Document) -> Option<String> {
    let catalog = doc.catalog().ok()?;
    let obj = resolve(doc, catalog.get(b"Metadata").ok()?);
    let Object::Stream(stream) = obj else {
        return None;
    };
    let content = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    Some(String::from_utf8_lossy(&content).into_owned())
}

// ── Object resolution helpers ───────────────────────────────────────────

/// Follow a reference to its target object; non-references pass through
pub(super) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

pub(super) fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj) {
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_utf16_pdf_string() {
        // BOM + "Hi"
        let bytes = [0xFE, 0xFF, 0x00, b'H', 0x00, b'i'];
        assert_eq!(decode_pdf_string(&bytes), "Hi");
    }

    #[test]
    fn decodes_latin1_pdf_string() {
        assert_eq!(decode_pdf_string(b"caf\xe9"), "caf\u{e9}");
    }

    #[test]
    fn converts_pdf_date() {
        assert_eq!(pdf_date_to_iso("D:20240315120000Z").as_deref(), Some("2024-03-15"));
        assert_eq!(pdf_date_to_iso("20240315").as_deref(), Some("2024-03-15"));
        assert_eq!(pdf_date_to_iso("D:garbage"), None);
    }

    #[test]
    fn xmp_fields_parse() {
        let xml = r#"<?xpacket begin=""?>
<x:xmpmeta xmlns:x="adobe:ns:meta/">
 <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <rdf:Description xmlns:dc="http://purl.org/dc/elements/1.1/">
   <dc:title><rdf:Alt><rdf:li xml:lang="x-default">XMP Title</rdf:li></rdf:Alt></dc:title>
   <dc:creator><rdf:Seq><rdf:li>XMP Author</rdf:li></rdf:Seq></dc:creator>
   <dc:publisher><rdf:Bag><rdf:li>XMP Press</rdf:li></rdf:Bag></dc:publisher>
  </rdf:Description>
 </rdf:RDF>
</x:xmpmeta>"#;

        let meta = parse_xmp(xml);
        assert_eq!(meta.title.as_deref(), Some("XMP Title"));
        assert_eq!(meta.author.as_deref(), Some("XMP Author"));
        assert_eq!(meta.publisher.as_deref(), Some("XMP Press"));
    }
}
