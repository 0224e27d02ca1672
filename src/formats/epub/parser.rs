//! EPUB container parsing
//!
//! An EPUB is a ZIP container: `META-INF/container.xml` names the
//! package document (OPF), which carries Dublin Core metadata, the
//! resource manifest and the spine. Navigation lives either in an
//! EPUB 3 nav document (`properties="nav"`) or an EPUB 2 NCX.
//!
//! All metadata fields are read defensively: anything absent stays
//! `None` instead of failing the parse, and cover resolution degrades
//! to "no cover" on any single-step failure.

use std::io::{Cursor, Read, Seek};

use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::cover::CoverSource;
use crate::document::{
    BookFile, BookMetadata, ContentManifest, ContentManifestItem, DocumentFormat,
    ManifestResource, ParsedDocument,
};
use crate::error::{IngestError, Result};
use crate::formats::FormatAdapter;

/// Adapter for EPUB containers
#[derive(Debug, Clone, Copy, Default)]
pub struct EpubAdapter;

impl EpubAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FormatAdapter for EpubAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Epub
    }

    fn supports(&self, file: &BookFile, extension: &str, mime: &str) -> bool {
        extension == "epub"
            || DocumentFormat::from_mime(mime) == Some(DocumentFormat::Epub)
            || DocumentFormat::from_magic_bytes(&file.data) == Some(DocumentFormat::Epub)
    }

    async fn parse(&self, file: &BookFile) -> Result<ParsedDocument> {
        let data = file.data.clone();
        tokio::task::spawn_blocking(move || parse_epub(data))
            .await
            .map_err(|e| IngestError::ParseError(format!("task join error: {e}")))?
    }
}

fn parse_epub(data: Vec<u8>) -> Result<ParsedDocument> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;

    let container = read_text(&mut archive, "META-INF/container.xml")
        .ok_or_else(|| IngestError::ParseError("missing META-INF/container.xml".into()))?;
    let opf_path = rootfile_path(&container)?
        .ok_or_else(|| IngestError::ParseError("container.xml declares no rootfile".into()))?;
    let opf_text = read_text(&mut archive, &opf_path)
        .ok_or_else(|| IngestError::ParseError(format!("missing package document: {opf_path}")))?;

    let opf_dir = parent_dir(&opf_path);
    let opf = parse_opf(&opf_text)?;

    let toc = load_toc(&mut archive, &opf, &opf_dir);
    let spine = build_spine(&opf, &opf_dir, &toc);
    let cover = resolve_cover(&mut archive, &opf, &opf_dir);

    let meta = opf.metadata;
    let metadata = BookMetadata {
        title: meta.title.unwrap_or_default(),
        author: meta.creators.into_iter().next(),
        publisher: meta.publisher,
        published_date: meta.date,
        language: meta.language,
        description: meta.description,
        tags: meta.subjects,
        identifiers: meta.identifiers,
        format: Some(DocumentFormat::Epub),
        page_count: None,
        cover_image: None,
    };

    Ok(ParsedDocument {
        metadata,
        manifest: ContentManifest {
            format: Some(DocumentFormat::Epub),
            spine,
            table_of_contents: toc,
            page_count: None,
            text_layers: Vec::new(),
        },
        cover,
    })
}

// ── Package document (OPF) ──────────────────────────────────────────────

#[derive(Debug, Default)]
struct OpfMetadata {
    title: Option<String>,
    creators: Vec<String>,
    publisher: Option<String>,
    date: Option<String>,
    language: Option<String>,
    description: Option<String>,
    subjects: Vec<String>,
    identifiers: std::collections::HashMap<String, String>,
    /// `content` of `<meta name="cover">`, naming a manifest item id
    cover_meta: Option<String>,
}

#[derive(Debug, Clone)]
struct OpfItem {
    id: String,
    href: String,
    media_type: Option<String>,
    properties: Option<String>,
}

#[derive(Debug, Default)]
struct OpfPackage {
    metadata: OpfMetadata,
    manifest: Vec<OpfItem>,
    spine: Vec<String>,
    /// `toc` attribute of `<spine>`, naming the NCX manifest item
    spine_toc: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DcField {
    Title,
    Creator,
    Publisher,
    Date,
    Language,
    Description,
    Subject,
    Identifier,
}

/// Parse the OPF package document.
///
/// Element names are matched by local name so `dc:`-prefixed Dublin
/// Core elements resolve regardless of the prefix the producer chose.
fn parse_opf(xml: &str) -> Result<OpfPackage> {
    let mut reader = Reader::from_str(xml);
    let mut opf = OpfPackage::default();
    let mut current: Option<DcField> = None;
    let mut identifier_scheme: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"title" => current = Some(DcField::Title),
                b"creator" => current = Some(DcField::Creator),
                b"publisher" => current = Some(DcField::Publisher),
                b"date" => current = Some(DcField::Date),
                b"language" => current = Some(DcField::Language),
                b"description" => current = Some(DcField::Description),
                b"subject" => current = Some(DcField::Subject),
                b"identifier" => {
                    identifier_scheme = attr(&e, b"scheme").or_else(|| attr(&e, b"id"));
                    current = Some(DcField::Identifier);
                }
                b"spine" => opf.spine_toc = attr(&e, b"toc"),
                b"item" => push_item(&mut opf, &e),
                b"itemref" => push_itemref(&mut opf, &e),
                b"meta" => read_meta(&mut opf, &e),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"item" => push_item(&mut opf, &e),
                b"itemref" => push_itemref(&mut opf, &e),
                b"meta" => read_meta(&mut opf, &e),
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let Some(field) = current {
                    let text = t.unescape().unwrap_or_default();
                    let text = text.trim();
                    if !text.is_empty() {
                        store_dc_field(&mut opf.metadata, field, text, identifier_scheme.as_deref());
                    }
                }
            }
            Ok(Event::End(_)) => {
                current = None;
                identifier_scheme = None;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(err.into()),
        }
    }

    Ok(opf)
}

fn store_dc_field(meta: &mut OpfMetadata, field: DcField, text: &str, scheme: Option<&str>) {
    match field {
        DcField::Title => {
            if meta.title.is_none() {
                meta.title = Some(text.to_string());
            }
        }
        DcField::Creator => meta.creators.push(text.to_string()),
        DcField::Publisher => {
            if meta.publisher.is_none() {
                meta.publisher = Some(text.to_string());
            }
        }
        DcField::Date => {
            if meta.date.is_none() {
                meta.date = Some(text.to_string());
            }
        }
        DcField::Language => {
            if meta.language.is_none() {
                meta.language = Some(text.to_string());
            }
        }
        DcField::Description => {
            if meta.description.is_none() {
                meta.description = Some(text.to_string());
            }
        }
        DcField::Subject => meta.subjects.push(text.to_string()),
        DcField::Identifier => {
            let key = scheme
                .unwrap_or("identifier")
                .to_lowercase()
                .replace("calibre:", "");
            meta.identifiers.entry(key).or_insert_with(|| text.to_string());
        }
    }
}

fn push_item(opf: &mut OpfPackage, e: &BytesStart<'_>) {
    if let (Some(id), Some(href)) = (attr(e, b"id"), attr(e, b"href")) {
        opf.manifest.push(OpfItem {
            id,
            href,
            media_type: attr(e, b"media-type"),
            properties: attr(e, b"properties"),
        });
    }
}

fn push_itemref(opf: &mut OpfPackage, e: &BytesStart<'_>) {
    if let Some(idref) = attr(e, b"idref") {
        opf.spine.push(idref);
    }
}

fn read_meta(opf: &mut OpfPackage, e: &BytesStart<'_>) {
    if attr(e, b"name").as_deref() == Some("cover") {
        opf.metadata.cover_meta = attr(e, b"content");
    }
}

/// Attribute value by local name
fn attr(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

// ── Container and archive access ────────────────────────────────────────

/// Full path of the first `<rootfile>` in container.xml
fn rootfile_path(xml: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"rootfile" {
                    if let Some(path) = attr(&e, b"full-path") {
                        return Ok(Some(path));
                    }
                }
            }
            Ok(Event::Eof) => return Ok(None),
            Ok(_) => {}
            Err(err) => return Err(err.into()),
        }
    }
}

fn read_text<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Option<String> {
    let mut entry = archive.by_name(path).ok()?;
    let mut text = String::new();
    entry.read_to_string(&mut text).ok()?;
    Some(text)
}

fn read_bytes<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Option<Vec<u8>> {
    let mut entry = archive.by_name(path).ok()?;
    let mut data = Vec::new();
    entry.read_to_end(&mut data).ok()?;
    Some(data)
}

/// Directory part of a container path ("" for the root)
fn parent_dir(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((dir, _)) => dir.to_string(),
        None => String::new(),
    }
}

/// Resolve an href relative to a directory inside the container,
/// collapsing `.` and `..` components.
fn join_href(dir: &str, href: &str) -> String {
    let href = href.trim_start_matches('/');
    let mut parts: Vec<&str> = if dir.is_empty() {
        Vec::new()
    } else {
        dir.split('/').collect()
    };
    for part in href.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Href without its fragment identifier
fn strip_fragment(href: &str) -> &str {
    href.split('#').next().unwrap_or(href)
}

// ── Spine ───────────────────────────────────────────────────────────────

fn build_spine(opf: &OpfPackage, opf_dir: &str, toc: &[ContentManifestItem]) -> Vec<ManifestResource> {
    opf.spine
        .iter()
        .enumerate()
        .map(|(order, idref)| {
            let item = opf.manifest.iter().find(|i| &i.id == idref);
            let href = item.map(|i| join_href(opf_dir, &i.href));
            // Explicit label from the navigation tree, else the internal id
            let title = href
                .as_deref()
                .and_then(|h| find_toc_title(toc, h))
                .unwrap_or_else(|| idref.clone());

            ManifestResource {
                id: idref.clone(),
                href,
                media_type: item.and_then(|i| i.media_type.clone()),
                title: Some(title),
                order,
            }
        })
        .collect()
}

fn find_toc_title(items: &[ContentManifestItem], href: &str) -> Option<String> {
    for item in items {
        if let Some(entry_href) = item.href.as_deref() {
            if strip_fragment(entry_href) == href {
                return item.title.clone();
            }
        }
        if let Some(title) = find_toc_title(&item.children, href) {
            return Some(title);
        }
    }
    None
}

// ── Table of contents ───────────────────────────────────────────────────

fn load_toc<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    opf: &OpfPackage,
    opf_dir: &str,
) -> Vec<ContentManifestItem> {
    // EPUB 3 nav document first
    if let Some(nav_item) = opf
        .manifest
        .iter()
        .find(|i| i.properties.as_deref().is_some_and(|p| p.split(' ').any(|t| t == "nav")))
    {
        let path = join_href(opf_dir, &nav_item.href);
        match read_text(archive, &path) {
            Some(xml) => {
                let nav_dir = parent_dir(&path);
                let toc = parse_nav(&xml, &nav_dir, true)
                    .or_else(|| parse_nav(&xml, &nav_dir, false))
                    .unwrap_or_default();
                if !toc.is_empty() {
                    return toc;
                }
            }
            None => tracing::warn!(%path, "nav document named in manifest is missing"),
        }
    }

    // EPUB 2 NCX
    let ncx_item = opf
        .spine_toc
        .as_deref()
        .and_then(|toc_id| opf.manifest.iter().find(|i| i.id == toc_id))
        .or_else(|| {
            opf.manifest
                .iter()
                .find(|i| i.media_type.as_deref() == Some("application/x-dtbncx+xml"))
        });
    if let Some(item) = ncx_item {
        let path = join_href(opf_dir, &item.href);
        match read_text(archive, &path) {
            Some(xml) => match parse_ncx(&xml, &parent_dir(&path)) {
                Ok(toc) => return toc,
                Err(err) => tracing::warn!(%path, %err, "NCX parse failed, continuing without TOC"),
            },
            None => tracing::warn!(%path, "NCX named in manifest is missing"),
        }
    }

    Vec::new()
}

/// Parse an NCX navMap into a navigation tree
fn parse_ncx(xml: &str, ncx_dir: &str) -> Result<Vec<ContentManifestItem>> {
    let mut reader = Reader::from_str(xml);
    let mut roots: Vec<ContentManifestItem> = Vec::new();
    let mut stack: Vec<ContentManifestItem> = Vec::new();
    let mut in_label_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"navPoint" => stack.push(ContentManifestItem {
                    id: attr(&e, b"id").unwrap_or_default(),
                    level: stack.len(),
                    ..Default::default()
                }),
                b"text" => in_label_text = !stack.is_empty(),
                b"content" => set_nav_href(&mut stack, &e, ncx_dir),
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"content" {
                    set_nav_href(&mut stack, &e, ncx_dir);
                }
            }
            Ok(Event::Text(t)) => {
                if in_label_text {
                    if let Some(point) = stack.last_mut() {
                        let text = t.unescape().unwrap_or_default();
                        let text = text.trim();
                        if !text.is_empty() && point.title.is_none() {
                            point.title = Some(text.to_string());
                        }
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"text" => in_label_text = false,
                b"navPoint" => {
                    if let Some(done) = stack.pop() {
                        match stack.last_mut() {
                            Some(parent) => parent.children.push(done),
                            None => roots.push(done),
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(err.into()),
        }
    }

    Ok(roots)
}

fn set_nav_href(stack: &mut [ContentManifestItem], e: &BytesStart<'_>, dir: &str) {
    if let Some(point) = stack.last_mut() {
        if let Some(src) = attr(e, b"src") {
            let (path, fragment) = match src.split_once('#') {
                Some((p, f)) => (p, Some(f)),
                None => (src.as_str(), None),
            };
            let mut href = join_href(dir, path);
            if let Some(fragment) = fragment {
                href = format!("{href}#{fragment}");
            }
            point.href = Some(href);
        }
    }
}

/// Parse an EPUB 3 nav document.
///
/// With `require_toc` set, only a `<nav>` carrying `epub:type="toc"`
/// (or `role="doc-toc"`) is considered; the relaxed pass takes the
/// first `<nav>` in the document.
fn parse_nav(xml: &str, nav_dir: &str, require_toc: bool) -> Option<Vec<ContentManifestItem>> {
    let mut reader = Reader::from_str(xml);
    let mut roots: Vec<ContentManifestItem> = Vec::new();
    let mut stack: Vec<ContentManifestItem> = Vec::new();
    let mut in_nav = false;
    let mut capture_label = false;
    let mut found_nav = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"nav" if !found_nav => {
                    let nav_type = attr(&e, b"type").or_else(|| attr(&e, b"role"));
                    let is_toc = matches!(nav_type.as_deref(), Some("toc") | Some("doc-toc"));
                    if is_toc || !require_toc {
                        in_nav = true;
                        found_nav = true;
                    }
                }
                b"li" if in_nav => stack.push(ContentManifestItem {
                    level: stack.len(),
                    ..Default::default()
                }),
                b"a" | b"span" if in_nav && !stack.is_empty() => {
                    capture_label = true;
                    if e.local_name().as_ref() == b"a" {
                        if let Some(href) = attr(&e, b"href") {
                            let (path, fragment) = match href.split_once('#') {
                                Some((p, f)) => (p, Some(f)),
                                None => (href.as_str(), None),
                            };
                            let mut resolved = join_href(nav_dir, path);
                            if let Some(fragment) = fragment {
                                resolved = format!("{resolved}#{fragment}");
                            }
                            if let Some(item) = stack.last_mut() {
                                item.href = Some(resolved);
                            }
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if capture_label {
                    if let Some(item) = stack.last_mut() {
                        let text = t.unescape().unwrap_or_default();
                        let text = text.trim();
                        if !text.is_empty() {
                            match &mut item.title {
                                Some(existing) => {
                                    existing.push(' ');
                                    existing.push_str(text);
                                }
                                None => item.title = Some(text.to_string()),
                            }
                        }
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"a" | b"span" => capture_label = false,
                b"li" if in_nav => {
                    if let Some(done) = stack.pop() {
                        match stack.last_mut() {
                            Some(parent) => parent.children.push(done),
                            None => roots.push(done),
                        }
                    }
                }
                b"nav" if in_nav => break,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => break,
        }
    }

    if roots.is_empty() {
        None
    } else {
        Some(roots)
    }
}

// ── Cover resolution ────────────────────────────────────────────────────

/// Fallback chain: `<meta name="cover">` manifest lookup, then the
/// `cover-image` property, then any image item whose id mentions
/// "cover". Every failed step degrades instead of failing the parse.
fn resolve_cover<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    opf: &OpfPackage,
    opf_dir: &str,
) -> Option<CoverSource> {
    let by_meta = opf
        .metadata
        .cover_meta
        .as_deref()
        .and_then(|cover_id| opf.manifest.iter().find(|i| i.id == cover_id));

    let by_property = || {
        opf.manifest.iter().find(|i| {
            i.properties
                .as_deref()
                .is_some_and(|p| p.split(' ').any(|t| t == "cover-image"))
        })
    };

    let by_id = || {
        opf.manifest.iter().find(|i| {
            i.id.to_lowercase().contains("cover")
                && i.media_type.as_deref().is_some_and(|m| m.starts_with("image/"))
        })
    };

    let candidates = by_meta.into_iter().chain(by_property()).chain(by_id());
    for item in candidates {
        let path = join_href(opf_dir, &item.href);
        match read_bytes(archive, &path) {
            Some(data) => {
                return Some(CoverSource::Bytes {
                    data,
                    media_type: item.media_type.clone(),
                })
            }
            None => tracing::warn!(%path, "declared cover missing from container, trying next strategy"),
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPF: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://www.idpf.org/2007/opf" unique-identifier="uuid_id" version="2.0">
    <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
        <dc:title>Test Book</dc:title>
        <dc:creator opf:file-as="Author, Test" opf:role="aut">Test Author</dc:creator>
        <dc:language>en</dc:language>
        <dc:subject>Fiction</dc:subject>
        <dc:subject>Testing</dc:subject>
        <dc:identifier opf:scheme="ISBN">978-1234567890</dc:identifier>
        <meta name="cover" content="cover-img"/>
    </metadata>
    <manifest>
        <item id="cover-img" href="images/cover.jpg" media-type="image/jpeg"/>
        <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
        <item id="ch1" href="text/ch1.xhtml" media-type="application/xhtml+xml"/>
        <item id="ch2" href="text/ch2.xhtml" media-type="application/xhtml+xml"/>
    </manifest>
    <spine toc="ncx">
        <itemref idref="ch1"/>
        <itemref idref="ch2"/>
    </spine>
</package>"#;

    #[test]
    fn parses_opf_metadata_and_spine() {
        let opf = parse_opf(OPF).unwrap();
        assert_eq!(opf.metadata.title.as_deref(), Some("Test Book"));
        assert_eq!(opf.metadata.creators, vec!["Test Author"]);
        assert_eq!(opf.metadata.language.as_deref(), Some("en"));
        assert_eq!(opf.metadata.subjects, vec!["Fiction", "Testing"]);
        assert_eq!(
            opf.metadata.identifiers.get("isbn").map(String::as_str),
            Some("978-1234567890")
        );
        assert_eq!(opf.metadata.cover_meta.as_deref(), Some("cover-img"));
        assert_eq!(opf.spine, vec!["ch1", "ch2"]);
        assert_eq!(opf.spine_toc.as_deref(), Some("ncx"));
        assert_eq!(opf.manifest.len(), 4);
    }

    #[test]
    fn parses_nested_ncx() {
        let ncx = r#"<?xml version="1.0"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <docTitle><text>Test Book</text></docTitle>
  <navMap>
    <navPoint id="np-1" playOrder="1">
      <navLabel><text>Part One</text></navLabel>
      <content src="text/ch1.xhtml"/>
      <navPoint id="np-2" playOrder="2">
        <navLabel><text>Chapter 1</text></navLabel>
        <content src="text/ch1.xhtml#s1"/>
      </navPoint>
    </navPoint>
    <navPoint id="np-3" playOrder="3">
      <navLabel><text>Part Two</text></navLabel>
      <content src="text/ch2.xhtml"/>
    </navPoint>
  </navMap>
</ncx>"#;

        let toc = parse_ncx(ncx, "OEBPS").unwrap();
        assert_eq!(toc.len(), 2);
        assert_eq!(toc[0].title.as_deref(), Some("Part One"));
        assert_eq!(toc[0].href.as_deref(), Some("OEBPS/text/ch1.xhtml"));
        assert_eq!(toc[0].level, 0);
        assert_eq!(toc[0].children.len(), 1);
        assert_eq!(toc[0].children[0].title.as_deref(), Some("Chapter 1"));
        assert_eq!(toc[0].children[0].href.as_deref(), Some("OEBPS/text/ch1.xhtml#s1"));
        assert_eq!(toc[0].children[0].level, 1);
        assert_eq!(toc[1].title.as_deref(), Some("Part Two"));
    }

    #[test]
    fn parses_epub3_nav_document() {
        let nav = r#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head><title>Nav</title></head>
<body>
  <nav epub:type="toc">
    <ol>
      <li><a href="ch1.xhtml">Chapter 1</a>
        <ol><li><a href="ch1.xhtml#sec">Section</a></li></ol>
      </li>
      <li><a href="ch2.xhtml">Chapter 2</a></li>
    </ol>
  </nav>
</body>
</html>"#;

        let toc = parse_nav(nav, "OEBPS", true).unwrap();
        assert_eq!(toc.len(), 2);
        assert_eq!(toc[0].title.as_deref(), Some("Chapter 1"));
        assert_eq!(toc[0].href.as_deref(), Some("OEBPS/ch1.xhtml"));
        assert_eq!(toc[0].children.len(), 1);
        assert_eq!(toc[0].children[0].title.as_deref(), Some("Section"));
        assert_eq!(toc[1].title.as_deref(), Some("Chapter 2"));
    }

    #[test]
    fn join_href_collapses_components() {
        assert_eq!(join_href("OEBPS", "text/ch1.xhtml"), "OEBPS/text/ch1.xhtml");
        assert_eq!(join_href("OEBPS/text", "../images/cover.jpg"), "OEBPS/images/cover.jpg");
        assert_eq!(join_href("", "ch1.xhtml"), "ch1.xhtml");
        assert_eq!(join_href("OEBPS", "./toc.ncx"), "OEBPS/toc.ncx");
    }

    #[test]
    fn rootfile_path_from_container() {
        let container = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;
        assert_eq!(rootfile_path(container).unwrap().as_deref(), Some("OEBPS/content.opf"));
    }
}
