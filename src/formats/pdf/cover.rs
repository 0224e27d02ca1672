//! Cover extraction for paged documents
//!
//! A structural parser cannot rasterize arbitrary page content, so the
//! cover comes from a cascade of cheaper strategies: the first image
//! XObject embedded on page 1 (scanned covers and title pages are
//! almost always a single full-page image), then a synthesized
//! placeholder, then a fixed 1x1 image constant. Each step fails soft
//! so a PDF always yields a usable cover.

use std::collections::BTreeMap;
use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::cover::CoverSource;

use super::parser::{resolve, resolve_dict};

/// Smallest valid PNG: 1x1 transparent pixel. Last resort when even
/// placeholder synthesis fails.
const PLACEHOLDER_PNG_B64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub fn extract_cover(doc: &Document, pages: &BTreeMap<u32, ObjectId>) -> CoverSource {
    if let Some(first_page) = pages.values().next() {
        match first_page_image(doc, *first_page) {
            Some(cover) => return cover,
            None => tracing::debug!("no usable embedded image on page 1, synthesizing placeholder"),
        }
    }
    placeholder_cover()
}

/// First decodable image XObject on the given page.
fn first_page_image(doc: &Document, page_id: ObjectId) -> Option<CoverSource> {
    let resources = page_resources(doc, page_id)?;
    let xobjects = resources.get(b"XObject").ok().and_then(|o| resolve_dict(doc, o))?;

    for (_name, obj) in xobjects.iter() {
        let Object::Stream(stream) = resolve(doc, obj) else {
            continue;
        };
        let dict = &stream.dict;
        let is_image = matches!(
            dict.get(b"Subtype").ok().map(|s| resolve(doc, s)),
            Some(Object::Name(subtype)) if subtype.as_slice() == b"Image"
        );
        if !is_image {
            continue;
        }

        // DCTDecode content is a ready-to-use JPEG
        if has_filter(doc, dict, b"DCTDecode") {
            return Some(CoverSource::Bytes {
                data: stream.content.clone(),
                media_type: Some("image/jpeg".to_string()),
            });
        }

        // Uncompressed or flate raster: rebuild through `image`
        if let Some(cover) = rebuild_raster(doc, dict, stream) {
            return Some(cover);
        }
    }

    None
}

fn has_filter(doc: &Document, dict: &Dictionary, filter: &[u8]) -> bool {
    match dict.get(b"Filter").ok().map(|f| resolve(doc, f)) {
        Some(Object::Name(name)) => name.as_slice() == filter,
        Some(Object::Array(names)) => names.iter().any(|n| {
            matches!(n, Object::Name(name) if name.as_slice() == filter)
        }),
        _ => false,
    }
}

/// Re-encode an 8-bit RGB or grayscale raster as PNG.
fn rebuild_raster(
    doc: &Document,
    dict: &Dictionary,
    stream: &lopdf::Stream,
) -> Option<CoverSource> {
    let width = dict_u32(doc, dict, b"Width")?;
    let height = dict_u32(doc, dict, b"Height")?;
    let bits = dict_u32(doc, dict, b"BitsPerComponent").unwrap_or(8);
    if bits != 8 {
        return None;
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let colorspace = match dict.get(b"ColorSpace").ok().map(|c| resolve(doc, c)) {
        Some(Object::Name(name)) => name.clone(),
        _ => return None,
    };

    // Declared dimensions are untrusted; overflowing or absurd sizes
    // bail to the next cascade step instead of panicking.
    let pixels = (width as u64).checked_mul(height as u64)?;
    let image = match colorspace.as_slice() {
        b"DeviceRGB" => {
            let len = usize::try_from(pixels.checked_mul(3)?).ok()?;
            let raw = data.get(..len)?.to_vec();
            image::RgbImage::from_raw(width, height, raw).map(image::DynamicImage::ImageRgb8)
        }
        b"DeviceGray" => {
            let len = usize::try_from(pixels).ok()?;
            let raw = data.get(..len)?.to_vec();
            image::GrayImage::from_raw(width, height, raw).map(image::DynamicImage::ImageLuma8)
        }
        _ => None,
    }?;

    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .ok()?;
    Some(CoverSource::Bytes {
        data: buf,
        media_type: Some("image/png".to_string()),
    })
}

fn dict_u32(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<u32> {
    match dict.get(key).ok().map(|o| resolve(doc, o)) {
        Some(Object::Integer(n)) if *n >= 0 => Some(*n as u32),
        _ => None,
    }
}

/// Walk the page's Parent chain for the Resources dictionary.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..32 {
        if let Some(resources) = current.get(b"Resources").ok().and_then(|o| resolve_dict(doc, o)) {
            return Some(resources);
        }
        current = current.get(b"Parent").ok().and_then(|o| resolve_dict(doc, o))?;
    }
    None
}

fn placeholder_cover() -> CoverSource {
    let pixel = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 0]));
    let mut buf = Vec::new();
    let encoded = image::DynamicImage::ImageRgba8(pixel)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .is_ok();

    let data = if encoded {
        buf
    } else {
        // Encoder unavailable: fall back to the fixed constant
        STANDARD.decode(PLACEHOLDER_PNG_B64).unwrap_or_default()
    };
    CoverSource::Bytes {
        data,
        media_type: Some("image/png".to_string()),
    }
}
