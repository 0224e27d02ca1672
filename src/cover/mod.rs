//! Cover image normalization
//!
//! Adapters hand back covers in whatever shape their format offers:
//! raw image bytes, an embedded data URL, or a remote URL. This module
//! converts any of those into a canonical `{bytes, data URL}` pair.
//! Every conversion fails soft: an unreadable cover degrades to an
//! empty pair and never fails the surrounding ingestion.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine as _;

/// A cover image as produced by an adapter
#[derive(Debug, Clone)]
pub enum CoverSource {
    /// Raw image bytes, with the media type declared by the container
    /// when it had one
    Bytes {
        data: Vec<u8>,
        media_type: Option<String>,
    },
    /// An inline `data:` URL
    DataUrl(String),
    /// A remote image location
    Remote(String),
}

/// Canonical cover representation
#[derive(Debug, Clone, Default)]
pub struct NormalizedCover {
    /// Decoded image bytes
    pub data: Option<Vec<u8>>,
    /// Base64 data URL suitable for direct embedding
    pub data_url: Option<String>,
}

impl NormalizedCover {
    pub fn is_empty(&self) -> bool {
        self.data.is_none() && self.data_url.is_none()
    }
}

/// Converts adapter cover output into the canonical pair
#[derive(Debug, Clone, Default)]
pub struct CoverNormalizer {
    client: reqwest::Client,
}

impl CoverNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize an optional cover source. Never errors.
    pub async fn normalize(&self, source: Option<CoverSource>) -> NormalizedCover {
        match source {
            None => NormalizedCover::default(),
            Some(CoverSource::Bytes { data, media_type }) => {
                encode_cover(data, media_type.as_deref())
            }
            Some(CoverSource::DataUrl(url)) => decode_data_url(&url)
                .map(|data| NormalizedCover {
                    data: Some(data),
                    data_url: Some(url),
                })
                .unwrap_or_else(|| {
                    tracing::warn!("cover data URL could not be decoded, dropping cover");
                    NormalizedCover::default()
                }),
            Some(CoverSource::Remote(url)) => match self.fetch(&url).await {
                Some((data, media_type)) => encode_cover(data, media_type.as_deref()),
                None => NormalizedCover::default(),
            },
        }
    }

    async fn fetch(&self, url: &str) -> Option<(Vec<u8>, Option<String>)> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(err) => {
                tracing::warn!(%url, %err, "cover fetch failed");
                return None;
            }
        };
        let response = match response.error_for_status() {
            Ok(r) => r,
            Err(err) => {
                tracing::warn!(%url, %err, "cover fetch returned an error status");
                return None;
            }
        };
        let media_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        match response.bytes().await {
            Ok(bytes) => Some((bytes.to_vec(), media_type)),
            Err(err) => {
                tracing::warn!(%url, %err, "cover body read failed");
                None
            }
        }
    }
}

/// Encode raw image bytes as a data URL.
///
/// The media type is resolved through an ordered strategy list: content
/// sniffing first, then the declared type, then a generic fallback.
pub fn encode_cover(data: Vec<u8>, declared_media_type: Option<&str>) -> NormalizedCover {
    let media_type = sniff_media_type(&data)
        .or_else(|| declared_media_type.map(|m| m.to_string()))
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let data_url = format!("data:{};base64,{}", media_type, STANDARD.encode(&data));
    NormalizedCover {
        data: Some(data),
        data_url: Some(data_url),
    }
}

/// Decode a `data:*;base64,...` URL back into bytes.
///
/// Payloads in the wild sometimes drop base64 padding, so decoding
/// falls through an ordered engine list before giving up.
pub fn decode_data_url(url: &str) -> Option<Vec<u8>> {
    let rest = url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    if !header.ends_with(";base64") {
        // Percent-encoded text payloads are not cover material
        return None;
    }
    let payload = payload.trim();
    STANDARD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload.trim_end_matches('=')))
        .ok()
}

fn sniff_media_type(data: &[u8]) -> Option<String> {
    image::guess_format(data)
        .ok()
        .map(|f| f.to_mime_type().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Smallest valid PNG: 1x1 transparent pixel
    const PNG_1X1: &str =
        "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    fn png_bytes() -> Vec<u8> {
        STANDARD.decode(PNG_1X1).unwrap()
    }

    #[test]
    fn encode_sniffs_png() {
        let cover = encode_cover(png_bytes(), None);
        let url = cover.data_url.unwrap();
        assert!(url.starts_with("data:image/png;base64,"), "got {url}");
    }

    #[test]
    fn encode_falls_back_to_declared_type() {
        let cover = encode_cover(vec![1, 2, 3, 4], Some("image/x-custom"));
        assert!(cover.data_url.unwrap().starts_with("data:image/x-custom;base64,"));
    }

    #[test]
    fn round_trip_is_identity() {
        let original = png_bytes();
        let cover = encode_cover(original.clone(), None);
        let decoded = decode_data_url(&cover.data_url.unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn decodes_unpadded_payload() {
        let data = b"hello".to_vec();
        let unpadded = STANDARD_NO_PAD.encode(&data);
        let url = format!("data:application/octet-stream;base64,{unpadded}");
        assert_eq!(decode_data_url(&url).unwrap(), data);
    }

    #[test]
    fn rejects_non_base64_data_url() {
        assert!(decode_data_url("data:text/plain,hello").is_none());
        assert!(decode_data_url("http://example.com/x.png").is_none());
    }

    #[tokio::test]
    async fn normalize_none_is_empty() {
        let normalizer = CoverNormalizer::new();
        assert!(normalizer.normalize(None).await.is_empty());
    }

    #[tokio::test]
    async fn normalize_bad_data_url_is_empty() {
        let normalizer = CoverNormalizer::new();
        let result = normalizer
            .normalize(Some(CoverSource::DataUrl("data:image/png;base64,!!!".into())))
            .await;
        assert!(result.is_empty());
    }
}
