//! Tolerant body parsing.
//!
//! Parsing never fails: when the requested decoding cannot be applied
//! (truncated gzip, invalid JSON) the body degrades to its raw opaque
//! form and the caller proceeds with that.

use crate::model::BodyData;
use bytes::Bytes;
use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use std::io::Read;
use tracing::debug;

/// Parse a body captured from the wire.
///
/// `content_type` and `content_encoding` are the first observed header
/// values, if any. The two toggles independently request gzip/deflate
/// decompression and JSON deserialization.
pub fn parse(
    raw: Bytes,
    content_type: Option<&str>,
    content_encoding: Option<&str>,
    deserialize_json: bool,
    decompress_gzip_and_deflate: bool,
) -> BodyData {
    let mut decoded = false;

    let view = if decompress_gzip_and_deflate {
        match normalize_encoding(content_encoding).as_deref() {
            Some("gzip") => match gunzip(&raw) {
                Ok(bytes) => {
                    decoded = true;
                    Bytes::from(bytes)
                }
                Err(e) => {
                    debug!(error = %e, "gzip decompression failed, keeping raw body");
                    raw.clone()
                }
            },
            Some("deflate") => match inflate(&raw) {
                Ok(bytes) => {
                    decoded = true;
                    Bytes::from(bytes)
                }
                Err(e) => {
                    debug!(error = %e, "deflate decompression failed, keeping raw body");
                    raw.clone()
                }
            },
            _ => raw.clone(),
        }
    } else {
        raw.clone()
    };

    let text = String::from_utf8(view.to_vec()).ok();

    let json = if deserialize_json && wants_json(content_type) {
        match text.as_deref().map(serde_json::from_str::<serde_json::Value>) {
            Some(Ok(value)) => {
                decoded = true;
                Some(value)
            }
            Some(Err(e)) => {
                debug!(error = %e, "json deserialization failed, keeping body opaque");
                None
            }
            None => None,
        }
    } else {
        None
    };

    BodyData {
        raw,
        text,
        json,
        content_type: content_type.map(str::to_string),
        content_encoding: content_encoding.map(str::to_string),
        decoded,
    }
}

fn normalize_encoding(content_encoding: Option<&str>) -> Option<String> {
    content_encoding.map(|e| e.trim().to_ascii_lowercase())
}

/// JSON deserialization applies when the content type says json, or when
/// no content type was observed at all.
fn wants_json(content_type: Option<&str>) -> bool {
    match content_type {
        Some(ct) => ct.to_ascii_lowercase().contains("json"),
        None => true,
    }
}

fn gunzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut out)?;
    Ok(out)
}

fn inflate(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    // zlib-wrapped first; some servers send raw deflate without the wrapper
    let mut out = Vec::new();
    match ZlibDecoder::new(bytes).read_to_end(&mut out) {
        Ok(_) => Ok(out),
        Err(_) => {
            let mut out = Vec::new();
            DeflateDecoder::new(bytes).read_to_end(&mut out)?;
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
    use flate2::Compression;
    use serde_json::json;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_plain_text_body() {
        let body = parse(
            Bytes::from_static(b"hello"),
            Some("text/plain"),
            None,
            false,
            false,
        );
        assert_eq!(body.text.as_deref(), Some("hello"));
        assert!(body.json.is_none());
        assert!(!body.decoded);
        assert_eq!(&body.raw[..], b"hello");
    }

    #[test]
    fn test_json_deserialization() {
        let body = parse(
            Bytes::from_static(br#"{"a": 1}"#),
            Some("application/json; charset=utf-8"),
            None,
            true,
            false,
        );
        assert_eq!(body.json, Some(json!({"a": 1})));
        assert!(body.decoded);
    }

    #[test]
    fn test_json_toggle_off_keeps_string() {
        let body = parse(
            Bytes::from_static(br#"{"a": 1}"#),
            Some("application/json"),
            None,
            false,
            false,
        );
        assert!(body.json.is_none());
        assert_eq!(body.text.as_deref(), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn test_invalid_json_degrades_to_opaque() {
        let body = parse(
            Bytes::from_static(b"{not json"),
            Some("application/json"),
            None,
            true,
            false,
        );
        assert!(body.json.is_none());
        assert_eq!(body.text.as_deref(), Some("{not json"));
        assert_eq!(&body.raw[..], b"{not json");
    }

    #[test]
    fn test_gzip_decompression() {
        let compressed = gzip(br#"{"ok": true}"#);
        let body = parse(
            Bytes::from(compressed.clone()),
            Some("application/json"),
            Some("gzip"),
            true,
            true,
        );
        assert_eq!(body.json, Some(json!({"ok": true})));
        assert!(body.decoded);
        // Raw bytes stay compressed for re-emission
        assert_eq!(&body.raw[..], &compressed[..]);
    }

    #[test]
    fn test_gzip_toggle_off_keeps_compressed() {
        let compressed = gzip(b"payload");
        let body = parse(Bytes::from(compressed.clone()), None, Some("gzip"), false, false);
        assert!(!body.decoded);
        assert_eq!(&body.raw[..], &compressed[..]);
    }

    #[test]
    fn test_corrupt_gzip_degrades_to_raw() {
        let body = parse(
            Bytes::from_static(b"\x1f\x8b-not-really-gzip"),
            None,
            Some("gzip"),
            false,
            true,
        );
        assert!(!body.decoded);
        assert_eq!(&body.raw[..], b"\x1f\x8b-not-really-gzip");
    }

    #[test]
    fn test_zlib_deflate_decompression() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"zlib payload").unwrap();
        let compressed = encoder.finish().unwrap();

        let body = parse(Bytes::from(compressed), None, Some("deflate"), false, true);
        assert_eq!(body.text.as_deref(), Some("zlib payload"));
        assert!(body.decoded);
    }

    #[test]
    fn test_raw_deflate_fallback() {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"raw deflate payload").unwrap();
        let compressed = encoder.finish().unwrap();

        let body = parse(Bytes::from(compressed), None, Some("deflate"), false, true);
        assert_eq!(body.text.as_deref(), Some("raw deflate payload"));
    }

    #[test]
    fn test_binary_body_has_no_text_view() {
        let body = parse(Bytes::from_static(&[0xff, 0xfe, 0x00]), None, None, false, false);
        assert!(body.text.is_none());
        assert_eq!(&body.raw[..], &[0xff, 0xfe, 0x00]);
    }
}
