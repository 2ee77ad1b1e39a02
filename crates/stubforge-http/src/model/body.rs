//! Body representation with retained raw bytes.

use bytes::Bytes;
use serde_json::Value;

/// A request/response body: the original raw bytes plus any decoded views
/// the parser produced. Immutable once built; downstream consumers that
/// need the body again must use the retained bytes, never the source
/// stream (which is single-pass).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyData {
    /// Raw bytes exactly as received, before any decompression.
    pub raw: Bytes,

    /// UTF-8 view of the (possibly decompressed) bytes, when they decode.
    pub text: Option<String>,

    /// Parsed JSON, when deserialization was requested and succeeded.
    pub json: Option<Value>,

    /// Content type the body arrived with, as observed on the wire.
    pub content_type: Option<String>,

    /// Content encoding the body arrived with.
    pub content_encoding: Option<String>,

    /// Whether decompression and/or deserialization actually happened.
    pub decoded: bool,
}

impl BodyData {
    /// A configured string body (webhook definitions, canned responses).
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            raw: Bytes::from(text.clone().into_bytes()),
            text: Some(text),
            ..Default::default()
        }
    }

    /// A configured JSON body.
    pub fn from_json(json: Value) -> Self {
        let text = json.to_string();
        Self {
            raw: Bytes::from(text.clone().into_bytes()),
            text: Some(text),
            json: Some(json),
            content_type: Some("application/json".to_string()),
            ..Default::default()
        }
    }

    /// An opaque byte body.
    pub fn from_bytes(raw: impl Into<Bytes>) -> Self {
        Self {
            raw: raw.into(),
            ..Default::default()
        }
    }

    /// Bytes to put on the wire: the decoded text when present, otherwise
    /// the retained raw bytes.
    pub fn wire_bytes(&self) -> Bytes {
        match &self.text {
            Some(text) => Bytes::from(text.clone().into_bytes()),
            None => self.raw.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}
