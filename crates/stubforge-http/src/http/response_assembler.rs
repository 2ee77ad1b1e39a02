//! Upstream response assembly.
//!
//! Translates a raw protocol response into a [`ResponseMessage`]: status
//! copied verbatim, headers carried over with order and multiplicity
//! intact, the body captured in a single pass and handed to the parser,
//! and absolute `Location` headers pointing at the proxied host re-based
//! onto the client-facing URL.

use super::body_parser;
use crate::model::{HeaderMultiMap, ResponseMessage};
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::Response;
use tracing::debug;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    #[error("failed to read upstream response body: {0}")]
    BodyRead(String),
}

/// Assemble an upstream response.
///
/// `upstream_url` is the proxied-to address the response came from;
/// `original_url` is the client-facing address the server was reached on.
/// The response body stream is consumed here exactly once; downstream
/// consumers use the retained bytes in the returned body.
pub async fn assemble<B>(
    upstream_response: Response<B>,
    upstream_url: &Url,
    original_url: &Url,
    deserialize_json: bool,
    decompress_gzip_and_deflate: bool,
) -> Result<ResponseMessage, AssembleError>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let (parts, body) = upstream_response.into_parts();
    let mut message = ResponseMessage::new(parts.status.as_u16());

    // One unified ordered multimap over everything the upstream sent;
    // repeated names keep every value.
    let mut unified = HeaderMultiMap::new();
    for (name, value) in parts.headers.iter() {
        unified.add(
            name.as_str(),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        );
    }

    // Capture the body before anything else: the source stream cannot be
    // re-read.
    let bytes = body
        .collect()
        .await
        .map_err(|e| AssembleError::BodyRead(e.to_string()))?
        .to_bytes();
    if !bytes.is_empty() {
        let content_type = unified.first("content-type").map(str::to_string);
        let content_encoding = unified.first("content-encoding").map(str::to_string);
        message.body = Some(body_parser::parse(
            bytes,
            content_type.as_deref(),
            content_encoding.as_deref(),
            deserialize_json,
            decompress_gzip_and_deflate,
        ));
    }

    for (name, values) in unified.iter() {
        if name.eq_ignore_ascii_case("location") {
            if let Some(rewritten) = values
                .first()
                .and_then(|value| rewrite_location(value, upstream_url, original_url))
            {
                debug!(location = %rewritten, "rewrote upstream location header");
                message.headers.add(name, rewritten);
                continue;
            }
        }
        message.headers.add_all(name, values.iter().cloned());
    }

    Ok(message)
}

/// Re-base an absolute redirect to the upstream host onto the original
/// URL. Anything else (relative, unparseable, different host) is left
/// for the caller to pass through unchanged.
fn rewrite_location(value: &str, upstream_url: &Url, original_url: &Url) -> Option<String> {
    let absolute = Url::parse(value).ok()?;
    let host = absolute.host_str()?;
    let upstream_host = upstream_url.host_str()?;
    if !host.eq_ignore_ascii_case(upstream_host) {
        return None;
    }

    let path_and_query = match absolute.query() {
        Some(query) => format!("{}?{}", absolute.path(), query),
        None => absolute.path().to_string(),
    };
    original_url
        .join(&path_and_query)
        .ok()
        .map(|rewritten| rewritten.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::Full;
    use serde_json::json;

    fn full(bytes: &'static [u8]) -> Full<Bytes> {
        Full::new(Bytes::from_static(bytes))
    }

    fn urls() -> (Url, Url) {
        (
            Url::parse("https://backend.internal").unwrap(),
            Url::parse("https://edge.example.com/proxy").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_status_and_headers_preserved() {
        let (upstream, original) = urls();
        let response = Response::builder()
            .status(418)
            .header("X-One", "1")
            .header("Set-Cookie", "a=1")
            .header("Set-Cookie", "b=2")
            .header("Content-Type", "text/plain")
            .body(full(b"short and stout"))
            .unwrap();

        let message = assemble(response, &upstream, &original, false, false)
            .await
            .unwrap();

        assert_eq!(message.status_code, 418);
        assert_eq!(message.headers.len(), 3);
        assert_eq!(message.headers.get("x-one").unwrap(), &["1".to_string()]);
        assert_eq!(
            message.headers.get("set-cookie").unwrap(),
            &["a=1".to_string(), "b=2".to_string()]
        );
        assert_eq!(
            message.body.unwrap().text.as_deref(),
            Some("short and stout")
        );
    }

    #[tokio::test]
    async fn test_location_rewritten_to_original_host() {
        let (upstream, original) = urls();
        let response = Response::builder()
            .status(302)
            .header("Location", "https://backend.internal/a/b")
            .body(full(b""))
            .unwrap();

        let message = assemble(response, &upstream, &original, false, false)
            .await
            .unwrap();

        assert_eq!(
            message.headers.first("location"),
            Some("https://edge.example.com/a/b")
        );
        assert!(message.body.is_none());
    }

    #[tokio::test]
    async fn test_location_with_query_rewritten() {
        let (upstream, original) = urls();
        let response = Response::builder()
            .status(302)
            .header("Location", "https://backend.internal/a?x=1&y=2")
            .body(full(b""))
            .unwrap();

        let message = assemble(response, &upstream, &original, false, false)
            .await
            .unwrap();

        assert_eq!(
            message.headers.first("location"),
            Some("https://edge.example.com/a?x=1&y=2")
        );
    }

    #[tokio::test]
    async fn test_location_other_host_passes_through() {
        let (upstream, original) = urls();
        let response = Response::builder()
            .status(302)
            .header("Location", "https://elsewhere.example.net/a")
            .body(full(b""))
            .unwrap();

        let message = assemble(response, &upstream, &original, false, false)
            .await
            .unwrap();

        assert_eq!(
            message.headers.first("location"),
            Some("https://elsewhere.example.net/a")
        );
    }

    #[tokio::test]
    async fn test_relative_location_passes_through() {
        let (upstream, original) = urls();
        let response = Response::builder()
            .status(302)
            .header("Location", "/relative/path")
            .body(full(b""))
            .unwrap();

        let message = assemble(response, &upstream, &original, false, false)
            .await
            .unwrap();

        assert_eq!(message.headers.first("location"), Some("/relative/path"));
    }

    #[tokio::test]
    async fn test_json_body_deserialized_when_requested() {
        let (upstream, original) = urls();
        let response = Response::builder()
            .status(200)
            .header("Content-Type", "application/json")
            .body(full(br#"{"ready": true}"#))
            .unwrap();

        let message = assemble(response, &upstream, &original, true, false)
            .await
            .unwrap();

        let body = message.body.unwrap();
        assert_eq!(body.json, Some(json!({"ready": true})));
        assert_eq!(body.content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_malformed_json_body_does_not_abort() {
        let (upstream, original) = urls();
        let response = Response::builder()
            .status(200)
            .header("Content-Type", "application/json")
            .body(full(b"{broken"))
            .unwrap();

        let message = assemble(response, &upstream, &original, true, false)
            .await
            .unwrap();

        let body = message.body.unwrap();
        assert!(body.json.is_none());
        assert_eq!(&body.raw[..], b"{broken");
    }

    #[test]
    fn test_rewrite_location_host_comparison_ignores_case() {
        let upstream = Url::parse("https://Backend.Internal").unwrap();
        let original = Url::parse("https://edge.example.com").unwrap();
        assert_eq!(
            rewrite_location("https://backend.internal/x", &upstream, &original),
            Some("https://edge.example.com/x".to_string())
        );
    }
}
