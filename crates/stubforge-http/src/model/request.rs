//! Inbound (or synthesized) request message.

use super::body::BodyData;
use super::headers::HeaderMultiMap;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use url::Url;

/// A request as the matching engine sees it.
///
/// Created once per inbound request (or synthesized for a webhook call)
/// and discarded when the pass completes.
#[derive(Debug, Clone)]
pub struct RequestMessage {
    pub method: String,
    pub url: Url,
    /// Address the request came from (loopback for synthesized requests).
    pub client_ip: String,
    pub timestamp: DateTime<Utc>,
    pub headers: HeaderMultiMap,
    pub body: Option<BodyData>,
}

impl RequestMessage {
    pub fn new(method: &str, url: Url, client_ip: &str) -> Self {
        Self {
            method: method.to_uppercase(),
            url,
            client_ip: client_ip.to_string(),
            timestamp: Utc::now(),
            headers: HeaderMultiMap::new(),
            body: None,
        }
    }

    /// Path component of the URL.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Decoded query parameters. Repeated keys keep the last value.
    pub fn query(&self) -> HashMap<String, String> {
        self.url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Body as text, when one is present and decodes.
    pub fn body_text(&self) -> Option<&str> {
        self.body.as_ref().and_then(|b| b.text.as_deref())
    }
}
