//! Configured webhook definition.

use super::headers::HeaderMultiMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Which templating engine rewrites the webhook body/headers.
///
/// Closed set: construction and dispatch match it exhaustively, so an
/// unsupported engine cannot slip through to a runtime default branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TransformerKind {
    #[default]
    Handlebars,
    /// Liquid templates.
    Liquid,
    /// Liquid with the DotLiquid-compatible model conventions.
    DotLiquid,
}

/// How a rendered JSON string node is put back into the body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReplaceNodeOptions {
    /// Re-type the node when the rendered text parses as JSON.
    #[default]
    Evaluate,
    /// Always keep the rendered text as a string node.
    KeepAsString,
}

/// A configured webhook body: a plain string or a JSON document.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum WebhookBody {
    Text(String),
    Json(Value),
}

/// One out-of-band HTTP call configured on a mapping.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    pub url: Url,

    #[serde(default = "default_method")]
    pub method: String,

    #[serde(default, skip_serializing_if = "HeaderMultiMap::is_empty")]
    pub headers: HeaderMultiMap,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<WebhookBody>,

    /// Run the configured body/headers through a templating engine before
    /// sending.
    #[serde(default)]
    pub use_transformer: bool,

    #[serde(default)]
    pub transformer: TransformerKind,

    #[serde(default)]
    pub replace_node: ReplaceNodeOptions,
}

fn default_method() -> String {
    "POST".to_string()
}

impl WebhookRequest {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            method: default_method(),
            headers: HeaderMultiMap::new(),
            body: None,
            use_transformer: false,
            transformer: TransformerKind::default(),
            replace_node: ReplaceNodeOptions::default(),
        }
    }
}
