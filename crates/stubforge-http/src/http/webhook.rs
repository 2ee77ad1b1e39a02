//! Webhook dispatch.
//!
//! A matched mapping can fire out-of-band HTTP calls. Each call is built
//! from its configured [`WebhookRequest`] (optionally rewritten by a
//! templating engine), synthesized into a loopback [`RequestMessage`] and
//! sent through the injected client. Dispatch is fire-and-forget relative
//! to the primary response path: every webhook runs as its own detached
//! task and failures are only surfaced to the log.

use super::client::HttpClient;
use super::response_assembler::{self, AssembleError};
use crate::mapping::Mapping;
use crate::model::{
    BodyData, RequestMessage, ResponseMessage, WebhookBody, WebhookRequest,
};
use crate::settings::ServerSettings;
use crate::transform::{TransformError, Transformer};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Client address stamped on synthesized webhook requests.
const WEBHOOK_CLIENT_IP: &str = "::1";

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("webhook transformation failed: {0}")]
    Transform(#[from] TransformError),
    #[error("invalid webhook method '{0}'")]
    InvalidMethod(String),
    #[error("invalid webhook request: {0}")]
    InvalidRequest(String),
    #[error("webhook call failed: {0}")]
    Http(String),
    #[error(transparent)]
    Reply(#[from] AssembleError),
}

/// Builds and sends webhook calls for matched mappings.
#[derive(Clone)]
pub struct WebhookSender {
    settings: Arc<ServerSettings>,
}

impl WebhookSender {
    pub fn new(settings: Arc<ServerSettings>) -> Self {
        Self { settings }
    }

    /// Build and send exactly one webhook call, returning the eventual
    /// reply. The caller decides whether to await; the primary response
    /// path never does (see [`dispatch_all`](Self::dispatch_all)).
    pub async fn send(
        &self,
        client: &HttpClient,
        mapping: &Mapping,
        webhook: &WebhookRequest,
        original_request: &RequestMessage,
        original_response: &ResponseMessage,
    ) -> Result<ResponseMessage, WebhookError> {
        let (body, headers) = if webhook.use_transformer {
            let transformer = Transformer::for_kind(webhook.transformer, &self.settings)?;
            transformer.transform(
                mapping,
                original_request,
                original_response,
                webhook.body.as_ref(),
                &webhook.headers,
                webhook.replace_node,
            )?
        } else {
            (
                webhook.body.clone().map(body_from_config),
                webhook.headers.clone(),
            )
        };

        // Synthesize the outbound request message: loopback origin,
        // stamped with the current UTC time by construction.
        let mut message =
            RequestMessage::new(&webhook.method, webhook.url.clone(), WEBHOOK_CLIENT_IP);
        message.headers = headers;
        message.body = body;

        let request = to_protocol_request(&message)?;
        debug!(url = %message.url, method = %message.method, "dispatching webhook");
        let response = client
            .request(request)
            .await
            .map_err(|e| WebhookError::Http(e.to_string()))?;

        // The webhook URL sits on both sides of the assembly, so the
        // location rewrite can never apply to a webhook reply.
        Ok(response_assembler::assemble(response, &message.url, &message.url, false, false).await?)
    }

    /// Fire every webhook configured on the mapping, each as its own
    /// detached task. Failure of one call never cancels or delays the
    /// others; outcomes go to the log only. The returned handles exist for
    /// observers (tests, drain-on-shutdown) - request handling must not
    /// await them.
    pub fn dispatch_all(
        &self,
        client: &HttpClient,
        mapping: &Arc<Mapping>,
        original_request: &Arc<RequestMessage>,
        original_response: &Arc<ResponseMessage>,
    ) -> Vec<JoinHandle<()>> {
        mapping
            .webhooks
            .iter()
            .cloned()
            .map(|webhook| {
                let sender = self.clone();
                let client = client.clone();
                let mapping = Arc::clone(mapping);
                let request = Arc::clone(original_request);
                let response = Arc::clone(original_response);
                tokio::spawn(async move {
                    match sender
                        .send(&client, &mapping, &webhook, &request, &response)
                        .await
                    {
                        Ok(reply) => debug!(
                            url = %webhook.url,
                            status = reply.status_code,
                            "webhook delivered"
                        ),
                        Err(error) => warn!(url = %webhook.url, %error, "webhook failed"),
                    }
                })
            })
            .collect()
    }
}

/// Materialize a configured webhook body.
pub(crate) fn body_from_config(body: WebhookBody) -> BodyData {
    match body {
        WebhookBody::Text(text) => BodyData::from_text(text),
        WebhookBody::Json(json) => BodyData::from_json(json),
    }
}

/// Convert a synthesized message to a protocol-level request.
fn to_protocol_request(
    message: &RequestMessage,
) -> Result<Request<BoxBody<Bytes, hyper::Error>>, WebhookError> {
    let method: Method = message
        .method
        .parse()
        .map_err(|_| WebhookError::InvalidMethod(message.method.clone()))?;

    let mut builder = Request::builder().method(method).uri(message.url.as_str());
    for (name, values) in message.headers.iter() {
        for value in values {
            builder = builder.header(name, value.as_str());
        }
    }

    let payload = message
        .body
        .as_ref()
        .map(|b| b.wire_bytes())
        .unwrap_or_default();
    builder
        .body(
            Full::new(payload)
                .map_err(|never: Infallible| match never {})
                .boxed(),
        )
        .map_err(|e| WebhookError::InvalidRequest(e.to_string()))
}
