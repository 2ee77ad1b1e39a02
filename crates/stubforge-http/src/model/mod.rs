//! Internal message model.
//!
//! Requests, responses and bodies as the matching engine and the HTTP
//! pipeline see them. Instances are created per inbound request/response
//! and discarded after the pass completes; [`BodyData`] is immutable once
//! parsed.

mod body;
mod headers;
mod request;
mod response;
mod webhook;

pub use body::BodyData;
pub use headers::HeaderMultiMap;
pub use request::RequestMessage;
pub use response::ResponseMessage;
pub use webhook::{ReplaceNodeOptions, TransformerKind, WebhookBody, WebhookRequest};
