//! HTTP pipeline: the outbound client, body parsing, upstream response
//! assembly and webhook dispatch.

pub mod body_parser;
pub mod client;
pub mod response_assembler;
mod tls;
pub mod webhook;

pub use client::{create_http_client, HttpClient};
pub use response_assembler::{assemble, AssembleError};
pub use webhook::{WebhookError, WebhookSender};
