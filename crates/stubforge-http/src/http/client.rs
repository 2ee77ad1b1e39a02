//! Outbound HTTP client.
//!
//! The pipeline does not own timeouts or cancellation for webhook and
//! proxy calls; that policy lives in this client's configuration.

use super::tls::NoVerifier;
use crate::settings::HttpClientSettings;
use http_body_util::combinators::BoxBody;
use hyper::body::Bytes;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Shared pooled client used for webhook dispatch and proxying.
pub type HttpClient = Client<
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
    BoxBody<Bytes, hyper::Error>,
>;

/// Build the pooled client from settings.
pub fn create_http_client(settings: &HttpClientSettings) -> HttpClient {
    let mut http_connector = hyper_util::client::legacy::connect::HttpConnector::new();
    http_connector.set_keepalive(Some(Duration::from_secs(settings.keepalive_secs)));
    http_connector.set_connect_timeout(Some(Duration::from_secs(settings.connect_timeout_secs)));
    http_connector.enforce_http(false); // plain HTTP targets stay allowed

    let https_connector = if settings.skip_tls_verify {
        warn!("TLS certificate verification disabled for outbound calls (development only)");
        hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(
                rustls::ClientConfig::builder()
                    .dangerous()
                    .with_custom_certificate_verifier(Arc::new(NoVerifier))
                    .with_no_client_auth(),
            )
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector)
    } else {
        hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .expect("failed to load native root certificates")
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector)
    };

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(settings.pool_idle_timeout_secs))
        .pool_max_idle_per_host(settings.pool_max_idle_per_host)
        .build(https_connector)
}
