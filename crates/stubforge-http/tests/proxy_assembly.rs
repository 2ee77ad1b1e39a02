//! Integration tests: assembling upstream responses fetched through the
//! real pooled client.

use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use serde_json::json;
use std::convert::Infallible;
use std::io::Write;
use std::net::SocketAddr;
use stubforge_http::http::{assemble, create_http_client, HttpClient};
use tokio::net::TcpListener;
use url::Url;

/// Start a backend that answers every request with the given response.
async fn spawn_backend<F>(make_response: F) -> SocketAddr
where
    F: Fn(SocketAddr) -> Response<Full<Bytes>> + Clone + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let (stream, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            let make_response = make_response.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |_req: Request<Incoming>| {
                    let response = make_response(addr);
                    async move { Ok::<_, Infallible>(response) }
                });
                let _ = http1::Builder::new().serve_connection(io, service).await;
            });
        }
    });

    addr
}

async fn fetch(client: &HttpClient, url: &str) -> Response<Incoming> {
    let request = Request::builder()
        .method("GET")
        .uri(url)
        .body(BoxBody::new(
            Full::new(Bytes::new()).map_err(|never: Infallible| match never {}),
        ))
        .unwrap();
    client.request(request).await.unwrap()
}

#[tokio::test]
async fn test_redirect_to_upstream_host_is_rebased() {
    let addr = spawn_backend(|addr| {
        Response::builder()
            .status(302)
            .header("Location", format!("http://{addr}/a/b?next=1"))
            .header("X-Backend", "true")
            .body(Full::new(Bytes::new()))
            .unwrap()
    })
    .await;

    let client = create_http_client(&Default::default());
    let upstream_url = Url::parse(&format!("http://{addr}/")).unwrap();
    let original_url = Url::parse("https://edge.example.com/proxy").unwrap();

    let response = fetch(&client, &format!("http://{addr}/redirect")).await;
    let message = assemble(response, &upstream_url, &original_url, false, false)
        .await
        .unwrap();

    assert_eq!(message.status_code, 302);
    assert_eq!(
        message.headers.first("location"),
        Some("https://edge.example.com/a/b?next=1")
    );
    assert_eq!(message.headers.first("x-backend"), Some("true"));
}

#[tokio::test]
async fn test_gzip_json_body_decoded_end_to_end() {
    let addr = spawn_backend(|_| {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(br#"{"ready": true, "items": [1, 2]}"#).unwrap();
        let compressed = encoder.finish().unwrap();

        Response::builder()
            .status(200)
            .header("Content-Type", "application/json")
            .header("Content-Encoding", "gzip")
            .body(Full::new(Bytes::from(compressed)))
            .unwrap()
    })
    .await;

    let client = create_http_client(&Default::default());
    let upstream_url = Url::parse(&format!("http://{addr}/")).unwrap();
    let original_url = Url::parse("http://edge.example.com/").unwrap();

    let response = fetch(&client, &format!("http://{addr}/data")).await;
    let message = assemble(response, &upstream_url, &original_url, true, true)
        .await
        .unwrap();

    let body = message.body.unwrap();
    assert!(body.decoded);
    assert_eq!(body.json, Some(json!({"ready": true, "items": [1, 2]})));
    assert_eq!(body.content_encoding.as_deref(), Some("gzip"));
}
