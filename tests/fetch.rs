//! HttpFetcher against a local mock server.

use std::time::Duration;

use mdgate::{Fetch, GatewayError, HttpFetcher, DEFAULT_USER_AGENT};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serve one response that promises 1000 bytes, sends 10, then closes.
async fn truncated_body_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request: Vec<u8> = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }
        socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\n0123456789")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });
    format!("http://{addr}/doc.pdf")
}

#[tokio::test]
async fn fetch_streams_body_to_destination() {
    let server = MockServer::start().await;
    let body = vec![b'x'; 256 * 1024];
    Mock::given(method("GET"))
        .and(path("/big.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out");
    let fetcher = HttpFetcher::new(DEFAULT_USER_AGENT, None).unwrap();

    let written = fetcher
        .fetch(&format!("{}/big.bin", server.uri()), &dest)
        .await
        .expect("fetch ok");

    assert_eq!(written, body.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), body);
}

#[tokio::test]
async fn fetch_sends_browser_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let fetcher = HttpFetcher::new(DEFAULT_USER_AGENT, None).unwrap();
    fetcher
        .fetch(&format!("{}/doc", server.uri()), &dir.path().join("doc"))
        .await
        .expect("user agent should match");
}

#[tokio::test]
async fn fetch_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("missing");
    let fetcher = HttpFetcher::new(DEFAULT_USER_AGENT, None).unwrap();

    let err = fetcher
        .fetch(&format!("{}/missing", server.uri()), &dest)
        .await
        .unwrap_err();

    assert!(
        matches!(err, GatewayError::DownloadStatus { status: 404, .. }),
        "got: {err}"
    );
    assert_eq!(err.status_code(), 400);
    assert!(!dest.exists(), "no file is created for a rejected response");
}

#[tokio::test]
async fn fetch_reports_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let fetcher = HttpFetcher::new(DEFAULT_USER_AGENT, Some(Duration::from_secs(1))).unwrap();

    let err = fetcher
        .fetch(&format!("{}/slow", server.uri()), &dir.path().join("slow"))
        .await
        .unwrap_err();

    assert!(
        matches!(err, GatewayError::DownloadTimeout { secs: 1, .. }),
        "got: {err}"
    );
}

#[tokio::test]
async fn fetch_reports_unreachable_host() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let fetcher = HttpFetcher::new(DEFAULT_USER_AGENT, None).unwrap();

    let err = fetcher
        .fetch(&format!("http://127.0.0.1:{port}/doc"), &dir.path().join("doc"))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::DownloadFailed { .. }), "got: {err}");
    assert!(err.to_string().starts_with("Request error"));
}

#[tokio::test]
async fn fetch_reports_connection_dropped_mid_body() {
    let url = truncated_body_server().await;
    let dir = tempfile::tempdir().unwrap();
    let fetcher = HttpFetcher::new(DEFAULT_USER_AGENT, None).unwrap();

    let err = fetcher
        .fetch(&url, &dir.path().join("doc.pdf"))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::DownloadFailed { .. }), "got: {err}");
    assert_eq!(err.status_code(), 400);
}
