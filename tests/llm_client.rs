//! StreamingAnswerClient tests that need no live backend.
//!
//! The SSE frame parsing itself is unit-tested in `llm::sse`; this covers
//! the request lifecycle around it.

use quiz_lens::settings::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use quiz_lens::{AnswerClient, ApiConfig, ScanError, StreamingAnswerClient};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// One-shot HTTP server: accept a single connection, swallow the request,
/// reply with `body` as an event stream.
async fn serve_sse_once(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        // Read until the header terminator; the request body is irrelevant.
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            if request.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });
    format!("http://{}/v1/chat/completions", addr)
}

fn unconfigured() -> StreamingAnswerClient {
    StreamingAnswerClient::new(ApiConfig {
        api_key: String::new(),
        model: DEFAULT_MODEL.to_string(),
        endpoint: DEFAULT_ENDPOINT.to_string(),
    })
}

#[tokio::test]
async fn missing_credential_is_a_single_error_emission() {
    let client = unconfigured();
    let mut rx = client.stream_answer("What is the capital of France?");

    match rx.recv().await {
        Some(Err(ScanError::CredentialMissing)) => {}
        other => panic!("expected CredentialMissing, got {:?}", other.map(|r| r.map_err(|e| e.to_string()))),
    }
    assert!(rx.recv().await.is_none(), "stream must close after the error");
}

#[tokio::test]
async fn missing_credential_fails_single_shot_too() {
    let client = unconfigured();
    match client.answer_once("What is the capital of France?").await {
        Err(ScanError::CredentialMissing) => {}
        other => panic!("expected CredentialMissing, got {:?}", other.map_err(|e| e.to_string())),
    }
}

#[tokio::test]
async fn malformed_stream_frame_is_skipped_not_fatal() {
    // A bad frame in the middle must be logged and skipped; the partials
    // around it still accumulate and the terminator still closes cleanly.
    const BODY: &str = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"Par\"}}]}\n\n",
        "data: {broken json\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"is\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    let endpoint = serve_sse_once(BODY).await;
    let client = StreamingAnswerClient::new(ApiConfig {
        api_key: "test-key".to_string(),
        model: DEFAULT_MODEL.to_string(),
        endpoint,
    });

    let mut rx = client.stream_answer("What is the capital of France?");
    let mut partials = Vec::new();
    while let Some(event) = rx.recv().await {
        partials.push(event.expect("stream must continue past the bad frame"));
    }

    assert_eq!(partials, vec!["Par".to_string(), "Paris".to_string()]);
}

#[tokio::test]
async fn unreachable_endpoint_is_a_single_network_error() {
    // Port 1 on loopback: connection refused almost immediately.
    let client = StreamingAnswerClient::new(ApiConfig {
        api_key: "test-key".to_string(),
        model: DEFAULT_MODEL.to_string(),
        endpoint: "http://127.0.0.1:1/v1/chat/completions".to_string(),
    });
    let mut rx = client.stream_answer("What is the capital of France?");

    match rx.recv().await {
        Some(Err(ScanError::Network(_))) => {}
        other => panic!("expected Network error, got {:?}", other.map(|r| r.map_err(|e| e.to_string()))),
    }
    assert!(rx.recv().await.is_none());
}
