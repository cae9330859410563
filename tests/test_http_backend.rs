//! HttpBackend against a one-shot local HTTP server.

mod common;

use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use sticker_grid::{BackendConfig, HttpBackend, StickerBackend, StickerImage, Upscaler};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// What the server saw: request line and JSON body.
struct Captured {
    request_line: String,
    body: Value,
}

/// Serve exactly one request with `status` and `body`, returning the base URL.
async fn serve_once(status: u16, body: String) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 8192];
        let header_end = loop {
            let n = stream.read(&mut buf).await.unwrap();
            assert!(n > 0, "client closed early");
            raw.extend_from_slice(&buf[..n]);
            if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&raw[..header_end]).to_string();
        let content_length = head
            .lines()
            .find_map(|l| {
                let (name, value) = l.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())?
            })
            .unwrap_or(0);
        while raw.len() < header_end + content_length {
            let n = stream.read(&mut buf).await.unwrap();
            assert!(n > 0, "client closed early");
            raw.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 {} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.ok();

        Captured {
            request_line: head.lines().next().unwrap_or_default().to_string(),
            body: serde_json::from_slice(&raw[header_end..header_end + content_length])
                .unwrap_or(Value::Null),
        }
    });
    (url, handle)
}

fn backend(url: &str) -> HttpBackend {
    HttpBackend::new(&BackendConfig {
        base_url: url.to_string(),
        timeout_secs: 10,
    })
    .unwrap()
}

fn sticker(side: u32) -> StickerImage {
    StickerImage::from_bytes(common::solid_png(side, [10, 20, 30, 255])).unwrap()
}

#[tokio::test]
async fn upscale_sends_data_uri_and_target_size() {
    let reply = common::solid_png(64, [1, 1, 1, 255]);
    let body = json!({
        "image": format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(&reply))
    });
    let (url, server) = serve_once(200, body.to_string()).await;

    let bytes = backend(&url).upscale(&sticker(16), 64).await.unwrap();
    let captured = server.await.unwrap();

    assert_eq!(bytes, reply);
    assert!(captured.request_line.starts_with("POST /api/upscale "));
    assert_eq!(captured.body["targetSize"], 64);
    assert!(captured.body["image"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn labels_are_read_from_response() {
    let (url, server) = serve_once(200, json!({ "labels": ["wave", "wink"] }).to_string()).await;

    let labels = backend(&url).label_sheet(&sticker(8)).await.unwrap();
    let captured = server.await.unwrap();

    assert_eq!(labels, vec!["wave", "wink"]);
    assert!(captured.request_line.starts_with("POST /api/labels "));
}

#[tokio::test]
async fn generate_sends_prompt_and_references() {
    let reply = common::sheet_png(64, 64, 4, 4);
    let body = json!({ "image": general_purpose::STANDARD.encode(&reply) });
    let (url, server) = serve_once(200, body.to_string()).await;

    let bytes = backend(&url)
        .generate_sheet("grumpy frogs", &[sticker(4), sticker(4)])
        .await
        .unwrap();
    let captured = server.await.unwrap();

    assert_eq!(bytes, reply);
    assert_eq!(captured.body["prompt"], "grumpy frogs");
    assert_eq!(captured.body["referenceImages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn error_status_becomes_remote_operation() {
    let (url, server) = serve_once(500, json!({ "error": "model crashed" }).to_string()).await;

    let err = backend(&url)
        .regenerate_sticker(&sticker(8), "add a hat")
        .await
        .unwrap_err();
    let captured = server.await.unwrap();

    assert_eq!(err.category(), "remote_operation");
    assert!(err.to_string().contains("model crashed"));
    assert_eq!(captured.body["instruction"], "add a hat");
}

#[tokio::test]
async fn unreachable_backend_is_retryable() {
    use sticker_grid::Retryable;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = backend(&url).upscale(&sticker(8), 32).await.unwrap_err();

    assert_eq!(err.category(), "remote_operation");
    assert!(err.is_retryable());
}
