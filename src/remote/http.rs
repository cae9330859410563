//! # HTTP Backend Client
//!
//! JSON-over-HTTP client for the sticker backend. Pictures travel as base64
//! `data:` URIs in both directions.
//!
//! | Endpoint | Request | Response |
//! |---|---|---|
//! | `POST /api/labels` | `{image}` | `{labels: [..]}` |
//! | `POST /api/upscale` | `{image, targetSize}` | `{image}` |
//! | `POST /api/generate` | `{prompt, referenceImages: [..]}` | `{image}` |
//! | `POST /api/regenerate` | `{image, instruction}` | `{image}` |
//!
//! Any non-2xx status becomes `RemoteOperation` carrying the body's `error`
//! (or `message`) field, falling back to the raw body text.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::BackendConfig;
use crate::error::{StickerError, StickerResult};
use crate::payload::{parse_data_uri, StickerImage};
use crate::remote::{StickerBackend, Upscaler};

const MAX_ERROR_CHARS: usize = 300;

/// Backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Build a client for `config.base_url` with the configured timeout.
    pub fn new(config: &BackendConfig) -> StickerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                StickerError::config("backend", config.base_url.clone(), e.to_string())
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    async fn post_json(&self, operation: &str, path: &str, payload: &Value) -> StickerResult<Value> {
        let url = self.endpoint(path);
        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                StickerError::remote(operation, None, e.to_string())
                    .with_metadata("url", url.clone())
                    .with_recovery_suggestion("Check that the backend is running and reachable")
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StickerError::remote(
                operation,
                Some(status.as_u16()),
                error_message_from_body(&body, status.canonical_reason()),
            )
            .with_metadata("url", url));
        }

        response.json::<Value>().await.map_err(|e| {
            StickerError::remote(
                operation,
                Some(status.as_u16()),
                format!("invalid JSON response: {}", e),
            )
        })
    }

    async fn post_for_image(&self, operation: &str, path: &str, payload: &Value) -> StickerResult<Vec<u8>> {
        let body = self.post_json(operation, path, payload).await?;
        image_from_response(operation, &body)
    }
}

/// Pull a human-readable message out of an error body.
pub(crate) fn error_message_from_body(body: &str, fallback: Option<&str>) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["error", "message"] {
            match value.get(key) {
                Some(Value::String(msg)) if !msg.trim().is_empty() => return msg.trim().to_string(),
                Some(Value::Object(inner)) => {
                    if let Some(Value::String(msg)) = inner.get("message") {
                        return msg.trim().to_string();
                    }
                }
                _ => {}
            }
        }
    }
    let text = body.trim();
    if text.is_empty() {
        return fallback.unwrap_or("request failed").to_string();
    }
    text.chars().take(MAX_ERROR_CHARS).collect()
}

/// Decode the `image` field of a backend response.
pub(crate) fn image_from_response(operation: &str, body: &Value) -> StickerResult<Vec<u8>> {
    let field = body
        .get("image")
        .and_then(Value::as_str)
        .ok_or_else(|| StickerError::remote(operation, None, "response has no image"))?;
    parse_data_uri(field).map_err(|e| e.with_operation(operation.to_string()))
}

/// Read the `labels` field of a backend response. Non-string entries become
/// empty labels so positions still line up with the grid.
pub(crate) fn labels_from_response(body: &Value) -> StickerResult<Vec<String>> {
    let labels = body
        .get("labels")
        .and_then(Value::as_array)
        .ok_or_else(|| StickerError::remote("label", None, "response has no labels"))?;
    Ok(labels
        .iter()
        .map(|v| v.as_str().unwrap_or_default().to_string())
        .collect())
}

#[async_trait]
impl Upscaler for HttpBackend {
    async fn upscale(&self, image: &StickerImage, target_size: u32) -> StickerResult<Vec<u8>> {
        info!("upscaling sticker to {}px via {}", target_size, self.base_url);
        let payload = json!({ "image": image.preview(), "targetSize": target_size });
        self.post_for_image("upscale", "upscale", &payload).await
    }
}

#[async_trait]
impl StickerBackend for HttpBackend {
    async fn label_sheet(&self, sheet: &StickerImage) -> StickerResult<Vec<String>> {
        let payload = json!({ "image": sheet.preview() });
        let body = self.post_json("label", "labels", &payload).await?;
        labels_from_response(&body)
    }

    async fn generate_sheet(
        &self,
        prompt: &str,
        references: &[StickerImage],
    ) -> StickerResult<Vec<u8>> {
        if prompt.trim().is_empty() {
            return Err(StickerError::validation("prompt", "must not be blank", prompt));
        }
        info!("generating sheet with {} reference image(s)", references.len());
        let refs: Vec<&str> = references.iter().map(StickerImage::preview).collect();
        let payload = json!({ "prompt": prompt, "referenceImages": refs });
        self.post_for_image("generate", "generate", &payload).await
    }

    async fn regenerate_sticker(
        &self,
        image: &StickerImage,
        instruction: &str,
    ) -> StickerResult<Vec<u8>> {
        let payload = json!({ "image": image.preview(), "instruction": instruction });
        self.post_for_image("regenerate", "regenerate", &payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_json_fields() {
        assert_eq!(error_message_from_body(r#"{"error":"quota exceeded"}"#, None), "quota exceeded");
        assert_eq!(
            error_message_from_body(r#"{"error":{"message":"bad image"}}"#, None),
            "bad image"
        );
        assert_eq!(error_message_from_body(r#"{"message":"nope"}"#, None), "nope");
    }

    #[test]
    fn error_message_falls_back_to_text_then_reason() {
        assert_eq!(error_message_from_body("upstream down", None), "upstream down");
        assert_eq!(error_message_from_body("", Some("Bad Gateway")), "Bad Gateway");
        assert_eq!(error_message_from_body("x".repeat(1000).as_str(), None).len(), MAX_ERROR_CHARS);
    }

    #[test]
    fn labels_keep_positions() {
        let body = json!({ "labels": ["cat", 3, "dog"] });
        assert_eq!(labels_from_response(&body).unwrap(), vec!["cat", "", "dog"]);
        assert!(labels_from_response(&json!({})).is_err());
    }

    #[test]
    fn image_field_is_required() {
        assert_eq!(image_from_response("upscale", &json!({ "image": "AQID" })).unwrap(), vec![1, 2, 3]);
        let err = image_from_response("upscale", &json!({ "url": "x" })).unwrap_err();
        assert_eq!(err.category(), "remote_operation");
    }

    #[test]
    fn base_url_is_normalised() {
        let backend = HttpBackend::new(&BackendConfig {
            base_url: "http://localhost:3000/".to_string(),
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(backend.endpoint("labels"), "http://localhost:3000/api/labels");
    }
}
