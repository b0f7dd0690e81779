//! Mistral OCR client.
//!
//! ## Request sequence
//!
//! ```text
//! POST   /v1/files                 multipart: purpose=ocr, file=<pdf>  → { id }
//! GET    /v1/files/{id}/url        ?expiry=<hours>                      → { url }
//! POST   /v1/ocr                   { model, document: {document_url}, include_image_base64 }
//! DELETE /v1/files/{id}            best-effort, only when configured
//! ```
//!
//! Nothing is retried. The first failing call aborts the run and its error is
//! classified from the HTTP status (401/403 → auth, 429 → rate limit, other
//! non-2xx → service) so callers can react without parsing messages.

use super::{OcrProvider, OcrResponse};
use crate::config::OcrConfig;
use crate::error::OcrError;
use crate::progress::{NoopProgressCallback, OcrStage, ProgressCallback};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Longest error body we echo back to the user.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// HTTP client for the Mistral OCR API.
pub struct MistralOcrClient {
    http: reqwest::Client,
    config: OcrConfig,
    api_key: String,
    progress: ProgressCallback,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    id: String,
    #[serde(default)]
    bytes: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SignedUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct OcrRequest<'a> {
    model: &'a str,
    document: DocumentUrl<'a>,
    include_image_base64: bool,
}

#[derive(Debug, Serialize)]
struct DocumentUrl<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    document_url: &'a str,
}

impl MistralOcrClient {
    /// Build a client from an immutable config.
    ///
    /// Fails with [`OcrError::MissingCredential`] when the config has no key.
    pub fn new(config: OcrConfig) -> Result<Self, OcrError> {
        let api_key = config.api_key.clone().ok_or(OcrError::MissingCredential)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| OcrError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            config,
            api_key,
            progress: Arc::new(NoopProgressCallback),
        })
    }

    /// Attach a progress callback.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    async fn upload(&self, bytes: &[u8], filename: &str) -> Result<UploadedFile, OcrError> {
        let part = Part::bytes(bytes.to_vec())
            .file_name(filename.to_string())
            .mime_str("application/pdf")
            .map_err(|e| OcrError::Internal(format!("multipart: {e}")))?;
        let form = Form::new().text("purpose", "ocr").part("file", part);

        let request = self
            .http
            .post(self.config.endpoint("v1/files"))
            .bearer_auth(&self.api_key)
            .multipart(form);
        self.send_json("upload", request).await
    }

    async fn signed_url(&self, file_id: &str) -> Result<SignedUrl, OcrError> {
        let request = self
            .http
            .get(self.config.endpoint(&format!("v1/files/{file_id}/url")))
            .bearer_auth(&self.api_key)
            .query(&[("expiry", self.config.signed_url_expiry_hours)]);
        self.send_json("signed URL", request).await
    }

    async fn run_ocr(&self, document_url: &str) -> Result<OcrResponse, OcrError> {
        let body = OcrRequest {
            model: &self.config.model,
            document: DocumentUrl {
                kind: "document_url",
                document_url,
            },
            include_image_base64: self.config.include_image_base64,
        };
        let request = self
            .http
            .post(self.config.endpoint("v1/ocr"))
            .bearer_auth(&self.api_key)
            .json(&body);
        self.send_json("ocr", request).await
    }

    async fn sign_and_process(&self, file_id: &str) -> Result<OcrResponse, OcrError> {
        self.progress.on_stage(OcrStage::SigningUrl);
        let signed = self.signed_url(file_id).await?;
        debug!("Signed URL obtained for {}", file_id);

        self.progress.on_stage(OcrStage::Processing);
        self.run_ocr(&signed.url).await
    }

    async fn delete_file(&self, file_id: &str) -> Result<(), OcrError> {
        let request = self
            .http
            .delete(self.config.endpoint(&format!("v1/files/{file_id}")))
            .bearer_auth(&self.api_key);
        let response = self.send("delete", request).await?;
        check_status("delete", response).await.map(|_| ())
    }

    async fn send(
        &self,
        stage: &'static str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, OcrError> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                OcrError::Network {
                    stage,
                    detail: format!("timed out after {}s", self.config.request_timeout_secs),
                }
            } else {
                OcrError::Network {
                    stage,
                    detail: e.to_string(),
                }
            }
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        stage: &'static str,
        request: RequestBuilder,
    ) -> Result<T, OcrError> {
        let response = self.send(stage, request).await?;
        let response = check_status(stage, response).await?;
        let text = response.text().await.map_err(|e| OcrError::Network {
            stage,
            detail: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| OcrError::Decode {
            stage,
            detail: e.to_string(),
        })
    }
}

#[async_trait]
impl OcrProvider for MistralOcrClient {
    fn name(&self) -> &str {
        "mistral"
    }

    async fn process_document(
        &self,
        bytes: &[u8],
        filename: &str,
    ) -> Result<OcrResponse, OcrError> {
        info!("Uploading '{}' ({} bytes) for OCR", filename, bytes.len());
        self.progress.on_stage(OcrStage::Uploading);
        let uploaded = self.upload(bytes, filename).await?;
        debug!(
            "Uploaded file id={} size={:?}",
            uploaded.id, uploaded.bytes
        );

        let result = self.sign_and_process(&uploaded.id).await;

        if self.config.delete_after_processing {
            self.progress.on_stage(OcrStage::CleaningUp);
            if let Err(e) = self.delete_file(&uploaded.id).await {
                warn!("Could not delete uploaded file {}: {}", uploaded.id, e);
            }
        }

        let response = result?;
        info!(
            "OCR complete: {} pages (model {})",
            response.pages.len(),
            response.model
        );
        self.progress.on_complete(response.pages.len());
        Ok(response)
    }
}

/// Map a non-success status to a classified error.
async fn check_status(
    stage: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, OcrError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body);
    warn!("OCR service returned HTTP {} during {}: {}", status, stage, message);

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => OcrError::Auth {
            status: status.as_u16(),
            detail: message,
        },
        StatusCode::TOO_MANY_REQUESTS => OcrError::RateLimited { stage },
        _ => OcrError::Service {
            stage,
            status: status.as_u16(),
            message,
        },
    })
}

/// Pull a human-readable message out of an error body.
///
/// The service answers with `{"message": …}` or `{"detail": …}`; anything
/// else is echoed back, truncated.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "detail"] {
            match value.get(key) {
                Some(serde_json::Value::String(s)) => return s.clone(),
                Some(other) if !other.is_null() => return other.to_string(),
                _ => {}
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    if trimmed.chars().count() > MAX_ERROR_BODY_CHARS {
        let cut: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{cut}\u{2026}")
    } else {
        trimmed.to_string()
    }
}
