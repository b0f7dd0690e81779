use super::{page, AppState};
use crate::config::OcrConfig;
use crate::convert::process_pdf;
use crate::error::OcrError;
use crate::ocr::mistral::MistralOcrClient;
use crate::output::ConversionOutput;
use crate::pipeline::input::PdfUpload;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, warn};

/// A failed request, carrying the status and the one message shown to the user.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    /// The API key was missing or rejected.
    pub credential: bool,
    /// The OCR service was reached, so "processing failed" is accurate.
    pub from_service: bool,
}

impl From<OcrError> for ApiError {
    fn from(e: OcrError) -> Self {
        let status = match &e {
            OcrError::MissingCredential | OcrError::Auth { .. } => StatusCode::UNAUTHORIZED,
            OcrError::NotAPdf { .. }
            | OcrError::MissingUpload
            | OcrError::FileNotFound { .. }
            | OcrError::PermissionDenied { .. }
            | OcrError::ReadFailed { .. } => StatusCode::BAD_REQUEST,
            OcrError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            OcrError::Network { .. } | OcrError::Service { .. } | OcrError::Decode { .. } => {
                StatusCode::BAD_GATEWAY
            }
            OcrError::OutputWriteFailed { .. }
            | OcrError::InvalidConfig(_)
            | OcrError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            credential: e.is_credential_problem(),
            from_service: e.is_service_failure(),
            message: e.to_string(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self {
            status: e.status(),
            message: format!("Invalid upload: {}", e.body_text()),
            credential: false,
            from_service: false,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "credential_required": self.credential,
        }));
        (self.status, body).into_response()
    }
}

#[derive(Default)]
struct UploadForm {
    file: Option<(String, Vec<u8>)>,
    api_key: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was picked.
                if !bytes.is_empty() || !filename.is_empty() {
                    form.file = Some((filename, bytes.to_vec()));
                }
            }
            "api_key" => form.api_key = Some(field.text().await?),
            other => debug!("Ignoring form field '{}'", other),
        }
    }
    Ok(form)
}

/// Shared by the HTML and JSON endpoints.
async fn run_ocr(
    state: &AppState,
    multipart: Multipart,
) -> Result<(PdfUpload, ConversionOutput), ApiError> {
    let form = read_form(multipart).await?;

    // A key typed into the form is only used when the server has none.
    let config: OcrConfig = match form.api_key {
        Some(ref key) if state.needs_key() => state.config.with_api_key(key.as_str()),
        _ => state.config.as_ref().clone(),
    };
    if !config.has_api_key() {
        return Err(OcrError::MissingCredential.into());
    }

    let (filename, bytes) = form.file.ok_or(OcrError::MissingUpload)?;
    let upload = PdfUpload::from_bytes(filename, bytes)?;
    let client = MistralOcrClient::new(config.clone())?;

    let _permit = state
        .ocr_gate
        .acquire()
        .await
        .map_err(|_| OcrError::Internal("OCR gate closed".into()))?;
    let output = process_pdf(&client, &upload, &config).await?;
    Ok((upload, output))
}

pub(super) async fn index(State(state): State<AppState>) -> Html<String> {
    Html(page::index_page(state.needs_key()))
}

pub(super) async fn health() -> &'static str {
    "ok"
}

pub(super) async fn ocr_form(State(state): State<AppState>, multipart: Multipart) -> Response {
    match run_ocr(&state, multipart).await {
        Ok((upload, output)) => {
            Html(page::result_page(state.needs_key(), &upload, &output)).into_response()
        }
        Err(e) => {
            warn!("OCR request failed ({}): {}", e.status, e.message);
            let body = page::error_page(state.needs_key(), &e);
            (e.status, Html(body)).into_response()
        }
    }
}

pub(super) async fn ocr_api(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ConversionOutput>, ApiError> {
    let (_, output) = run_ocr(&state, multipart).await.inspect_err(|e| {
        warn!("OCR request failed ({}): {}", e.status, e.message);
    })?;
    Ok(Json(output))
}
