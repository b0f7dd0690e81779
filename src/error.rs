//! Error types for the pdf-ocr-viewer library.
//!
//! Every failure in this crate is fatal for the request that hit it: the OCR
//! run is all-or-nothing, so there is no per-page error type. Instead
//! [`OcrError`] classifies *why* a run failed so the web layer can choose a
//! status code and the CLI can print a useful hint:
//!
//! * credential problems ([`OcrError::MissingCredential`], [`OcrError::Auth`])
//!   prompt the user for a key;
//! * everything else coming back from the OCR service is surfaced as a single
//!   "OCR processing failed" message with no partial output.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf-ocr-viewer library.
#[derive(Debug, Error)]
pub enum OcrError {
    // ── Credential errors ─────────────────────────────────────────────────
    /// No API key is configured and none was supplied with the request.
    #[error(
        "Mistral API key is not configured.\n\
Set MISTRAL_API_KEY (environment or .env). Keys are issued at https://console.mistral.ai/"
    )]
    MissingCredential,

    /// The OCR service rejected the API key (HTTP 401/403).
    #[error("Authentication failed (HTTP {status}): {detail}")]
    Auth { status: u16, detail: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure reading the input (a directory, a broken disk, …).
    #[error("Could not read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The upload or file is not a PDF.
    #[error("'{filename}' is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { filename: String, magic: Vec<u8> },

    /// The upload form did not contain a file.
    #[error("No PDF file was uploaded")]
    MissingUpload,

    // ── OCR service errors ────────────────────────────────────────────────
    /// Transport failure talking to the OCR service (DNS, TLS, timeout, …).
    #[error("Network error during {stage}: {detail}")]
    Network { stage: &'static str, detail: String },

    /// The OCR service answered HTTP 429.
    #[error("Rate limit exceeded by the OCR service during {stage}")]
    RateLimited { stage: &'static str },

    /// The OCR service answered with any other non-success status.
    #[error("OCR service error during {stage} (HTTP {status}): {message}")]
    Service {
        stage: &'static str,
        status: u16,
        message: String,
    },

    /// The OCR service answered 2xx but the body could not be decoded.
    #[error("Could not decode the OCR service response during {stage}: {detail}")]
    Decode { stage: &'static str, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcrError {
    /// True when the user should be asked for (another) API key.
    pub fn is_credential_problem(&self) -> bool {
        matches!(self, OcrError::MissingCredential | OcrError::Auth { .. })
    }

    /// True for errors caused by the caller's input rather than the service.
    pub fn is_bad_input(&self) -> bool {
        matches!(
            self,
            OcrError::NotAPdf { .. }
                | OcrError::MissingUpload
                | OcrError::FileNotFound { .. }
                | OcrError::PermissionDenied { .. }
                | OcrError::ReadFailed { .. }
        )
    }

    /// True when the failure came back from the OCR service, i.e. processing
    /// was actually attempted.
    pub fn is_service_failure(&self) -> bool {
        matches!(
            self,
            OcrError::Auth { .. }
                | OcrError::Network { .. }
                | OcrError::RateLimited { .. }
                | OcrError::Service { .. }
                | OcrError::Decode { .. }
        )
    }
}
