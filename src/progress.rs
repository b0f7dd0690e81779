//! Progress-callback trait for OCR request stages.
//!
//! An OCR run is three sequential HTTP calls (upload, signed URL, OCR) and
//! the last one can take a minute on long documents. Inject an
//! [`Arc<dyn OcrProgressCallback>`] via
//! [`crate::ocr::mistral::MistralOcrClient::with_progress`] to find out which
//! stage is in flight, e.g. to drive a terminal spinner.
//!
//! # Example
//!
//! ```rust
//! use pdf_ocr_viewer::{OcrProgressCallback, OcrStage};
//! use std::sync::Mutex;
//!
//! #[derive(Default)]
//! struct Recorder(Mutex<Vec<OcrStage>>);
//!
//! impl OcrProgressCallback for Recorder {
//!     fn on_stage(&self, stage: OcrStage) {
//!         self.0.lock().unwrap().push(stage);
//!     }
//! }
//! ```

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A step of the OCR request sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OcrStage {
    Uploading,
    SigningUrl,
    Processing,
    CleaningUp,
}

impl fmt::Display for OcrStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OcrStage::Uploading => "Uploading PDF",
            OcrStage::SigningUrl => "Requesting signed URL",
            OcrStage::Processing => "Running OCR",
            OcrStage::CleaningUp => "Deleting uploaded file",
        };
        f.write_str(s)
    }
}

/// Called by the OCR client as it moves through the request sequence.
///
/// Methods have default no-op implementations so callers only override what
/// they care about.
pub trait OcrProgressCallback: Send + Sync {
    /// Called just before the request for `stage` is sent.
    fn on_stage(&self, stage: OcrStage) {
        let _ = stage;
    }

    /// Called once the OCR response has been decoded.
    ///
    /// # Arguments
    /// * `page_count`: number of pages in the response
    fn on_complete(&self, page_count: usize) {
        let _ = page_count;
    }
}

/// Shared, thread-safe progress callback handle.
pub type ProgressCallback = Arc<dyn OcrProgressCallback>;

/// A no-op implementation used when no callback is supplied.
pub struct NoopProgressCallback;

impl OcrProgressCallback for NoopProgressCallback {}
