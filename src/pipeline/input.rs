//! Input collection: turn a browser upload or a local path into a validated
//! in-memory PDF.
//!
//! The whole file is held in memory for the duration of one request; it is
//! needed twice (upload to the OCR service, inline preview in the result
//! page) and dropped afterwards. We validate the PDF magic bytes (`%PDF`)
//! up front so a wrong file type fails with a clear message instead of an
//! opaque service error.

use crate::error::OcrError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Filename used when the upload does not carry one.
pub const DEFAULT_FILENAME: &str = "document.pdf";

/// A validated PDF held in memory.
#[derive(Clone)]
pub struct PdfUpload {
    filename: String,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for PdfUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfUpload")
            .field("filename", &self.filename)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl PdfUpload {
    /// Validate raw bytes received from a form upload.
    pub fn from_bytes(filename: impl Into<String>, bytes: Vec<u8>) -> Result<Self, OcrError> {
        let filename = sanitise_filename(&filename.into());
        if !is_pdf(&bytes) {
            let magic = bytes.iter().take(PDF_MAGIC.len()).copied().collect();
            return Err(OcrError::NotAPdf { filename, magic });
        }
        debug!("Accepted PDF '{}' ({} bytes)", filename, bytes.len());
        Ok(Self { filename, bytes })
    }

    /// Read and validate a local file.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, OcrError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => OcrError::FileNotFound {
                path: path.to_path_buf(),
            },
            ErrorKind::PermissionDenied => OcrError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => OcrError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_bytes(filename, bytes)
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `data:` URL for embedding the original PDF in a page.
    pub fn data_url(&self) -> String {
        format!("data:application/pdf;base64,{}", STANDARD.encode(&self.bytes))
    }
}

/// True when `bytes` starts with the PDF magic.
pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// Strip any client-side directory components and fall back to a default.
///
/// Browsers on some platforms send the full local path as the filename.
fn sanitise_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        base.to_string()
    }
}
