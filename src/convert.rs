//! Conversion entry points: PDF in, reconciled Markdown out.
//!
//! [`process_pdf`] is the core: hand a validated upload to any
//! [`OcrProvider`], reconcile the pages and assemble the document. The
//! other functions are conveniences that build the Mistral client from an
//! [`OcrConfig`] and read from / write to disk.

use crate::config::OcrConfig;
use crate::error::OcrError;
use crate::ocr::mistral::MistralOcrClient;
use crate::ocr::OcrProvider;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::input::PdfUpload;
use crate::pipeline::reconcile;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Run OCR on `upload` and assemble the reconciled document.
///
/// # Errors
/// Any provider failure aborts the run; nothing partial is returned.
pub async fn process_pdf(
    provider: &dyn OcrProvider,
    upload: &PdfUpload,
    config: &OcrConfig,
) -> Result<ConversionOutput, OcrError> {
    let start = Instant::now();
    info!(
        "Starting OCR of '{}' via {}",
        upload.filename(),
        provider.name()
    );

    let response = provider
        .process_document(upload.bytes(), upload.filename())
        .await?;

    let pages = reconcile::reconcile_pages(&response.pages);
    let markdown = reconcile::assemble_document(&pages, &config.page_separator);

    let unresolved: usize = pages.iter().map(|p| p.unresolved_images.len()).sum();
    if unresolved > 0 {
        warn!(
            "{} image reference(s) had no matching image payload and were left as-is",
            unresolved
        );
    }

    let stats = ConversionStats {
        total_pages: pages.len(),
        total_images: pages.iter().map(|p| p.image_count).sum(),
        unresolved_images: unresolved,
        input_bytes: upload.len(),
        pages_processed: response.usage_info.map(|u| u.pages_processed),
        total_duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} pages, {} images, {}ms",
        stats.total_pages, stats.total_images, stats.total_duration_ms
    );

    Ok(ConversionOutput {
        markdown,
        pages,
        model: response.model,
        stats,
    })
}

/// Convert in-memory PDF bytes with the Mistral client built from `config`.
pub async fn convert_bytes(
    filename: &str,
    bytes: Vec<u8>,
    config: &OcrConfig,
) -> Result<ConversionOutput, OcrError> {
    let upload = PdfUpload::from_bytes(filename, bytes)?;
    let client = MistralOcrClient::new(config.clone())?;
    process_pdf(&client, &upload, config).await
}

/// Convert a local PDF file with the Mistral client built from `config`.
pub async fn convert_file(
    path: impl AsRef<Path>,
    config: &OcrConfig,
) -> Result<ConversionOutput, OcrError> {
    let upload = PdfUpload::from_path(path).await?;
    let client = MistralOcrClient::new(config.clone())?;
    process_pdf(&client, &upload, config).await
}

/// Write the assembled markdown to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn write_markdown(
    output: &ConversionOutput,
    output_path: impl AsRef<Path>,
) -> Result<(), OcrError> {
    write_atomic(output_path.as_ref(), &output.markdown).await
}

/// Write the whole [`ConversionOutput`] as pretty-printed JSON.
pub async fn write_json(
    output: &ConversionOutput,
    output_path: impl AsRef<Path>,
) -> Result<(), OcrError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| OcrError::Internal(format!("serialising output: {e}")))?;
    write_atomic(output_path.as_ref(), &json).await
}

async fn write_atomic(path: &Path, contents: &str) -> Result<(), OcrError> {
    let write_err = |source| OcrError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);
    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    info!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}
