//! # pdf-ocr-viewer
//!
//! Upload a PDF, run it through Mistral OCR, and view the resulting Markdown
//! with the extracted images inlined next to the original document.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF (browser upload or local path)
//!  │
//!  ├─ 1. Input      validate %PDF magic, hold bytes in memory
//!  ├─ 2. OCR        upload → signed URL → OCR (images as base64)
//!  ├─ 3. Reconcile  ![id](id) → ![id](data:image/…;base64,…) per page
//!  ├─ 4. Assemble   pages joined by a blank line, in service order
//!  └─ 5. Output     HTML side-by-side view, JSON, or a .md file
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_ocr_viewer::{convert_file, OcrConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads MISTRAL_API_KEY from the environment or .env
//!     let config = OcrConfig::from_env()?;
//!     let output = convert_file("document.pdf", &config).await?;
//!     println!("{}", output.markdown);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-ocr` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod ocr;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod web;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{OcrConfig, OcrConfigBuilder, PageSeparator};
pub use convert::{convert_bytes, convert_file, process_pdf, write_json, write_markdown};
pub use error::OcrError;
pub use ocr::mistral::MistralOcrClient;
pub use ocr::{OcrImage, OcrPage, OcrProvider, OcrResponse};
pub use output::{ConversionOutput, ConversionStats, PageResult};
pub use pipeline::input::PdfUpload;
pub use pipeline::reconcile::{assemble_document, markdown_with_images, replace_images_in_markdown};
pub use progress::{OcrProgressCallback, OcrStage, ProgressCallback};
pub use web::{build_router, serve, AppState};
