//! OCR service boundary: response types and the [`OcrProvider`] trait.
//!
//! The rest of the crate only sees [`OcrProvider::process_document`] and the
//! [`OcrResponse`] it returns. [`mistral::MistralOcrClient`] is the one real
//! implementation; tests plug in their own.

pub mod mistral;

use crate::error::OcrError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Full OCR result for one document, in page order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrResponse {
    pub pages: Vec<OcrPage>,
    /// Model that served the request, as reported by the service.
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub usage_info: Option<UsageInfo>,
}

/// One page of OCR output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrPage {
    /// 0-indexed position in the source PDF.
    pub index: usize,
    pub markdown: String,
    #[serde(default)]
    pub images: Vec<OcrImage>,
    #[serde(default)]
    pub dimensions: Option<PageDimensions>,
}

impl OcrPage {
    /// Image id → encoded payload pairs for this page.
    ///
    /// Images the service returned without a payload (image extraction
    /// disabled) have nothing to splice in and are left out.
    pub fn image_payloads(&self) -> Vec<(&str, &str)> {
        self.images
            .iter()
            .filter_map(|img| {
                img.image_base64
                    .as_deref()
                    .map(|payload| (img.id.as_str(), payload))
            })
            .collect()
    }
}

/// An image extracted from a page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrImage {
    /// Unique within its page, e.g. `img-0.jpeg`.
    pub id: String,
    /// Usually a complete `data:image/…;base64,` URL.
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub top_left_x: Option<f64>,
    #[serde(default)]
    pub top_left_y: Option<f64>,
    #[serde(default)]
    pub bottom_right_x: Option<f64>,
    #[serde(default)]
    pub bottom_right_y: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PageDimensions {
    pub dpi: u32,
    pub height: u32,
    pub width: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UsageInfo {
    pub pages_processed: u64,
    #[serde(default)]
    pub doc_size_bytes: Option<u64>,
}

/// An OCR backend that turns PDF bytes into per-page markdown.
///
/// Any failure aborts the whole document; there is no partial result.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn process_document(&self, bytes: &[u8], filename: &str)
        -> Result<OcrResponse, OcrError>;
}
