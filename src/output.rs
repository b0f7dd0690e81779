//! Result types returned by a conversion.

use serde::{Deserialize, Serialize};

/// Everything produced by one OCR run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The assembled document, images inlined.
    pub markdown: String,
    /// Per-page results in the order the service returned them.
    pub pages: Vec<PageResult>,
    /// Model that served the request.
    pub model: String,
    pub stats: ConversionStats,
}

/// One page after image reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number.
    pub page_num: usize,
    pub markdown: String,
    /// Images the service returned for this page.
    pub image_count: usize,
    /// Placeholder references (`![id](id)`) still present after
    /// reconciliation, i.e. ids with no payload on this page.
    pub unresolved_images: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    pub total_pages: usize,
    pub total_images: usize,
    pub unresolved_images: usize,
    /// Size of the uploaded PDF.
    pub input_bytes: usize,
    /// Pages billed by the service, when reported.
    pub pages_processed: Option<u64>,
    pub total_duration_ms: u64,
}
