//! Configuration types for OCR runs.
//!
//! All OCR behaviour is controlled through [`OcrConfig`], built via its
//! [`OcrConfigBuilder`] or loaded with [`OcrConfig::from_env`]. The config is
//! created once at startup and handed to the OCR client at construction; it
//! is immutable afterwards; there is no process-wide credential state.

use crate::error::OcrError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default Mistral API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai";

/// Default OCR model identifier.
pub const DEFAULT_MODEL: &str = "mistral-ocr-latest";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "MISTRAL_API_KEY";

/// Configuration for talking to the OCR service and assembling its output.
///
/// # Example
/// ```rust
/// use pdf_ocr_viewer::OcrConfig;
///
/// let config = OcrConfig::builder()
///     .api_key("sk-test")
///     .model("mistral-ocr-latest")
///     .build()
///     .unwrap();
/// assert!(config.has_api_key());
/// ```
#[derive(Clone)]
pub struct OcrConfig {
    /// Bearer token for the OCR service. `None` means the user has to supply
    /// one before anything can be processed.
    pub api_key: Option<String>,

    /// Service root, without trailing slash. Default: `https://api.mistral.ai`.
    pub base_url: String,

    /// OCR model. Default: `mistral-ocr-latest`.
    pub model: String,

    /// Ask the service to return extracted images as base64. Default: true.
    ///
    /// Without this the markdown still references `![img-0.jpeg](img-0.jpeg)`
    /// but there is nothing to splice in, so images render as broken links.
    pub include_image_base64: bool,

    /// Lifetime of the signed document URL, in hours. Default: 1.
    pub signed_url_expiry_hours: u32,

    /// Per-request HTTP timeout in seconds. Default: 120.
    pub request_timeout_secs: u64,

    /// Delete the uploaded file from the service once OCR finishes. Default: true.
    pub delete_after_processing: bool,

    /// Page separator in assembled output. Default: blank line.
    pub page_separator: PageSeparator,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            include_image_base64: true,
            signed_url_expiry_hours: 1,
            request_timeout_secs: 120,
            delete_after_processing: true,
            page_separator: PageSeparator::default(),
        }
    }
}

impl fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("include_image_base64", &self.include_image_base64)
            .field("signed_url_expiry_hours", &self.signed_url_expiry_hours)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("delete_after_processing", &self.delete_after_processing)
            .field("page_separator", &self.page_separator)
            .finish()
    }
}

impl OcrConfig {
    /// Create a new builder for `OcrConfig`.
    pub fn builder() -> OcrConfigBuilder {
        OcrConfigBuilder {
            config: Self::default(),
        }
    }

    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory (or any parent) is read first;
    /// real environment variables win over it.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `MISTRAL_API_KEY` | `api_key` |
    /// | `MISTRAL_BASE_URL` | `base_url` |
    /// | `MISTRAL_OCR_MODEL` | `model` |
    pub fn from_env() -> Result<Self, OcrError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (used by [`Self::from_env`]).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, OcrError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();
        if let Some(key) = lookup(API_KEY_ENV) {
            builder = builder.api_key(key);
        }
        if let Some(url) = lookup("MISTRAL_BASE_URL") {
            builder = builder.base_url(url);
        }
        if let Some(model) = lookup("MISTRAL_OCR_MODEL") {
            builder = builder.model(model);
        }
        builder.build()
    }

    /// True when an API key is available.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Copy of this config using `key` as the credential.
    ///
    /// The web form uses this when the server was started without a key and
    /// the user typed one in.
    pub fn with_api_key(&self, key: impl Into<String>) -> Self {
        let key = key.into();
        let mut config = self.clone();
        config.api_key = normalise_key(&key);
        config
    }

    /// Join `path` onto the configured base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn normalise_key(key: &str) -> Option<String> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Builder for [`OcrConfig`].
#[derive(Debug)]
pub struct OcrConfigBuilder {
    config: OcrConfig,
}

impl OcrConfigBuilder {
    /// Blank keys are treated as absent.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = normalise_key(&key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn include_image_base64(mut self, v: bool) -> Self {
        self.config.include_image_base64 = v;
        self
    }

    pub fn signed_url_expiry_hours(mut self, hours: u32) -> Self {
        self.config.signed_url_expiry_hours = hours;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn delete_after_processing(mut self, v: bool) -> Self {
        self.config.delete_after_processing = v;
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.config.page_separator = sep;
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// A missing API key is *not* a build error: the web UI can still start
    /// and ask the user for one.
    pub fn build(self) -> Result<OcrConfig, OcrError> {
        let c = &self.config;
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(OcrError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if c.model.trim().is_empty() {
            return Err(OcrError::InvalidConfig("model must not be empty".into()));
        }
        if c.signed_url_expiry_hours == 0 {
            return Err(OcrError::InvalidConfig(
                "signed URL expiry must be ≥ 1 hour".into(),
            ));
        }
        if c.request_timeout_secs == 0 {
            return Err(OcrError::InvalidConfig(
                "request timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How to separate pages in the assembled Markdown output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSeparator {
    /// No separator; pages joined with "\n\n". (default)
    #[default]
    None,
    /// Horizontal rule: "\n\n---\n\n"
    HorizontalRule,
    /// HTML comment with page number: "<!-- page N -->"
    Comment,
    /// Custom string inserted between pages.
    Custom(String),
}

impl PageSeparator {
    /// Render the separator placed before the given page (1-indexed).
    pub fn render(&self, page_num: usize) -> String {
        match self {
            PageSeparator::None => "\n\n".to_string(),
            PageSeparator::HorizontalRule => "\n\n---\n\n".to_string(),
            PageSeparator::Comment => format!("\n\n<!-- page {} -->\n\n", page_num),
            PageSeparator::Custom(s) => format!("\n\n{}\n\n", s),
        }
    }

    /// Parse the CLI spelling: `none`, `hr`/`---`, `comment`, or anything else
    /// as a custom string.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "none" => PageSeparator::None,
            "hr" | "---" => PageSeparator::HorizontalRule,
            "comment" => PageSeparator::Comment,
            _ => PageSeparator::Custom(s.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let c = OcrConfig::default();
        assert_eq!(c.base_url, DEFAULT_BASE_URL);
        assert_eq!(c.model, DEFAULT_MODEL);
        assert!(c.include_image_base64);
        assert_eq!(c.signed_url_expiry_hours, 1);
        assert!(!c.has_api_key());
    }

    #[test]
    fn blank_key_is_absent() {
        let c = OcrConfig::builder().api_key("   ").build().unwrap();
        assert!(c.api_key.is_none());
        assert!(c.with_api_key("").api_key.is_none());
        assert_eq!(c.with_api_key(" k ").api_key.as_deref(), Some("k"));
    }

    #[test]
    fn debug_redacts_key() {
        let c = OcrConfig::builder().api_key("secret-123").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret-123"), "got: {dbg}");
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn rejects_bad_base_url() {
        let err = OcrConfig::builder().base_url("ftp://x").build().unwrap_err();
        assert!(matches!(err, OcrError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_zero_expiry() {
        assert!(OcrConfig::builder()
            .signed_url_expiry_hours(0)
            .build()
            .is_err());
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let c = OcrConfig::builder()
            .base_url("http://127.0.0.1:9000/")
            .build()
            .unwrap();
        assert_eq!(c.endpoint("/v1/ocr"), "http://127.0.0.1:9000/v1/ocr");
        assert_eq!(c.endpoint("v1/files"), "http://127.0.0.1:9000/v1/files");
    }

    #[test]
    fn from_lookup_reads_variables() {
        let vars: HashMap<&str, &str> = [
            ("MISTRAL_API_KEY", "abc"),
            ("MISTRAL_OCR_MODEL", "mistral-ocr-2505"),
        ]
        .into_iter()
        .collect();
        let c = OcrConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(c.api_key.as_deref(), Some("abc"));
        assert_eq!(c.model, "mistral-ocr-2505");
        assert_eq!(c.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn separator_render_and_parse() {
        assert_eq!(PageSeparator::None.render(2), "\n\n");
        assert_eq!(PageSeparator::HorizontalRule.render(2), "\n\n---\n\n");
        assert_eq!(PageSeparator::Comment.render(3), "\n\n<!-- page 3 -->\n\n");
        assert_eq!(PageSeparator::parse("HR"), PageSeparator::HorizontalRule);
        assert_eq!(
            PageSeparator::parse("* * *"),
            PageSeparator::Custom("* * *".into())
        );
    }
}
