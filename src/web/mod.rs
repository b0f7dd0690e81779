//! Browser UI and JSON API.
//!
//! ```text
//! GET  /          upload form
//! POST /ocr       multipart (file, api_key?) → HTML result page
//! POST /api/ocr   multipart (file, api_key?) → JSON ConversionOutput
//! GET  /health    "ok"
//! ```
//!
//! OCR runs are serialised through a single-permit semaphore: a second
//! upload waits until the first one has been rendered.

mod handlers;
pub mod page;

use crate::config::OcrConfig;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tower_http::trace::TraceLayer;

pub use handlers::ApiError;

/// Default upload limit: 50 MiB, the OCR service's own document cap.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Server state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Immutable configuration; the API key may be absent.
    pub config: Arc<OcrConfig>,
    /// One OCR run at a time.
    pub ocr_gate: Arc<Semaphore>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(config: OcrConfig) -> Self {
        Self {
            config: Arc::new(config),
            ocr_gate: Arc::new(Semaphore::new(1)),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// True when the form has to ask for an API key.
    pub fn needs_key(&self) -> bool {
        !self.config.has_api_key()
    }
}

/// Build the router with all endpoints.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/ocr", post(handlers::ocr_form))
        .route("/api/ocr", post(handlers::ocr_api))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: &str, state: AppState) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    if state.needs_key() {
        tracing::warn!("No MISTRAL_API_KEY configured; the form will ask for one");
    }

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_on(tokio::signal::ctrl_c()))
        .await
}

/// Resolve when `signal` fires. If the handler could not be installed, log
/// it and never resolve, so the server keeps running.
async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => tracing::info!("Shutting down"),
        Err(e) => {
            tracing::error!("Cannot listen for Ctrl-C, graceful shutdown disabled: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
