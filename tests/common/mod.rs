//! In-process fake of the Mistral files + OCR endpoints.
//!
//! Bound to `127.0.0.1:0`; every request is appended to `log` as
//! `"METHOD /path"` so tests can assert the exact call sequence.

#![allow(dead_code)]

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const TEST_KEY: &str = "test-key";
pub const TINY_PDF: &[u8] = b"%PDF-1.4\n1 0 obj<<>>endobj\n%%EOF\n";
pub const EXPECTED_MARKDOWN: &str =
    "# Scan\n\n![img-0.jpeg](data:image/jpeg;base64,AAAA)\n\nPage two";

/// Make one endpoint answer with a canned failure.
#[derive(Clone)]
pub struct Failure {
    /// One of "files", "url", "ocr", "delete".
    pub endpoint: &'static str,
    pub status: StatusCode,
    pub body: &'static str,
}

/// Park every `/v1/ocr` call: signal `entered`, then wait for `release`.
#[derive(Clone, Default)]
pub struct Hold {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[derive(Clone, Default)]
pub struct FakeState {
    pub log: Arc<Mutex<Vec<String>>>,
    pub uploads: Arc<Mutex<Vec<(String, String, usize)>>>,
    pub expiry: Arc<Mutex<Option<String>>>,
    pub ocr_body: Arc<Mutex<Option<Value>>>,
    pub failure: Option<Failure>,
    pub hold: Option<Hold>,
}

impl FakeState {
    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }

    /// Auth check plus failure injection, shared by every handler.
    fn gate(&self, endpoint: &str, headers: &HeaderMap) -> Option<Response> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if auth != format!("Bearer {TEST_KEY}") {
            return Some(
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"message": "Unauthorized"})),
                )
                    .into_response(),
            );
        }
        match &self.failure {
            Some(f) if f.endpoint == endpoint => Some((f.status, f.body).into_response()),
            _ => None,
        }
    }
}

pub struct FakeService {
    pub addr: SocketAddr,
    pub state: FakeState,
}

impl FakeService {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

pub async fn spawn(failure: Option<Failure>) -> FakeService {
    spawn_with(failure, None).await
}

pub async fn spawn_with(failure: Option<Failure>, hold: Option<Hold>) -> FakeService {
    let state = FakeState {
        failure,
        hold,
        ..Default::default()
    };
    let app = Router::new()
        .route("/v1/files", post(upload))
        .route("/v1/files/{id}/url", get(signed_url))
        .route("/v1/files/{id}", axum::routing::delete(delete_file))
        .route("/v1/ocr", post(ocr))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeService { addr, state }
}

async fn upload(
    State(state): State<FakeState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    state.record("POST /v1/files".into());

    // Drain the body before answering, even on failure.
    let mut purpose = String::new();
    let mut filename = String::new();
    let mut len = 0;
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "purpose" => purpose = field.text().await.unwrap(),
            "file" => {
                filename = field.file_name().unwrap_or_default().to_string();
                len = field.bytes().await.unwrap().len();
            }
            _ => {}
        }
    }
    if let Some(resp) = state.gate("files", &headers) {
        return resp;
    }
    state
        .uploads
        .lock()
        .unwrap()
        .push((purpose.clone(), filename.clone(), len));

    Json(json!({
        "id": "file-123",
        "object": "file",
        "bytes": len,
        "filename": filename,
        "purpose": purpose,
    }))
    .into_response()
}

async fn signed_url(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.record(format!("GET /v1/files/{id}/url"));
    if let Some(resp) = state.gate("url", &headers) {
        return resp;
    }
    *state.expiry.lock().unwrap() = query.get("expiry").cloned();
    Json(json!({ "url": format!("https://signed.example/{id}") })).into_response()
}

async fn ocr(State(state): State<FakeState>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    state.record("POST /v1/ocr".into());
    if let Some(resp) = state.gate("ocr", &headers) {
        return resp;
    }
    *state.ocr_body.lock().unwrap() = Some(body);
    if let Some(hold) = &state.hold {
        hold.entered.notify_one();
        hold.release.notified().await;
    }

    Json(json!({
        "pages": [
            {
                "index": 0,
                "markdown": "# Scan\n\n![img-0.jpeg](img-0.jpeg)",
                "images": [{
                    "id": "img-0.jpeg",
                    "top_left_x": 0, "top_left_y": 0,
                    "bottom_right_x": 10, "bottom_right_y": 10,
                    "image_base64": "data:image/jpeg;base64,AAAA"
                }],
                "dimensions": {"dpi": 200, "height": 100, "width": 100}
            },
            {
                "index": 1,
                "markdown": "Page two",
                "images": [],
                "dimensions": {"dpi": 200, "height": 100, "width": 100}
            }
        ],
        "model": "mistral-ocr-test",
        "usage_info": {"pages_processed": 2, "doc_size_bytes": TINY_PDF.len()}
    }))
    .into_response()
}

async fn delete_file(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    state.record(format!("DELETE /v1/files/{id}"));
    if let Some(resp) = state.gate("delete", &headers) {
        return resp;
    }
    Json(json!({ "id": id, "object": "file", "deleted": true })).into_response()
}
