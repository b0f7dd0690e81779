//! OCR client tests against the in-process fake service.

mod common;

use axum::http::StatusCode;
use common::{Failure, EXPECTED_MARKDOWN, TEST_KEY, TINY_PDF};
use pdf_ocr_viewer::{
    convert_file, process_pdf, MistralOcrClient, OcrConfig, OcrError, OcrProgressCallback,
    OcrProvider, OcrStage, PdfUpload,
};
use std::sync::{Arc, Mutex};

fn config_for(base_url: &str) -> OcrConfig {
    OcrConfig::builder()
        .api_key(TEST_KEY)
        .base_url(base_url)
        .request_timeout_secs(10)
        .build()
        .unwrap()
}

#[tokio::test]
async fn full_request_sequence() {
    let fake = common::spawn(None).await;
    let client = MistralOcrClient::new(config_for(&fake.base_url())).unwrap();

    let resp = client.process_document(TINY_PDF, "scan.pdf").await.unwrap();
    assert_eq!(resp.pages.len(), 2);
    assert_eq!(resp.model, "mistral-ocr-test");

    assert_eq!(
        fake.state.calls(),
        vec![
            "POST /v1/files",
            "GET /v1/files/file-123/url",
            "POST /v1/ocr",
            "DELETE /v1/files/file-123",
        ]
    );

    let uploads = fake.state.uploads.lock().unwrap().clone();
    assert_eq!(
        uploads,
        vec![("ocr".to_string(), "scan.pdf".to_string(), TINY_PDF.len())]
    );
    assert_eq!(fake.state.expiry.lock().unwrap().as_deref(), Some("1"));

    let body = fake.state.ocr_body.lock().unwrap().clone().unwrap();
    assert_eq!(body["model"], "mistral-ocr-latest");
    assert_eq!(body["include_image_base64"], true);
    assert_eq!(body["document"]["type"], "document_url");
    assert_eq!(
        body["document"]["document_url"],
        "https://signed.example/file-123"
    );
}

#[tokio::test]
async fn convert_file_reconciles_images() {
    let fake = common::spawn(None).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.pdf");
    std::fs::write(&path, TINY_PDF).unwrap();

    let out = convert_file(&path, &config_for(&fake.base_url()))
        .await
        .unwrap();
    assert_eq!(out.markdown, EXPECTED_MARKDOWN);
    assert_eq!(out.stats.total_pages, 2);
    assert_eq!(out.stats.total_images, 1);
    assert_eq!(out.stats.unresolved_images, 0);
    assert_eq!(out.stats.pages_processed, Some(2));
}

#[tokio::test]
async fn keeps_upload_when_configured() {
    let fake = common::spawn(None).await;
    let config = OcrConfig::builder()
        .api_key(TEST_KEY)
        .base_url(fake.base_url())
        .delete_after_processing(false)
        .build()
        .unwrap();
    let client = MistralOcrClient::new(config).unwrap();
    client.process_document(TINY_PDF, "scan.pdf").await.unwrap();
    assert!(!fake.state.calls().iter().any(|c| c.starts_with("DELETE")));
}

#[tokio::test]
async fn wrong_key_is_an_auth_error() {
    let fake = common::spawn(None).await;
    let config = OcrConfig::builder()
        .api_key("wrong")
        .base_url(fake.base_url())
        .build()
        .unwrap();
    let client = MistralOcrClient::new(config).unwrap();
    let err = client
        .process_document(TINY_PDF, "scan.pdf")
        .await
        .unwrap_err();
    match &err {
        OcrError::Auth { status, detail } => {
            assert_eq!(*status, 401);
            assert_eq!(detail, "Unauthorized");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_credential_problem());
    // Upload failed, so nothing else was attempted.
    assert_eq!(fake.state.calls(), vec!["POST /v1/files"]);
}

#[tokio::test]
async fn rate_limit_on_ocr_still_cleans_up() {
    let fake = common::spawn(Some(Failure {
        endpoint: "ocr",
        status: StatusCode::TOO_MANY_REQUESTS,
        body: r#"{"message":"slow down"}"#,
    }))
    .await;
    let client = MistralOcrClient::new(config_for(&fake.base_url())).unwrap();
    let err = client
        .process_document(TINY_PDF, "scan.pdf")
        .await
        .unwrap_err();
    assert!(matches!(err, OcrError::RateLimited { stage: "ocr" }), "got: {err}");
    assert_eq!(
        fake.state.calls().last().map(String::as_str),
        Some("DELETE /v1/files/file-123")
    );
}

#[tokio::test]
async fn server_error_is_classified() {
    let fake = common::spawn(Some(Failure {
        endpoint: "url",
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: "boom",
    }))
    .await;
    let client = MistralOcrClient::new(config_for(&fake.base_url())).unwrap();
    let err = client
        .process_document(TINY_PDF, "scan.pdf")
        .await
        .unwrap_err();
    match err {
        OcrError::Service {
            stage,
            status,
            message,
        } => {
            assert_eq!(stage, "signed URL");
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!fake.state.calls().contains(&"POST /v1/ocr".to_string()));
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let fake = common::spawn(Some(Failure {
        endpoint: "ocr",
        status: StatusCode::OK,
        body: "{not json",
    }))
    .await;
    let client = MistralOcrClient::new(config_for(&fake.base_url())).unwrap();
    let err = client
        .process_document(TINY_PDF, "scan.pdf")
        .await
        .unwrap_err();
    assert!(matches!(err, OcrError::Decode { stage: "ocr", .. }), "got: {err}");
}

#[tokio::test]
async fn failed_delete_does_not_fail_the_run() {
    let fake = common::spawn(Some(Failure {
        endpoint: "delete",
        status: StatusCode::NOT_FOUND,
        body: r#"{"detail":"gone"}"#,
    }))
    .await;
    let client = MistralOcrClient::new(config_for(&fake.base_url())).unwrap();
    let resp = client.process_document(TINY_PDF, "scan.pdf").await.unwrap();
    assert_eq!(resp.pages.len(), 2);
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    // Grab a free port, then close it again.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = MistralOcrClient::new(config_for(&format!("http://{addr}"))).unwrap();
    let upload = PdfUpload::from_bytes("scan.pdf", TINY_PDF.to_vec()).unwrap();
    let err = process_pdf(&client, &upload, client.config())
        .await
        .unwrap_err();
    assert!(matches!(err, OcrError::Network { stage: "upload", .. }), "got: {err}");
}

#[derive(Default)]
struct StageRecorder {
    stages: Mutex<Vec<OcrStage>>,
    pages: Mutex<Option<usize>>,
}

impl OcrProgressCallback for StageRecorder {
    fn on_stage(&self, stage: OcrStage) {
        self.stages.lock().unwrap().push(stage);
    }

    fn on_complete(&self, page_count: usize) {
        *self.pages.lock().unwrap() = Some(page_count);
    }
}

#[tokio::test]
async fn progress_reports_every_stage() {
    let fake = common::spawn(None).await;
    let recorder = Arc::new(StageRecorder::default());
    let client = MistralOcrClient::new(config_for(&fake.base_url()))
        .unwrap()
        .with_progress(recorder.clone());
    client.process_document(TINY_PDF, "scan.pdf").await.unwrap();

    assert_eq!(
        *recorder.stages.lock().unwrap(),
        vec![
            OcrStage::Uploading,
            OcrStage::SigningUrl,
            OcrStage::Processing,
            OcrStage::CleaningUp,
        ]
    );
    assert_eq!(*recorder.pages.lock().unwrap(), Some(2));
}
