use axum::http::StatusCode;
use reqwest::multipart;

mod common;
use common::{MockRag, TestApp};

fn pdf_form(file_name: &str) -> multipart::Form {
    multipart::Form::new().part(
        "file",
        multipart::Part::bytes(b"%PDF-1.4 test".to_vec())
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .unwrap(),
    )
}

#[tokio::test]
async fn upload_relays_pdf_and_returns_session_id() {
    let app = TestApp::spawn().await;

    let response = app
        .client()
        .post(format!("{}/upload", app.address))
        .multipart(pdf_form("report.pdf"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(StatusCode::OK, response.status());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "PDF uploaded and processed");
    assert!(!body["session_id"].as_str().unwrap().is_empty());

    assert_eq!(app.rag.hits(), vec!["/upload"]);
    assert_eq!(0, app.spooled_file_count(), "spooled file must be deleted");

    app.cleanup().await;
}

#[tokio::test]
async fn upload_without_file_field_returns_400() {
    let app = TestApp::spawn().await;

    let form = multipart::Form::new().text("session_hint", "abc");
    let response = app
        .client()
        .post(format!("{}/upload", app.address))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(StatusCode::BAD_REQUEST, response.status());
    assert!(app.rag.hits().is_empty());

    app.cleanup().await;
}

#[tokio::test]
async fn upload_rejects_non_pdf_with_400() {
    let app = TestApp::spawn().await;

    let form = multipart::Form::new().part(
        "file",
        multipart::Part::bytes(b"hello".to_vec())
            .file_name("notes.txt")
            .mime_str("text/plain")
            .unwrap(),
    );
    let response = app
        .client()
        .post(format!("{}/upload", app.address))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(StatusCode::BAD_REQUEST, response.status());
    assert!(app.rag.hits().is_empty());
    assert_eq!(0, app.spooled_file_count());

    app.cleanup().await;
}

#[tokio::test]
async fn upload_rejects_path_traversal_filename() {
    let app = TestApp::spawn().await;

    let response = app
        .client()
        .post(format!("{}/upload", app.address))
        .multipart(pdf_form("../../etc/evil.pdf"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(StatusCode::BAD_REQUEST, response.status());
    assert!(app.rag.hits().is_empty(), "nothing must be forwarded");
    assert_eq!(0, app.spooled_file_count());

    app.cleanup().await;
}

#[tokio::test]
async fn upload_rejects_oversized_file_with_413() {
    let app = TestApp::spawn_with(|config| {
        config.upload.max_bytes = 1024;
    })
    .await;

    let form = multipart::Form::new().part(
        "file",
        multipart::Part::bytes(vec![0u8; 4096])
            .file_name("big.pdf")
            .mime_str("application/pdf")
            .unwrap(),
    );
    let response = app
        .client()
        .post(format!("{}/upload", app.address))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(StatusCode::PAYLOAD_TOO_LARGE, response.status());
    assert_eq!(0, app.spooled_file_count());

    app.cleanup().await;
}

#[tokio::test]
async fn upload_cleans_up_when_upstream_fails() {
    let failing = MockRag::spawn_failing(StatusCode::INTERNAL_SERVER_ERROR).await;
    let url = failing.url.clone();
    let app = TestApp::spawn_with(move |config| {
        config.rag_service.url = url;
    })
    .await;

    let response = app
        .client()
        .post(format!("{}/upload", app.address))
        .multipart(pdf_form("report.pdf"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, response.status());
    // The upstream error body must not leak through.
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(!body["error"].as_str().unwrap().contains("exploded"));

    assert_eq!(0, app.spooled_file_count(), "spooled file must be deleted");

    app.cleanup().await;
}

#[tokio::test]
async fn upload_returns_503_when_upstream_is_down() {
    let app = TestApp::spawn_with(|config| {
        config.rag_service.url = "http://127.0.0.1:1".to_string();
    })
    .await;

    let response = app
        .client()
        .post(format!("{}/upload", app.address))
        .multipart(pdf_form("report.pdf"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(StatusCode::SERVICE_UNAVAILABLE, response.status());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "RAG service unavailable");
    assert_eq!(0, app.spooled_file_count());

    app.cleanup().await;
}
