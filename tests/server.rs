#![cfg(feature = "serve")]
//! Integration tests for the upload viewer routes.
//!
//! None of these reach pdfium: uploads that are not PDFs are rejected
//! before the document is opened.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use datasheet_extract::{
    server::{create_router, create_router_with_limit, HealthResponse},
    ExtractionConfig,
};
use tower::ServiceExt;

const BOUNDARY: &str = "X-BOUNDARY";

fn router() -> Router {
    create_router(ExtractionConfig::default())
}

fn multipart_request(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
Content-Type: application/pdf\r\n\
\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/extract")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("content-length", body.len())
        .body(Body::from(body))
        .expect("Failed to build request")
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), 10_000_000)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is UTF-8")
}

#[tokio::test]
async fn test_index_shows_upload_form() {
    let request = Request::builder()
        .uri("/")
        .body(Body::empty())
        .expect("Failed to build request");

    let response = router().oneshot(request).await.expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("<title>Datasheet Extractor</title>"));
    assert!(html.contains("DATASHEET INFORMATION"));
    assert!(html.contains("Upload component datasheet (PDF)"));
    assert!(html.contains("action=\"/extract\""));
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("Failed to build request");

    let response = router().oneshot(request).await.expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), 10_000).await.unwrap();
    let health: HealthResponse = serde_json::from_slice(&bytes).expect("Health JSON");
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_missing_file_field_is_bad_request() {
    let request = multipart_request("attachment", "ds.pdf", b"%PDF-1.4");

    let response = router().oneshot(request).await.expect("Request failed");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let html = body_text(response).await;
    assert!(html.contains("No file uploaded"));
    // The form is still there to try again.
    assert!(html.contains("name=\"file\""));
}

#[tokio::test]
async fn test_empty_upload_is_bad_request() {
    let request = multipart_request("file", "ds.pdf", b"");

    let response = router().oneshot(request).await.expect("Request failed");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("The uploaded file is empty."));
}

#[tokio::test]
async fn test_non_pdf_upload_is_bad_request() {
    let request = multipart_request("file", "photo.pdf", b"GIF89a not a datasheet");

    let response = router().oneshot(request).await.expect("Request failed");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("File is not a valid PDF"));
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let router = create_router_with_limit(ExtractionConfig::default(), 1024);
    let request = multipart_request("file", "big.pdf", &vec![b'%'; 4096]);

    let response = router.oneshot(request).await.expect("Request failed");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let request = Request::builder()
        .uri("/does-not-exist")
        .body(Body::empty())
        .expect("Failed to build request");

    let response = router().oneshot(request).await.expect("Request failed");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
