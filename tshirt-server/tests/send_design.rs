//! Integration tests for `POST /api/send-design`.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{valid_submission, FailingMailer, TestApp, SELLER, SENDER};
use tshirt_renderer::parse_data_uri;
use tshirt_server::OutboxMailer;

// ============================================================================
// Successful Delivery
// ============================================================================

#[tokio::test]
async fn test_valid_submission_is_sent() {
    let (app, mailer) = TestApp::recording();
    let body = valid_submission();

    let response = app.post_json("/api/send-design", &body).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json(),
        serde_json::json!({"success": true, "message": "Design sent successfully!"})
    );

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    let message = &sent[0];
    assert_eq!(message.from, SENDER);
    assert_eq!(message.to, SELLER);
    assert_eq!(
        message.subject,
        "New T-Shirt Design Submission from Ada Lovelace"
    );
    assert_eq!(message.attachment_name, "design.png");
    assert_eq!(message.attachment_content_type, "image/png");

    let uri = body["designImage"].as_str().expect("string");
    assert_eq!(message.attachment, parse_data_uri(uri).expect("uri").data);
    assert!(message.html.contains("N/A"));
    assert!(message.html.contains("N1 9GU"));
}

#[tokio::test]
async fn test_company_is_included() {
    let (app, mailer) = TestApp::recording();
    let mut body = valid_submission();
    body["userDetails"]["company"] = "Difference Engines Ltd".into();

    let response = app.post_json("/api/send-design", &body).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(mailer.sent()[0].html.contains("Difference Engines Ltd"));
}

#[tokio::test]
async fn test_submission_lands_in_outbox() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = TestApp::with_mailer(Arc::new(OutboxMailer::new(dir.path())));

    let response = app.post_json("/api/send-design", &valid_submission()).await;
    assert_eq!(response.status, StatusCode::OK);

    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .expect("outbox")
        .filter_map(Result::ok)
        .collect();
    assert_eq!(entries.len(), 1);
    let message_dir = entries[0].path();
    assert!(message_dir.join("design.png").is_file());
    assert!(message_dir.join("message.html").is_file());
    assert!(message_dir.join("meta.json").is_file());
}

// ============================================================================
// Validation Failures
// ============================================================================

#[tokio::test]
async fn test_missing_block_is_rejected() {
    let (app, mailer) = TestApp::recording();

    for field in ["designImage", "userDetails", "deliveryDetails"] {
        let mut body = valid_submission();
        body.as_object_mut().expect("object").remove(field);

        let response = app.post_json("/api/send-design", &body).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "without {field}");
        assert_eq!(
            response.json(),
            serde_json::json!({"error": "Missing required fields"})
        );
    }
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_blank_field_is_named() {
    let (app, mailer) = TestApp::recording();
    let mut body = valid_submission();
    body["deliveryDetails"]["postalCode"] = "  ".into();

    let response = app.post_json("/api/send-design", &body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "Postal code is required");
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_missing_nested_field_is_named() {
    let (app, _) = TestApp::recording();
    let mut body = valid_submission();
    body["userDetails"]
        .as_object_mut()
        .expect("object")
        .remove("email");

    let response = app.post_json("/api/send-design", &body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "Email is required");
}

#[tokio::test]
async fn test_non_png_design_is_rejected() {
    let (app, mailer) = TestApp::recording();
    let mut body = valid_submission();
    body["designImage"] = "data:image/png;base64,aGVsbG8=".into();

    let response = app.post_json("/api/send-design", &body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let error = response.json()["error"].as_str().expect("error").to_string();
    assert!(error.starts_with("Invalid design image"), "{error}");
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let (app, _) = TestApp::recording();
    let request = axum::http::Request::post("/api/send-design")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .expect("request");

    let response = app.request(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json()["error"].is_string());
}

// ============================================================================
// Delivery Failures
// ============================================================================

#[tokio::test]
async fn test_mailer_failure_is_generic_500() {
    let app = TestApp::with_mailer(Arc::new(FailingMailer));

    let response = app.post_json("/api/send-design", &valid_submission()).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json(),
        serde_json::json!({"error": "Failed to send design. Please try again."})
    );
}
