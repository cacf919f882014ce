//! Integration tests for the three-step listing creation flow.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use axum::http::Method;
use ramm_client::create::{CreationFlow, CreationStep, ImageFile, ListingDraft, MISSING_IMAGE_MESSAGE};
use ramm_client::{ErrorKind, api::ProgressFn};
use ramm_core::ListingId;
use ramm_integration_tests::MockServer;
use serde_json::json;

fn draft() -> ListingDraft {
    ListingDraft {
        name: "Oak desk".to_string(),
        price: "120".to_string(),
        category: "furniture".to_string(),
        seller_id: "seller-1".to_string(),
    }
}

fn image() -> ImageFile {
    ImageFile::new("desk.png", vec![7_u8; 200 * 1024])
}

fn stub_upload_target(server: &MockServer) {
    let upload_url = server.url("storage/products/desk.png");
    server.stub(
        Method::GET,
        "/api/products/upload-url",
        200,
        json!({ "upload_url": upload_url.as_str(), "key": "products/desk.png" }),
    );
}

fn recorder() -> (ProgressFn, Arc<Mutex<Vec<u8>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let progress: ProgressFn = Arc::new(move |percent| sink.lock().unwrap().push(percent));
    (progress, seen)
}

// ============================================================================
// Happy path
// ============================================================================

#[tokio::test]
async fn test_creation_runs_three_steps_in_order() {
    let server = MockServer::start().await;
    stub_upload_target(&server);
    server.stub(Method::PUT, "/storage/products/desk.png", 200, json!({}));
    server.stub(
        Method::POST,
        "/api/products/create-product",
        200,
        json!({ "product_id": 31 }),
    );

    let api = server.api_client();
    let steps = Arc::new(Mutex::new(Vec::new()));
    let step_sink = Arc::clone(&steps);
    let (progress, seen) = recorder();
    let flow = CreationFlow::new(&api)
        .with_progress(progress)
        .with_step_observer(Arc::new(move |step| step_sink.lock().unwrap().push(step)));

    let id = flow.submit(&draft(), Some(&image())).await.unwrap();
    assert_eq!(id, ListingId::new(31));

    assert_eq!(
        *steps.lock().unwrap(),
        vec![
            CreationStep::RequestUploadUrl,
            CreationStep::UploadImage,
            CreationStep::CreateListing
        ]
    );

    let paths: Vec<String> = server.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(
        paths,
        vec![
            "/api/products/upload-url",
            "/storage/products/desk.png",
            "/api/products/create-product"
        ]
    );

    let target = &server.requests_to(&Method::GET, "/api/products/upload-url")[0];
    assert_eq!(target.query_param("filename").as_deref(), Some("desk.png"));

    let upload = &server.requests_to(&Method::PUT, "/storage/products/desk.png")[0];
    assert_eq!(upload.header("content-type"), Some("image/png"));
    assert_eq!(upload.body.len(), 200 * 1024);

    let create = &server.requests_to(&Method::POST, "/api/products/create-product")[0];
    assert_eq!(create.form_param("name").as_deref(), Some("Oak desk"));
    assert_eq!(create.form_param("price").as_deref(), Some("120"));
    assert_eq!(create.form_param("seller_id").as_deref(), Some("seller-1"));
    assert_eq!(create.form_param("image_keys").as_deref(), Some("products/desk.png"));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.last(), Some(&100));
    assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]), "{seen:?}");
}

// ============================================================================
// Failure modes
// ============================================================================

#[tokio::test]
async fn test_missing_image_sends_nothing() {
    let server = MockServer::start().await;
    let api = server.api_client();

    let err = CreationFlow::new(&api).submit(&draft(), None).await.unwrap_err();

    assert_eq!(err.user_message(), MISSING_IMAGE_MESSAGE);
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_upload_url_failure_stops_before_upload() {
    let server = MockServer::start().await;
    server.stub(
        Method::GET,
        "/api/products/upload-url",
        500,
        json!({ "detail": "Could not generate upload URL" }),
    );
    let api = server.api_client();

    let err = CreationFlow::new(&api)
        .submit(&draft(), Some(&image()))
        .await
        .unwrap_err();

    assert_eq!(err.step, Some(CreationStep::RequestUploadUrl));
    assert_eq!(
        err.user_message(),
        "Backend Error (500): Could not generate upload URL"
    );
    assert!(err.orphaned_key.is_none());
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_create_failure_reports_orphaned_image_and_resets_progress() {
    let server = MockServer::start().await;
    stub_upload_target(&server);
    server.stub(Method::PUT, "/storage/products/desk.png", 200, json!({}));
    server.stub(
        Method::POST,
        "/api/products/create-product",
        500,
        json!({ "detail": "Failed to create product in database." }),
    );
    let api = server.api_client();
    let (progress, seen) = recorder();

    let err = CreationFlow::new(&api)
        .with_progress(progress)
        .submit(&draft(), Some(&image()))
        .await
        .unwrap_err();

    assert_eq!(err.step, Some(CreationStep::CreateListing));
    assert_eq!(err.kind(), ErrorKind::Backend);
    assert_eq!(err.orphaned_key.as_deref(), Some("products/desk.png"));
    assert_eq!(seen.lock().unwrap().last(), Some(&0));
}

#[tokio::test]
async fn test_retry_repeats_every_step() {
    let server = MockServer::start().await;
    stub_upload_target(&server);
    server.stub(Method::PUT, "/storage/products/desk.png", 500, json!({}));
    server.stub(Method::PUT, "/storage/products/desk.png", 200, json!({}));
    server.stub(
        Method::POST,
        "/api/products/create-product",
        200,
        json!({ "product_id": 4 }),
    );
    let api = server.api_client();
    let flow = CreationFlow::new(&api);
    let draft = draft();
    let image = image();

    let first = flow.submit(&draft, Some(&image)).await.unwrap_err();
    assert_eq!(first.step, Some(CreationStep::UploadImage));
    assert!(
        server
            .requests_to(&Method::POST, "/api/products/create-product")
            .is_empty()
    );

    let id = flow.submit(&draft, Some(&image)).await.unwrap();
    assert_eq!(id, ListingId::new(4));
    assert_eq!(
        server
            .requests_to(&Method::GET, "/api/products/upload-url")
            .len(),
        2
    );
}
