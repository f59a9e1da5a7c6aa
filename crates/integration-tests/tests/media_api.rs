//! Image generation relay and CDN uploads against fake third-party APIs.

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};
use tidepool_integration_tests::{
    FakeApi, FakeShopify, TestApp, body_text, cdn_config, media_config, test_config,
};
use tidepool_storefront::services::cdn::CdnError;
use tidepool_storefront::services::media::{MediaError, TaskStatus};

const GENERATIONS: &str = "/v1/images/generations";
const UPLOAD: &str = "/v1_1/tidepool-test/image/upload";

async fn app_with_media() -> (FakeApi, TestApp) {
    let shopify = FakeShopify::start().await;
    let api = FakeApi::start().await;
    let mut config = test_config(&shopify, None);
    config.media = Some(media_config(&api));
    config.cdn = Some(cdn_config(&api));
    (api, TestApp::new(config))
}

async fn json_body(response: axum::http::Response<axum::body::Body>) -> Value {
    serde_json::from_str(&body_text(response).await).expect("JSON body")
}

// =============================================================================
// Image generation
// =============================================================================

#[tokio::test]
async fn test_create_generation_relays_task() {
    let (api, app) = app_with_media().await;
    api.respond(
        Method::POST,
        GENERATIONS,
        StatusCode::OK,
        json!({
            "code": 0,
            "message": "SUCCEED",
            "data": { "task_id": "task-7", "task_status": "submitted" }
        }),
    );

    let response = app
        .post_json(
            "/api/media/generations",
            &json!({ "prompt": "  a tide pool at dawn  ", "n": 2, "aspect_ratio": "16:9" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(response.headers()["cache-control"], "private, no-store");
    assert_eq!(
        json_body(response).await,
        json!({ "task_id": "task-7", "status": "submitted", "images": [] })
    );

    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    let token = requests[0]
        .authorization
        .as_deref()
        .and_then(|value| value.strip_prefix("Bearer "))
        .expect("bearer token");
    assert_eq!(token.split('.').count(), 3);

    let sent: Value = serde_json::from_str(&requests[0].body).expect("JSON request");
    assert_eq!(sent["model_name"], "kling-v1");
    assert_eq!(sent["prompt"], "a tide pool at dawn");
    assert_eq!(sent["n"], 2);
    assert_eq!(sent["aspect_ratio"], "16:9");
    assert!(sent.get("negative_prompt").is_none());
}

#[tokio::test]
async fn test_invalid_generation_is_rejected_before_sending() {
    let (api, app) = app_with_media().await;

    let response = app
        .post_json(
            "/api/media/generations",
            &json!({ "prompt": "a tide pool", "aspect_ratio": "5:4" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_generation_status_relays_images() {
    let (api, app) = app_with_media().await;
    api.respond(
        Method::GET,
        &format!("{GENERATIONS}/task-7"),
        StatusCode::OK,
        json!({
            "code": 0,
            "message": "SUCCEED",
            "data": {
                "task_id": "task-7",
                "task_status": "succeed",
                "task_status_msg": "",
                "task_result": { "images": [
                    { "index": 0, "url": "https://img.example/gen/1.png" },
                    { "index": 1, "url": "https://img.example/gen/2.png" }
                ]}
            }
        }),
    );

    let response = app.get("/api/media/generations/task-7").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({
            "task_id": "task-7",
            "status": "succeeded",
            "images": ["https://img.example/gen/1.png", "https://img.example/gen/2.png"]
        })
    );
}

#[tokio::test]
async fn test_api_error_code_is_server_error() {
    let (api, app) = app_with_media().await;
    api.respond(
        Method::GET,
        &format!("{GENERATIONS}/task-7"),
        StatusCode::OK,
        json!({ "code": 1102, "message": "Account balance not enough", "data": null }),
    );

    let response = app.get("/api/media/generations/task-7").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body_text(response).await.contains("balance"));

    let err = app
        .state()
        .media()
        .expect("media configured")
        .task_status("task-7")
        .await
        .expect_err("non-zero code");
    assert!(matches!(
        err,
        MediaError::Api { code: 1102, ref message } if message == "Account balance not enough"
    ));
}

#[tokio::test]
async fn test_envelope_without_data_is_response_error() {
    let (api, app) = app_with_media().await;
    api.respond(
        Method::GET,
        &format!("{GENERATIONS}/task-7"),
        StatusCode::OK,
        json!({ "code": 0, "message": "SUCCEED" }),
    );

    let err = app
        .state()
        .media()
        .expect("media configured")
        .task_status("task-7")
        .await
        .expect_err("missing data");
    assert!(matches!(err, MediaError::Response(_)));
}

#[tokio::test]
async fn test_malformed_task_id_is_bad_request() {
    let (api, app) = app_with_media().await;

    let response = app.get("/api/media/generations/task%21").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_pending_task_is_not_terminal() {
    let (api, app) = app_with_media().await;
    api.respond(
        Method::GET,
        &format!("{GENERATIONS}/task-8"),
        StatusCode::OK,
        json!({
            "code": 0,
            "message": "SUCCEED",
            "data": { "task_id": "task-8", "task_status": "processing" }
        }),
    );

    let task = app
        .state()
        .media()
        .expect("media configured")
        .task_status("task-8")
        .await
        .expect("task");
    assert_eq!(task.status, TaskStatus::Processing);
    assert!(!task.status.is_terminal());
    assert!(task.images.is_empty());
}

// =============================================================================
// CDN uploads
// =============================================================================

#[tokio::test]
async fn test_upload_signature() {
    let (api, app) = app_with_media().await;

    let response = app
        .post_json("/api/media/upload-signature", &json!({ "public_id": "gen-1" }))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let signed = json_body(response).await;
    assert_eq!(signed["cloud_name"], "tidepool-test");
    assert_eq!(signed["folder"], "storefront");
    assert_eq!(signed["public_id"], "gen-1");
    assert_eq!(signed["signature_algorithm"], "sha256");
    assert_eq!(signed["upload_url"], format!("{}{UPLOAD}", api.base_url()));
    let signature = signed["signature"].as_str().expect("signature");
    assert_eq!(signature.len(), 64);
    assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_remote_upload_returns_asset() {
    let (api, app) = app_with_media().await;
    api.respond(
        Method::POST,
        UPLOAD,
        StatusCode::OK,
        json!({
            "public_id": "storefront/gen-1",
            "secure_url": "https://res.cloudinary.com/tidepool-test/image/upload/v1/storefront/gen-1.png",
            "width": 1024,
            "height": 1024,
            "format": "png",
            "bytes": 48213
        }),
    );

    let response = app
        .post_json(
            "/api/media/uploads",
            &json!({ "file_url": "https://img.example/gen/1.png", "public_id": "gen-1" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let asset = json_body(response).await;
    assert_eq!(asset["public_id"], "storefront/gen-1");
    assert_eq!(asset["bytes"], 48213);
    assert_eq!(
        asset["delivery_url"],
        "https://res.cloudinary.com/tidepool-test/image/upload/f_auto,q_auto/storefront/gen-1"
    );

    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    let form = &requests[0].body;
    assert!(form.contains("file=https%3A%2F%2Fimg.example%2Fgen%2F1.png"));
    assert!(form.contains("api_key=873215904417"));
    assert!(form.contains("folder=storefront"));
    assert!(form.contains("public_id=gen-1"));
    assert!(form.contains("signature_algorithm=sha256"));
    assert!(form.contains("signature="));
}

#[tokio::test]
async fn test_rejected_upload_carries_cdn_message() {
    let (api, app) = app_with_media().await;
    api.respond(
        Method::POST,
        UPLOAD,
        StatusCode::BAD_REQUEST,
        json!({ "error": { "message": "Invalid image file" } }),
    );

    let response = app
        .post_json(
            "/api/media/uploads",
            &json!({ "file_url": "https://img.example/gen/broken.png" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body_text(response).await.contains("Invalid image file"));

    let err = app
        .state()
        .cdn()
        .expect("cdn configured")
        .upload_remote("https://img.example/gen/broken.png", None)
        .await
        .expect_err("rejected upload");
    assert!(matches!(
        err,
        CdnError::Api { status: 400, ref message } if message == "Invalid image file"
    ));
}

#[tokio::test]
async fn test_non_http_file_url_is_bad_request() {
    let (api, app) = app_with_media().await;

    let response = app
        .post_json("/api/media/uploads", &json!({ "file_url": "file:///etc/passwd" }))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(api.requests().is_empty());
}
