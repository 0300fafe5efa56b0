use axum::http::{Method, StatusCode};
use serial_test::serial;
use tower::ServiceExt;

use crate::helpers::{body_json, make_test_app, request};

#[tokio::test]
#[serial]
async fn health_is_public() {
    let t = make_test_app(0).await;

    let resp = t
        .app
        .clone()
        .oneshot(request(Method::GET, "/api/health", None, None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["status"], "success");
}
