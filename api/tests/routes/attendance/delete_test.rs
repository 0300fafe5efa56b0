use axum::http::{Method, StatusCode};
use serde_json::json;
use serial_test::serial;
use tower::ServiceExt;

use crate::helpers::{body_json, make_test_app, request};

#[tokio::test]
#[serial]
async fn remove_record_then_404() {
    let t = make_test_app(2).await;
    let sid = t.start_session().await;
    let student = t.students[0];

    let body = json!({ "student_id": student, "method": "manual", "status": "present" });
    t.app
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/attendance/sessions/{sid}/records"),
            Some(&t.lecturer_token()),
            Some(body),
        ))
        .await
        .unwrap();

    let uri = format!("/api/attendance/sessions/{sid}/records/{student}");

    let resp = t
        .app
        .clone()
        .oneshot(request(Method::DELETE, &uri, Some(&t.lecturer_token()), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["student_id"], student);

    let resp = t
        .app
        .clone()
        .oneshot(request(Method::DELETE, &uri, Some(&t.lecturer_token()), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn cannot_remove_after_end() {
    let t = make_test_app(1).await;
    let sid = t.start_session().await;
    let student = t.students[0];

    let body = json!({ "student_id": student, "method": "manual", "status": "present" });
    t.app
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/attendance/sessions/{sid}/records"),
            Some(&t.lecturer_token()),
            Some(body),
        ))
        .await
        .unwrap();
    t.app
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/api/attendance/sessions/{sid}/end"),
            Some(&t.lecturer_token()),
            None,
        ))
        .await
        .unwrap();

    let resp = t
        .app
        .clone()
        .oneshot(request(
            Method::DELETE,
            &format!("/api/attendance/sessions/{sid}/records/{student}"),
            Some(&t.lecturer_token()),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CONFLICT);
}
