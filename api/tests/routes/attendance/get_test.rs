use axum::http::{Method, StatusCode};
use serde_json::json;
use serial_test::serial;
use tower::ServiceExt;

use crate::helpers::app::OTHER_LECTURER_USER;
use crate::helpers::{body_json, make_test_app, request};

#[tokio::test]
#[serial]
async fn active_session_is_404_until_started() {
    let t = make_test_app(1).await;
    let uri = "/api/attendance/sessions/active";

    let resp = t
        .app
        .clone()
        .oneshot(request(Method::GET, uri, Some(&t.lecturer_token()), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let sid = t.start_session().await;

    let resp = t
        .app
        .clone()
        .oneshot(request(Method::GET, uri, Some(&t.lecturer_token()), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["id"], sid);
    assert_eq!(json["data"]["total_students"], 1);
}

#[tokio::test]
#[serial]
async fn scope_status_reports_active_session() {
    let t = make_test_app(1).await;
    let uri = format!(
        "/api/attendance/sessions/status?department_id={}&option_id={}&course_id={}",
        t.fx.department.id, t.fx.option.id, t.fx.course.id
    );

    let resp = t
        .app
        .clone()
        .oneshot(request(Method::GET, &uri, Some(&t.lecturer_token()), None))
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["data"]["active"], false);
    assert!(json["data"]["session"].is_null());

    let sid = t.start_session().await;

    let resp = t
        .app
        .clone()
        .oneshot(request(Method::GET, &uri, Some(&t.lecturer_token()), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["active"], true);
    assert_eq!(json["data"]["session"]["id"], sid);
}

#[tokio::test]
#[serial]
async fn scope_status_shows_own_session_alongside_a_colleague() {
    let t = make_test_app(1).await;
    db::models::lecturer::Model::create(t.state.db(), 503, t.fx.department.id, "Grace", "Hopper")
        .await
        .unwrap();

    let mine = t.start_session().await;

    let req = request(
        Method::POST,
        "/api/attendance/sessions",
        Some(&t.token(503, false)),
        Some(t.start_body(t.fx.course.id, false)),
    );
    let resp = t.app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let theirs = body_json(resp).await["data"]["session"]["id"].as_i64().unwrap();
    assert_ne!(mine, theirs);

    let uri = format!(
        "/api/attendance/sessions/status?department_id={}&option_id={}&course_id={}",
        t.fx.department.id, t.fx.option.id, t.fx.course.id
    );
    let resp = t
        .app
        .clone()
        .oneshot(request(Method::GET, &uri, Some(&t.lecturer_token()), None))
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["data"]["active"], true);
    assert_eq!(json["data"]["session"]["id"], mine);
}

#[tokio::test]
#[serial]
async fn stats_follow_recorded_attendance() {
    let t = make_test_app(4).await;
    let sid = t.start_session().await;
    let records = format!("/api/attendance/sessions/{sid}/records");

    for (student, method) in [
        (t.students[0], "face_recognition"),
        (t.students[1], "face_recognition"),
        (t.students[2], "fingerprint"),
    ] {
        let body = json!({ "student_id": student, "method": method, "status": "present" });
        let resp = t
            .app
            .clone()
            .oneshot(request(Method::POST, &records, Some(&t.lecturer_token()), Some(body)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = t
        .app
        .clone()
        .oneshot(request(
            Method::GET,
            &format!("/api/attendance/sessions/{sid}/stats"),
            Some(&t.lecturer_token()),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    let stats = &json["data"];
    assert_eq!(stats["total_students"], 4);
    assert_eq!(stats["present_count"], 3);
    assert_eq!(stats["absent_count"], 1);
    assert_eq!(stats["attendance_rate"], 75.0);

    let breakdown = stats["method_breakdown"].as_array().unwrap();
    assert_eq!(breakdown.len(), 2);
    let face = breakdown
        .iter()
        .find(|m| m["method"] == "face_recognition")
        .unwrap();
    assert_eq!(face["count"], 2);
}

#[tokio::test]
#[serial]
async fn history_lists_student_details() {
    let t = make_test_app(2).await;
    let sid = t.start_session().await;
    let uri = format!("/api/attendance/sessions/{sid}/records");

    let body = json!({ "student_id": t.students[0], "method": "manual", "status": "present" });
    t.app
        .clone()
        .oneshot(request(Method::POST, &uri, Some(&t.lecturer_token()), Some(body)))
        .await
        .unwrap();

    let resp = t
        .app
        .clone()
        .oneshot(request(Method::GET, &uri, Some(&t.lecturer_token()), None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["reg_no"], "REG00001");
    assert_eq!(rows[0]["method"], "manual");
}

#[tokio::test]
#[serial]
async fn other_lecturer_cannot_read_session() {
    let t = make_test_app(1).await;
    let sid = t.start_session().await;
    let other = t.token(OTHER_LECTURER_USER, false);

    for path in ["", "/records", "/stats"] {
        let resp = t
            .app
            .clone()
            .oneshot(request(
                Method::GET,
                &format!("/api/attendance/sessions/{sid}{path}"),
                Some(&other),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "path {path:?}");
    }
}

#[tokio::test]
#[serial]
async fn unknown_session_is_404() {
    let t = make_test_app(0).await;

    let resp = t
        .app
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/attendance/sessions/9999",
            Some(&t.lecturer_token()),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["status"], "error");
}
