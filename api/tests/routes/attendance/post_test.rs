use axum::http::{Method, StatusCode};
use serde_json::json;
use serial_test::serial;
use tower::ServiceExt;

use crate::helpers::{body_json, make_test_app, request};

mod start_session {
    use super::*;

    #[tokio::test]
    #[serial]
    async fn start_returns_201_with_roster_size() {
        let t = make_test_app(3).await;

        let req = request(
            Method::POST,
            "/api/attendance/sessions",
            Some(&t.lecturer_token()),
            Some(t.start_body(t.fx.course.id, false)),
        );
        let resp = t.app.clone().oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::CREATED);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "Attendance session started");
        assert_eq!(json["data"]["session"]["status"], "active");
        assert_eq!(json["data"]["session"]["total_students"], 3);
        assert_eq!(json["data"]["session"]["biometric_method"], "face_recognition");
        assert!(json["data"].get("replaced_session_id").is_none());
    }

    #[tokio::test]
    #[serial]
    async fn camel_case_class_level_is_accepted() {
        let t = make_test_app(1).await;
        let body = json!({
            "department_id": t.fx.department.id,
            "option_id": t.fx.option.id,
            "course_id": t.fx.course.id,
            "classLevel": "Year 2",
            "biometric_method": "fingerprint",
        });

        let req = request(Method::POST, "/api/attendance/sessions", Some(&t.lecturer_token()), Some(body));
        let resp = t.app.clone().oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::CREATED);
        let json = body_json(resp).await;
        assert_eq!(json["data"]["session"]["biometric_method"], "fingerprint");
    }

    #[tokio::test]
    #[serial]
    async fn second_start_is_409_existing_session() {
        let t = make_test_app(2).await;
        let first = t.start_session().await;
        let elective = t.fx.add_course(t.state.db(), "SE50199").await;

        let req = request(
            Method::POST,
            "/api/attendance/sessions",
            Some(&t.lecturer_token()),
            Some(t.start_body(elective.id, false)),
        );
        let resp = t.app.clone().oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "existing_session");
        assert_eq!(json["data"]["existing_session"]["id"], first);
        assert_eq!(json["data"]["same_scope"], false);
    }

    #[tokio::test]
    #[serial]
    async fn force_replaces_the_active_session() {
        let t = make_test_app(2).await;
        let first = t.start_session().await;
        let elective = t.fx.add_course(t.state.db(), "SE50199").await;

        let req = request(
            Method::POST,
            "/api/attendance/sessions",
            Some(&t.lecturer_token()),
            Some(t.start_body(elective.id, true)),
        );
        let resp = t.app.clone().oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::CREATED);
        let json = body_json(resp).await;
        assert_eq!(json["data"]["replaced_session_id"], first);
        assert_eq!(json["data"]["session"]["course_id"], elective.id);

        let req = request(
            Method::GET,
            &format!("/api/attendance/sessions/{first}"),
            Some(&t.lecturer_token()),
            None,
        );
        let json = body_json(t.app.clone().oneshot(req).await.unwrap()).await;
        assert_eq!(json["data"]["status"], "ended");
    }

    #[tokio::test]
    #[serial]
    async fn force_new_is_accepted_as_force() {
        let t = make_test_app(1).await;
        let first = t.start_session().await;
        let body = json!({
            "department_id": t.fx.department.id,
            "option_id": t.fx.option.id,
            "course_id": t.fx.course.id,
            "classLevel": "Year 2",
            "force_new": true,
        });

        let req = request(Method::POST, "/api/attendance/sessions", Some(&t.lecturer_token()), Some(body));
        let resp = t.app.clone().oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::CREATED);
        let json = body_json(resp).await;
        assert_eq!(json["data"]["replaced_session_id"], first);
    }

    #[tokio::test]
    #[serial]
    async fn missing_scope_is_400() {
        let t = make_test_app(0).await;
        let body = json!({ "department_id": t.fx.department.id, "class_level": "Year 2" });

        let req = request(Method::POST, "/api/attendance/sessions", Some(&t.lecturer_token()), Some(body));
        let resp = t.app.clone().oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "error");
    }

    #[tokio::test]
    #[serial]
    async fn course_from_another_department_is_400() {
        let t = make_test_app(0).await;

        let req = request(
            Method::POST,
            "/api/attendance/sessions",
            Some(&t.lecturer_token()),
            Some(t.start_body(t.other.course.id, false)),
        );
        let resp = t.app.clone().oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    #[serial]
    async fn unknown_biometric_method_is_400() {
        let t = make_test_app(0).await;
        let mut body = t.start_body(t.fx.course.id, false);
        body["biometric_method"] = json!("iris");

        let req = request(Method::POST, "/api/attendance/sessions", Some(&t.lecturer_token()), Some(body));
        let resp = t.app.clone().oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    #[serial]
    async fn missing_token_is_401() {
        let t = make_test_app(0).await;

        let req = request(
            Method::POST,
            "/api/attendance/sessions",
            None,
            Some(t.start_body(t.fx.course.id, false)),
        );
        let resp = t.app.clone().oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "error");
    }

    #[tokio::test]
    #[serial]
    async fn token_signed_with_another_secret_is_401() {
        let t = make_test_app(0).await;
        util::config::AppConfig::set_jwt_secret("some-other-secret");
        let forged = t.lecturer_token();
        util::config::AppConfig::set_jwt_secret("attendance-test-secret");

        let req = request(
            Method::POST,
            "/api/attendance/sessions",
            Some(&forged),
            Some(t.start_body(t.fx.course.id, false)),
        );
        let resp = t.app.clone().oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}

mod end_session {
    use super::*;

    #[tokio::test]
    #[serial]
    async fn end_returns_stats_and_second_end_is_409() {
        let t = make_test_app(2).await;
        let sid = t.start_session().await;
        let uri = format!("/api/attendance/sessions/{sid}/end");

        let resp = t
            .app
            .clone()
            .oneshot(request(Method::POST, &uri, Some(&t.lecturer_token()), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["data"]["session"]["status"], "ended");
        assert_eq!(json["data"]["stats"]["total_students"], 2);
        assert_eq!(json["data"]["stats"]["present_count"], 0);

        let resp = t
            .app
            .clone()
            .oneshot(request(Method::POST, &uri, Some(&t.lecturer_token()), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(resp).await["status"], "error");
    }

    #[tokio::test]
    #[serial]
    async fn another_lecturer_cannot_end_it() {
        let t = make_test_app(1).await;
        let sid = t.start_session().await;

        let resp = t
            .app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/attendance/sessions/{sid}/end"),
                Some(&t.token(crate::helpers::app::OTHER_LECTURER_USER, false)),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    #[serial]
    async fn admin_can_end_any_session() {
        let t = make_test_app(1).await;
        let sid = t.start_session().await;

        let resp = t
            .app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/attendance/sessions/{sid}/end"),
                Some(&t.token(crate::helpers::app::ADMIN_USER, true)),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
    }
}

mod records {
    use super::*;

    #[tokio::test]
    #[serial]
    async fn record_is_idempotent_per_student() {
        let t = make_test_app(3).await;
        let sid = t.start_session().await;
        let student = t.students[0];
        let uri = format!("/api/attendance/sessions/{sid}/records");

        for _ in 0..2 {
            let body = json!({ "student_id": student, "method": "face_recognition", "status": "present" });
            let resp = t
                .app
                .clone()
                .oneshot(request(Method::POST, &uri, Some(&t.lecturer_token()), Some(body)))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            let json = body_json(resp).await;
            assert_eq!(json["data"]["student_id"], student);
            assert_eq!(json["data"]["status"], "present");
        }

        let resp = t
            .app
            .clone()
            .oneshot(request(Method::GET, &uri, Some(&t.lecturer_token()), None))
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    #[serial]
    async fn student_outside_roster_is_422() {
        let t = make_test_app(1).await;
        let outsider = t.other.enrol(t.state.db(), 1).await[0];
        let sid = t.start_session().await;

        let body = json!({ "student_id": outsider, "method": "manual", "status": "present" });
        let resp = t
            .app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/attendance/sessions/{sid}/records"),
                Some(&t.lecturer_token()),
                Some(body),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    #[serial]
    async fn unknown_method_is_400() {
        let t = make_test_app(1).await;
        let sid = t.start_session().await;

        let body = json!({ "student_id": t.students[0], "method": "telepathy", "status": "present" });
        let resp = t
            .app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/attendance/sessions/{sid}/records"),
                Some(&t.lecturer_token()),
                Some(body),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    #[serial]
    async fn write_after_end_is_409() {
        let t = make_test_app(1).await;
        let sid = t.start_session().await;
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

        let body = json!({ "student_id": t.students[0], "method": "manual", "status": "present" });
        let resp = t
            .app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/attendance/sessions/{sid}/records"),
                Some(&t.lecturer_token()),
                Some(body),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "error");
        assert!(json["message"].as_str().unwrap().contains("not active"));
    }

    #[tokio::test]
    #[serial]
    async fn manual_entry_records_operator_and_checks_date() {
        let t = make_test_app(2).await;
        let sid = t.start_session().await;
        let uri = format!("/api/attendance/sessions/{sid}/manual");

        let body = json!({ "student_id": t.students[1], "status": "excused" });
        let resp = t
            .app
            .clone()
            .oneshot(request(Method::POST, &uri, Some(&t.lecturer_token()), Some(body)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["data"]["status"], "excused");
        assert_eq!(json["data"]["method"], "manual");
        assert_eq!(json["data"]["recorded_by"], crate::helpers::app::LECTURER_USER);

        let body = json!({ "student_id": t.students[1], "status": "present", "date": "1999-01-01" });
        let resp = t
            .app
            .clone()
            .oneshot(request(Method::POST, &uri, Some(&t.lecturer_token()), Some(body)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

mod captures {
    use super::*;

    #[tokio::test]
    #[serial]
    async fn recognized_face_is_recorded_present() {
        let t = make_test_app(2).await;
        let sid = t.start_session().await;
        let student = t.students[1];

        let body = json!({ "image": format!("data:image/jpeg;base64,student:{student}") });
        let resp = t
            .app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/attendance/sessions/{sid}/recognize"),
                Some(&t.lecturer_token()),
                Some(body),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"]["student_id"], student);
        assert_eq!(json["data"]["method"], "face_recognition");
        assert_eq!(json["data"]["confidence"], 88.0);
    }

    #[tokio::test]
    #[serial]
    async fn image_data_field_is_accepted() {
        let t = make_test_app(1).await;
        let sid = t.start_session().await;
        let student = t.students[0];

        let resp = t
            .app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/attendance/sessions/{sid}/recognize"),
                Some(&t.lecturer_token()),
                Some(json!({ "image_data": format!("student:{student}") })),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"]["student_id"], student);
    }

    #[tokio::test]
    #[serial]
    async fn unrecognized_or_offline_is_a_warning() {
        let t = make_test_app(1).await;
        let sid = t.start_session().await;
        let uri = format!("/api/attendance/sessions/{sid}/recognize");

        for image in ["nobody", "offline"] {
            let resp = t
                .app
                .clone()
                .oneshot(request(
                    Method::POST,
                    &uri,
                    Some(&t.lecturer_token()),
                    Some(json!({ "image": image })),
                ))
                .await
                .unwrap();

            assert_eq!(resp.status(), StatusCode::OK);
            let json = body_json(resp).await;
            assert_eq!(json["status"], "warning");
            assert!(json["data"].is_null());
        }

        let resp = t
            .app
            .clone()
            .oneshot(request(
                Method::GET,
                &format!("/api/attendance/sessions/{sid}/records"),
                Some(&t.lecturer_token()),
                None,
            ))
            .await
            .unwrap();
        assert!(body_json(resp).await["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn fingerprint_scan_matches_enrolled_template() {
        let t = make_test_app(2).await;
        let sid = t.start_session().await;
        let uri = format!("/api/attendance/sessions/{sid}/fingerprint");

        let resp = t
            .app
            .clone()
            .oneshot(request(
                Method::POST,
                &uri,
                Some(&t.lecturer_token()),
                Some(json!({ "fingerprint_id": "FP00002" })),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"]["student_id"], t.students[1]);
        assert_eq!(json["data"]["method"], "fingerprint");

        let resp = t
            .app
            .clone()
            .oneshot(request(
                Method::POST,
                &uri,
                Some(&t.lecturer_token()),
                Some(json!({ "fingerprint_id": "FP99999" })),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "warning");
    }

    #[tokio::test]
    #[serial]
    async fn empty_image_is_400() {
        let t = make_test_app(1).await;
        let sid = t.start_session().await;

        let resp = t
            .app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/attendance/sessions/{sid}/recognize"),
                Some(&t.lecturer_token()),
                Some(json!({ "image": "" })),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

mod roster {
    use super::*;

    #[tokio::test]
    #[serial]
    async fn refresh_picks_up_new_enrolments() {
        let t = make_test_app(2).await;
        let sid = t.start_session().await;
        t.fx.enrol(t.state.db(), 1).await;

        let resp = t
            .app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/attendance/sessions/{sid}/roster/refresh"),
                Some(&t.lecturer_token()),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["data"]["total_students"], 3);
        assert_eq!(json["data"]["added"], 1);
        assert_eq!(json["data"]["removed"], 0);
    }
}
