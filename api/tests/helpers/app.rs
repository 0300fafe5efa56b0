use api::{auth::generate_jwt, auth::middleware::log_request, routes::routes};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response},
    middleware::from_fn,
};
use db::test_utils::{Fixture, setup_test_db};
use serde_json::Value;
use std::sync::Arc;
use util::config::AppConfig;
use util::recognition::{AdapterError, FaceFrame, MatchVerdict, RecognitionAdapter};
use util::state::AppState;

pub const LECTURER_USER: i64 = 501;
pub const OTHER_LECTURER_USER: i64 = 502;
pub const ADMIN_USER: i64 = 1;

/// Recognises whoever is named in the image payload: `"student:<id>"`.
/// `"offline"` simulates an unreachable service; anything else is no match.
pub struct PayloadAdapter;

#[async_trait]
impl RecognitionAdapter for PayloadAdapter {
    async fn identify(&self, frame: &FaceFrame, candidates: &[i64]) -> Result<MatchVerdict, AdapterError> {
        let payload = frame.payload();
        if payload == "offline" {
            return Err(AdapterError::Unavailable("connection refused".into()));
        }
        match payload.strip_prefix("student:").and_then(|s| s.parse::<i64>().ok()) {
            Some(id) if candidates.contains(&id) => Ok(MatchVerdict::matched(id, 88.0)),
            _ => Ok(MatchVerdict::no_match()),
        }
    }
}

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub fx: Fixture,
    pub other: Fixture,
    pub students: Vec<i64>,
}

impl TestApp {
    pub fn token(&self, user_id: i64, admin: bool) -> String {
        generate_jwt(user_id, admin).unwrap().0
    }

    pub fn lecturer_token(&self) -> String {
        self.token(LECTURER_USER, false)
    }

    pub fn start_body(&self, course_id: i64, force: bool) -> Value {
        serde_json::json!({
            "department_id": self.fx.department.id,
            "option_id": self.fx.option.id,
            "course_id": course_id,
            "class_level": Fixture::CLASS_LEVEL,
            "force": force,
        })
    }

    /// Starts a session for the default course through the API and returns its id.
    pub async fn start_session(&self) -> i64 {
        use tower::ServiceExt;

        let req = request(
            Method::POST,
            "/api/attendance/sessions",
            Some(&self.lecturer_token()),
            Some(self.start_body(self.fx.course.id, false)),
        );
        let resp = self.app.clone().oneshot(req).await.unwrap();
        let json = body_json(resp).await;
        json["data"]["session"]["id"].as_i64().expect("session id")
    }
}

/// Fresh in-memory database, two lecturers in separate departments, and
/// `roster` students enrolled in the first lecturer's scope.
pub async fn make_test_app(roster: usize) -> TestApp {
    AppConfig::set_jwt_secret("attendance-test-secret");
    AppConfig::set_jwt_duration_minutes(30);

    let db = setup_test_db().await;
    let fx = Fixture::seed(&db, LECTURER_USER).await;
    let other = Fixture::seed(&db, OTHER_LECTURER_USER).await;
    let students = fx.enrol(&db, roster).await;

    let state = AppState::new(db, Arc::new(PayloadAdapter));
    let app = Router::new()
        .nest("/api", routes(state.clone()))
        .layer(from_fn(log_request));

    TestApp {
        app,
        state,
        fx,
        other,
        students,
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header("Authorization", format!("Bearer {t}"));
    }
    match body {
        Some(b) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(resp: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
