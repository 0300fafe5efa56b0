use async_trait::async_trait;
use db::models::attendance_session::BiometricMethod;
use db::test_utils::{Fixture, setup_test_db};
use sea_orm::DatabaseConnection;
use util::recognition::{AdapterError, FaceFrame, MatchVerdict, RecognitionAdapter};

use crate::context::{Actor, RequestContext};
use crate::scope::ScopeRequest;
use crate::session_registry::{SessionRegistry, SessionSummary, StartSession};

pub const LECTURER_USER: i64 = 10;

pub struct Harness {
    pub db: DatabaseConnection,
    pub fx: Fixture,
    pub students: Vec<i64>,
    pub ctx: RequestContext,
}

impl Harness {
    pub async fn new(roster: usize) -> Self {
        let db = setup_test_db().await;
        let fx = Fixture::seed(&db, LECTURER_USER).await;
        let students = fx.enrol(&db, roster).await;
        let ctx = RequestContext::new(db.clone(), Actor::user(LECTURER_USER));
        Self {
            db,
            fx,
            students,
            ctx,
        }
    }

    pub fn as_actor(&self, actor: Actor) -> RequestContext {
        RequestContext::new(self.db.clone(), actor)
    }

    pub fn request(&self, course_id: i64, force: bool) -> StartSession {
        StartSession {
            scope: ScopeRequest {
                department_id: self.fx.department.id,
                option_id: self.fx.option.id,
                course_id,
                class_level: Fixture::CLASS_LEVEL.to_string(),
            },
            biometric_method: BiometricMethod::FaceRecognition,
            force,
        }
    }

    pub async fn start(&self) -> SessionSummary {
        SessionRegistry::start(&self.ctx, self.request(self.fx.course.id, false))
            .await
            .expect("start session")
            .session
    }
}

/// Recognition adapter with a fixed answer.
pub enum StubAdapter {
    Match(i64, f64),
    NoMatch,
    Down,
}

#[async_trait]
impl RecognitionAdapter for StubAdapter {
    async fn identify(&self, _: &FaceFrame, _: &[i64]) -> Result<MatchVerdict, AdapterError> {
        match self {
            StubAdapter::Match(id, conf) => Ok(MatchVerdict::matched(*id, *conf)),
            StubAdapter::NoMatch => Ok(MatchVerdict::no_match()),
            StubAdapter::Down => Err(AdapterError::Unavailable("connection refused".into())),
        }
    }
}
