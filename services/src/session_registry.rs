//! Session Registry: owns the one-active-session-per-lecturer rule and the
//! start / conflict / force-new protocol.

use chrono::{DateTime, NaiveDate, Utc};
use db::models::{
    attendance_record,
    attendance_session::{self, BiometricMethod, NewSession, SessionStatus},
    session_student,
};
use sea_orm::{ConnectionTrait, EntityTrait, TransactionTrait};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::context::RequestContext;
use crate::error::{AttendanceError, AttendanceResult, is_unique_violation};
use crate::scope::{ResolvedScope, ScopeRequest};

/// Client-facing view of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub id: i64,
    pub lecturer_id: i64,
    pub department_id: i64,
    pub option_id: i64,
    pub course_id: i64,
    pub class_level: String,
    pub biometric_method: BiometricMethod,
    pub session_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub total_students: u64,
}

impl SessionSummary {
    pub fn from_model(model: attendance_session::Model, total_students: u64) -> Self {
        Self {
            id: model.id,
            lecturer_id: model.lecturer_id,
            department_id: model.department_id,
            option_id: model.option_id,
            course_id: model.course_id,
            class_level: model.class_level,
            biometric_method: model.biometric_method,
            session_date: model.session_date,
            start_time: model.start_time,
            end_time: model.end_time,
            status: model.status,
            total_students,
        }
    }

    pub(crate) async fn load<C: ConnectionTrait>(
        conn: &C,
        model: attendance_session::Model,
    ) -> AttendanceResult<Self> {
        let total = session_student::Model::count(conn, model.id).await?;
        Ok(Self::from_model(model, total))
    }

    fn same_scope(&self, scope: &ResolvedScope) -> bool {
        self.department_id == scope.department_id
            && self.option_id == scope.option_id
            && self.course_id == scope.course_id
            && self.class_level == scope.class_level
    }
}

/// Payload of a refused start: the session the caller may resume or override.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionConflict {
    pub existing_session: SessionSummary,
    /// Whether the existing session covers the scope that was requested.
    pub same_scope: bool,
}

#[derive(Debug, Clone)]
pub struct StartSession {
    pub scope: ScopeRequest,
    pub biometric_method: BiometricMethod,
    pub force: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartedSession {
    pub session: SessionSummary,
    /// The session that was ended to make room for this one, when `force` was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaced_session_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScopeStatus {
    pub active: bool,
    pub session: Option<SessionSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RosterRefresh {
    pub session_id: i64,
    pub total_students: u64,
    pub added: usize,
    pub removed: usize,
}

/// How often a forced start is tried before giving up with a conflict.
pub const START_ATTEMPTS: usize = 5;

pub struct SessionRegistry;

impl SessionRegistry {
    /// Starts a session for the calling lecturer.
    ///
    /// With an active session already open and `force == false` nothing is
    /// written and [`AttendanceError::Conflict`] describes the open session.
    /// With `force == true` that session is ended and the new one created in the
    /// same transaction. A forced start that loses a race against another start
    /// for the same lecturer is retried, up to [`START_ATTEMPTS`] times.
    pub async fn start(ctx: &RequestContext, req: StartSession) -> AttendanceResult<StartedSession> {
        let actor = ctx.actor();
        let lecturer = ctx.lecturer().await?.ok_or_else(|| {
            AttendanceError::forbidden("Only lecturers can start attendance sessions")
        })?;

        let scope = ctx.scope().resolve(&req.scope, lecturer.id).await?;
        let roster = ctx.scope().eligible_students(&scope).await?;

        let mut attempt = 0;
        let (created, replaced_session_id) = loop {
            attempt += 1;

            if !req.force {
                if let Some(open) =
                    attendance_session::Model::find_active_for_lecturer(ctx.db(), lecturer.id)
                        .await?
                {
                    return Err(Self::conflict(ctx.db(), open, &scope).await?);
                }
            }

            let txn = ctx.db().begin().await?;

            let replaced = if req.force {
                attendance_session::Model::close_active_for_lecturer(
                    &txn,
                    lecturer.id,
                    Some(actor.user_id),
                )
                .await?
            } else {
                Vec::new()
            };

            let created = attendance_session::Model::create(
                &txn,
                NewSession {
                    lecturer_id: lecturer.id,
                    department_id: scope.department_id,
                    option_id: scope.option_id,
                    course_id: scope.course_id,
                    class_level: scope.class_level.clone(),
                    biometric_method: req.biometric_method,
                },
            )
            .await;

            match created {
                Ok(model) => {
                    session_student::Model::insert_all(&txn, model.id, &roster).await?;
                    txn.commit().await?;
                    for id in &replaced {
                        info!(session_id = *id, lecturer_id = lecturer.id, "Force-ended active session");
                    }
                    break (model, replaced.first().copied());
                }
                Err(e) if is_unique_violation(&e) => {
                    txn.rollback().await?;
                    if req.force && attempt < START_ATTEMPTS {
                        warn!(lecturer_id = lecturer.id, attempt, "Concurrent forced start; retrying");
                        continue;
                    }
                    warn!(lecturer_id = lecturer.id, "Concurrent start lost the race");
                    let winner =
                        attendance_session::Model::find_active_for_lecturer(ctx.db(), lecturer.id)
                            .await?
                            .ok_or(AttendanceError::Persistence(e))?;
                    return Err(Self::conflict(ctx.db(), winner, &scope).await?);
                }
                Err(e) => return Err(e.into()),
            }
        };

        info!(
            session_id = created.id,
            lecturer_id = lecturer.id,
            course_id = created.course_id,
            students = roster.len(),
            "Attendance session started"
        );

        Ok(StartedSession {
            session: SessionSummary::from_model(created, roster.len() as u64),
            replaced_session_id,
        })
    }

    async fn conflict<C: ConnectionTrait>(
        conn: &C,
        open: attendance_session::Model,
        requested: &ResolvedScope,
    ) -> AttendanceResult<AttendanceError> {
        let existing_session = SessionSummary::load(conn, open).await?;
        let same_scope = existing_session.same_scope(requested);
        Ok(AttendanceError::Conflict(Box::new(SessionConflict {
            existing_session,
            same_scope,
        })))
    }

    /// The caller's active session, for resuming after a reload. Never creates anything.
    pub async fn active_for(ctx: &RequestContext) -> AttendanceResult<SessionSummary> {
        let lecturer = ctx
            .lecturer()
            .await?
            .ok_or_else(|| AttendanceError::not_found("No active session"))?;

        let session = attendance_session::Model::find_active_for_lecturer(ctx.db(), lecturer.id)
            .await?
            .ok_or_else(|| AttendanceError::not_found("No active session"))?;

        SessionSummary::load(ctx.db(), session).await
    }

    /// Whether an active session exists for a department/option/course triple.
    /// Lecturers only see their own sessions.
    pub async fn status_for_scope(
        ctx: &RequestContext,
        department_id: i64,
        option_id: i64,
        course_id: i64,
    ) -> AttendanceResult<ScopeStatus> {
        if department_id <= 0 || option_id <= 0 || course_id <= 0 {
            return Err(AttendanceError::validation(
                "department_id, option_id and course_id are required",
            ));
        }

        // Several lecturers can each have a session running on the same scope.
        let owner = if ctx.actor().admin {
            None
        } else {
            match ctx.lecturer().await? {
                Some(l) => Some(l.id),
                None => {
                    return Ok(ScopeStatus {
                        active: false,
                        session: None,
                    })
                }
            }
        };

        let visible = attendance_session::Model::find_active_for_scope(
            ctx.db(),
            department_id,
            option_id,
            course_id,
            owner,
        )
        .await?;

        let session = match visible {
            Some(s) => Some(SessionSummary::load(ctx.db(), s).await?),
            None => None,
        };

        Ok(ScopeStatus {
            active: session.is_some(),
            session,
        })
    }

    pub async fn get_session(ctx: &RequestContext, session_id: i64) -> AttendanceResult<SessionSummary> {
        let session = ctx.session(session_id).await?;
        SessionSummary::load(ctx.db(), session).await
    }

    /// Recomputes the roster of an active session from the current directory.
    ///
    /// Students that already hold a record stay on the roster, so the stats
    /// denominator never drops below the number of recorded students.
    pub async fn refresh_roster(ctx: &RequestContext, session_id: i64) -> AttendanceResult<RosterRefresh> {
        let session = ctx.session(session_id).await?;
        if !session.is_active() {
            return Err(AttendanceError::SessionNotActive { session_id });
        }

        let scope = ResolvedScope {
            department_id: session.department_id,
            option_id: session.option_id,
            course_id: session.course_id,
            class_level: session.class_level.clone(),
            lecturer_id: session.lecturer_id,
        };
        let eligible = ctx.scope().eligible_students(&scope).await?;

        let txn = ctx.db().begin().await?;

        let still_active = attendance_session::Entity::find_by_id(session_id)
            .one(&txn)
            .await?
            .is_some_and(|s| s.is_active());
        if !still_active {
            return Err(AttendanceError::SessionNotActive { session_id });
        }

        let previous: BTreeSet<i64> = session_student::Model::student_ids(&txn, session_id)
            .await?
            .into_iter()
            .collect();
        let mut next: BTreeSet<i64> = eligible.into_iter().collect();
        next.extend(attendance_record::Model::student_ids(&txn, session_id).await?);

        let roster: Vec<i64> = next.iter().copied().collect();
        session_student::Model::replace_all(&txn, session_id, &roster).await?;
        txn.commit().await?;

        let added = next.difference(&previous).count();
        let removed = previous.difference(&next).count();
        info!(session_id, added, removed, "Session roster refreshed");

        Ok(RosterRefresh {
            session_id,
            total_students: roster.len() as u64,
            added,
            removed,
        })
    }
}
