//! Attendance Recorder: the single write path for attendance facts, shared by
//! the face, fingerprint and manual channels.

use chrono::{DateTime, NaiveDate, Utc};
use db::models::{
    attendance_record::{self, AttendanceMethod, AttendanceStatus, RecordFact},
    attendance_session, session_student, student,
};
use sea_orm::{EntityTrait, TransactionTrait};
use serde::Serialize;
use tracing::{debug, info, warn};
use util::recognition::{FaceFrame, MatchVerdict, RecognitionAdapter};

use crate::context::RequestContext;
use crate::error::{AttendanceError, AttendanceResult};

/// One row of the live attendance list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceEntry {
    pub student_id: i64,
    pub reg_no: Option<String>,
    pub student_name: Option<String>,
    pub status: AttendanceStatus,
    pub method: AttendanceMethod,
    pub recorded_at: DateTime<Utc>,
    pub recorded_by: Option<i64>,
    pub confidence: Option<f64>,
}

impl AttendanceEntry {
    fn new(record: attendance_record::Model, student: Option<&student::Model>) -> Self {
        Self {
            student_id: record.student_id,
            reg_no: student.map(|s| s.reg_no.clone()),
            student_name: student.map(student::Model::full_name),
            status: record.status,
            method: record.method,
            recorded_at: record.recorded_at,
            recorded_by: record.recorded_by,
            confidence: record.confidence,
        }
    }
}

/// Result of a biometric capture. A capture that matched nobody is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Recorded(AttendanceEntry),
    NoMatch(String),
}

pub fn parse_status(raw: &str) -> AttendanceResult<AttendanceStatus> {
    raw.trim().parse().map_err(|_| {
        AttendanceError::validation(format!(
            "Invalid status '{raw}'; expected present, absent or excused"
        ))
    })
}

pub fn parse_method(raw: &str) -> AttendanceResult<AttendanceMethod> {
    raw.trim().parse().map_err(|_| {
        AttendanceError::validation(format!(
            "Invalid method '{raw}'; expected face_recognition, fingerprint or manual"
        ))
    })
}

pub struct AttendanceRecorder;

impl AttendanceRecorder {
    /// Records a fact submitted with raw `method`/`status` strings.
    ///
    /// Checks run in a fixed order: session active, student on the roster,
    /// then the enumerations.
    pub async fn record(
        ctx: &RequestContext,
        session_id: i64,
        student_id: i64,
        method: &str,
        status: &str,
    ) -> AttendanceResult<AttendanceEntry> {
        ctx.session(session_id).await?;

        Self::write(ctx, session_id, student_id, || {
            Ok(RecordFact {
                session_id,
                student_id,
                status: parse_status(status)?,
                method: parse_method(method)?,
                recorded_by: None,
                confidence: None,
            })
        })
        .await
    }

    /// Manual entry. The only channel that can set `absent` or `excused`.
    ///
    /// `date`, when given, must be the session date.
    pub async fn manual(
        ctx: &RequestContext,
        session_id: i64,
        student_id: i64,
        status: &str,
        date: Option<NaiveDate>,
    ) -> AttendanceResult<AttendanceEntry> {
        let session = ctx.session(session_id).await?;
        let recorded_by = Some(ctx.actor().user_id);

        Self::write(ctx, session_id, student_id, || {
            let status = parse_status(status)?;
            if let Some(date) = date {
                if date != session.session_date {
                    return Err(AttendanceError::validation(format!(
                        "Date {date} does not match the session date {}",
                        session.session_date
                    )));
                }
            }
            Ok(RecordFact {
                session_id,
                student_id,
                status,
                method: AttendanceMethod::Manual,
                recorded_by,
                confidence: None,
            })
        })
        .await
    }

    /// Face channel. The frame is matched against the session roster; adapter
    /// failures are logged and treated as "no match".
    pub async fn recognize_face(
        ctx: &RequestContext,
        recognizer: &dyn RecognitionAdapter,
        session_id: i64,
        frame: FaceFrame,
    ) -> AttendanceResult<CaptureOutcome> {
        let session = ctx.session(session_id).await?;
        if !session.is_active() {
            return Err(AttendanceError::SessionNotActive { session_id });
        }

        let candidates = session_student::Model::student_ids(ctx.db(), session_id).await?;
        let verdict = match recognizer.identify(&frame, &candidates).await {
            Ok(v) => v,
            Err(e) => {
                warn!(session_id, error = %e, "Face recognition unavailable; treating as no match");
                MatchVerdict::no_match()
            }
        };

        let Some(student_id) = verdict.student() else {
            return Ok(CaptureOutcome::NoMatch("No matching face found".into()));
        };

        let entry = Self::write(ctx, session_id, student_id, || {
            Ok(RecordFact {
                session_id,
                student_id,
                status: AttendanceStatus::Present,
                method: AttendanceMethod::FaceRecognition,
                recorded_by: None,
                confidence: verdict.confidence,
            })
        })
        .await?;

        Ok(CaptureOutcome::Recorded(entry))
    }

    /// Fingerprint channel: one operator-triggered scan.
    pub async fn scan_fingerprint(
        ctx: &RequestContext,
        session_id: i64,
        fingerprint_id: &str,
    ) -> AttendanceResult<CaptureOutcome> {
        if fingerprint_id.trim().is_empty() {
            return Err(AttendanceError::validation("fingerprint_id is required"));
        }

        let session = ctx.session(session_id).await?;
        if !session.is_active() {
            return Err(AttendanceError::SessionNotActive { session_id });
        }

        let Some(student) = ctx.scope().student_by_fingerprint(fingerprint_id).await? else {
            return Ok(CaptureOutcome::NoMatch("Fingerprint not recognised".into()));
        };

        let entry = Self::write(ctx, session_id, student.id, || {
            Ok(RecordFact {
                session_id,
                student_id: student.id,
                status: AttendanceStatus::Present,
                method: AttendanceMethod::Fingerprint,
                recorded_by: None,
                confidence: None,
            })
        })
        .await?;

        Ok(CaptureOutcome::Recorded(entry))
    }

    /// Deletes one record while the session is still active.
    pub async fn remove(ctx: &RequestContext, session_id: i64, student_id: i64) -> AttendanceResult<()> {
        ctx.session(session_id).await?;

        let txn = ctx.db().begin().await?;
        Self::ensure_active(&txn, session_id).await?;

        if !attendance_record::Model::delete_one(&txn, session_id, student_id).await? {
            return Err(AttendanceError::not_found(format!(
                "No attendance record for student {student_id} in session {session_id}"
            )));
        }
        txn.commit().await?;

        info!(session_id, student_id, removed_by = ctx.actor().user_id, "Attendance record removed");
        Ok(())
    }

    /// All records of a session, newest first. Readable after the session ended.
    pub async fn history(ctx: &RequestContext, session_id: i64) -> AttendanceResult<Vec<AttendanceEntry>> {
        ctx.session(session_id).await?;

        let rows =
            attendance_record::Model::find_for_session_with_students(ctx.db(), session_id).await?;
        Ok(rows
            .into_iter()
            .map(|(record, student)| AttendanceEntry::new(record, student.as_ref()))
            .collect())
    }

    /// Shared write path. The session state, roster membership and upsert are
    /// checked and applied in one transaction; `build` runs after the first two.
    async fn write<F>(
        ctx: &RequestContext,
        session_id: i64,
        student_id: i64,
        build: F,
    ) -> AttendanceResult<AttendanceEntry>
    where
        F: FnOnce() -> AttendanceResult<RecordFact>,
    {
        let txn = ctx.db().begin().await?;

        Self::ensure_active(&txn, session_id).await?;
        if !session_student::Model::contains(&txn, session_id, student_id).await? {
            return Err(AttendanceError::InvalidStudent {
                session_id,
                student_id,
            });
        }

        let fact = build()?;
        let method = fact.method;
        let record = attendance_record::Model::upsert(&txn, fact).await?;
        let student = student::Entity::find_by_id(student_id).one(&txn).await?;
        txn.commit().await?;

        debug!(session_id, student_id, %method, status = %record.status, "Attendance recorded");
        Ok(AttendanceEntry::new(record, student.as_ref()))
    }

    async fn ensure_active<C: sea_orm::ConnectionTrait>(
        conn: &C,
        session_id: i64,
    ) -> AttendanceResult<()> {
        let active = attendance_session::Entity::find_by_id(session_id)
            .one(conn)
            .await?
            .is_some_and(|s| s.is_active());
        if active {
            Ok(())
        } else {
            Err(AttendanceError::SessionNotActive { session_id })
        }
    }
}
