//! Statistics Aggregator. Everything is recomputed from the stored rows on every
//! call; there are no running totals to drift.

use db::models::{
    attendance_record::{self, AttendanceMethod, AttendanceStatus},
    attendance_session::{self, SessionStatus},
    session_student,
};
use sea_orm::ConnectionTrait;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::context::RequestContext;
use crate::error::AttendanceResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodStats {
    pub method: AttendanceMethod,
    pub count: u64,
    pub present: u64,
    /// Share of this method's records that are `present`, in percent.
    pub present_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStats {
    pub session_id: i64,
    pub session_status: SessionStatus,
    pub total_students: u64,
    pub present_count: u64,
    /// Everyone on the roster who is not present, recorded or not.
    pub absent_count: u64,
    pub attendance_rate: f64,
    pub method_breakdown: Vec<MethodStats>,
}

/// `part / whole * 100`, rounded to one decimal; `0.0` for an empty whole.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 1000.0).round() / 10.0
}

pub struct AttendanceStats;

impl AttendanceStats {
    pub async fn compute(ctx: &RequestContext, session_id: i64) -> AttendanceResult<SessionStats> {
        let session = ctx.session(session_id).await?;
        Self::compute_for(ctx.db(), &session).await
    }

    pub(crate) async fn compute_for<C: ConnectionTrait>(
        conn: &C,
        session: &attendance_session::Model,
    ) -> AttendanceResult<SessionStats> {
        let total = session_student::Model::count(conn, session.id).await?;
        let records = attendance_record::Model::find_for_session(conn, session.id).await?;
        Ok(Self::summarize(session.id, session.status, total, &records))
    }

    pub fn summarize(
        session_id: i64,
        session_status: SessionStatus,
        total_students: u64,
        records: &[attendance_record::Model],
    ) -> SessionStats {
        let present_count = records
            .iter()
            .filter(|r| r.status == AttendanceStatus::Present)
            .count() as u64;

        let mut groups: BTreeMap<AttendanceMethod, (u64, u64)> = BTreeMap::new();
        for r in records {
            let entry = groups.entry(r.method).or_default();
            entry.0 += 1;
            if r.status == AttendanceStatus::Present {
                entry.1 += 1;
            }
        }

        let method_breakdown = groups
            .into_iter()
            .map(|(method, (count, present))| MethodStats {
                method,
                count,
                present,
                present_rate: percentage(present, count),
            })
            .collect();

        SessionStats {
            session_id,
            session_status,
            total_students,
            present_count,
            absent_count: total_students.saturating_sub(present_count),
            attendance_rate: percentage(present_count, total_students),
            method_breakdown,
        }
    }
}
