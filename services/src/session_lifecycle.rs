//! Active -> Ended transition of a single session.

use db::models::attendance_session;
use sea_orm::{ConnectionTrait, EntityTrait};
use serde::Serialize;
use tracing::info;

use crate::attendance_stats::{AttendanceStats, SessionStats};
use crate::context::RequestContext;
use crate::error::{AttendanceError, AttendanceResult};
use crate::session_registry::SessionSummary;

#[derive(Debug, Clone, Serialize)]
pub struct EndedSession {
    pub session: SessionSummary,
    /// Statistics frozen at the moment the session ended.
    pub stats: SessionStats,
}

pub struct SessionLifecycle;

impl SessionLifecycle {
    /// Ends an active session. A repeat call fails with [`AttendanceError::NotActive`].
    ///
    /// Records already written are untouched; only further writes are blocked.
    pub async fn end(ctx: &RequestContext, session_id: i64) -> AttendanceResult<EndedSession> {
        let session = ctx.session(session_id).await?;
        if !session.is_active() {
            return Err(AttendanceError::NotActive { session_id });
        }

        Self::close_in(ctx.db(), session_id, Some(ctx.actor().user_id)).await?;

        let ended = attendance_session::Entity::find_by_id(session_id)
            .one(ctx.db())
            .await?
            .ok_or_else(|| AttendanceError::not_found(format!("Session {session_id} not found")))?;

        let stats = AttendanceStats::compute_for(ctx.db(), &ended).await?;
        info!(
            session_id,
            ended_by = ctx.actor().user_id,
            present = stats.present_count,
            total = stats.total_students,
            "Attendance session ended"
        );

        Ok(EndedSession {
            session: SessionSummary::from_model(ended, stats.total_students),
            stats,
        })
    }

    /// Conditional Active -> Ended update on any connection or transaction.
    async fn close_in<C: ConnectionTrait>(
        conn: &C,
        session_id: i64,
        ended_by: Option<i64>,
    ) -> AttendanceResult<()> {
        if attendance_session::Model::close(conn, session_id, ended_by).await? {
            Ok(())
        } else {
            Err(AttendanceError::NotActive { session_id })
        }
    }
}
