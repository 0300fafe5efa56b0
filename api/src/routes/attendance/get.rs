use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use services::attendance_record::{AttendanceEntry, AttendanceRecorder};
use services::attendance_stats::{AttendanceStats, SessionStats};
use services::session_registry::{ScopeStatus, SessionRegistry, SessionSummary};
use util::state::AppState;

use super::common::{SessionStatusQuery, context};
use crate::auth::AuthUser;
use crate::response::{ApiError, ApiResponse};

/// GET /api/attendance/sessions/active
///
/// The caller's active session, used by clients to resume after a reload.
///
/// ### Responses
/// - `200 OK` → the session summary
/// - `404 Not Found` → no active session
pub async fn get_active_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<SessionSummary>>, ApiError> {
    let session = SessionRegistry::active_for(&context(&state, &user)).await?;
    Ok(Json(ApiResponse::success(session, "Active session found")))
}

/// GET /api/attendance/sessions/status?department_id=&option_id=&course_id=
///
/// Whether a session for the given scope is active. Lecturers only see their own.
pub async fn get_session_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(q): Query<SessionStatusQuery>,
) -> Result<Json<ApiResponse<ScopeStatus>>, ApiError> {
    let status = SessionRegistry::status_for_scope(
        &context(&state, &user),
        q.department_id,
        q.option_id,
        q.course_id,
    )
    .await?;

    let message = if status.active {
        "Session is active"
    } else {
        "No active session for this scope"
    };
    Ok(Json(ApiResponse::success(status, message)))
}

/// GET /api/attendance/sessions/{session_id}
pub async fn get_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<i64>,
) -> Result<Json<ApiResponse<SessionSummary>>, ApiError> {
    let session = SessionRegistry::get_session(&context(&state, &user), session_id).await?;
    Ok(Json(ApiResponse::success(session, "Session retrieved")))
}

/// GET /api/attendance/sessions/{session_id}/records
///
/// Live attendance list, newest first. Polled by the client while the session runs.
pub async fn get_attendance_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<AttendanceEntry>>>, ApiError> {
    let entries = AttendanceRecorder::history(&context(&state, &user), session_id).await?;
    Ok(Json(ApiResponse::success(entries, "Attendance records retrieved")))
}

/// GET /api/attendance/sessions/{session_id}/stats
pub async fn get_session_stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<i64>,
) -> Result<Json<ApiResponse<SessionStats>>, ApiError> {
    let stats = AttendanceStats::compute(&context(&state, &user), session_id).await?;
    Ok(Json(ApiResponse::success(stats, "Session statistics computed")))
}
