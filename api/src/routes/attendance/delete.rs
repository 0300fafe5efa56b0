use axum::{
    Extension, Json,
    extract::{Path, State},
};
use services::attendance_record::AttendanceRecorder;
use util::state::AppState;

use super::common::{RemovedRecord, context};
use crate::auth::AuthUser;
use crate::response::{ApiError, ApiResponse};

/// DELETE /api/attendance/sessions/{session_id}/records/{student_id}
///
/// Removes one record while the session is active.
///
/// ### Responses
/// - `200 OK` → removed
/// - `404 Not Found` → no record for that student
/// - `409 Conflict` → the session has ended
pub async fn remove_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((session_id, student_id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse<RemovedRecord>>, ApiError> {
    AttendanceRecorder::remove(&context(&state, &user), session_id, student_id).await?;

    Ok(Json(ApiResponse::success(
        RemovedRecord {
            session_id,
            student_id,
        },
        "Attendance record removed",
    )))
}
