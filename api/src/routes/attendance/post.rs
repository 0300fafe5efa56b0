use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use db::models::attendance_session::BiometricMethod;
use services::attendance_record::{AttendanceEntry, AttendanceRecorder};
use services::scope::ScopeRequest;
use services::session_lifecycle::{EndedSession, SessionLifecycle};
use services::session_registry::{RosterRefresh, SessionRegistry, StartSession, StartedSession};
use util::recognition::FaceFrame;
use util::state::AppState;

use super::common::{
    ManualAttendanceReq, RecognizeFaceReq, RecordAttendanceReq, ScanFingerprintReq,
    StartSessionReq, capture_response, context, validated,
};
use crate::auth::AuthUser;
use crate::response::{ApiError, ApiResponse};

/// POST /api/attendance/sessions
///
/// Starts a session for the calling lecturer.
///
/// ### Request Body
/// ```json
/// {
///   "department_id": 5,
///   "option_id": 2,
///   "course_id": 10,
///   "class_level": "Year 2",
///   "biometric_method": "face_recognition",
///   "force": false
/// }
/// ```
///
/// ### Responses
/// - `201 Created` → session started
/// - `400 Bad Request` → missing or unknown scope
/// - `409 Conflict` with `status: "existing_session"` → another session is active;
///   `data.existing_session` describes it. Retry with `force: true` to end it and
///   start the new one.
pub async fn start_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<StartSessionReq>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<StartedSession>>), ApiError> {
    let body = validated(payload)?;

    let biometric_method = match body.biometric_method.as_deref() {
        None | Some("") => BiometricMethod::default(),
        Some(raw) => raw.parse().map_err(|_| {
            ApiError::validation(format!(
                "Invalid biometric_method '{raw}'; expected face_recognition or fingerprint"
            ))
        })?,
    };

    let started = SessionRegistry::start(
        &context(&state, &user),
        StartSession {
            scope: ScopeRequest {
                department_id: body.department_id,
                option_id: body.option_id,
                course_id: body.course_id,
                class_level: body.class_level,
            },
            biometric_method,
            force: body.force,
        },
    )
    .await?;

    let message = if started.replaced_session_id.is_some() {
        "Previous session ended; new attendance session started"
    } else {
        "Attendance session started"
    };

    Ok((StatusCode::CREATED, Json(ApiResponse::success(started, message))))
}

/// POST /api/attendance/sessions/{session_id}/end
///
/// Ends the session and returns its final statistics. Ending an already ended
/// session is a `409`.
pub async fn end_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<i64>,
) -> Result<Json<ApiResponse<EndedSession>>, ApiError> {
    let ended = SessionLifecycle::end(&context(&state, &user), session_id).await?;
    Ok(Json(ApiResponse::success(ended, "Attendance session ended")))
}

/// POST /api/attendance/sessions/{session_id}/records
///
/// ### Request Body
/// ```json
/// { "student_id": 77, "method": "face_recognition", "status": "present" }
/// ```
pub async fn record_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<i64>,
    payload: Result<Json<RecordAttendanceReq>, JsonRejection>,
) -> Result<Json<ApiResponse<AttendanceEntry>>, ApiError> {
    let body = validated(payload)?;

    let entry = AttendanceRecorder::record(
        &context(&state, &user),
        session_id,
        body.student_id,
        &body.method,
        &body.status,
    )
    .await?;

    Ok(Json(ApiResponse::success(entry, "Attendance recorded")))
}

/// POST /api/attendance/sessions/{session_id}/manual
///
/// Manual entry by the operator; the only way to mark `absent` or `excused`.
/// `date` is optional and must equal the session date when present.
pub async fn manual_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<i64>,
    payload: Result<Json<ManualAttendanceReq>, JsonRejection>,
) -> Result<Json<ApiResponse<AttendanceEntry>>, ApiError> {
    let body = validated(payload)?;

    let entry = AttendanceRecorder::manual(
        &context(&state, &user),
        session_id,
        body.student_id,
        &body.status,
        body.date,
    )
    .await?;

    Ok(Json(ApiResponse::success(entry, "Attendance marked manually")))
}

/// POST /api/attendance/sessions/{session_id}/recognize
///
/// Submits one camera frame (`{"image": "<base64>"}`). A match records the
/// student as present; no match, or an unreachable recognition service,
/// answers with a `warning` and writes nothing.
pub async fn recognize_face(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<i64>,
    payload: Result<Json<RecognizeFaceReq>, JsonRejection>,
) -> Result<Json<ApiResponse<Option<AttendanceEntry>>>, ApiError> {
    let body = validated(payload)?;

    let outcome = AttendanceRecorder::recognize_face(
        &context(&state, &user),
        state.recognizer(),
        session_id,
        FaceFrame::new(body.image),
    )
    .await?;

    Ok(capture_response(outcome))
}

/// POST /api/attendance/sessions/{session_id}/fingerprint
pub async fn scan_fingerprint(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<i64>,
    payload: Result<Json<ScanFingerprintReq>, JsonRejection>,
) -> Result<Json<ApiResponse<Option<AttendanceEntry>>>, ApiError> {
    let body = validated(payload)?;

    let outcome =
        AttendanceRecorder::scan_fingerprint(&context(&state, &user), session_id, &body.fingerprint_id)
            .await?;

    Ok(capture_response(outcome))
}

/// POST /api/attendance/sessions/{session_id}/roster/refresh
///
/// Re-reads the eligible students of an active session from the directory.
pub async fn refresh_roster(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<i64>,
) -> Result<Json<ApiResponse<RosterRefresh>>, ApiError> {
    let refresh = SessionRegistry::refresh_roster(&context(&state, &user), session_id).await?;
    Ok(Json(ApiResponse::success(refresh, "Session roster refreshed")))
}
