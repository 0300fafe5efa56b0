use axum::{Json, extract::rejection::JsonRejection};
use chrono::NaiveDate;
use ::common::format_validation_errors;
use serde::{Deserialize, Serialize};
use services::RequestContext;
use services::attendance_record::{AttendanceEntry, CaptureOutcome};
use util::state::AppState;
use validator::Validate;

use crate::auth::AuthUser;
use crate::response::{ApiError, ApiResponse};

/// Builds the request-scoped context for the core from the shared state and caller.
pub fn context(state: &AppState, user: &AuthUser) -> RequestContext {
    RequestContext::new(state.db_clone(), user.actor())
}

/// Unwraps a JSON body and validates it, turning both failures into a
/// `Validation` error rendered with the standard envelope.
pub fn validated<T: Validate>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    body.validate()
        .map_err(|e| ApiError::validation(format_validation_errors(&e)))?;
    Ok(body)
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct StartSessionReq {
    #[validate(range(min = 1, message = "department_id is required"))]
    pub department_id: i64,
    #[validate(range(min = 1, message = "option_id is required"))]
    pub option_id: i64,
    #[validate(range(min = 1, message = "course_id is required"))]
    pub course_id: i64,
    #[serde(alias = "classLevel")]
    #[validate(length(min = 1, message = "class_level is required"))]
    pub class_level: String,
    pub biometric_method: Option<String>,
    #[serde(alias = "force_new")]
    pub force: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SessionStatusQuery {
    pub department_id: i64,
    pub option_id: i64,
    pub course_id: i64,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RecordAttendanceReq {
    #[validate(range(min = 1, message = "student_id is required"))]
    pub student_id: i64,
    pub method: String,
    pub status: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ManualAttendanceReq {
    #[validate(range(min = 1, message = "student_id is required"))]
    pub student_id: i64,
    pub status: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RecognizeFaceReq {
    #[serde(alias = "image_data")]
    #[validate(length(min = 1, message = "image is required"))]
    pub image: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ScanFingerprintReq {
    #[validate(length(min = 1, message = "fingerprint_id is required"))]
    pub fingerprint_id: String,
}

#[derive(Debug, Serialize)]
pub struct RemovedRecord {
    pub session_id: i64,
    pub student_id: i64,
}

/// Renders a biometric capture: a match is a `success`, no match a `warning`.
pub fn capture_response(outcome: CaptureOutcome) -> Json<ApiResponse<Option<AttendanceEntry>>> {
    match outcome {
        CaptureOutcome::Recorded(entry) => {
            let who = entry
                .student_name
                .clone()
                .unwrap_or_else(|| format!("student {}", entry.student_id));
            Json(ApiResponse::success(
                Some(entry),
                format!("Attendance recorded for {who}"),
            ))
        }
        CaptureOutcome::NoMatch(reason) => Json(ApiResponse::warning(None, reason)),
    }
}
