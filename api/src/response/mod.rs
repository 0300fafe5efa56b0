use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use services::AttendanceError;
use tracing::error;

/// Outcome tag carried by every response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    Error,
    /// A session is already active; `data` describes it so the caller can
    /// resume it or retry with `force`.
    ExistingSession,
    /// The request was fine but produced no change (e.g. a capture matched nobody).
    Warning,
}

/// Standardized API response wrapper for all outgoing JSON responses.
///
/// ```json
/// {
///   "status": "success",
///   "message": "Attendance recorded",
///   "data": { ... }
/// }
/// ```
///
/// - `T` is the type of the `data` payload.
/// - `status` is one of `success`, `error`, `existing_session`, `warning`.
/// - `message` provides a human-readable context string.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub status: ResponseStatus,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
            data,
        }
    }

    pub fn warning(data: T, message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Warning,
            message: message.into(),
            data,
        }
    }

    pub fn existing_session(data: T, message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::ExistingSession,
            message: message.into(),
            data,
        }
    }

    /// Constructs an error response with a message and default `data`.
    pub fn error(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
            data: T::default(),
        }
    }
}

/// Handler error: an [`AttendanceError`] rendered as an `ApiResponse`.
#[derive(Debug)]
pub struct ApiError(pub AttendanceError);

impl From<AttendanceError> for ApiError {
    fn from(err: AttendanceError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self(AttendanceError::Validation(msg.into()))
    }

    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AttendanceError::Validation(_) => StatusCode::BAD_REQUEST,
            AttendanceError::Conflict(_)
            | AttendanceError::SessionNotActive { .. }
            | AttendanceError::NotActive { .. } => StatusCode::CONFLICT,
            AttendanceError::InvalidStudent { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AttendanceError::NotFound(_) => StatusCode::NOT_FOUND,
            AttendanceError::Forbidden(_) => StatusCode::FORBIDDEN,
            AttendanceError::Adapter(_) => StatusCode::BAD_GATEWAY,
            AttendanceError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status_code();

        match self.0 {
            AttendanceError::Conflict(conflict) => (
                code,
                Json(ApiResponse::existing_session(
                    *conflict,
                    "You already have an active attendance session",
                )),
            )
                .into_response(),
            AttendanceError::Persistence(e) => {
                error!(error = %e, "Database error while handling request");
                (
                    code,
                    Json(ApiResponse::<()>::error("Internal server error")),
                )
                    .into_response()
            }
            other => (code, Json(ApiResponse::<()>::error(other.to_string()))).into_response(),
        }
    }
}
