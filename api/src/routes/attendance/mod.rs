//! `/api/attendance` routes.
//!
//! Everything below is keyed by session id; ownership (own session or admin)
//! is enforced by the core, so the only route-level guard is authentication.

use axum::{
    Router,
    routing::{delete, get, post},
};
use util::state::AppState;

mod common;
mod delete;
mod get;
mod post;

pub use delete::remove_attendance;
pub use get::{
    get_active_session, get_attendance_history, get_session, get_session_stats,
    get_session_status,
};
pub use post::{
    end_session, manual_attendance, recognize_face, record_attendance, refresh_roster,
    scan_fingerprint, start_session,
};

pub fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(start_session))
        .route("/sessions/active", get(get_active_session))
        .route("/sessions/status", get(get_session_status))
        .route("/sessions/{session_id}", get(get_session))
        .route("/sessions/{session_id}/end", post(end_session))
        .route(
            "/sessions/{session_id}/records",
            get(get_attendance_history).post(record_attendance),
        )
        .route(
            "/sessions/{session_id}/records/{student_id}",
            delete(remove_attendance),
        )
        .route("/sessions/{session_id}/manual", post(manual_attendance))
        .route("/sessions/{session_id}/recognize", post(recognize_face))
        .route("/sessions/{session_id}/fingerprint", post(scan_fingerprint))
        .route("/sessions/{session_id}/stats", get(get_session_stats))
        .route("/sessions/{session_id}/roster/refresh", post(refresh_roster))
}
