//! Error taxonomy of the attendance core.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use util::recognition::AdapterError;

use crate::session_registry::SessionConflict;

pub type AttendanceResult<T> = Result<T, AttendanceError>;

#[derive(Debug, Error)]
pub enum AttendanceError {
    /// Missing or malformed scope, enum or date fields.
    #[error("{0}")]
    Validation(String),

    /// The lecturer already has an active session and `force` was not set.
    #[error("An active attendance session already exists (session {})", .0.existing_session.id)]
    Conflict(Box<SessionConflict>),

    /// A write was attempted on a session that has ended.
    #[error("Session {session_id} is not active; attendance can no longer be changed")]
    SessionNotActive { session_id: i64 },

    /// `end` was called on a session that has already ended.
    #[error("Session {session_id} has already ended")]
    NotActive { session_id: i64 },

    #[error("Student {student_id} is not eligible for session {session_id}")]
    InvalidStudent { session_id: i64, student_id: i64 },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("database error: {0}")]
    Persistence(#[from] DbErr),
}

impl AttendanceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}

/// True when the database rejected a write because of a unique index.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
