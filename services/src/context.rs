//! Request-scoped context passed into every core operation.

use db::models::{attendance_session, lecturer};
use sea_orm::{DatabaseConnection, EntityTrait};
use std::sync::Arc;

use crate::error::{AttendanceError, AttendanceResult};
use crate::scope::{DbScopeResolver, ScopeResolver};

/// The authenticated caller, as validated by the auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub admin: bool,
}

impl Actor {
    pub fn user(user_id: i64) -> Self {
        Self {
            user_id,
            admin: false,
        }
    }

    pub fn admin(user_id: i64) -> Self {
        Self {
            user_id,
            admin: true,
        }
    }
}

#[derive(Clone)]
pub struct RequestContext {
    db: DatabaseConnection,
    actor: Actor,
    scope: Arc<dyn ScopeResolver>,
}

impl RequestContext {
    /// Context backed by the database scope resolver.
    pub fn new(db: DatabaseConnection, actor: Actor) -> Self {
        let scope = Arc::new(DbScopeResolver::new(db.clone()));
        Self { db, actor, scope }
    }

    pub fn with_scope_resolver(mut self, scope: Arc<dyn ScopeResolver>) -> Self {
        self.scope = scope;
        self
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn actor(&self) -> Actor {
        self.actor
    }

    pub fn scope(&self) -> &dyn ScopeResolver {
        self.scope.as_ref()
    }

    /// Lecturer profile of the caller, if they have one.
    pub async fn lecturer(&self) -> AttendanceResult<Option<lecturer::Model>> {
        self.scope.lecturer_for_user(self.actor.user_id).await
    }

    /// Loads a session the caller may act on: admins reach every session,
    /// lecturers only their own.
    pub async fn session(&self, session_id: i64) -> AttendanceResult<attendance_session::Model> {
        let session = attendance_session::Entity::find_by_id(session_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AttendanceError::not_found(format!("Session {session_id} not found")))?;

        if self.actor.admin {
            return Ok(session);
        }

        match self.lecturer().await? {
            Some(l) if l.id == session.lecturer_id => Ok(session),
            _ => Err(AttendanceError::forbidden(
                "You do not have access to this session",
            )),
        }
    }
}
