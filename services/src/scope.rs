//! Scope Resolver: turns the identifiers of a start request into validated
//! directory entities and the set of students a session applies to.

use async_trait::async_trait;
use db::models::{course, department, lecturer, student, study_option};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};

use crate::error::{AttendanceError, AttendanceResult};

/// Unvalidated scope as submitted by a client.
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeRequest {
    pub department_id: i64,
    pub option_id: i64,
    pub course_id: i64,
    pub class_level: String,
}

impl ScopeRequest {
    fn check_shape(&self) -> AttendanceResult<()> {
        let ids = [
            ("department_id", self.department_id),
            ("option_id", self.option_id),
            ("course_id", self.course_id),
        ];
        if let Some((name, _)) = ids.iter().find(|(_, v)| *v <= 0) {
            return Err(AttendanceError::validation(format!("{name} is required")));
        }
        if self.class_level.trim().is_empty() {
            return Err(AttendanceError::validation("class_level is required"));
        }
        Ok(())
    }
}

/// A scope whose every reference exists and is mutually consistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedScope {
    pub department_id: i64,
    pub option_id: i64,
    pub course_id: i64,
    pub class_level: String,
    pub lecturer_id: i64,
}

#[async_trait]
pub trait ScopeResolver: Send + Sync {
    async fn resolve(&self, req: &ScopeRequest, lecturer_id: i64) -> AttendanceResult<ResolvedScope>;

    /// Ids of the students a session with this scope applies to, ascending.
    async fn eligible_students(&self, scope: &ResolvedScope) -> AttendanceResult<Vec<i64>>;

    async fn lecturer_for_user(&self, user_id: i64) -> AttendanceResult<Option<lecturer::Model>>;

    async fn student_by_fingerprint(
        &self,
        fingerprint_id: &str,
    ) -> AttendanceResult<Option<student::Model>>;
}

/// Resolver backed by the directory tables.
#[derive(Debug, Clone)]
pub struct DbScopeResolver {
    db: DatabaseConnection,
}

impl DbScopeResolver {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ScopeResolver for DbScopeResolver {
    async fn resolve(&self, req: &ScopeRequest, lecturer_id: i64) -> AttendanceResult<ResolvedScope> {
        req.check_shape()?;

        let department = department::Entity::find_by_id(req.department_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                AttendanceError::validation(format!("Department {} not found", req.department_id))
            })?;

        let option = study_option::Entity::find_by_id(req.option_id)
            .one(&self.db)
            .await?
            .filter(|o| o.department_id == department.id)
            .ok_or_else(|| {
                AttendanceError::validation(format!(
                    "Option {} not found in department {}",
                    req.option_id, department.id
                ))
            })?;

        let course = course::Entity::find_by_id(req.course_id)
            .one(&self.db)
            .await?
            .filter(|c| c.option_id == option.id)
            .ok_or_else(|| {
                AttendanceError::validation(format!(
                    "Course {} not found in option {}",
                    req.course_id, option.id
                ))
            })?;

        let lecturer = lecturer::Entity::find_by_id(lecturer_id)
            .one(&self.db)
            .await?
            .filter(|l| l.department_id == department.id)
            .ok_or_else(|| {
                AttendanceError::validation("Lecturer does not belong to this department")
            })?;

        Ok(ResolvedScope {
            department_id: department.id,
            option_id: option.id,
            course_id: course.id,
            class_level: req.class_level.trim().to_string(),
            lecturer_id: lecturer.id,
        })
    }

    async fn eligible_students(&self, scope: &ResolvedScope) -> AttendanceResult<Vec<i64>> {
        let students = student::Model::find_in_scope(
            &self.db,
            scope.department_id,
            scope.option_id,
            &scope.class_level,
        )
        .await?;
        Ok(students.into_iter().map(|s| s.id).collect())
    }

    async fn lecturer_for_user(&self, user_id: i64) -> AttendanceResult<Option<lecturer::Model>> {
        Ok(lecturer::Model::find_by_user_id(&self.db, user_id).await?)
    }

    async fn student_by_fingerprint(
        &self,
        fingerprint_id: &str,
    ) -> AttendanceResult<Option<student::Model>> {
        Ok(student::Model::find_by_fingerprint(&self.db, fingerprint_id.trim()).await?)
    }
}
