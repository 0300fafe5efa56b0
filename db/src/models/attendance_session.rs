use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub lecturer_id: i64,
    pub department_id: i64,
    pub option_id: i64,
    pub course_id: i64,
    pub class_level: String,
    pub biometric_method: BiometricMethod,
    pub session_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub ended_by: Option<i64>,
}

/// Two-state lifecycle. There is no transition out of `Ended`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SessionStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "ended")]
    Ended,
}

/// Capture channel the lecturer selected for the session.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BiometricMethod {
    #[default]
    #[sea_orm(string_value = "face_recognition")]
    FaceRecognition,
    #[sea_orm(string_value = "fingerprint")]
    Fingerprint,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::lecturer::Entity",
        from = "Column::LecturerId",
        to = "super::lecturer::Column::Id"
    )]
    Lecturer,
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
    #[sea_orm(has_many = "super::session_student::Entity")]
    Roster,
}

impl Related<super::lecturer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lecturer.def()
    }
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl Related<super::session_student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Roster.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Scope columns of a new session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub lecturer_id: i64,
    pub department_id: i64,
    pub option_id: i64,
    pub course_id: i64,
    pub class_level: String,
    pub biometric_method: BiometricMethod,
}

impl Model {
    /// Inserts an `Active` session starting now. A second active session for the
    /// same lecturer violates `uq_att_sess_one_active` and fails here.
    pub async fn create<C: ConnectionTrait>(db: &C, new: NewSession) -> Result<Model, DbErr> {
        let now = Utc::now();

        ActiveModel {
            lecturer_id: Set(new.lecturer_id),
            department_id: Set(new.department_id),
            option_id: Set(new.option_id),
            course_id: Set(new.course_id),
            class_level: Set(new.class_level),
            biometric_method: Set(new.biometric_method),
            session_date: Set(now.date_naive()),
            start_time: Set(now),
            end_time: Set(None),
            status: Set(SessionStatus::Active),
            ended_by: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn find_active_for_lecturer<C: ConnectionTrait>(
        db: &C,
        lecturer_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::LecturerId.eq(lecturer_id))
            .filter(Column::Status.eq(SessionStatus::Active))
            .one(db)
            .await
    }

    /// Most recently started active session for a department/option/course triple,
    /// optionally restricted to one lecturer.
    pub async fn find_active_for_scope<C: ConnectionTrait>(
        db: &C,
        department_id: i64,
        option_id: i64,
        course_id: i64,
        lecturer_id: Option<i64>,
    ) -> Result<Option<Model>, DbErr> {
        let mut query = Entity::find()
            .filter(Column::DepartmentId.eq(department_id))
            .filter(Column::OptionId.eq(option_id))
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::Status.eq(SessionStatus::Active));

        if let Some(lecturer_id) = lecturer_id {
            query = query.filter(Column::LecturerId.eq(lecturer_id));
        }

        query.order_by_desc(Column::StartTime).one(db).await
    }

    /// Ends every active session of a lecturer and returns their ids.
    ///
    /// The update runs first, so inside a transaction the write lock is taken
    /// before anything is read.
    pub async fn close_active_for_lecturer<C: ConnectionTrait>(
        db: &C,
        lecturer_id: i64,
        ended_by: Option<i64>,
    ) -> Result<Vec<i64>, DbErr> {
        let now = Utc::now();

        let res = Entity::update_many()
            .col_expr(Column::Status, Expr::value(SessionStatus::Ended))
            .col_expr(Column::EndTime, Expr::value(now))
            .col_expr(Column::EndedBy, Expr::value(ended_by))
            .filter(Column::LecturerId.eq(lecturer_id))
            .filter(Column::Status.eq(SessionStatus::Active))
            .exec(db)
            .await?;

        if res.rows_affected == 0 {
            return Ok(Vec::new());
        }

        let ended = Entity::find()
            .filter(Column::LecturerId.eq(lecturer_id))
            .filter(Column::Status.eq(SessionStatus::Ended))
            .filter(Column::EndTime.eq(now))
            .all(db)
            .await?;

        Ok(ended.into_iter().map(|m| m.id).collect())
    }

    /// Flips an active session to `Ended`.
    ///
    /// The update is conditional on the row still being active, so two racing
    /// calls cannot both succeed. Returns `false` when nothing was updated.
    pub async fn close<C: ConnectionTrait>(
        db: &C,
        id: i64,
        ended_by: Option<i64>,
    ) -> Result<bool, DbErr> {
        let res = Entity::update_many()
            .col_expr(Column::Status, Expr::value(SessionStatus::Ended))
            .col_expr(Column::EndTime, Expr::value(Utc::now()))
            .col_expr(Column::EndedBy, Expr::value(ended_by))
            .filter(Column::Id.eq(id))
            .filter(Column::Status.eq(SessionStatus::Active))
            .exec(db)
            .await?;

        Ok(res.rows_affected == 1)
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}
