use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub session_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: i64,
    pub status: AttendanceStatus,
    pub method: AttendanceMethod,
    pub recorded_at: DateTime<Utc>,
    /// Only set for manual entries.
    pub recorded_by: Option<i64>,
    /// Matcher confidence for face captures.
    pub confidence: Option<f64>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
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
pub enum AttendanceStatus {
    #[sea_orm(string_value = "present")]
    Present,
    #[sea_orm(string_value = "absent")]
    Absent,
    #[sea_orm(string_value = "excused")]
    Excused,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
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
pub enum AttendanceMethod {
    #[sea_orm(string_value = "face_recognition")]
    FaceRecognition,
    #[sea_orm(string_value = "fingerprint")]
    Fingerprint,
    #[sea_orm(string_value = "manual")]
    Manual,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::attendance_session::Entity",
        from = "Column::SessionId",
        to = "super::attendance_session::Column::Id"
    )]
    Session,
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// One attendance fact as submitted by a capture channel.
#[derive(Debug, Clone)]
pub struct RecordFact {
    pub session_id: i64,
    pub student_id: i64,
    pub status: AttendanceStatus,
    pub method: AttendanceMethod,
    pub recorded_by: Option<i64>,
    pub confidence: Option<f64>,
}

impl Model {
    /// Insert-or-overwrite keyed on `(session_id, student_id)`.
    ///
    /// A single `INSERT .. ON CONFLICT DO UPDATE` statement, so concurrent
    /// submissions for the same pair never produce a second row; whichever
    /// commits last wins.
    pub async fn upsert<C: ConnectionTrait>(db: &C, fact: RecordFact) -> Result<Model, DbErr> {
        let key = (fact.session_id, fact.student_id);

        let active_model = ActiveModel {
            session_id: Set(fact.session_id),
            student_id: Set(fact.student_id),
            status: Set(fact.status),
            method: Set(fact.method),
            recorded_at: Set(Utc::now()),
            recorded_by: Set(fact.recorded_by),
            confidence: Set(fact.confidence),
        };

        Entity::insert(active_model)
            .on_conflict(
                OnConflict::columns([Column::SessionId, Column::StudentId])
                    .update_columns([
                        Column::Status,
                        Column::Method,
                        Column::RecordedAt,
                        Column::RecordedBy,
                        Column::Confidence,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        Entity::find_by_id(key)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("Attendance record not found".to_string()))
    }

    pub async fn find_for_session<C: ConnectionTrait>(
        db: &C,
        session_id: i64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .order_by_desc(Column::RecordedAt)
            .all(db)
            .await
    }

    /// Records joined with the student they belong to, newest first.
    pub async fn find_for_session_with_students<C: ConnectionTrait>(
        db: &C,
        session_id: i64,
    ) -> Result<Vec<(Model, Option<super::student::Model>)>, DbErr> {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .find_also_related(super::student::Entity)
            .order_by_desc(Column::RecordedAt)
            .all(db)
            .await
    }

    pub async fn student_ids<C: ConnectionTrait>(
        db: &C,
        session_id: i64,
    ) -> Result<Vec<i64>, DbErr> {
        Ok(Self::find_for_session(db, session_id)
            .await?
            .into_iter()
            .map(|r| r.student_id)
            .collect())
    }

    /// Returns `false` if there was no record to delete.
    pub async fn delete_one<C: ConnectionTrait>(
        db: &C,
        session_id: i64,
        student_id: i64,
    ) -> Result<bool, DbErr> {
        let res = Entity::delete_by_id((session_id, student_id)).exec(db).await?;
        Ok(res.rows_affected > 0)
    }
}
