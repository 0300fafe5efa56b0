//! Eligible-student roster of a session, captured when it starts.

use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, QueryOrder, QuerySelect};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "session_students")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub session_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: i64,
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

const INSERT_CHUNK: usize = 500;

impl Model {
    pub async fn insert_all<C: ConnectionTrait>(
        db: &C,
        session_id: i64,
        student_ids: &[i64],
    ) -> Result<(), DbErr> {
        for chunk in student_ids.chunks(INSERT_CHUNK) {
            let rows = chunk.iter().map(|&student_id| ActiveModel {
                session_id: Set(session_id),
                student_id: Set(student_id),
            });
            Entity::insert_many(rows).exec_without_returning(db).await?;
        }
        Ok(())
    }

    /// Replaces the roster of a session with `student_ids`.
    pub async fn replace_all<C: ConnectionTrait>(
        db: &C,
        session_id: i64,
        student_ids: &[i64],
    ) -> Result<(), DbErr> {
        Entity::delete_many()
            .filter(Column::SessionId.eq(session_id))
            .exec(db)
            .await?;
        Self::insert_all(db, session_id, student_ids).await
    }

    pub async fn student_ids<C: ConnectionTrait>(
        db: &C,
        session_id: i64,
    ) -> Result<Vec<i64>, DbErr> {
        Entity::find()
            .select_only()
            .column(Column::StudentId)
            .filter(Column::SessionId.eq(session_id))
            .order_by_asc(Column::StudentId)
            .into_tuple()
            .all(db)
            .await
    }

    pub async fn contains<C: ConnectionTrait>(
        db: &C,
        session_id: i64,
        student_id: i64,
    ) -> Result<bool, DbErr> {
        Ok(Entity::find_by_id((session_id, student_id))
            .one(db)
            .await?
            .is_some())
    }

    pub async fn count<C: ConnectionTrait>(db: &C, session_id: i64) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .count(db)
            .await
    }
}
