use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{QueryFilter, QueryOrder};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub reg_no: String,
    pub first_name: String,
    pub last_name: String,
    pub department_id: i64,
    pub option_id: i64,
    pub class_level: String,
    pub active: bool,
    /// Template id assigned by the fingerprint scanner at enrolment.
    #[sea_orm(unique)]
    pub fingerprint_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::study_option::Entity",
        from = "Column::OptionId",
        to = "super::study_option::Column::Id"
    )]
    StudyOption,
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
}

impl Related<super::study_option::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudyOption.def()
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Fields needed to enrol a student.
#[derive(Debug, Clone)]
pub struct NewStudent<'a> {
    pub reg_no: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub department_id: i64,
    pub option_id: i64,
    pub class_level: &'a str,
    pub fingerprint_id: Option<&'a str>,
}

impl Model {
    pub async fn create<C: ConnectionTrait>(db: &C, new: NewStudent<'_>) -> Result<Model, DbErr> {
        ActiveModel {
            reg_no: Set(new.reg_no.to_owned()),
            first_name: Set(new.first_name.to_owned()),
            last_name: Set(new.last_name.to_owned()),
            department_id: Set(new.department_id),
            option_id: Set(new.option_id),
            class_level: Set(new.class_level.to_owned()),
            active: Set(true),
            fingerprint_id: Set(new.fingerprint_id.map(str::to_owned)),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// Active students enrolled in the given department, option and class level.
    pub async fn find_in_scope<C: ConnectionTrait>(
        db: &C,
        department_id: i64,
        option_id: i64,
        class_level: &str,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::DepartmentId.eq(department_id))
            .filter(Column::OptionId.eq(option_id))
            .filter(Column::ClassLevel.eq(class_level))
            .filter(Column::Active.eq(true))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    pub async fn find_by_fingerprint<C: ConnectionTrait>(
        db: &C,
        fingerprint_id: &str,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::FingerprintId.eq(fingerprint_id))
            .filter(Column::Active.eq(true))
            .one(db)
            .await
    }

    pub async fn set_active<C: ConnectionTrait>(
        db: &C,
        id: i64,
        active: bool,
    ) -> Result<(), DbErr> {
        Entity::update_many()
            .col_expr(Column::Active, Expr::value(active))
            .filter(Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(())
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
