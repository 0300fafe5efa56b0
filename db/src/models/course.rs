use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub department_id: i64,
    pub option_id: i64,
    pub lecturer_id: Option<i64>,
    #[sea_orm(unique)]
    pub course_code: String,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::study_option::Entity",
        from = "Column::OptionId",
        to = "super::study_option::Column::Id"
    )]
    StudyOption,
    #[sea_orm(
        belongs_to = "super::lecturer::Entity",
        from = "Column::LecturerId",
        to = "super::lecturer::Column::Id"
    )]
    Lecturer,
}

impl Related<super::study_option::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudyOption.def()
    }
}

impl Related<super::lecturer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lecturer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        department_id: i64,
        option_id: i64,
        lecturer_id: Option<i64>,
        course_code: &str,
        name: &str,
    ) -> Result<Model, DbErr> {
        ActiveModel {
            department_id: Set(department_id),
            option_id: Set(option_id),
            lecturer_id: Set(lecturer_id),
            course_code: Set(course_code.to_owned()),
            name: Set(name.to_owned()),
            ..Default::default()
        }
        .insert(db)
        .await
    }
}
