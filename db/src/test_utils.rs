use migration::Migrator;
use sea_orm::{Database, DatabaseConnection, EntityTrait, PaginatorTrait};
use sea_orm_migration::MigratorTrait;

use crate::models::{
    course, department, lecturer,
    student::{self, NewStudent},
    study_option,
};

pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory db");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// A department with one option, one course and one lecturer.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub department: department::Model,
    pub option: study_option::Model,
    pub course: course::Model,
    pub lecturer: lecturer::Model,
}

impl Fixture {
    pub const CLASS_LEVEL: &'static str = "Year 2";

    /// Seeds the directory tables. `lecturer_user_id` is the auth identity of the lecturer.
    pub async fn seed(db: &DatabaseConnection, lecturer_user_id: i64) -> Self {
        let department = department::Model::create(db, &format!("Dept {lecturer_user_id}"))
            .await
            .expect("create department");
        let option = study_option::Model::create(db, department.id, "Software Engineering")
            .await
            .expect("create option");
        let lecturer = lecturer::Model::create(db, lecturer_user_id, department.id, "Ada", "Lovelace")
            .await
            .expect("create lecturer");
        let course = course::Model::create(
            db,
            department.id,
            option.id,
            Some(lecturer.id),
            &format!("SE{lecturer_user_id}01"),
            "Distributed Systems",
        )
        .await
        .expect("create course");

        Self {
            department,
            option,
            course,
            lecturer,
        }
    }

    /// Another course in the same option, taught by the same lecturer.
    pub async fn add_course(&self, db: &DatabaseConnection, code: &str) -> course::Model {
        course::Model::create(
            db,
            self.department.id,
            self.option.id,
            Some(self.lecturer.id),
            code,
            "Elective",
        )
        .await
        .expect("create course")
    }

    /// Enrols `count` active students in this fixture's scope and returns their ids.
    pub async fn enrol(&self, db: &DatabaseConnection, count: usize) -> Vec<i64> {
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let n = student::Entity::find()
                .count(db)
                .await
                .expect("count students")
                + 1;
            let reg_no = format!("REG{n:05}");
            let fingerprint = format!("FP{n:05}");
            let s = student::Model::create(
                db,
                NewStudent {
                    reg_no: &reg_no,
                    first_name: "Student",
                    last_name: &n.to_string(),
                    department_id: self.department.id,
                    option_id: self.option.id,
                    class_level: Self::CLASS_LEVEL,
                    fingerprint_id: Some(&fingerprint),
                },
            )
            .await
            .expect("create student");
            ids.push(s.id);
        }
        ids
    }
}
