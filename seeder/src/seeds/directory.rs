use crate::seed::Seeder;
use db::models::{course, department, lecturer, study_option};
use sea_orm::{DatabaseConnection, DbErr};

/// Departments, their options, one lecturer each and the courses they teach.
///
/// Lecturer `user_id`s start at 2; user 1 is reserved for the administrator.
pub struct DirectorySeeder;

type Courses = &'static [(&'static str, &'static str)];

const DIRECTORY: &[(&str, &[(&str, Courses)])] = &[
    (
        "Computer Science",
        &[
            (
                "Software Engineering",
                &[("CS201", "Data Structures"), ("CS214", "Distributed Systems")],
            ),
            (
                "Networking",
                &[("CS221", "Computer Networks"), ("CS302", "Network Security")],
            ),
        ],
    ),
    (
        "Information Technology",
        &[(
            "Information Systems",
            &[("IT110", "Databases"), ("IT240", "Systems Analysis")],
        )],
    ),
];

const LECTURERS: &[(&str, &str)] = &[("Grace", "Hopper"), ("Alan", "Turing")];

#[async_trait::async_trait]
impl Seeder for DirectorySeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        for (i, (dept_name, options)) in DIRECTORY.iter().enumerate() {
            let dept = department::Model::create(db, dept_name).await?;
            let (first, last) = LECTURERS[i % LECTURERS.len()];
            let lecturer = lecturer::Model::create(db, i as i64 + 2, dept.id, first, last).await?;

            for (option_name, courses) in options.iter() {
                let option = study_option::Model::create(db, dept.id, option_name).await?;
                for (code, name) in courses.iter() {
                    course::Model::create(db, dept.id, option.id, Some(lecturer.id), code, name)
                        .await?;
                }
            }
        }
        Ok(())
    }
}
