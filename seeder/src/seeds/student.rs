use crate::seed::Seeder;
use db::models::student::{self, NewStudent};
use db::models::study_option;
use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait};

pub struct StudentSeeder;

const CLASS_LEVELS: [&str; 3] = ["Year 1", "Year 2", "Year 3"];
const PER_CLASS: usize = 15;

#[async_trait::async_trait]
impl Seeder for StudentSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        let options = study_option::Entity::find().all(db).await?;
        let mut n = 0u32;

        for option in &options {
            for level in CLASS_LEVELS {
                for _ in 0..PER_CLASS {
                    n += 1;
                    let first: String = FirstName().fake();
                    let last: String = LastName().fake();
                    let reg_no = format!("{}{:05}", fastrand::u16(20..26), n);
                    // About one in ten students has no fingerprint enrolled yet.
                    let fingerprint = (fastrand::u8(..10) > 0).then(|| format!("FP{n:05}"));

                    student::Model::create(
                        db,
                        NewStudent {
                            reg_no: &reg_no,
                            first_name: &first,
                            last_name: &last,
                            department_id: option.department_id,
                            option_id: option.id,
                            class_level: level,
                            fingerprint_id: fingerprint.as_deref(),
                        },
                    )
                    .await?;
                }
            }
        }
        Ok(())
    }
}
