use crate::seed::{Seeder, run_seeder};
use crate::seeds::{directory::DirectorySeeder, student::StudentSeeder};

mod seed;
mod seeds;

#[tokio::main]
async fn main() {
    let db = match db::connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to connect to {}: {e}", util::config::database_path());
            std::process::exit(1);
        }
    };

    for (seeder, name) in [
        (Box::new(DirectorySeeder) as Box<dyn Seeder + Send + Sync>, "Directory"),
        (Box::new(StudentSeeder), "Student"),
    ] {
        run_seeder(&*seeder, name, &db).await;
    }
}
