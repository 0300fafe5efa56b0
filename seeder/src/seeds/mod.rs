pub mod directory;
pub mod student;
