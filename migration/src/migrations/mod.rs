pub mod m202510010001_create_departments;
pub mod m202510010002_create_options;
pub mod m202510010003_create_lecturers;
pub mod m202510010004_create_courses;
pub mod m202510010005_create_students;
pub mod m202510010006_create_attendance;
