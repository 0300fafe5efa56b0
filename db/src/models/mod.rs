pub mod attendance_record;
pub mod attendance_session;
pub mod course;
pub mod department;
pub mod lecturer;
pub mod session_student;
pub mod student;
pub mod study_option;

pub use attendance_record::Entity as AttendanceRecord;
pub use attendance_session::Entity as AttendanceSession;
pub use course::Entity as Course;
pub use department::Entity as Department;
pub use lecturer::Entity as Lecturer;
pub use session_student::Entity as SessionStudent;
pub use student::Entity as Student;
pub use study_option::Entity as StudyOption;
