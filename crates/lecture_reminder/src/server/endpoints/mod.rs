pub mod courses;
pub mod status;
pub mod student;
pub mod timetable;
