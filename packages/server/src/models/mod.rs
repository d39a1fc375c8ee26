pub mod course;
pub mod custom_table;
pub mod grading;
pub mod shared;
pub mod student;
