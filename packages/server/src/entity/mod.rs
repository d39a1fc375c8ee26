pub mod course;
pub mod custom_field;
pub mod custom_table;
pub mod grade;
pub mod grade_component;
pub mod grading_scale;
pub mod score;
pub mod student;
