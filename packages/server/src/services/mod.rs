pub mod dynamic_table;
pub mod grade_engine;
