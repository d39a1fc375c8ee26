mod auth;
mod common;
mod courses;
mod custom_tables;
mod grading;
