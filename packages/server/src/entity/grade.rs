use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Computed course result. Written only by the grade engine.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "grade")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "student_course")]
    pub student_id: i32,
    #[sea_orm(belongs_to, from = "student_id", to = "id")]
    pub student: HasOne<super::student::Entity>,

    #[sea_orm(unique_key = "student_course")]
    pub course_id: i32,
    #[sea_orm(belongs_to, from = "course_id", to = "id")]
    pub course: HasOne<super::course::Entity>,

    pub final_grade: f64,
    pub letter_grade: Option<String>,

    pub grading_scale_id: Option<i32>,
    #[sea_orm(belongs_to, from = "grading_scale_id", to = "id")]
    pub grading_scale: HasOne<super::grading_scale::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
