use common::EducationLevel;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "grading_scale")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,
    pub level: EducationLevel,
    /// Threshold to label mapping, e.g. `{"80": "A1", "70-79": "B2"}`.
    #[sea_orm(column_type = "JsonBinary")]
    pub grades: serde_json::Value,
    pub is_active: bool,

    #[sea_orm(has_many)]
    pub courses: HasMany<super::course::Entity>,

    #[sea_orm(has_many)]
    pub components: HasMany<super::grade_component::Entity>,

    #[sea_orm(has_many)]
    pub assigned_grades: HasMany<super::grade::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
