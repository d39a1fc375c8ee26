use common::EducationLevel;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "course")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(unique)]
    pub code: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub credit_hours: i32,
    /// Used to pick a fallback grading scale when none is assigned.
    pub level: Option<EducationLevel>,

    pub grading_scale_id: Option<i32>,
    #[sea_orm(belongs_to, from = "grading_scale_id", to = "id")]
    pub grading_scale: HasOne<super::grading_scale::Entity>,

    #[sea_orm(has_many)]
    pub components: HasMany<super::grade_component::Entity>,

    #[sea_orm(has_many)]
    pub grades: HasMany<super::grade::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
