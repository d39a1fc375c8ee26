use common::ComponentKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "grade_component")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    pub kind: ComponentKind,
    pub max_score: f64,
    /// Percentage points this component contributes (0-100).
    pub weight: i32,

    #[sea_orm(indexed)]
    pub course_id: i32,
    #[sea_orm(belongs_to, from = "course_id", to = "id")]
    pub course: HasOne<super::course::Entity>,

    pub grading_scale_id: Option<i32>,
    #[sea_orm(belongs_to, from = "grading_scale_id", to = "id")]
    pub grading_scale: HasOne<super::grading_scale::Entity>,

    #[sea_orm(has_many)]
    pub scores: HasMany<super::score::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
