use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// School-issued identifier, e.g. "STU-2024-001".
    #[sea_orm(unique)]
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,

    /// Account of the student in the identity service.
    #[sea_orm(unique)]
    pub user_id: Option<i32>,
    /// Account of the parent or guardian.
    #[sea_orm(indexed)]
    pub parent_user_id: Option<i32>,

    #[sea_orm(has_many)]
    pub scores: HasMany<super::score::Entity>,

    #[sea_orm(has_many)]
    pub grades: HasMany<super::grade::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
