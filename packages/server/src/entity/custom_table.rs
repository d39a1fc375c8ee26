use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Metadata of an admin-defined table. The physical table is `custom_<name>`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "custom_table")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// User id from the access token of the creator.
    pub owner_id: i32,
    pub is_active: bool,

    #[sea_orm(has_many)]
    pub fields: HasMany<super::custom_field::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
