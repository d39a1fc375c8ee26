use common::FieldDataType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "custom_field")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "table_field")]
    pub table_id: i32,
    #[sea_orm(belongs_to, from = "table_id", to = "id")]
    pub table: HasOne<super::custom_table::Entity>,

    /// Physical column name.
    #[sea_orm(unique_key = "table_field")]
    pub name: String,
    pub label: String,
    pub data_type: FieldDataType,
    pub required: bool,
    /// Stored as text and coerced to `data_type` when applied.
    pub default_value: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub help_text: Option<String>,
    /// JSON array of allowed values for text fields.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub choices: Option<serde_json::Value>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
