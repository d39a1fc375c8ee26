use chrono::{DateTime, Utc};
use common::FieldDataType;
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, double_option};
use crate::entity::{custom_field, custom_table};
use crate::error::AppError;
use crate::services::dynamic_table::Row;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateTableRequest {
    /// Lowercase identifier; the physical table is `custom_<name>`.
    #[schema(example = "library_books")]
    pub name: String,
    pub description: Option<String>,
}

/// The name is immutable because it names the physical table.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateTableRequest {
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TableResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: i32,
    pub is_active: bool,
    pub fields: Vec<FieldResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TableResponse {
    pub fn new(m: custom_table::Model, fields: Vec<custom_field::Model>) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            owner_id: m.owner_id,
            is_active: m.is_active,
            fields: fields.into_iter().map(FieldResponse::from).collect(),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateFieldRequest {
    pub table_id: i32,
    /// Lowercase identifier used as the column name.
    #[schema(example = "isbn")]
    pub name: String,
    /// Defaults to the name.
    pub label: Option<String>,
    pub data_type: FieldDataType,
    #[serde(default)]
    pub required: bool,
    pub default_value: Option<String>,
    pub help_text: Option<String>,
    /// Allowed values for text fields.
    #[schema(value_type = Option<Vec<String>>)]
    pub choices: Option<serde_json::Value>,
}

/// Only metadata can change; the column itself is left alone.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateFieldRequest {
    pub label: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub help_text: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub default_value: Option<Option<String>>,
    pub required: Option<bool>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TableListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub is_active: Option<bool>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TableListResponse {
    pub data: Vec<TableResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FieldListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub table_id: Option<i32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FieldListResponse {
    pub data: Vec<FieldResponse>,
    pub pagination: Pagination,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FieldResponse {
    pub id: i32,
    pub table_id: i32,
    pub name: String,
    pub label: String,
    pub data_type: FieldDataType,
    pub required: bool,
    pub default_value: Option<String>,
    pub help_text: Option<String>,
    #[schema(value_type = Option<Vec<String>>)]
    pub choices: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<custom_field::Model> for FieldResponse {
    fn from(m: custom_field::Model) -> Self {
        Self {
            id: m.id,
            table_id: m.table_id,
            name: m.name,
            label: m.label,
            data_type: m.data_type,
            required: m.required,
            default_value: m.default_value,
            help_text: m.help_text,
            choices: m.choices,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RowListResponse {
    pub table: String,
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Row>,
}

pub fn validate_label(label: &str) -> Result<(), AppError> {
    if label.trim().is_empty() || label.chars().count() > 100 {
        return Err(AppError::Validation("label must be 1-100 characters".into()));
    }
    Ok(())
}
