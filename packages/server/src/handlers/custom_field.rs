use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::validate_column_name;
use sea_orm::*;
use tracing::{info, instrument};

use super::custom_table::find_table;
use crate::entity::custom_field;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::custom_table::*;
use crate::models::shared::{Pagination, page_params};
use crate::permissions::{CUSTOM_DATA_READ, CUSTOM_TABLE_MANAGE};
use crate::services::dynamic_table::{SchemaManager, parse_choices, parse_default};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/custom_tables/fields",
    tag = "Custom Fields",
    operation_id = "createCustomField",
    summary = "Add a field to a custom table",
    description = "Stores the field definition and adds the matching nullable column in one transaction. Requires `custom_table:manage` permission. Text fields may carry a `choices` list, enforced by a CHECK constraint. `id` is reserved.",
    request_body = CreateFieldRequest,
    responses(
        (status = 201, description = "Field created", body = FieldResponse),
        (status = 400, description = "Invalid name, choices or default (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Table not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Field name already used in this table (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(table_id = payload.table_id, name = %payload.name))]
pub async fn create_field(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateFieldRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(CUSTOM_TABLE_MANAGE)?;
    validate_column_name(&payload.name)?;
    let label = payload.label.unwrap_or_else(|| payload.name.clone());
    validate_label(&label)?;
    let choices = parse_choices(payload.data_type, payload.choices.as_ref())?;
    if let Some(ref default) = payload.default_value {
        parse_default(
            &payload.name,
            payload.data_type,
            choices.as_deref().unwrap_or_default(),
            default,
        )?;
    }

    let txn = state.db.begin().await?;
    let table = find_table(&txn, payload.table_id).await?;

    let model = custom_field::ActiveModel {
        table_id: Set(table.id),
        name: Set(payload.name.clone()),
        label: Set(label),
        data_type: Set(payload.data_type),
        required: Set(payload.required),
        default_value: Set(payload.default_value),
        help_text: Set(payload.help_text),
        choices: Set(choices.as_ref().map(|c| serde_json::json!(c))),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(format!(
            "Field '{}' already exists in table '{}'",
            payload.name, table.name
        )),
        _ => AppError::from(e),
    })?;

    SchemaManager::new(&txn)
        .add_backing_column(
            &table.name,
            &model.name,
            model.data_type,
            choices.as_deref(),
        )
        .await?;
    txn.commit().await?;

    info!(id = model.id, data_type = %model.data_type, "Custom field created");
    Ok((StatusCode::CREATED, Json(FieldResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/custom_tables/fields",
    tag = "Custom Fields",
    operation_id = "listCustomFields",
    summary = "List custom fields",
    params(FieldListQuery),
    responses(
        (status = 200, description = "Fields ordered by id", body = FieldListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_fields(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<FieldListQuery>,
) -> Result<Json<FieldListResponse>, AppError> {
    auth_user.require_any_permission(&[CUSTOM_TABLE_MANAGE, CUSTOM_DATA_READ])?;
    let (page, per_page) = page_params(query.page, query.per_page);

    let mut select = custom_field::Entity::find();
    if let Some(table_id) = query.table_id {
        select = select.filter(custom_field::Column::TableId.eq(table_id));
    }
    let paginator = select
        .order_by_asc(custom_field::Column::Id)
        .paginate(&state.db, per_page);
    let total = paginator.num_items().await?;
    let data = paginator
        .fetch_page(page - 1)
        .await?
        .into_iter()
        .map(FieldResponse::from)
        .collect();

    Ok(Json(FieldListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/custom_tables/fields/{id}",
    tag = "Custom Fields",
    operation_id = "getCustomField",
    summary = "Get a custom field by ID",
    params(("id" = i32, Path, description = "Field ID")),
    responses(
        (status = 200, description = "Field definition", body = FieldResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Field not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_field(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<FieldResponse>, AppError> {
    auth_user.require_any_permission(&[CUSTOM_TABLE_MANAGE, CUSTOM_DATA_READ])?;
    let model = find_field(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/custom_tables/fields/{id}",
    tag = "Custom Fields",
    operation_id = "updateCustomField",
    summary = "Update field metadata",
    description = "Changes the label, help text, default value or required flag. The physical column is not altered; name, type and choices are fixed once created. Requires `custom_table:manage` permission.",
    params(("id" = i32, Path, description = "Field ID")),
    request_body = UpdateFieldRequest,
    responses(
        (status = 200, description = "Field updated", body = FieldResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Field not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_field(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateFieldRequest>,
) -> Result<Json<FieldResponse>, AppError> {
    auth_user.require_permission(CUSTOM_TABLE_MANAGE)?;
    if let Some(ref label) = payload.label {
        validate_label(label)?;
    }

    let existing = find_field(&state.db, id).await?;
    if let Some(Some(ref default)) = payload.default_value {
        let choices = parse_choices(existing.data_type, existing.choices.as_ref())?;
        parse_default(
            &existing.name,
            existing.data_type,
            choices.as_deref().unwrap_or_default(),
            default,
        )?;
    }

    let mut active: custom_field::ActiveModel = existing.into();
    if let Some(label) = payload.label {
        active.label = Set(label);
    }
    if let Some(help_text) = payload.help_text {
        active.help_text = Set(help_text);
    }
    if let Some(default_value) = payload.default_value {
        active.default_value = Set(default_value);
    }
    if let Some(required) = payload.required {
        active.required = Set(required);
    }

    let model = active.update(&state.db).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/custom_tables/fields/{id}",
    tag = "Custom Fields",
    operation_id = "deleteCustomField",
    summary = "Remove a field",
    description = "Deletes the field definition and drops its column, with the stored values, in one transaction. Requires `custom_table:manage` permission.",
    params(("id" = i32, Path, description = "Field ID")),
    responses(
        (status = 204, description = "Field deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Field not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_field(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(CUSTOM_TABLE_MANAGE)?;

    let txn = state.db.begin().await?;
    let field = find_field(&txn, id).await?;
    let table = find_table(&txn, field.table_id).await?;

    custom_field::Entity::delete_by_id(id).exec(&txn).await?;
    SchemaManager::new(&txn)
        .drop_backing_column(&table.name, &field.name)
        .await?;
    txn.commit().await?;

    info!(table = %table.name, column = %field.name, "Custom field deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_field<C: ConnectionTrait>(db: &C, id: i32) -> Result<custom_field::Model, AppError> {
    custom_field::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Field not found".into()))
}
