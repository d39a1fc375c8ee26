use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::validate_identifier;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{custom_field, custom_table};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::custom_table::*;
use crate::models::shared::{Pagination, page_params};
use crate::permissions::{CUSTOM_DATA_READ, CUSTOM_TABLE_MANAGE};
use crate::services::dynamic_table::SchemaManager;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/custom_tables/tables",
    tag = "Custom Tables",
    operation_id = "createCustomTable",
    summary = "Define a custom table",
    description = "Stores the table definition and creates the physical table `custom_<name>` with only an auto-increment `id`, in one transaction. Requires `custom_table:manage` permission. Names must match `[a-z][a-z0-9_]*` (at most 48 characters).",
    request_body = CreateTableRequest,
    responses(
        (status = 201, description = "Table created", body = TableResponse),
        (status = 400, description = "Invalid name (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Table name already exists (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_table(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTableRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(CUSTOM_TABLE_MANAGE)?;
    validate_identifier(&payload.name)?;

    let txn = state.db.begin().await?;
    let now = chrono::Utc::now();
    let model = custom_table::ActiveModel {
        name: Set(payload.name.clone()),
        description: Set(payload.description),
        owner_id: Set(auth_user.user_id),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict(format!("Table '{}' already exists", payload.name))
        }
        _ => AppError::from(e),
    })?;

    SchemaManager::new(&txn)
        .create_backing_table(&model.name)
        .await?;
    txn.commit().await?;

    info!(id = model.id, "Custom table created");
    Ok((
        StatusCode::CREATED,
        Json(TableResponse::new(model, Vec::new())),
    ))
}

#[utoipa::path(
    get,
    path = "/custom_tables/tables",
    tag = "Custom Tables",
    operation_id = "listCustomTables",
    summary = "List custom tables",
    description = "Returns a paginated list of table definitions with their fields, optionally filtered by the active flag.",
    params(TableListQuery),
    responses(
        (status = 200, description = "Table definitions ordered by id", body = TableListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_tables(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<TableListQuery>,
) -> Result<Json<TableListResponse>, AppError> {
    auth_user.require_any_permission(&[CUSTOM_TABLE_MANAGE, CUSTOM_DATA_READ])?;
    let (page, per_page) = page_params(query.page, query.per_page);

    let mut select = custom_table::Entity::find();
    if let Some(is_active) = query.is_active {
        select = select.filter(custom_table::Column::IsActive.eq(is_active));
    }
    let paginator = select
        .order_by_asc(custom_table::Column::Id)
        .paginate(&state.db, per_page);
    let total = paginator.num_items().await?;
    let tables = paginator.fetch_page(page - 1).await?;

    let table_ids: Vec<i32> = tables.iter().map(|t| t.id).collect();
    let mut fields_by_table: HashMap<i32, Vec<custom_field::Model>> = HashMap::new();
    for field in custom_field::Entity::find()
        .filter(custom_field::Column::TableId.is_in(table_ids))
        .order_by_asc(custom_field::Column::Id)
        .all(&state.db)
        .await?
    {
        fields_by_table.entry(field.table_id).or_default().push(field);
    }

    let data = tables
        .into_iter()
        .map(|t| {
            let fields = fields_by_table.remove(&t.id).unwrap_or_default();
            TableResponse::new(t, fields)
        })
        .collect();
    Ok(Json(TableListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/custom_tables/tables/{id}",
    tag = "Custom Tables",
    operation_id = "getCustomTable",
    summary = "Get a custom table with its fields",
    params(("id" = i32, Path, description = "Table ID")),
    responses(
        (status = 200, description = "Table definition", body = TableResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Table not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_table(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TableResponse>, AppError> {
    auth_user.require_any_permission(&[CUSTOM_TABLE_MANAGE, CUSTOM_DATA_READ])?;
    let table = find_table(&state.db, id).await?;
    let fields = table_fields(&state.db, id).await?;
    Ok(Json(TableResponse::new(table, fields)))
}

#[utoipa::path(
    patch,
    path = "/custom_tables/tables/{id}",
    tag = "Custom Tables",
    operation_id = "updateCustomTable",
    summary = "Update a custom table",
    description = "Changes the description or the active flag. Inactive tables keep their data but reject row operations with 404. Requires `custom_table:manage` permission.",
    params(("id" = i32, Path, description = "Table ID")),
    request_body = UpdateTableRequest,
    responses(
        (status = 200, description = "Table updated", body = TableResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Table not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_table(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateTableRequest>,
) -> Result<Json<TableResponse>, AppError> {
    auth_user.require_permission(CUSTOM_TABLE_MANAGE)?;

    let existing = find_table(&state.db, id).await?;
    let mut active: custom_table::ActiveModel = existing.into();
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;
    let fields = table_fields(&state.db, id).await?;
    Ok(Json(TableResponse::new(model, fields)))
}

#[utoipa::path(
    delete,
    path = "/custom_tables/tables/{id}",
    tag = "Custom Tables",
    operation_id = "deleteCustomTable",
    summary = "Delete a custom table",
    description = "Removes the table definition and its fields and drops the physical table with all of its rows, in one transaction. Requires `custom_table:manage` permission.",
    params(("id" = i32, Path, description = "Table ID")),
    responses(
        (status = 204, description = "Table deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Table not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_table(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(CUSTOM_TABLE_MANAGE)?;

    let txn = state.db.begin().await?;
    let table = find_table(&txn, id).await?;

    custom_field::Entity::delete_many()
        .filter(custom_field::Column::TableId.eq(id))
        .exec(&txn)
        .await?;
    custom_table::Entity::delete_by_id(id).exec(&txn).await?;
    SchemaManager::new(&txn)
        .drop_backing_table(&table.name)
        .await?;
    txn.commit().await?;

    info!(name = %table.name, "Custom table deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn find_table<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<custom_table::Model, AppError> {
    custom_table::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Table not found".into()))
}

async fn table_fields<C: ConnectionTrait>(
    db: &C,
    table_id: i32,
) -> Result<Vec<custom_field::Model>, AppError> {
    Ok(custom_field::Entity::find()
        .filter(custom_field::Column::TableId.eq(table_id))
        .order_by_asc(custom_field::Column::Id)
        .all(db)
        .await?)
}
