use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::TransactionTrait;
use serde_json::Value;
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::custom_table::RowListResponse;
use crate::permissions::{CUSTOM_DATA_READ, CUSTOM_DATA_WRITE};
use crate::services::dynamic_table::{Row, RowStore, WriteMode};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/custom_tables/data/{table_name}",
    tag = "Custom Data",
    operation_id = "listCustomRows",
    summary = "List the rows of a custom table",
    description = "Returns every row with `id` and all declared fields, typed by the field definitions. The table must be active. Requires `custom_data:read` permission.",
    params(("table_name" = String, Path, description = "Custom table name")),
    responses(
        (status = 200, description = "Rows ordered by id", body = RowListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown or inactive table (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(table_name))]
pub async fn list_rows(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(table_name): Path<String>,
) -> Result<Json<RowListResponse>, AppError> {
    auth_user.require_any_permission(&[CUSTOM_DATA_READ, CUSTOM_DATA_WRITE])?;
    let store = RowStore::open(&state.db, &table_name).await?;
    let data = store.list().await?;
    Ok(Json(RowListResponse {
        table: store.table().name.clone(),
        data,
    }))
}

#[utoipa::path(
    post,
    path = "/custom_tables/data/{table_name}/add",
    tag = "Custom Data",
    operation_id = "insertCustomRow",
    summary = "Insert a row",
    description = "Inserts a row from a JSON object keyed by field name. Required fields must be present and non-null; absent optional fields take their default value. Unknown keys are rejected. Requires `custom_data:write` permission.",
    params(("table_name" = String, Path, description = "Custom table name")),
    request_body(content = Object, description = "Field values keyed by field name"),
    responses(
        (status = 201, description = "Row inserted", body = Object),
        (status = 400, description = "Malformed body or invalid value (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown or inactive table (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(table_name))]
pub async fn insert_row(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(table_name): Path<String>,
    AppJson(payload): AppJson<Value>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(CUSTOM_DATA_WRITE)?;

    let txn = state.db.begin().await?;
    let row = RowStore::open(&txn, &table_name)
        .await?
        .insert(&payload)
        .await?;
    txn.commit().await?;

    info!(id = ?row.get("id"), "Custom row inserted");
    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(
    get,
    path = "/custom_tables/data/{table_name}/{pk}",
    tag = "Custom Data",
    operation_id = "getCustomRow",
    summary = "Get a row by id",
    params(
        ("table_name" = String, Path, description = "Custom table name"),
        ("pk" = i32, Path, description = "Row id"),
    ),
    responses(
        (status = 200, description = "Row", body = Object),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown table or row (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(table_name, pk))]
pub async fn get_row(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((table_name, pk)): Path<(String, i32)>,
) -> Result<Json<Row>, AppError> {
    auth_user.require_any_permission(&[CUSTOM_DATA_READ, CUSTOM_DATA_WRITE])?;
    let row = RowStore::open(&state.db, &table_name).await?.get(pk).await?;
    Ok(Json(row))
}

#[utoipa::path(
    put,
    path = "/custom_tables/data/{table_name}/{pk}",
    tag = "Custom Data",
    operation_id = "replaceCustomRow",
    summary = "Update a row, re-checking required fields",
    description = "Updates the columns present in the body. Every required field must be present and non-null. Requires `custom_data:write` permission.",
    params(
        ("table_name" = String, Path, description = "Custom table name"),
        ("pk" = i32, Path, description = "Row id"),
    ),
    request_body(content = Object, description = "Field values keyed by field name"),
    responses(
        (status = 200, description = "Row updated", body = Object),
        (status = 400, description = "Malformed body or invalid value (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown table or row (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(table_name, pk))]
pub async fn replace_row(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((table_name, pk)): Path<(String, i32)>,
    AppJson(payload): AppJson<Value>,
) -> Result<Json<Row>, AppError> {
    auth_user.require_permission(CUSTOM_DATA_WRITE)?;
    write_row(&state, &table_name, pk, &payload, WriteMode::Replace).await
}

#[utoipa::path(
    patch,
    path = "/custom_tables/data/{table_name}/{pk}",
    tag = "Custom Data",
    operation_id = "updateCustomRow",
    summary = "Partially update a row",
    description = "Updates the columns present in the body without checking required fields. Requires `custom_data:write` permission.",
    params(
        ("table_name" = String, Path, description = "Custom table name"),
        ("pk" = i32, Path, description = "Row id"),
    ),
    request_body(content = Object, description = "Field values keyed by field name"),
    responses(
        (status = 200, description = "Row updated", body = Object),
        (status = 400, description = "Malformed body or invalid value (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown table or row (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(table_name, pk))]
pub async fn update_row(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((table_name, pk)): Path<(String, i32)>,
    AppJson(payload): AppJson<Value>,
) -> Result<Json<Row>, AppError> {
    auth_user.require_permission(CUSTOM_DATA_WRITE)?;
    write_row(&state, &table_name, pk, &payload, WriteMode::Merge).await
}

#[utoipa::path(
    delete,
    path = "/custom_tables/data/{table_name}/{pk}",
    tag = "Custom Data",
    operation_id = "deleteCustomRow",
    summary = "Delete a row",
    params(
        ("table_name" = String, Path, description = "Custom table name"),
        ("pk" = i32, Path, description = "Row id"),
    ),
    responses(
        (status = 204, description = "Row deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown table or row (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(table_name, pk))]
pub async fn delete_row(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((table_name, pk)): Path<(String, i32)>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(CUSTOM_DATA_WRITE)?;

    let txn = state.db.begin().await?;
    RowStore::open(&txn, &table_name).await?.delete(pk).await?;
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn write_row(
    state: &AppState,
    table_name: &str,
    pk: i32,
    payload: &Value,
    mode: WriteMode,
) -> Result<Json<Row>, AppError> {
    let txn = state.db.begin().await?;
    let row = RowStore::open(&txn, table_name)
        .await?
        .update(pk, payload, mode)
        .await?;
    txn.commit().await?;
    Ok(Json(row))
}
