use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{course, grade, grade_component, grading_scale};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::grading::*;
use crate::permissions::{COURSE_MANAGE, GRADE_VIEW, GRADING_MANAGE};
use crate::state::AppState;

fn map_name_conflict(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Grading scale name already exists".into())
        }
        _ => AppError::from(e),
    }
}

#[utoipa::path(
    post,
    path = "/grading-scales",
    tag = "Grading Scales",
    operation_id = "createGradingScale",
    summary = "Create a grading scale",
    description = "Creates a threshold to label mapping for an education level. Requires `grading:manage` permission. Several active scales per level are allowed; the lowest id wins when a course has no explicit scale.",
    request_body = CreateGradingScaleRequest,
    responses(
        (status = 201, description = "Grading scale created", body = GradingScaleResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Name already exists (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_grading_scale(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateGradingScaleRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(GRADING_MANAGE)?;
    validate_create_grading_scale(&payload)?;

    let model = grading_scale::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        level: Set(payload.level),
        grades: Set(payload.grades),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(map_name_conflict)?;

    info!(id = model.id, "Grading scale created");
    Ok((StatusCode::CREATED, Json(GradingScaleResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/grading-scales",
    tag = "Grading Scales",
    operation_id = "listGradingScales",
    summary = "List grading scales",
    params(GradingScaleListQuery),
    responses(
        (status = 200, description = "Grading scales ordered by id", body = Vec<GradingScaleResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_grading_scales(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<GradingScaleListQuery>,
) -> Result<Json<Vec<GradingScaleResponse>>, AppError> {
    auth_user.require_any_permission(&[GRADING_MANAGE, COURSE_MANAGE, GRADE_VIEW])?;

    let mut select = grading_scale::Entity::find();
    if let Some(level) = query.level {
        select = select.filter(grading_scale::Column::Level.eq(level));
    }
    if let Some(is_active) = query.is_active {
        select = select.filter(grading_scale::Column::IsActive.eq(is_active));
    }

    let scales = select
        .order_by_asc(grading_scale::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(
        scales.into_iter().map(GradingScaleResponse::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/grading-scales/{id}",
    tag = "Grading Scales",
    operation_id = "getGradingScale",
    summary = "Get a grading scale by ID",
    params(("id" = i32, Path, description = "Grading scale ID")),
    responses(
        (status = 200, description = "Grading scale details", body = GradingScaleResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Grading scale not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_grading_scale(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<GradingScaleResponse>, AppError> {
    auth_user.require_any_permission(&[GRADING_MANAGE, COURSE_MANAGE, GRADE_VIEW])?;
    let model = find_grading_scale(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/grading-scales/{id}",
    tag = "Grading Scales",
    operation_id = "updateGradingScale",
    summary = "Update a grading scale",
    description = "Partially updates a grading scale. Requires `grading:manage` permission. Stored letter grades change only on the next recompute.",
    params(("id" = i32, Path, description = "Grading scale ID")),
    request_body = UpdateGradingScaleRequest,
    responses(
        (status = 200, description = "Grading scale updated", body = GradingScaleResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Grading scale not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name already exists (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_grading_scale(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateGradingScaleRequest>,
) -> Result<Json<GradingScaleResponse>, AppError> {
    auth_user.require_permission(GRADING_MANAGE)?;
    validate_update_grading_scale(&payload)?;

    let existing = find_grading_scale(&state.db, id).await?;
    let mut active: grading_scale::ActiveModel = existing.into();

    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(level) = payload.level {
        active.level = Set(level);
    }
    if let Some(grades) = payload.grades {
        active.grades = Set(grades);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }

    let model = active.update(&state.db).await.map_err(map_name_conflict)?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/grading-scales/{id}",
    tag = "Grading Scales",
    operation_id = "deleteGradingScale",
    summary = "Delete a grading scale",
    description = "Deletes a grading scale. Requires `grading:manage` permission. Returns 409 while a course, component or grade references it; deactivate it instead.",
    params(("id" = i32, Path, description = "Grading scale ID")),
    responses(
        (status = 204, description = "Grading scale deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Grading scale not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Grading scale in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_grading_scale(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(GRADING_MANAGE)?;

    let txn = state.db.begin().await?;
    find_grading_scale(&txn, id).await?;

    let courses = course::Entity::find()
        .filter(course::Column::GradingScaleId.eq(id))
        .count(&txn)
        .await?;
    let components = grade_component::Entity::find()
        .filter(grade_component::Column::GradingScaleId.eq(id))
        .count(&txn)
        .await?;
    let grades = grade::Entity::find()
        .filter(grade::Column::GradingScaleId.eq(id))
        .count(&txn)
        .await?;
    if courses + components + grades > 0 {
        return Err(AppError::Conflict("Grading scale is in use".into()));
    }

    grading_scale::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn find_grading_scale<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<grading_scale::Model, AppError> {
    grading_scale::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Grading scale not found".into()))
}
