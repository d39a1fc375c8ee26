use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::{info, instrument};

use super::course::{ensure_scale_exists, find_course};
use crate::entity::{grade_component, score};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::course::*;
use crate::permissions::{COURSE_MANAGE, GRADE_VIEW, SCORE_RECORD};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/courses/{id}/components",
    tag = "Grade Components",
    operation_id = "createComponent",
    summary = "Add a graded component to a course",
    description = "Creates a quiz, assignment, mid-semester or exam component. Requires `course:manage` permission. Weights are not checked against each other here; the 100-point total is enforced when a grade is computed.",
    params(("id" = i32, Path, description = "Course ID")),
    request_body = CreateComponentRequest,
    responses(
        (status = 201, description = "Component created", body = ComponentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(course_id))]
pub async fn create_component(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
    AppJson(payload): AppJson<CreateComponentRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(COURSE_MANAGE)?;
    validate_create_component(&payload)?;
    find_course(&state.db, course_id).await?;
    if let Some(scale_id) = payload.grading_scale_id {
        ensure_scale_exists(&state.db, scale_id).await?;
    }

    let model = grade_component::ActiveModel {
        course_id: Set(course_id),
        name: Set(payload.name.trim().to_string()),
        kind: Set(payload.kind),
        max_score: Set(payload.max_score),
        weight: Set(payload.weight),
        grading_scale_id: Set(payload.grading_scale_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(id = model.id, kind = %model.kind, "Component created");
    Ok((StatusCode::CREATED, Json(ComponentResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/courses/{id}/components",
    tag = "Grade Components",
    operation_id = "listComponents",
    summary = "List the components of a course",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Components ordered by id", body = Vec<ComponentResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(course_id))]
pub async fn list_components(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> Result<Json<Vec<ComponentResponse>>, AppError> {
    auth_user.require_any_permission(&[COURSE_MANAGE, SCORE_RECORD, GRADE_VIEW])?;
    find_course(&state.db, course_id).await?;

    let components = grade_component::Entity::find()
        .filter(grade_component::Column::CourseId.eq(course_id))
        .order_by_asc(grade_component::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(
        components.into_iter().map(ComponentResponse::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/components/{id}",
    tag = "Grade Components",
    operation_id = "getComponent",
    summary = "Get a component by ID",
    params(("id" = i32, Path, description = "Component ID")),
    responses(
        (status = 200, description = "Component details", body = ComponentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Component not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_component(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ComponentResponse>, AppError> {
    auth_user.require_any_permission(&[COURSE_MANAGE, SCORE_RECORD, GRADE_VIEW])?;
    let model = find_component(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/components/{id}",
    tag = "Grade Components",
    operation_id = "updateComponent",
    summary = "Update a component",
    description = "Partially updates a component. Requires `course:manage` permission. Lowering `max_score` below an already recorded score is rejected. Stored grades are not recomputed.",
    params(("id" = i32, Path, description = "Component ID")),
    request_body = UpdateComponentRequest,
    responses(
        (status = 200, description = "Component updated", body = ComponentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Component not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_component(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateComponentRequest>,
) -> Result<Json<ComponentResponse>, AppError> {
    auth_user.require_permission(COURSE_MANAGE)?;
    validate_update_component(&payload)?;
    if let Some(Some(scale_id)) = payload.grading_scale_id {
        ensure_scale_exists(&state.db, scale_id).await?;
    }

    let txn = state.db.begin().await?;
    let existing = find_component(&txn, id).await?;

    if let Some(max_score) = payload.max_score {
        let above = score::Entity::find()
            .filter(score::Column::ComponentId.eq(id))
            .filter(score::Column::Score.gt(max_score))
            .count(&txn)
            .await?;
        if above > 0 {
            return Err(AppError::Validation(format!(
                "{above} recorded score(s) exceed the new max_score"
            )));
        }
    }

    let mut active: grade_component::ActiveModel = existing.into();
    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(kind) = payload.kind {
        active.kind = Set(kind);
    }
    if let Some(max_score) = payload.max_score {
        active.max_score = Set(max_score);
    }
    if let Some(weight) = payload.weight {
        active.weight = Set(weight);
    }
    if let Some(grading_scale_id) = payload.grading_scale_id {
        active.grading_scale_id = Set(grading_scale_id);
    }

    let model = active.update(&txn).await?;
    txn.commit().await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/components/{id}",
    tag = "Grade Components",
    operation_id = "deleteComponent",
    summary = "Delete a component",
    description = "Deletes a component. Requires `course:manage` permission. Returns 409 while scores are recorded against it.",
    params(("id" = i32, Path, description = "Component ID")),
    responses(
        (status = 204, description = "Component deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Component not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Component has scores (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_component(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(COURSE_MANAGE)?;

    let txn = state.db.begin().await?;
    find_component(&txn, id).await?;

    let scores = score::Entity::find()
        .filter(score::Column::ComponentId.eq(id))
        .count(&txn)
        .await?;
    if scores > 0 {
        return Err(AppError::Conflict(
            "Component has recorded scores".into(),
        ));
    }

    grade_component::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn find_component<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<grade_component::Model, AppError> {
    grade_component::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Component not found".into()))
}
