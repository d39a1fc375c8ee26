use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::{info, instrument, warn};

use super::grade_component::find_component;
use super::student::{ensure_visible, find_student, visible_students};
use crate::entity::{grade_component, score, student};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::grading::*;
use crate::models::shared::{Pagination, escape_like, page_params};
use crate::permissions::{GRADE_VIEW, SCORE_RECORD};
use crate::services::grade_engine::GradeEngine;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/scores",
    tag = "Scores",
    operation_id = "createScore",
    summary = "Record a score",
    description = "Records a student's score for a component and recomputes the student's course grade in the same transaction. Requires `score:record` permission. If the course's component weights do not sum to 100 the request is rejected and nothing is stored.",
    request_body = CreateScoreRequest,
    responses(
        (status = 201, description = "Score recorded", body = ScoreResponse),
        (status = 400, description = "Validation error or weight mismatch (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student or component not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Score already recorded for this component (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(student_id = payload.student_id, component_id = payload.component_id))]
pub async fn create_score(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateScoreRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(SCORE_RECORD)?;

    let txn = state.db.begin().await?;
    find_student(&txn, payload.student_id).await?;
    let component = find_component(&txn, payload.component_id).await?;
    validate_score_value(payload.score, component.max_score)?;

    let now = chrono::Utc::now();
    let model = score::ActiveModel {
        student_id: Set(payload.student_id),
        component_id: Set(payload.component_id),
        score: Set(payload.score),
        recorded_by: Set(Some(auth_user.user_id)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(
            "A score is already recorded for this student and component".into(),
        ),
        _ => AppError::from(e),
    })?;

    GradeEngine::new(&txn)
        .recompute(model.student_id, component.course_id)
        .await?;
    txn.commit().await?;

    info!(id = model.id, "Score recorded");
    Ok((StatusCode::CREATED, Json(ScoreResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/scores",
    tag = "Scores",
    operation_id = "listScores",
    summary = "List scores",
    description = "Returns a paginated list of scores ordered by id, optionally filtered by student or component and searched by component or student name. Students and parents only see their own or their children's scores.",
    params(ScoreListQuery),
    responses(
        (status = 200, description = "List of scores", body = ScoreListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_scores(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ScoreListQuery>,
) -> Result<Json<ScoreListResponse>, AppError> {
    auth_user.require_any_permission(&[SCORE_RECORD, GRADE_VIEW])?;
    let (page, per_page) = page_params(query.page, query.per_page);

    let mut select = score::Entity::find();
    if let Some(student_id) = query.student_id {
        select = select.filter(score::Column::StudentId.eq(student_id));
    }
    if let Some(component_id) = query.component_id {
        select = select.filter(score::Column::ComponentId.eq(component_id));
    }
    if let Some(own) = visible_students(&auth_user) {
        select = select.filter(score::Column::StudentId.in_subquery(own));
    }
    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            let components = grade_component::Entity::find()
                .select_only()
                .column(grade_component::Column::Id)
                .filter(
                    Expr::expr(Func::lower(Expr::col(grade_component::Column::Name)))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                )
                .into_query();
            let students = student::Entity::find()
                .select_only()
                .column(student::Column::Id)
                .filter(
                    Condition::any()
                        .add(
                            Expr::expr(Func::lower(Expr::col(student::Column::FirstName)))
                                .like(LikeExpr::new(pattern.clone()).escape('\\')),
                        )
                        .add(
                            Expr::expr(Func::lower(Expr::col(student::Column::LastName)))
                                .like(LikeExpr::new(pattern).escape('\\')),
                        ),
                )
                .into_query();
            select = select.filter(
                Condition::any()
                    .add(score::Column::ComponentId.in_subquery(components))
                    .add(score::Column::StudentId.in_subquery(students)),
            );
        }
    }

    let paginator = select
        .order_by_asc(score::Column::Id)
        .paginate(&state.db, per_page);
    let total = paginator.num_items().await?;
    let data = paginator
        .fetch_page(page - 1)
        .await?
        .into_iter()
        .map(ScoreResponse::from)
        .collect();

    Ok(Json(ScoreListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/scores/{id}",
    tag = "Scores",
    operation_id = "getScore",
    summary = "Get a score by ID",
    params(("id" = i32, Path, description = "Score ID")),
    responses(
        (status = 200, description = "Score details", body = ScoreResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Score not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_score(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ScoreResponse>, AppError> {
    auth_user.require_any_permission(&[SCORE_RECORD, GRADE_VIEW])?;
    let model = find_score(&state.db, id).await?;
    ensure_visible(&state.db, &auth_user, model.student_id, "Score not found").await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    put,
    path = "/scores/{id}",
    tag = "Scores",
    operation_id = "replaceScore",
    summary = "Replace a score value",
    description = "Sets a new value for an existing score and recomputes the grade in the same transaction. Requires `score:record` permission. The student and component of a score cannot change.",
    params(("id" = i32, Path, description = "Score ID")),
    request_body = ReplaceScoreRequest,
    responses(
        (status = 200, description = "Score updated", body = ScoreResponse),
        (status = 400, description = "Validation error or weight mismatch (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Score not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn replace_score(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<ReplaceScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    auth_user.require_permission(SCORE_RECORD)?;
    let model = write_score(&state.db, id, Some(payload.score), auth_user.user_id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/scores/{id}",
    tag = "Scores",
    operation_id = "updateScore",
    summary = "Partially update a score",
    description = "Same as PUT with every field optional. An empty payload returns the score unchanged without recomputing.",
    params(("id" = i32, Path, description = "Score ID")),
    request_body = UpdateScoreRequest,
    responses(
        (status = 200, description = "Score updated", body = ScoreResponse),
        (status = 400, description = "Validation error or weight mismatch (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Score not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_score(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    auth_user.require_permission(SCORE_RECORD)?;

    if payload == UpdateScoreRequest::default() {
        let existing = find_score(&state.db, id).await?;
        return Ok(Json(existing.into()));
    }

    let model = write_score(&state.db, id, payload.score, auth_user.user_id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/scores/{id}",
    tag = "Scores",
    operation_id = "deleteScore",
    summary = "Delete a score",
    description = "Deletes a score, then recomputes the grade with the score counted as zero. Requires `score:record` permission. The deletion stands even if the recompute fails; the failure is logged.",
    params(("id" = i32, Path, description = "Score ID")),
    responses(
        (status = 204, description = "Score deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Score not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_score(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(SCORE_RECORD)?;

    let txn = state.db.begin().await?;
    let existing = find_score(&txn, id).await?;
    let component = find_component(&txn, existing.component_id).await?;
    score::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    if let Err(e) = GradeEngine::new(&state.db)
        .recompute(existing.student_id, component.course_id)
        .await
    {
        warn!(
            student_id = existing.student_id,
            course_id = component.course_id,
            error = %e,
            "Grade recompute after score deletion failed"
        );
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Apply a new score value and recompute, all in one transaction.
async fn write_score(
    db: &DatabaseConnection,
    id: i32,
    new_score: Option<f64>,
    user_id: i32,
) -> Result<score::Model, AppError> {
    let txn = db.begin().await?;
    let existing = find_score(&txn, id).await?;
    let component = find_component(&txn, existing.component_id).await?;

    let mut active: score::ActiveModel = existing.into();
    if let Some(value) = new_score {
        validate_score_value(value, component.max_score)?;
        active.score = Set(value);
    }
    active.recorded_by = Set(Some(user_id));
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    GradeEngine::new(&txn)
        .recompute(model.student_id, component.course_id)
        .await?;
    txn.commit().await?;

    Ok(model)
}

async fn find_score<C: ConnectionTrait>(db: &C, id: i32) -> Result<score::Model, AppError> {
    score::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Score not found".into()))
}
