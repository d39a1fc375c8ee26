use axum::Json;
use axum::extract::{Path, Query, State};
use sea_orm::*;
use tracing::{info, instrument};

use super::student::{ensure_visible, visible_students};
use crate::entity::grade;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::grading::*;
use crate::models::shared::{Pagination, page_params};
use crate::permissions::{GRADE_RECOMPUTE, GRADE_VIEW};
use crate::services::grade_engine::GradeEngine;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/grades",
    tag = "Grades",
    operation_id = "listGrades",
    summary = "List computed grades",
    description = "Returns a paginated list of grades ordered by id, optionally filtered by student or course. Students and parents only see their own or their children's grades. Grades are produced by the grade engine and cannot be edited directly.",
    params(GradeListQuery),
    responses(
        (status = 200, description = "List of grades", body = GradeListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_grades(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<GradeListQuery>,
) -> Result<Json<GradeListResponse>, AppError> {
    auth_user.require_permission(GRADE_VIEW)?;
    let (page, per_page) = page_params(query.page, query.per_page);

    let mut select = grade::Entity::find();
    if let Some(own) = visible_students(&auth_user) {
        select = select.filter(grade::Column::StudentId.in_subquery(own));
    }
    if let Some(student_id) = query.student_id {
        select = select.filter(grade::Column::StudentId.eq(student_id));
    }
    if let Some(course_id) = query.course_id {
        select = select.filter(grade::Column::CourseId.eq(course_id));
    }

    let paginator = select
        .order_by_asc(grade::Column::Id)
        .paginate(&state.db, per_page);
    let total = paginator.num_items().await?;
    let data = paginator
        .fetch_page(page - 1)
        .await?
        .into_iter()
        .map(GradeResponse::from)
        .collect();

    Ok(Json(GradeListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/grades/{id}",
    tag = "Grades",
    operation_id = "getGrade",
    summary = "Get a grade by ID",
    params(("id" = i32, Path, description = "Grade ID")),
    responses(
        (status = 200, description = "Grade details", body = GradeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Grade not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_grade(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<GradeResponse>, AppError> {
    auth_user.require_permission(GRADE_VIEW)?;
    let model = grade::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Grade not found".into()))?;
    ensure_visible(&state.db, &auth_user, model.student_id, "Grade not found").await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/grades/recompute",
    tag = "Grades",
    operation_id = "recomputeGrade",
    summary = "Recompute a student's course grade",
    description = "Runs the grade engine for one (student, course) pair, creating the grade if it does not exist yet. Requires `grade:recompute` permission. Useful after component weights or the grading scale change.",
    request_body = RecomputeGradeRequest,
    responses(
        (status = 200, description = "Grade recomputed", body = GradeResponse),
        (status = 400, description = "Component weights do not sum to 100 (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student or course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(student_id = payload.student_id, course_id = payload.course_id))]
pub async fn recompute_grade(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<RecomputeGradeRequest>,
) -> Result<Json<GradeResponse>, AppError> {
    auth_user.require_permission(GRADE_RECOMPUTE)?;

    let txn = state.db.begin().await?;
    let model = GradeEngine::new(&txn)
        .recompute(payload.student_id, payload.course_id)
        .await?;
    txn.commit().await?;

    info!(final_grade = model.final_grade, "Grade recomputed on request");
    Ok(Json(model.into()))
}
