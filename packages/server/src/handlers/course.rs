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
use crate::models::course::*;
use crate::models::shared::{Pagination, page_params};
use crate::permissions::{COURSE_MANAGE, GRADE_VIEW, SCORE_RECORD};
use crate::state::AppState;

fn map_code_conflict(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Course code already exists".into())
        }
        _ => AppError::from(e),
    }
}

#[utoipa::path(
    post,
    path = "/courses",
    tag = "Courses",
    operation_id = "createCourse",
    summary = "Create a course",
    description = "Creates a course. Requires `course:manage` permission. Course codes are unique. When `grading_scale_id` is omitted, letter grades fall back to the first active scale for the course level.",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Course code already exists (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(code = %payload.code))]
pub async fn create_course(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(COURSE_MANAGE)?;
    validate_create_course(&payload)?;
    if let Some(scale_id) = payload.grading_scale_id {
        ensure_scale_exists(&state.db, scale_id).await?;
    }

    let now = chrono::Utc::now();
    let model = course::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        code: Set(payload.code.trim().to_string()),
        description: Set(payload.description),
        credit_hours: Set(payload.credit_hours.unwrap_or(DEFAULT_CREDIT_HOURS)),
        level: Set(payload.level),
        grading_scale_id: Set(payload.grading_scale_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(map_code_conflict)?;

    info!(id = model.id, "Course created");
    Ok((StatusCode::CREATED, Json(CourseResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/courses",
    tag = "Courses",
    operation_id = "listCourses",
    summary = "List courses",
    description = "Returns a paginated list of courses ordered by code, optionally filtered by education level.",
    params(CourseListQuery),
    responses(
        (status = 200, description = "List of courses", body = CourseListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_courses(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<CourseListQuery>,
) -> Result<Json<CourseListResponse>, AppError> {
    auth_user.require_any_permission(&[COURSE_MANAGE, SCORE_RECORD, GRADE_VIEW])?;
    let (page, per_page) = page_params(query.page, query.per_page);

    let mut select = course::Entity::find();
    if let Some(level) = query.level {
        select = select.filter(course::Column::Level.eq(level));
    }

    let paginator = select
        .order_by_asc(course::Column::Code)
        .paginate(&state.db, per_page);
    let total = paginator.num_items().await?;
    let data = paginator
        .fetch_page(page - 1)
        .await?
        .into_iter()
        .map(CourseResponse::from)
        .collect();

    Ok(Json(CourseListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/courses/{id}",
    tag = "Courses",
    operation_id = "getCourse",
    summary = "Get a course by ID",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course details", body = CourseResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_course(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CourseResponse>, AppError> {
    auth_user.require_any_permission(&[COURSE_MANAGE, SCORE_RECORD, GRADE_VIEW])?;
    let model = find_course(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/courses/{id}",
    tag = "Courses",
    operation_id = "updateCourse",
    summary = "Update a course",
    description = "Partially updates a course. Requires `course:manage` permission. Changing the grading scale does not rewrite stored grades; use `POST /grades/recompute` for that.",
    params(("id" = i32, Path, description = "Course ID")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated", body = CourseResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Course code already exists (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_course(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateCourseRequest>,
) -> Result<Json<CourseResponse>, AppError> {
    auth_user.require_permission(COURSE_MANAGE)?;
    validate_update_course(&payload)?;
    if let Some(Some(scale_id)) = payload.grading_scale_id {
        ensure_scale_exists(&state.db, scale_id).await?;
    }

    let existing = find_course(&state.db, id).await?;
    let mut active: course::ActiveModel = existing.into();

    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(ref code) = payload.code {
        active.code = Set(code.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(credit_hours) = payload.credit_hours {
        active.credit_hours = Set(credit_hours);
    }
    if let Some(level) = payload.level {
        active.level = Set(level);
    }
    if let Some(grading_scale_id) = payload.grading_scale_id {
        active.grading_scale_id = Set(grading_scale_id);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await.map_err(map_code_conflict)?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/courses/{id}",
    tag = "Courses",
    operation_id = "deleteCourse",
    summary = "Delete a course",
    description = "Deletes a course. Requires `course:manage` permission. Returns 409 while the course still has components or grades.",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Course still in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_course(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(COURSE_MANAGE)?;

    let txn = state.db.begin().await?;
    find_course(&txn, id).await?;

    let components = grade_component::Entity::find()
        .filter(grade_component::Column::CourseId.eq(id))
        .count(&txn)
        .await?;
    let grades = grade::Entity::find()
        .filter(grade::Column::CourseId.eq(id))
        .count(&txn)
        .await?;
    if components > 0 || grades > 0 {
        return Err(AppError::Conflict(
            "Course still has components or grades".into(),
        ));
    }

    course::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    info!("Course deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn find_course<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<course::Model, AppError> {
    course::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".into()))
}

/// Referenced scales must exist; reported as a validation error.
pub(crate) async fn ensure_scale_exists<C: ConnectionTrait>(
    db: &C,
    scale_id: i32,
) -> Result<(), AppError> {
    grading_scale::Entity::find_by_id(scale_id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::Validation(format!("Grading scale {scale_id} does not exist")))
}
