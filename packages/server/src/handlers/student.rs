use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, SelectStatement};
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{grade, score, student};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::shared::{Pagination, escape_like, page_params};
use crate::models::student::*;
use crate::permissions::{GRADE_VIEW, SCORE_RECORD, STUDENT_MANAGE};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/students",
    tag = "Students",
    operation_id = "createStudent",
    summary = "Register a student",
    description = "Creates a student record. Requires `student:manage` permission. Returns 409 if the student id or the linked user account is taken.",
    request_body = CreateStudentRequest,
    responses(
        (status = 201, description = "Student created", body = StudentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Student id or user account already in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(student_id = %payload.student_id))]
pub async fn create_student(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateStudentRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(STUDENT_MANAGE)?;
    validate_create_student(&payload)?;

    let model = student::ActiveModel {
        student_id: Set(payload.student_id.trim().to_string()),
        first_name: Set(payload.first_name.trim().to_string()),
        last_name: Set(payload.last_name.trim().to_string()),
        user_id: Set(payload.user_id),
        parent_user_id: Set(payload.parent_user_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Student id or user account already in use".into())
        }
        _ => AppError::from(e),
    })?;

    info!(id = model.id, "Student created");
    Ok((StatusCode::CREATED, Json(StudentResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/students",
    tag = "Students",
    operation_id = "listStudents",
    summary = "List students",
    description = "Returns a paginated list of students ordered by id, optionally filtered by a case-insensitive search on name or student id.",
    params(StudentListQuery),
    responses(
        (status = 200, description = "List of students", body = StudentListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_students(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<StudentListQuery>,
) -> Result<Json<StudentListResponse>, AppError> {
    auth_user.require_any_permission(&[STUDENT_MANAGE, SCORE_RECORD, GRADE_VIEW])?;
    let (page, per_page) = page_params(query.page, query.per_page);

    let mut select = student::Entity::find();
    if let Some(own) = auth_user.own_students() {
        select = select.filter(own);
    }
    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(student::Column::FirstName)))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(student::Column::LastName)))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(student::Column::StudentId)))
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            );
        }
    }

    let paginator = select
        .order_by_asc(student::Column::Id)
        .paginate(&state.db, per_page);
    let total = paginator.num_items().await?;
    let data = paginator
        .fetch_page(page - 1)
        .await?
        .into_iter()
        .map(StudentResponse::from)
        .collect();

    Ok(Json(StudentListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/students/{id}",
    tag = "Students",
    operation_id = "getStudent",
    summary = "Get a student by ID",
    params(("id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student details", body = StudentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_student(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<StudentResponse>, AppError> {
    auth_user.require_any_permission(&[STUDENT_MANAGE, SCORE_RECORD, GRADE_VIEW])?;
    ensure_visible(&state.db, &auth_user, id, "Student not found").await?;
    let model = find_student(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/students/{id}",
    tag = "Students",
    operation_id = "deleteStudent",
    summary = "Delete a student",
    description = "Deletes a student together with their scores and grades. Requires `student:manage` permission.",
    params(("id" = i32, Path, description = "Student ID")),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_student(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(STUDENT_MANAGE)?;

    let txn = state.db.begin().await?;
    find_student(&txn, id).await?;

    score::Entity::delete_many()
        .filter(score::Column::StudentId.eq(id))
        .exec(&txn)
        .await?;
    grade::Entity::delete_many()
        .filter(grade::Column::StudentId.eq(id))
        .exec(&txn)
        .await?;
    student::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    info!("Student deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn find_student<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<student::Model, AppError> {
    student::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".into()))
}

/// Subquery of the student ids the caller may read, `None` when unrestricted.
pub(crate) fn visible_students(auth_user: &AuthUser) -> Option<SelectStatement> {
    auth_user.own_students().map(|own| {
        student::Entity::find()
            .select_only()
            .column(student::Column::Id)
            .filter(own)
            .into_query()
    })
}

/// Reject reads of another student's records as not found.
pub(crate) async fn ensure_visible<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    student_id: i32,
    not_found: &'static str,
) -> Result<(), AppError> {
    let Some(own) = auth_user.own_students() else {
        return Ok(());
    };
    let visible = student::Entity::find_by_id(student_id)
        .filter(own)
        .count(db)
        .await?;
    if visible == 0 {
        return Err(AppError::NotFound(not_found.into()));
    }
    Ok(())
}
