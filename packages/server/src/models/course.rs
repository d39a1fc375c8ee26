use chrono::{DateTime, Utc};
use common::{ComponentKind, EducationLevel};
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, double_option, validate_text};
use crate::entity::{course, grade_component};
use crate::error::AppError;

pub const DEFAULT_CREDIT_HOURS: i32 = 3;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCourseRequest {
    #[schema(example = "Integrated Science")]
    pub name: String,
    #[schema(example = "SCI101")]
    pub code: String,
    pub description: Option<String>,
    /// Defaults to 3.
    pub credit_hours: Option<i32>,
    pub level: Option<EducationLevel>,
    pub grading_scale_id: Option<i32>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateCourseRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub credit_hours: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<EducationLevel>)]
    pub level: Option<Option<EducationLevel>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub grading_scale_id: Option<Option<i32>>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub level: Option<EducationLevel>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CourseResponse {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub credit_hours: i32,
    pub level: Option<EducationLevel>,
    pub grading_scale_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CourseListResponse {
    pub data: Vec<CourseResponse>,
    pub pagination: Pagination,
}

impl From<course::Model> for CourseResponse {
    fn from(m: course::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            code: m.code,
            description: m.description,
            credit_hours: m.credit_hours,
            level: m.level,
            grading_scale_id: m.grading_scale_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

fn validate_credit_hours(hours: i32) -> Result<(), AppError> {
    if !(0..=30).contains(&hours) {
        return Err(AppError::Validation(
            "credit_hours must be between 0 and 30".into(),
        ));
    }
    Ok(())
}

pub fn validate_create_course(req: &CreateCourseRequest) -> Result<(), AppError> {
    validate_text("name", &req.name, 200)?;
    validate_text("code", &req.code, 20)?;
    if let Some(hours) = req.credit_hours {
        validate_credit_hours(hours)?;
    }
    Ok(())
}

pub fn validate_update_course(req: &UpdateCourseRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_text("name", name, 200)?;
    }
    if let Some(ref code) = req.code {
        validate_text("code", code, 20)?;
    }
    if let Some(hours) = req.credit_hours {
        validate_credit_hours(hours)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Grade components
// ---------------------------------------------------------------------------

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateComponentRequest {
    #[schema(example = "Quiz 1")]
    pub name: String,
    pub kind: ComponentKind,
    /// Highest attainable score, in (0, 100].
    #[schema(example = 20.0)]
    pub max_score: f64,
    /// Percentage points contributed, in [0, 100].
    #[schema(example = 10)]
    pub weight: i32,
    pub grading_scale_id: Option<i32>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateComponentRequest {
    pub name: Option<String>,
    pub kind: Option<ComponentKind>,
    pub max_score: Option<f64>,
    pub weight: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub grading_scale_id: Option<Option<i32>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ComponentResponse {
    pub id: i32,
    pub course_id: i32,
    pub name: String,
    pub kind: ComponentKind,
    pub max_score: f64,
    pub weight: i32,
    pub grading_scale_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<grade_component::Model> for ComponentResponse {
    fn from(m: grade_component::Model) -> Self {
        Self {
            id: m.id,
            course_id: m.course_id,
            name: m.name,
            kind: m.kind,
            max_score: m.max_score,
            weight: m.weight,
            grading_scale_id: m.grading_scale_id,
            created_at: m.created_at,
        }
    }
}

pub fn validate_max_score(max_score: f64) -> Result<(), AppError> {
    if !max_score.is_finite() || max_score <= 0.0 || max_score > 100.0 {
        return Err(AppError::Validation(
            "max_score must be greater than 0 and at most 100".into(),
        ));
    }
    Ok(())
}

pub fn validate_weight(weight: i32) -> Result<(), AppError> {
    if !(0..=100).contains(&weight) {
        return Err(AppError::Validation(
            "weight must be between 0 and 100".into(),
        ));
    }
    Ok(())
}

pub fn validate_create_component(req: &CreateComponentRequest) -> Result<(), AppError> {
    validate_text("name", &req.name, 100)?;
    validate_max_score(req.max_score)?;
    validate_weight(req.weight)
}

pub fn validate_update_component(req: &UpdateComponentRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_text("name", name, 100)?;
    }
    if let Some(max_score) = req.max_score {
        validate_max_score(max_score)?;
    }
    if let Some(weight) = req.weight {
        validate_weight(weight)?;
    }
    Ok(())
}
