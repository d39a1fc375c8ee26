use chrono::{DateTime, Utc};
use common::{EducationLevel, validate_scale};
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, validate_text};
use crate::entity::{grade, grading_scale, score};
use crate::error::AppError;

// ---------------------------------------------------------------------------
// Grading scales
// ---------------------------------------------------------------------------

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateGradingScaleRequest {
    #[schema(example = "WASSCE Grading")]
    pub name: String,
    pub level: EducationLevel,
    /// Threshold to label mapping. Keys are a number (`"75"`) or an
    /// inclusive range (`"70-74"`).
    #[schema(value_type = Object, example = json!({"75": "A1", "70-74": "B2", "0-39": "F9"}))]
    pub grades: serde_json::Value,
    /// Defaults to true.
    pub is_active: Option<bool>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateGradingScaleRequest {
    pub name: Option<String>,
    pub level: Option<EducationLevel>,
    #[schema(value_type = Option<Object>)]
    pub grades: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GradingScaleListQuery {
    pub level: Option<EducationLevel>,
    pub is_active: Option<bool>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct GradingScaleResponse {
    pub id: i32,
    pub name: String,
    pub level: EducationLevel,
    #[schema(value_type = Object)]
    pub grades: serde_json::Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<grading_scale::Model> for GradingScaleResponse {
    fn from(m: grading_scale::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            level: m.level,
            grades: m.grades,
            is_active: m.is_active,
            created_at: m.created_at,
        }
    }
}

pub fn validate_create_grading_scale(req: &CreateGradingScaleRequest) -> Result<(), AppError> {
    validate_text("name", &req.name, 100)?;
    validate_scale(&req.grades)?;
    Ok(())
}

pub fn validate_update_grading_scale(req: &UpdateGradingScaleRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_text("name", name, 100)?;
    }
    if let Some(ref grades) = req.grades {
        validate_scale(grades)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateScoreRequest {
    pub student_id: i32,
    pub component_id: i32,
    #[schema(example = 18.0)]
    pub score: f64,
}

/// Body of `PUT /scores/{id}`.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ReplaceScoreRequest {
    pub score: f64,
}

/// Body of `PATCH /scores/{id}`.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateScoreRequest {
    pub score: Option<f64>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScoreListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub student_id: Option<i32>,
    pub component_id: Option<i32>,
    /// Case-insensitive match on the component name or the student's name.
    pub search: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ScoreResponse {
    pub id: i32,
    pub student_id: i32,
    pub component_id: i32,
    pub score: f64,
    /// User id of whoever last wrote the score.
    pub recorded_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ScoreListResponse {
    pub data: Vec<ScoreResponse>,
    pub pagination: Pagination,
}

impl From<score::Model> for ScoreResponse {
    fn from(m: score::Model) -> Self {
        Self {
            id: m.id,
            student_id: m.student_id,
            component_id: m.component_id,
            score: m.score,
            recorded_by: m.recorded_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// A score must be a finite value in `[0, max_score]`.
pub fn validate_score_value(score: f64, max_score: f64) -> Result<(), AppError> {
    if !score.is_finite() || score < 0.0 {
        return Err(AppError::Validation(
            "Score must be a non-negative number".into(),
        ));
    }
    if score > max_score {
        return Err(AppError::Validation(format!(
            "Score cannot exceed the component's max score ({max_score})"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Grades
// ---------------------------------------------------------------------------

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RecomputeGradeRequest {
    pub student_id: i32,
    pub course_id: i32,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GradeListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub student_id: Option<i32>,
    pub course_id: Option<i32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct GradeResponse {
    pub id: i32,
    pub student_id: i32,
    pub course_id: i32,
    #[schema(example = 61.6)]
    pub final_grade: f64,
    /// Null when no grading scale applies or no threshold matches.
    #[schema(example = "B3")]
    pub letter_grade: Option<String>,
    pub grading_scale_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct GradeListResponse {
    pub data: Vec<GradeResponse>,
    pub pagination: Pagination,
}

impl From<grade::Model> for GradeResponse {
    fn from(m: grade::Model) -> Self {
        Self {
            id: m.id,
            student_id: m.student_id,
            course_id: m.course_id,
            final_grade: m.final_grade,
            letter_grade: m.letter_grade,
            grading_scale_id: m.grading_scale_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
