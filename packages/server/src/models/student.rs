use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, validate_text};
use crate::entity::student;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateStudentRequest {
    /// School-issued identifier, unique across students.
    #[schema(example = "STU-2024-001")]
    pub student_id: String,
    #[schema(example = "Ama")]
    pub first_name: String,
    #[schema(example = "Mensah")]
    pub last_name: String,
    /// User id carried in the student's own access token.
    pub user_id: Option<i32>,
    /// User id of the parent allowed to see this student's grades.
    pub parent_user_id: Option<i32>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Case-insensitive match on name or student id.
    pub search: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct StudentResponse {
    pub id: i32,
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub user_id: Option<i32>,
    pub parent_user_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct StudentListResponse {
    pub data: Vec<StudentResponse>,
    pub pagination: Pagination,
}

impl From<student::Model> for StudentResponse {
    fn from(m: student::Model) -> Self {
        Self {
            id: m.id,
            student_id: m.student_id,
            first_name: m.first_name,
            last_name: m.last_name,
            user_id: m.user_id,
            parent_user_id: m.parent_user_id,
            created_at: m.created_at,
        }
    }
}

pub fn validate_create_student(req: &CreateStudentRequest) -> Result<(), AppError> {
    validate_text("student_id", &req.student_id, 32)?;
    validate_text("first_name", &req.first_name, 100)?;
    validate_text("last_name", &req.last_name, 100)?;
    Ok(())
}
