use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{
    course, custom_data, custom_field, custom_table, grade, grade_component, grading_scale, score,
    student,
};
use crate::state::AppState;

/// Every versioned endpoint, mounted under `/api` by the caller.
pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/v1", v1_routes())
}

fn v1_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(student_routes())
        .merge(course_routes())
        .merge(grading_routes())
        .merge(custom_table_routes())
}

fn student_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(student::list_students, student::create_student))
        .routes(routes!(student::get_student, student::delete_student))
}

fn course_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(course::list_courses, course::create_course))
        .routes(routes!(
            course::get_course,
            course::update_course,
            course::delete_course
        ))
        .routes(routes!(
            grade_component::list_components,
            grade_component::create_component
        ))
        .routes(routes!(
            grade_component::get_component,
            grade_component::update_component,
            grade_component::delete_component
        ))
}

fn grading_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            grading_scale::list_grading_scales,
            grading_scale::create_grading_scale
        ))
        .routes(routes!(
            grading_scale::get_grading_scale,
            grading_scale::update_grading_scale,
            grading_scale::delete_grading_scale
        ))
        .routes(routes!(score::list_scores, score::create_score))
        .routes(routes!(
            score::get_score,
            score::replace_score,
            score::update_score,
            score::delete_score
        ))
        .routes(routes!(grade::list_grades))
        .routes(routes!(grade::recompute_grade))
        .routes(routes!(grade::get_grade))
}

fn custom_table_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(custom_table::list_tables, custom_table::create_table))
        .routes(routes!(
            custom_table::get_table,
            custom_table::update_table,
            custom_table::delete_table
        ))
        .routes(routes!(custom_field::list_fields, custom_field::create_field))
        .routes(routes!(
            custom_field::get_field,
            custom_field::update_field,
            custom_field::delete_field
        ))
        .routes(routes!(custom_data::list_rows))
        .routes(routes!(custom_data::insert_row))
        .routes(routes!(
            custom_data::get_row,
            custom_data::replace_row,
            custom_data::update_row,
            custom_data::delete_row
        ))
}
