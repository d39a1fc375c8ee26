//! Static role to permission table.
//!
//! Roles come from the access token; the grading service does not store
//! users or roles itself.

use common::Role;

pub const STUDENT_MANAGE: &str = "student:manage";
pub const COURSE_MANAGE: &str = "course:manage";
pub const GRADING_MANAGE: &str = "grading:manage";
pub const SCORE_RECORD: &str = "score:record";
pub const GRADE_VIEW: &str = "grade:view";
pub const GRADE_RECOMPUTE: &str = "grade:recompute";
pub const CUSTOM_TABLE_MANAGE: &str = "custom_table:manage";
pub const CUSTOM_DATA_READ: &str = "custom_data:read";
pub const CUSTOM_DATA_WRITE: &str = "custom_data:write";

const ALL: &[&str] = &[
    STUDENT_MANAGE,
    COURSE_MANAGE,
    GRADING_MANAGE,
    SCORE_RECORD,
    GRADE_VIEW,
    GRADE_RECOMPUTE,
    CUSTOM_TABLE_MANAGE,
    CUSTOM_DATA_READ,
    CUSTOM_DATA_WRITE,
];

pub fn for_role(role: Role) -> &'static [&'static str] {
    match role {
        Role::Admin => ALL,
        Role::Teacher => &[SCORE_RECORD, GRADE_VIEW, GRADE_RECOMPUTE, CUSTOM_DATA_READ],
        Role::Student | Role::Parent => &[GRADE_VIEW],
        _ => &[],
    }
}
