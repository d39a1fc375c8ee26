use std::collections::HashMap;

use chrono::Utc;
use common::{ComponentScore, GradingError, compute_final_grade, letter_for};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};
use tracing::debug;

use crate::entity::{course, grade, grade_component, grading_scale, score, student};

#[derive(Debug, thiserror::Error)]
pub enum GradeEngineError {
    #[error(transparent)]
    Grading(#[from] GradingError),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Recomputes the stored grade of one student in one course.
///
/// Run it on the same connection or transaction as the score write that
/// triggered it so a failed computation rolls the write back.
pub struct GradeEngine<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> GradeEngine<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Compute the final grade from the course's components and the
    /// student's scores, map it to a letter and upsert the grade row.
    ///
    /// Nothing is written when the component weights do not sum to 100.
    pub async fn recompute(
        &self,
        student_id: i32,
        course_id: i32,
    ) -> Result<grade::Model, GradeEngineError> {
        student::Entity::find_by_id(student_id)
            .one(self.conn)
            .await?
            .ok_or(GradeEngineError::NotFound("Student"))?;
        let course = course::Entity::find_by_id(course_id)
            .one(self.conn)
            .await?
            .ok_or(GradeEngineError::NotFound("Course"))?;

        let components = grade_component::Entity::find()
            .filter(grade_component::Column::CourseId.eq(course_id))
            .order_by_asc(grade_component::Column::Id)
            .all(self.conn)
            .await?;

        let component_ids: Vec<i32> = components.iter().map(|c| c.id).collect();
        let scores: HashMap<i32, f64> = score::Entity::find()
            .filter(score::Column::StudentId.eq(student_id))
            .filter(score::Column::ComponentId.is_in(component_ids))
            .all(self.conn)
            .await?
            .into_iter()
            .map(|s| (s.component_id, s.score))
            .collect();

        let inputs: Vec<ComponentScore> = components
            .iter()
            .map(|c| ComponentScore {
                kind: c.kind,
                max_score: c.max_score,
                weight: c.weight,
                score: scores.get(&c.id).copied(),
            })
            .collect();

        let breakdown = compute_final_grade(&inputs)?;
        let scale = self.resolve_scale(&course).await?;
        let letter_grade = scale
            .as_ref()
            .and_then(|s| s.grades.as_object())
            .and_then(|grades| letter_for(grades, breakdown.final_grade));

        debug!(
            student_id,
            course_id,
            ca = breakdown.total_ca_score,
            exam = breakdown.exam_score,
            final_grade = breakdown.final_grade,
            "Grade recomputed"
        );

        self.upsert(
            student_id,
            course_id,
            breakdown.final_grade,
            letter_grade,
            scale.map(|s| s.id),
        )
        .await
    }

    /// The course's own scale, else the first active scale for its level.
    pub async fn resolve_scale(
        &self,
        course: &course::Model,
    ) -> Result<Option<grading_scale::Model>, DbErr> {
        if let Some(scale_id) = course.grading_scale_id {
            return grading_scale::Entity::find_by_id(scale_id)
                .one(self.conn)
                .await;
        }
        let Some(level) = course.level else {
            return Ok(None);
        };
        grading_scale::Entity::find()
            .filter(grading_scale::Column::Level.eq(level))
            .filter(grading_scale::Column::IsActive.eq(true))
            .order_by_asc(grading_scale::Column::Id)
            .one(self.conn)
            .await
    }

    async fn upsert(
        &self,
        student_id: i32,
        course_id: i32,
        final_grade: f64,
        letter_grade: Option<String>,
        grading_scale_id: Option<i32>,
    ) -> Result<grade::Model, GradeEngineError> {
        let now = Utc::now();
        let existing = grade::Entity::find()
            .filter(grade::Column::StudentId.eq(student_id))
            .filter(grade::Column::CourseId.eq(course_id))
            .one(self.conn)
            .await?;

        let saved = match existing {
            Some(row) => {
                let mut active = row.into_active_model();
                active.final_grade = Set(final_grade);
                active.letter_grade = Set(letter_grade);
                active.grading_scale_id = Set(grading_scale_id);
                active.updated_at = Set(now);
                active.update(self.conn).await?
            }
            None => {
                grade::ActiveModel {
                    student_id: Set(student_id),
                    course_id: Set(course_id),
                    final_grade: Set(final_grade),
                    letter_grade: Set(letter_grade),
                    grading_scale_id: Set(grading_scale_id),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(self.conn)
                .await?
            }
        };
        Ok(saved)
    }
}
