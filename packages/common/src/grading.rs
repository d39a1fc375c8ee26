//! Weighted final-grade arithmetic.
//!
//! Components are split into the continuous assessment group (quiz,
//! assignment, mid-semester) and the exam group. The weights of both groups
//! must add up to exactly 100 before anything is computed.

use thiserror::Error;

use crate::ComponentKind;

/// Total weight every course must distribute across its components.
pub const TOTAL_WEIGHT: i32 = 100;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradingError {
    #[error(
        "Component weights must sum to {TOTAL_WEIGHT}, got {total} \
         (continuous assessment {ca}, exam {exam})"
    )]
    WeightMismatch { ca: i32, exam: i32, total: i32 },
    #[error("Invalid grading scale: {0}")]
    InvalidScale(String),
}

/// One component of a course together with the student's recorded score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentScore {
    pub kind: ComponentKind,
    pub max_score: f64,
    pub weight: i32,
    /// `None` when the student has no score for this component yet.
    pub score: Option<f64>,
}

/// Intermediate and final values of a grade computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeBreakdown {
    pub ca_weight_total: i32,
    pub exam_weight_total: i32,
    /// Sum of `score / max_score * weight` over scored CA components.
    pub total_ca_score: f64,
    /// Exam score as a percentage of the exam's max score.
    pub exam_score: f64,
    /// Rounded to two decimal places.
    pub final_grade: f64,
}

/// Two-decimal rounding used for persisted grades.
pub fn round_2_decimals(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Compute the final grade for a single student.
///
/// Unscored components contribute zero. Only the first scored exam
/// component is taken into account.
pub fn compute_final_grade(components: &[ComponentScore]) -> Result<GradeBreakdown, GradingError> {
    let ca_weight_total: i32 = components
        .iter()
        .filter(|c| c.kind.is_continuous_assessment())
        .map(|c| c.weight)
        .sum();
    let exam_weight_total: i32 = components
        .iter()
        .filter(|c| !c.kind.is_continuous_assessment())
        .map(|c| c.weight)
        .sum();

    let total = ca_weight_total + exam_weight_total;
    if total != TOTAL_WEIGHT {
        return Err(GradingError::WeightMismatch {
            ca: ca_weight_total,
            exam: exam_weight_total,
            total,
        });
    }

    let total_ca_score: f64 = components
        .iter()
        .filter(|c| c.kind.is_continuous_assessment())
        .filter_map(|c| {
            c.score
                .map(|score| weighted_fraction(score, c.max_score, c.weight as f64))
        })
        .sum();

    let exam_score = components
        .iter()
        .filter(|c| !c.kind.is_continuous_assessment())
        .find_map(|c| c.score.map(|score| weighted_fraction(score, c.max_score, 100.0)))
        .unwrap_or(0.0);

    let final_grade = total_ca_score * ca_weight_total as f64 / 100.0
        + exam_score * exam_weight_total as f64 / 100.0;

    Ok(GradeBreakdown {
        ca_weight_total,
        exam_weight_total,
        total_ca_score,
        exam_score,
        final_grade: round_2_decimals(final_grade),
    })
}

/// `score / max_score * scale`, zero when the component has no max.
fn weighted_fraction(score: f64, max_score: f64, scale: f64) -> f64 {
    if max_score > 0.0 {
        score * scale / max_score
    } else {
        0.0
    }
}
