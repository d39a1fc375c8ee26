#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a graded course component.
///
/// Quizzes, assignments and mid-semester exams form the continuous
/// assessment (CA) group; the final exam stands on its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentKind {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "QUIZ"))]
    Quiz,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ASSIGNMENT"))]
    Assignment,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "MIDSEM"))]
    Midsem,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "EXAM"))]
    Exam,
}

impl ComponentKind {
    /// Returns true for the continuous assessment group.
    pub fn is_continuous_assessment(&self) -> bool {
        matches!(self, Self::Quiz | Self::Assignment | Self::Midsem)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quiz => "QUIZ",
            Self::Assignment => "ASSIGNMENT",
            Self::Midsem => "MIDSEM",
            Self::Exam => "EXAM",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
