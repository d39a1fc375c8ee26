#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Schooling level a course or grading scale belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EducationLevel {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "PRIMARY"))]
    Primary,
    /// Junior high school.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "JHS"))]
    Jhs,
    /// Senior high school.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "SHS"))]
    Shs,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "UNIVERSITY"))]
    University,
}

impl EducationLevel {
    pub const ALL: &'static [EducationLevel] =
        &[Self::Primary, Self::Jhs, Self::Shs, Self::University];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "PRIMARY",
            Self::Jhs => "JHS",
            Self::Shs => "SHS",
            Self::University => "UNIVERSITY",
        }
    }
}

impl fmt::Display for EducationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EducationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| format!("Invalid education level '{s}'"))
    }
}
