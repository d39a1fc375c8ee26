#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared data type of a custom table column.
///
/// Older clients send the form-field names (`CharField`, `IntegerField`, ...);
/// those are accepted as aliases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")
)]
#[serde(rename_all = "lowercase")]
pub enum FieldDataType {
    #[serde(alias = "CharField")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "text"))]
    Text,
    #[serde(alias = "IntegerField")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "integer"))]
    Integer,
    #[serde(alias = "DecimalField")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "decimal"))]
    Decimal,
    #[serde(alias = "BooleanField")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "boolean"))]
    Boolean,
    #[serde(alias = "DateField")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "date"))]
    Date,
    #[serde(alias = "DateTimeField")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "datetime"))]
    DateTime,
}

impl FieldDataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
        }
    }

    /// Only text columns may carry an enumerated choice list.
    pub fn supports_choices(&self) -> bool {
        matches!(self, Self::Text)
    }
}

impl fmt::Display for FieldDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
