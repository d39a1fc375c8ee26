use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role carried in the `role` claim of an access token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Teacher,
    Student,
    Parent,
    Staff,
    Accountant,
    Librarian,
    Counselor,
}

impl Role {
    pub const ALL: &'static [Role] = &[
        Self::Admin,
        Self::Teacher,
        Self::Student,
        Self::Parent,
        Self::Staff,
        Self::Accountant,
        Self::Librarian,
        Self::Counselor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Teacher => "TEACHER",
            Self::Student => "STUDENT",
            Self::Parent => "PARENT",
            Self::Staff => "STAFF",
            Self::Accountant => "ACCOUNTANT",
            Self::Librarian => "LIBRARIAN",
            Self::Counselor => "COUNSELOR",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown role '{s}'"))
    }
}
