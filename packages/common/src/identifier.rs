//! Allow-list validation for SQL identifiers supplied by administrators.
//!
//! Identifiers cannot be bound as parameters, so custom table and column
//! names are restricted to lowercase ASCII letters, digits and underscores
//! before they are ever placed into a statement.

use thiserror::Error;

pub const MAX_IDENTIFIER_LEN: usize = 48;

/// Column names owned by the backing table itself.
pub const RESERVED_COLUMNS: &[&str] = &["id"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("name must not be empty")]
    Empty,
    #[error("name must be at most {MAX_IDENTIFIER_LEN} characters")]
    TooLong,
    #[error("name must start with a lowercase letter")]
    InvalidStart,
    #[error("name may only contain lowercase letters, digits and underscores (found '{0}')")]
    InvalidChar(char),
    #[error("'{0}' is reserved")]
    Reserved(String),
}

/// Validate a table or column name.
pub fn validate_identifier(name: &str) -> Result<(), IdentifierError> {
    let mut chars = name.chars();
    let first = chars.next().ok_or(IdentifierError::Empty)?;
    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(IdentifierError::TooLong);
    }
    if !first.is_ascii_lowercase() {
        return Err(IdentifierError::InvalidStart);
    }
    if let Some(bad) = chars.find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')) {
        return Err(IdentifierError::InvalidChar(bad));
    }
    Ok(())
}

/// Validate a column name, additionally rejecting reserved columns.
pub fn validate_column_name(name: &str) -> Result<(), IdentifierError> {
    validate_identifier(name)?;
    if RESERVED_COLUMNS.contains(&name) {
        return Err(IdentifierError::Reserved(name.to_string()));
    }
    Ok(())
}
