//! Admin-defined tables backed by real database tables.
//!
//! Metadata lives in `custom_table` / `custom_field`; each table is
//! materialised as `custom_<name>` with an auto-increment `id` and one
//! nullable column per field. Identifiers are validated against a strict
//! allow-list before being quoted into DDL or DML; values are always bound.

mod ddl;
mod rows;
mod value;

pub use ddl::SchemaManager;
pub use rows::{Row, RowStore, WriteMode};
pub use value::{parse_choices, parse_default};

use common::IdentifierError;
use sea_orm::{DbBackend, DbErr};

pub const TABLE_PREFIX: &str = "custom_";

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
    #[error("Invalid choices: {0}")]
    InvalidChoices(String),
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("Unknown field '{0}'")]
    UnknownField(String),
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("Request body must be a non-empty JSON object")]
    EmptyBody,
    #[error("Table '{0}' not found")]
    TableNotFound(String),
    #[error("Record not found")]
    RowNotFound,
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Physical table name for a custom table.
pub fn physical_table_name(name: &str) -> String {
    format!("{TABLE_PREFIX}{name}")
}

/// Quote an already validated identifier for the given backend.
pub(crate) fn quote(backend: DbBackend, ident: &str) -> String {
    match backend {
        DbBackend::MySql => format!("`{ident}`"),
        _ => format!("\"{ident}\""),
    }
}

/// Positional placeholder for the n-th (1-based) bound value.
pub(crate) fn placeholder(backend: DbBackend, n: usize) -> String {
    match backend {
        DbBackend::Postgres => format!("${n}"),
        _ => "?".to_owned(),
    }
}
