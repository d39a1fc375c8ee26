use sea_orm::{
    ColumnTrait, ConnectionTrait, DbBackend, DbErr, EntityTrait, QueryFilter, QueryOrder, QueryResult,
    Statement, Value,
};
use serde_json::{Map, Value as Json};

use super::value::{coerce_field, decode_cell};
use super::{SchemaError, physical_table_name, placeholder, quote};
use crate::entity::{custom_field, custom_table};

/// A record of a custom table: `id` plus one key per declared field.
pub type Row = Map<String, Json>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    /// New row: required fields must be present, defaults fill the gaps.
    Insert,
    /// PUT: required fields must be present; only sent columns change.
    Replace,
    /// PATCH: only sent columns change.
    Merge,
}

/// Parameterised CRUD against the physical table of one active custom table.
///
/// Column identifiers always come from the stored field metadata, never
/// from the request.
pub struct RowStore<'a, C: ConnectionTrait> {
    conn: &'a C,
    table: custom_table::Model,
    fields: Vec<custom_field::Model>,
}

impl<'a, C: ConnectionTrait> RowStore<'a, C> {
    /// Load an active table and its fields by name.
    pub async fn open(conn: &'a C, name: &str) -> Result<Self, SchemaError> {
        let table = custom_table::Entity::find()
            .filter(custom_table::Column::Name.eq(name))
            .filter(custom_table::Column::IsActive.eq(true))
            .one(conn)
            .await?
            .ok_or_else(|| SchemaError::TableNotFound(name.to_owned()))?;
        let fields = custom_field::Entity::find()
            .filter(custom_field::Column::TableId.eq(table.id))
            .order_by_asc(custom_field::Column::Id)
            .all(conn)
            .await?;
        Ok(Self {
            conn,
            table,
            fields,
        })
    }

    pub fn table(&self) -> &custom_table::Model {
        &self.table
    }

    pub async fn list(&self) -> Result<Vec<Row>, SchemaError> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            self.select_list(),
            self.quoted_table(),
            self.q("id")
        );
        let rows = self
            .conn
            .query_all_raw(Statement::from_string(self.backend(), sql))
            .await?;
        rows.iter().map(|row| self.decode_row(row)).collect()
    }

    pub async fn get(&self, id: i32) -> Result<Row, SchemaError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = {}",
            self.select_list(),
            self.quoted_table(),
            self.q("id"),
            placeholder(self.backend(), 1)
        );
        let row = self
            .conn
            .query_one_raw(Statement::from_sql_and_values(
                self.backend(),
                sql,
                [Value::from(id)],
            ))
            .await?
            .ok_or(SchemaError::RowNotFound)?;
        self.decode_row(&row)
    }

    pub async fn insert(&self, body: &Json) -> Result<Row, SchemaError> {
        let assignments = self.prepare(body, WriteMode::Insert)?;
        let backend = self.backend();

        let columns: Vec<String> = assignments.iter().map(|(name, _)| self.q(name)).collect();
        let marks: Vec<String> = (1..=assignments.len())
            .map(|n| placeholder(backend, n))
            .collect();
        let values: Vec<Value> = assignments.into_iter().map(|(_, v)| v).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.quoted_table(),
            columns.join(", "),
            marks.join(", ")
        );

        let id = if backend.support_returning() {
            let sql = format!("{sql} RETURNING {}", self.q("id"));
            let row = self
                .conn
                .query_one_raw(Statement::from_sql_and_values(backend, sql, values))
                .await?
                .ok_or(SchemaError::Database(DbErr::RecordNotInserted))?;
            row.try_get::<i32>("", "id")?
        } else {
            let res = self
                .conn
                .execute_raw(Statement::from_sql_and_values(backend, sql, values))
                .await?;
            res.last_insert_id() as i32
        };

        self.get(id).await
    }

    pub async fn update(&self, id: i32, body: &Json, mode: WriteMode) -> Result<Row, SchemaError> {
        let assignments = self.prepare(body, mode)?;
        // MySQL reports zero affected rows for no-op updates.
        self.get(id).await?;

        let backend = self.backend();
        let sets: Vec<String> = assignments
            .iter()
            .enumerate()
            .map(|(i, (name, _))| format!("{} = {}", self.q(name), placeholder(backend, i + 1)))
            .collect();
        let mut values: Vec<Value> = assignments.into_iter().map(|(_, v)| v).collect();
        values.push(id.into());
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            self.quoted_table(),
            sets.join(", "),
            self.q("id"),
            placeholder(backend, values.len())
        );
        self.conn
            .execute_raw(Statement::from_sql_and_values(backend, sql, values))
            .await?;

        self.get(id).await
    }

    pub async fn delete(&self, id: i32) -> Result<(), SchemaError> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = {}",
            self.quoted_table(),
            self.q("id"),
            placeholder(self.backend(), 1)
        );
        let res = self
            .conn
            .execute_raw(Statement::from_sql_and_values(
                self.backend(),
                sql,
                [Value::from(id)],
            ))
            .await?;
        if res.rows_affected() == 0 {
            return Err(SchemaError::RowNotFound);
        }
        Ok(())
    }

    /// Validate a request body and turn it into (column, value) pairs.
    ///
    /// An `id` key is ignored so that rows read back can be sent again.
    fn prepare(&self, body: &Json, mode: WriteMode) -> Result<Vec<(&str, Value)>, SchemaError> {
        let obj = body
            .as_object()
            .filter(|o| !o.is_empty())
            .ok_or(SchemaError::EmptyBody)?;

        if let Some(unknown) = obj
            .keys()
            .find(|key| key.as_str() != "id" && !self.fields.iter().any(|f| f.name == **key))
        {
            return Err(SchemaError::UnknownField(unknown.clone()));
        }

        let mut assignments = Vec::new();
        for field in &self.fields {
            match obj.get(&field.name) {
                Some(value) => {
                    if field.required && value.is_null() {
                        return Err(SchemaError::MissingField(field.name.clone()));
                    }
                    assignments.push((field.name.as_str(), coerce_field(field, value)?));
                }
                None => match (&field.default_value, mode) {
                    (Some(default), WriteMode::Insert) => {
                        let value = coerce_field(field, &Json::String(default.clone()))?;
                        assignments.push((field.name.as_str(), value));
                    }
                    _ if field.required && mode != WriteMode::Merge => {
                        return Err(SchemaError::MissingField(field.name.clone()));
                    }
                    _ => {}
                },
            }
        }

        if assignments.is_empty() {
            return Err(SchemaError::EmptyBody);
        }
        Ok(assignments)
    }

    fn decode_row(&self, row: &QueryResult) -> Result<Row, SchemaError> {
        let mut out = Row::new();
        let id: i32 = row.try_get("", "id")?;
        out.insert("id".into(), id.into());
        for field in &self.fields {
            let raw: Option<String> = row.try_get("", &field.name)?;
            out.insert(field.name.clone(), decode_cell(field.data_type, raw));
        }
        Ok(out)
    }

    /// Every column cast to text so one decoding path serves all backends.
    fn select_list(&self) -> String {
        let text = match self.backend() {
            DbBackend::MySql => "CHAR",
            _ => "TEXT",
        };
        std::iter::once(self.q("id"))
            .chain(self.fields.iter().map(|f| {
                let col = self.q(&f.name);
                format!("CAST({col} AS {text}) AS {col}")
            }))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn quoted_table(&self) -> String {
        self.q(&physical_table_name(&self.table.name))
    }

    fn q(&self, ident: &str) -> String {
        quote(self.backend(), ident)
    }

    fn backend(&self) -> DbBackend {
        self.conn.get_database_backend()
    }
}
