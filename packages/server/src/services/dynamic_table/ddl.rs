use common::{FieldDataType, validate_column_name, validate_identifier};
use sea_orm::{ConnectionTrait, DbBackend, Statement};
use tracing::info;

use super::{SchemaError, physical_table_name, quote};

/// Issues the DDL that keeps physical tables in step with the metadata.
///
/// Callers run it inside the same transaction as the metadata write.
pub struct SchemaManager<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> SchemaManager<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn create_backing_table(&self, name: &str) -> Result<(), SchemaError> {
        validate_identifier(name)?;
        let sql = create_table_sql(self.backend(), name);
        self.run(sql).await?;
        info!(table = %physical_table_name(name), "Created backing table");
        Ok(())
    }

    pub async fn drop_backing_table(&self, name: &str) -> Result<(), SchemaError> {
        validate_identifier(name)?;
        let sql = drop_table_sql(self.backend(), name);
        self.run(sql).await?;
        info!(table = %physical_table_name(name), "Dropped backing table");
        Ok(())
    }

    pub async fn add_backing_column(
        &self,
        table: &str,
        column: &str,
        data_type: FieldDataType,
        choices: Option<&[String]>,
    ) -> Result<(), SchemaError> {
        validate_identifier(table)?;
        validate_column_name(column)?;
        let sql = add_column_sql(self.backend(), table, column, data_type, choices);
        self.run(sql).await?;
        info!(table = %physical_table_name(table), column, "Added backing column");
        Ok(())
    }

    pub async fn drop_backing_column(&self, table: &str, column: &str) -> Result<(), SchemaError> {
        validate_identifier(table)?;
        validate_column_name(column)?;
        let sql = drop_column_sql(self.backend(), table, column);
        self.run(sql).await?;
        info!(table = %physical_table_name(table), column, "Dropped backing column");
        Ok(())
    }

    fn backend(&self) -> DbBackend {
        self.conn.get_database_backend()
    }

    async fn run(&self, sql: String) -> Result<(), SchemaError> {
        let stmt = Statement::from_string(self.backend(), sql);
        self.conn.execute_raw(stmt).await?;
        Ok(())
    }
}

pub(crate) fn column_type_sql(backend: DbBackend, data_type: FieldDataType) -> &'static str {
    match (data_type, backend) {
        (FieldDataType::Text, _) => "VARCHAR(255)",
        (FieldDataType::Integer, _) => "INT",
        (FieldDataType::Decimal, DbBackend::MySql) => "DECIMAL(18, 4)",
        (FieldDataType::Decimal, _) => "DECIMAL",
        (FieldDataType::Boolean, _) => "BOOLEAN",
        (FieldDataType::Date, _) => "DATE",
        (FieldDataType::DateTime, DbBackend::Postgres) => "TIMESTAMP",
        (FieldDataType::DateTime, _) => "DATETIME",
    }
}

fn create_table_sql(backend: DbBackend, name: &str) -> String {
    let table = quote(backend, &physical_table_name(name));
    let id = quote(backend, "id");
    let pk = match backend {
        DbBackend::Postgres => format!("{id} SERIAL PRIMARY KEY"),
        DbBackend::Sqlite => format!("{id} INTEGER PRIMARY KEY AUTOINCREMENT"),
        _ => format!("{id} INT AUTO_INCREMENT PRIMARY KEY"),
    };
    format!("CREATE TABLE {table} ({pk})")
}

fn drop_table_sql(backend: DbBackend, name: &str) -> String {
    format!(
        "DROP TABLE IF EXISTS {}",
        quote(backend, &physical_table_name(name))
    )
}

fn add_column_sql(
    backend: DbBackend,
    table: &str,
    column: &str,
    data_type: FieldDataType,
    choices: Option<&[String]>,
) -> String {
    let quoted = quote(backend, column);
    let mut sql = format!(
        "ALTER TABLE {} ADD COLUMN {quoted} {}",
        quote(backend, &physical_table_name(table)),
        column_type_sql(backend, data_type)
    );
    if let Some(choices) = choices.filter(|c| !c.is_empty())
        && data_type.supports_choices()
    {
        let allowed: Vec<String> = choices
            .iter()
            .map(|c| format!("'{}'", c.replace('\'', "''")))
            .collect();
        sql.push_str(&format!(" CHECK ({quoted} IN ({}))", allowed.join(", ")));
    }
    sql
}

fn drop_column_sql(backend: DbBackend, table: &str, column: &str) -> String {
    format!(
        "ALTER TABLE {} DROP COLUMN {}",
        quote(backend, &physical_table_name(table)),
        quote(backend, column)
    )
}
