//! PostgreSQL dialect.
//!
//! PostgreSQL alters columns in place, but renames must be separate
//! statements and a primary key can only be dropped by constraint name.

use super::{DdlDialect, declared_type, first_value, sized_type};
use crate::alteration::Alteration;
use crate::connection::SchemaConnection;
use crate::error::Result;
use crate::plan::MigrationPlan;
use crate::schema::Column;

const PRIMARY_KEY_QUERY: &str = "SELECT constraint_name FROM information_schema.table_constraints \
     WHERE table_schema = current_schema() AND table_name = $1 \
     AND constraint_type = 'PRIMARY KEY'";

/// Looks up the name of `table`'s primary-key constraint in the catalog.
///
/// Returns `None` if the table has no primary key.
///
/// # Errors
///
/// Returns the connection's error if the catalog query fails.
pub async fn find_primary_key_constraint_name<C: SchemaConnection>(
    conn: &mut C,
    table: &str,
) -> Result<Option<String>> {
    let rows = conn.query(PRIMARY_KEY_QUERY, &[table]).await?;
    Ok(first_value(rows))
}

/// PostgreSQL dialect for DDL generation.
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Maps the declared type. `serial` substitutes the SERIAL pseudo-types
    /// for auto-increment integers, which only `CREATE`/`ADD COLUMN` accept.
    fn data_type(column: &Column, serial: bool) -> String {
        let serial = serial && column.auto_increment;
        let declared = declared_type(column);
        match declared.as_str() {
            "INT" | "INTEGER" | "INT4" | "MEDIUMINT" => {
                if serial { "SERIAL" } else { "INTEGER" }.to_string()
            }
            "BIGINT" | "INT8" => if serial { "BIGSERIAL" } else { "BIGINT" }.to_string(),
            "SMALLINT" | "TINYINT" | "INT2" => {
                if serial { "SMALLSERIAL" } else { "SMALLINT" }.to_string()
            }
            "DATETIME" | "TIMESTAMP" => "TIMESTAMP".to_string(),
            "DATE" => "DATE".to_string(),
            "TIME" => "TIME".to_string(),
            "DOUBLE" | "DOUBLE PRECISION" => "DOUBLE PRECISION".to_string(),
            "FLOAT" | "REAL" => "REAL".to_string(),
            "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" | "BYTEA" => {
                "BYTEA".to_string()
            }
            "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "CLOB" => "TEXT".to_string(),
            "BOOL" | "BOOLEAN" => "BOOLEAN".to_string(),
            other => sized_type(other, column),
        }
    }

    /// `ALTER COLUMN` clauses restating a modified column's type,
    /// nullability and default.
    fn alter_column_clauses(&self, column: &Column) -> Vec<String> {
        let name = self.quote_identifier(&column.name);
        let mut clauses = vec![format!(
            "ALTER COLUMN {name} TYPE {}",
            Self::data_type(column, false)
        )];

        if column.not_null {
            clauses.push(format!("ALTER COLUMN {name} SET NOT NULL"));
        } else {
            clauses.push(format!("ALTER COLUMN {name} DROP NOT NULL"));
        }

        // Auto-increment columns keep their sequence default.
        if !column.auto_increment {
            clauses.push(column.effective_default().map_or_else(
                || format!("ALTER COLUMN {name} DROP DEFAULT"),
                |default| {
                    format!("ALTER COLUMN {name} SET DEFAULT {}", self.render_default(default))
                },
            ));
        }

        clauses
    }
}

impl DdlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn map_type(&self, column: &Column) -> String {
        Self::data_type(column, true)
    }

    fn auto_increment_keyword(&self, _column: &Column, _inline_primary_key: bool) -> Option<&'static str> {
        // Expressed through the SERIAL types instead.
        None
    }

    fn assumed_primary_key_name(&self, table: &str) -> Option<String> {
        Some(format!("{table}_pkey"))
    }

    async fn existing_primary_key_name<C: SchemaConnection>(
        &self,
        table: &str,
        connection: Option<&mut C>,
    ) -> Result<Option<String>> {
        if let Some(conn) = connection {
            return find_primary_key_constraint_name(conn, table).await;
        }
        Ok(self.assumed_primary_key_name(table))
    }

    fn plan_alteration(
        &self,
        alteration: &Alteration,
        existing_primary_key: Option<&str>,
    ) -> Result<MigrationPlan> {
        let table = &alteration.table_name;
        let mut statements = Vec::new();
        let mut clauses = Vec::new();

        for column in &alteration.columns.add_columns {
            clauses.push(format!("ADD COLUMN {}", self.column_definition(column, false)));
        }

        for modified in &alteration.columns.modify_columns {
            if let Some(previous) = modified.rename() {
                statements.push(format!(
                    "ALTER TABLE {table} RENAME COLUMN {} TO {};",
                    self.quote_identifier(previous),
                    self.quote_identifier(modified.name())
                ));
            }
            clauses.extend(self.alter_column_clauses(&modified.column));
        }

        for name in &alteration.columns.drop_columns {
            clauses.push(format!("DROP COLUMN {}", self.quote_identifier(name)));
        }

        if let Some(primary_key) = &alteration.indexes.new_primary_key_columns {
            if let Some(constraint) = existing_primary_key {
                clauses.push(format!(
                    "DROP CONSTRAINT {}",
                    self.quote_identifier(constraint)
                ));
            }
            if !primary_key.is_empty() {
                let columns: Vec<&str> = primary_key.iter().map(String::as_str).collect();
                clauses.push(format!("ADD {}", self.primary_key_clause(&columns)));
            }
        }

        if !clauses.is_empty() {
            statements.push(format!("ALTER TABLE {table} {};", clauses.join(", ")));
        }
        statements.extend(self.index_statements(table, &alteration.indexes));

        Ok(MigrationPlan::Direct(statements))
    }
}
