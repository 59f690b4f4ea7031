//! MySQL / MariaDB dialect.
//!
//! The primary key is always named `PRIMARY`, but `DROP PRIMARY KEY` fails
//! on a table without one, so a key change checks the catalog first when a
//! connection is available.

use super::{DdlDialect, declared_type, first_value, sized_type};
use crate::alteration::Alteration;
use crate::connection::SchemaConnection;
use crate::error::Result;
use crate::plan::MigrationPlan;
use crate::schema::{Column, Index, IndexColumn};

const PRIMARY_KEY_QUERY: &str = "SELECT constraint_name FROM information_schema.table_constraints \
     WHERE table_schema = DATABASE() AND table_name = ? \
     AND constraint_type = 'PRIMARY KEY'";

/// MySQL dialect for DDL generation.
#[derive(Debug, Clone, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DdlDialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_char(&self) -> char {
        '`'
    }

    fn quote_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
    }

    fn map_type(&self, column: &Column) -> String {
        let declared = declared_type(column);
        match declared.as_str() {
            "BYTEA" => "BLOB".to_string(),
            "DOUBLE PRECISION" => "DOUBLE".to_string(),
            "BOOL" => "BOOLEAN".to_string(),
            other => sized_type(other, column),
        }
    }

    fn auto_increment_keyword(&self, column: &Column, _inline_primary_key: bool) -> Option<&'static str> {
        column.auto_increment.then_some("AUTO_INCREMENT")
    }

    fn index_column(&self, column: &IndexColumn) -> String {
        let mut name = self.quote_identifier(&column.name);
        if let Some(bytes) = column.max_bytes_to_index {
            name.push_str(&format!("({bytes})"));
        }
        name
    }

    fn drop_index_sql(&self, table: &str, index: &Index) -> String {
        format!("DROP INDEX {} ON {};", index.name(), table)
    }

    fn assumed_primary_key_name(&self, _table: &str) -> Option<String> {
        Some("PRIMARY".to_string())
    }

    async fn existing_primary_key_name<C: SchemaConnection>(
        &self,
        table: &str,
        connection: Option<&mut C>,
    ) -> Result<Option<String>> {
        if let Some(conn) = connection {
            let rows = conn.query(PRIMARY_KEY_QUERY, &[table]).await?;
            return Ok(first_value(rows));
        }
        Ok(self.assumed_primary_key_name(table))
    }

    fn plan_alteration(
        &self,
        alteration: &Alteration,
        existing_primary_key: Option<&str>,
    ) -> Result<MigrationPlan> {
        let table = &alteration.table_name;
        let mut clauses = Vec::new();

        for column in &alteration.columns.add_columns {
            clauses.push(format!("ADD COLUMN {}", self.column_definition(column, false)));
        }

        // CHANGE COLUMN covers retyping and renaming in one clause.
        for modified in &alteration.columns.modify_columns {
            clauses.push(format!(
                "CHANGE COLUMN {} {}",
                self.quote_identifier(modified.source_name()),
                self.column_definition(&modified.column, false)
            ));
        }

        for name in &alteration.columns.drop_columns {
            clauses.push(format!("DROP COLUMN {}", self.quote_identifier(name)));
        }

        if let Some(primary_key) = &alteration.indexes.new_primary_key_columns {
            if existing_primary_key.is_some() {
                clauses.push("DROP PRIMARY KEY".to_string());
            }
            if !primary_key.is_empty() {
                let columns: Vec<&str> = primary_key.iter().map(String::as_str).collect();
                clauses.push(format!("ADD {}", self.primary_key_clause(&columns)));
            }
        }

        let mut statements = Vec::new();
        if !clauses.is_empty() {
            statements.push(format!("ALTER TABLE {table} {};", clauses.join(", ")));
        }
        statements.extend(self.index_statements(table, &alteration.indexes));

        Ok(MigrationPlan::Direct(statements))
    }
}
