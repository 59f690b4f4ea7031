//! Database dialect implementations.
//!
//! Each dialect knows how to render tables, columns and indexes for its
//! engine and how to apply an [`Alteration`]: in place when the engine's
//! `ALTER TABLE` can express it, by rebuilding the table otherwise.

#[cfg(test)]
mod catalog_stub;
mod mysql;
mod postgres;
mod sqlite;

use std::fmt;
use std::str::FromStr;

pub use mysql::MySqlDialect;
pub use postgres::{PostgresDialect, find_primary_key_constraint_name};
pub use sqlite::SqliteDialect;

use tracing::debug;

use crate::alteration::{Alteration, IndexAlterations};
use crate::connection::{Row, SchemaConnection};
use crate::error::{Result, SchemaError};
use crate::plan::MigrationPlan;
use crate::schema::{Column, DefaultValue, Index, IndexColumn, Table};

/// Trait for database-specific DDL generation.
#[allow(async_fn_in_trait)]
pub trait DdlDialect: Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Maps a column's declared type to this dialect, length included.
    fn map_type(&self, column: &Column) -> String;

    /// Returns the auto-increment marker appended to a column definition.
    fn auto_increment_keyword(&self, column: &Column, inline_primary_key: bool)
        -> Option<&'static str>;

    /// Decides how `alteration` is applied.
    ///
    /// `existing_primary_key` is the name of the current primary-key
    /// constraint for engines that can only drop a key by name. `None` means
    /// the table has no key to drop.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnsupportedAlteration`] if the alteration
    /// cannot be expressed, such as a rebuild without a target table.
    fn plan_alteration(
        &self,
        alteration: &Alteration,
        existing_primary_key: Option<&str>,
    ) -> Result<MigrationPlan>;

    /// Returns the identifier quote character.
    fn quote_char(&self) -> char {
        '"'
    }

    /// Quotes an identifier (column name).
    fn quote_identifier(&self, name: &str) -> String {
        let q = self.quote_char();
        let escaped = name.replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }

    /// Quotes a string literal.
    fn quote_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Renders a boolean literal.
    fn boolean_literal(&self, value: bool) -> &'static str {
        if value { "TRUE" } else { "FALSE" }
    }

    /// Renders a default value. Numbers and booleans are never quoted.
    fn render_default(&self, value: &DefaultValue) -> String {
        match value {
            DefaultValue::Integer(i) => i.to_string(),
            DefaultValue::Float(f) => f.to_string(),
            DefaultValue::Boolean(b) => self.boolean_literal(*b).to_string(),
            DefaultValue::Text(s) if value.is_numeric() => s.clone(),
            DefaultValue::Text(s) => self.quote_literal(s),
        }
    }

    /// Generates column definition SQL.
    fn column_definition(&self, column: &Column, inline_primary_key: bool) -> String {
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(&column.name),
            self.map_type(column)
        );

        if column.not_null {
            sql.push_str(" NOT NULL");
        }

        if let Some(default) = column.effective_default() {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.render_default(default));
        }

        if inline_primary_key {
            sql.push_str(" PRIMARY KEY");
        }

        if let Some(keyword) = self.auto_increment_keyword(column, inline_primary_key) {
            sql.push(' ');
            sql.push_str(keyword);
        }

        sql
    }

    /// Renders a `PRIMARY KEY (...)` clause.
    fn primary_key_clause(&self, columns: &[&str]) -> String {
        let quoted: Vec<String> = columns.iter().map(|c| self.quote_identifier(c)).collect();
        format!("PRIMARY KEY ({})", quoted.join(", "))
    }

    /// Renders one column of an index.
    fn index_column(&self, column: &IndexColumn) -> String {
        self.quote_identifier(&column.name)
    }

    /// Generates SQL for creating an index.
    fn create_index_sql(&self, table: &str, index: &Index) -> String {
        let columns: Vec<String> = index
            .columns()
            .iter()
            .map(|c| self.index_column(c))
            .collect();
        format!(
            "CREATE {}INDEX {} ON {} ({});",
            if index.is_unique() { "UNIQUE " } else { "" },
            index.name(),
            table,
            columns.join(", ")
        )
    }

    /// Generates SQL for dropping an index.
    fn drop_index_sql(&self, _table: &str, index: &Index) -> String {
        format!("DROP INDEX {};", index.name())
    }

    /// Renders `table`'s structure under `table_name`.
    fn create_table_sql(&self, table_name: &str, table: &Table) -> String {
        let inline = table.inline_primary_key().map(|c| c.name.as_str());

        let mut definitions: Vec<String> = table
            .columns
            .iter()
            .map(|c| self.column_definition(c, inline == Some(c.name.as_str())))
            .collect();

        let primary_key = table.trailing_primary_key();
        if !primary_key.is_empty() {
            definitions.push(self.primary_key_clause(&primary_key));
        }

        let mut sql = format!("CREATE TABLE {} ({});", table_name, definitions.join(", "));
        for index in &table.indexes {
            sql.push_str(&self.create_index_sql(table_name, index));
        }
        sql
    }

    /// Generates the `CREATE TABLE` statement followed by one `CREATE INDEX`
    /// per index.
    fn generate_table_create_sql(&self, table: &Table) -> String {
        self.create_table_sql(&table.name, table)
    }

    /// Generates SQL for dropping a table.
    fn generate_table_drop_sql(&self, table_name: &str) -> String {
        format!("DROP TABLE {table_name};")
    }

    /// Index statements of an alteration: creates, then drop-and-create for
    /// every redefined index, then drops.
    fn index_statements(&self, table: &str, indexes: &IndexAlterations) -> Vec<String> {
        let mut statements = Vec::new();
        for index in &indexes.add_indexes {
            statements.push(self.create_index_sql(table, index));
        }
        for index in &indexes.modify_indexes {
            statements.push(self.drop_index_sql(table, index));
            statements.push(self.create_index_sql(table, index));
        }
        for index in &indexes.drop_indexes {
            statements.push(self.drop_index_sql(table, index));
        }
        statements
    }

    /// Primary key constraint name assumed when no catalog is available.
    fn assumed_primary_key_name(&self, _table: &str) -> Option<String> {
        None
    }

    /// Finds the name of `table`'s primary-key constraint.
    ///
    /// # Errors
    ///
    /// Returns the connection's error if a catalog lookup fails.
    async fn existing_primary_key_name<C: SchemaConnection>(
        &self,
        table: &str,
        _connection: Option<&mut C>,
    ) -> Result<Option<String>> {
        Ok(self.assumed_primary_key_name(table))
    }

    /// Generates the SQL for `alteration` without a connection.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::ConnectionRequired`] if the table has to be
    /// rebuilt, and any error of [`DdlDialect::plan_alteration`].
    fn modify_table_sql(&self, alteration: &Alteration) -> Result<String> {
        let primary_key = self.assumed_primary_key_name(&alteration.table_name);
        match self.plan_alteration(alteration, primary_key.as_deref())? {
            MigrationPlan::Direct(statements) => Ok(statements.concat()),
            MigrationPlan::Rebuild(_) => Err(SchemaError::ConnectionRequired(
                alteration.table_name.clone(),
            )),
        }
    }

    /// Applies `alteration`.
    ///
    /// Direct plans are returned as SQL and nothing is executed. Rebuild
    /// plans run against `connection` and return the `DROP TABLE` of the
    /// temporary table, which the caller must execute.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::ConnectionRequired`] if a rebuild is needed and
    /// `connection` is `None`, planning errors, and the first database error
    /// of a catalog lookup or rebuild step.
    async fn generate_modify_table_sql<C: SchemaConnection>(
        &self,
        alteration: &Alteration,
        mut connection: Option<&mut C>,
    ) -> Result<String> {
        let primary_key = if alteration.has_primary_key_change() {
            self.existing_primary_key_name(&alteration.table_name, connection.as_deref_mut())
                .await?
        } else {
            None
        };

        let plan = self.plan_alteration(alteration, primary_key.as_deref())?;
        debug!(
            dialect = self.name(),
            table = %alteration.table_name,
            rebuild = plan.is_rebuild(),
            "Planned alteration"
        );

        match plan {
            MigrationPlan::Direct(statements) => Ok(statements.concat()),
            MigrationPlan::Rebuild(rebuild) => {
                let conn = connection.ok_or_else(|| {
                    SchemaError::ConnectionRequired(alteration.table_name.clone())
                })?;
                rebuild.execute(conn).await
            }
        }
    }
}

/// First column of the first row of a catalog lookup.
pub(crate) fn first_value(rows: Vec<Row>) -> Option<String> {
    rows.into_iter()
        .next()
        .and_then(|row| row.into_iter().next().flatten())
}

/// Renders `name` with the column's length and precision.
pub(crate) fn sized_type(name: &str, column: &Column) -> String {
    match (column.length, column.precision) {
        (Some(length), Some(precision)) => format!("{name}({length},{precision})"),
        (Some(length), None) => format!("{name}({length})"),
        _ => name.to_string(),
    }
}

/// The column's declared type, trimmed and upper-cased.
pub(crate) fn declared_type(column: &Column) -> String {
    column.sql_type.trim().to_ascii_uppercase()
}

/// Engines with a dialect implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectKind {
    /// PostgreSQL.
    Postgres,
    /// MySQL and MariaDB.
    MySql,
    /// SQLite.
    Sqlite,
}

impl DialectKind {
    /// Returns the canonical engine name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Postgres => PostgresDialect.name(),
            Self::MySql => MySqlDialect.name(),
            Self::Sqlite => SqliteDialect.name(),
        }
    }

    /// Returns whether the engine can retype and rename columns in place.
    #[must_use]
    pub const fn supports_live_alter(self) -> bool {
        !matches!(self, Self::Sqlite)
    }
}

impl FromStr for DialectKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            _ => Err(SchemaError::UnknownDialect(s.to_string())),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
