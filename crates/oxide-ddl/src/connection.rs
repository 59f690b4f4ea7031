//! Database connection collaborator.
//!
//! Dialects only touch a database when an alteration has to rebuild a table
//! or when a catalog lookup is needed. Everything else is pure SQL text.

use sqlx::Row as _;
use tracing::debug;

use crate::error::Result;

/// One result row, every column decoded as optional text.
pub type Row = Vec<Option<String>>;

/// The calls a dialect makes against a live database.
///
/// Calls run in the order they are issued and errors are returned as is;
/// transactions are the caller's business.
#[allow(async_fn_in_trait)]
pub trait SchemaConnection {
    /// Executes a single statement that returns no rows.
    ///
    /// # Errors
    ///
    /// Returns the database error if the statement fails.
    async fn execute(&mut self, sql: &str) -> Result<()>;

    /// Executes a string of `;`-separated statements.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing statement.
    async fn execute_script(&mut self, sql: &str) -> Result<()>;

    /// Runs a catalog query with positional text parameters.
    ///
    /// # Errors
    ///
    /// Returns the database error if the query fails or a value cannot be
    /// read as text.
    async fn query(&mut self, sql: &str, params: &[&str]) -> Result<Vec<Row>>;
}

/// [`SchemaConnection`] over a sqlx SQLite connection.
///
/// Borrow it from a pooled connection or from an open transaction
/// (`SqliteSchemaConnection::new(&mut *tx)`) so that a rebuild can be rolled back.
pub struct SqliteSchemaConnection<'c> {
    conn: &'c mut sqlx::SqliteConnection,
}

impl<'c> SqliteSchemaConnection<'c> {
    /// Wraps a borrowed sqlx connection.
    #[must_use]
    pub const fn new(conn: &'c mut sqlx::SqliteConnection) -> Self {
        Self { conn }
    }
}

impl SchemaConnection for SqliteSchemaConnection<'_> {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        debug!(sql = %sql, "Executing SQL");
        sqlx::query(sql).execute(&mut *self.conn).await?;
        Ok(())
    }

    async fn execute_script(&mut self, sql: &str) -> Result<()> {
        debug!(sql = %sql, "Executing SQL script");
        sqlx::raw_sql(sql).execute(&mut *self.conn).await?;
        Ok(())
    }

    async fn query(&mut self, sql: &str, params: &[&str]) -> Result<Vec<Row>> {
        debug!(sql = %sql, ?params, "Running catalog query");
        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(*param);
        }
        let rows = query.fetch_all(&mut *self.conn).await?;

        let mut decoded = Vec::with_capacity(rows.len());
        for row in rows {
            let mut values = Vec::with_capacity(row.len());
            for i in 0..row.len() {
                values.push(row.try_get_unchecked::<Option<String>, _>(i)?);
            }
            decoded.push(values);
        }
        Ok(decoded)
    }
}
