//! In-memory catalog answering dialect lookups in unit tests.

use crate::connection::{Row, SchemaConnection};
use crate::error::Result;

/// Answers every catalog query with `rows` and records what was asked.
/// Anything that would change the database panics.
pub struct Catalog {
    pub rows: Vec<Row>,
    pub queries: Vec<(String, Vec<String>)>,
}

impl Catalog {
    #[must_use]
    pub const fn answering(rows: Vec<Row>) -> Self {
        Self {
            rows,
            queries: Vec::new(),
        }
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self::answering(Vec::new())
    }
}

impl SchemaConnection for Catalog {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        panic!("unexpected execute: {sql}");
    }

    async fn execute_script(&mut self, sql: &str) -> Result<()> {
        panic!("unexpected script: {sql}");
    }

    async fn query(&mut self, sql: &str, params: &[&str]) -> Result<Vec<Row>> {
        self.queries.push((
            sql.to_string(),
            params.iter().map(ToString::to_string).collect(),
        ));
        Ok(self.rows.clone())
    }
}
