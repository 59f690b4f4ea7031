//! Migration plans.
//!
//! A dialect turns an [`Alteration`](crate::alteration::Alteration) into a
//! [`MigrationPlan`] without touching the database. Direct plans are plain
//! statement lists. Rebuild plans move the table aside, create the target
//! structure under the original name and copy the rows over.

use tracing::{debug, info};

use crate::connection::SchemaConnection;
use crate::error::Result;

/// Prefix of the name an existing table is moved to during a rebuild.
pub const REBUILD_TABLE_PREFIX: &str = "__";

/// Name the table is moved to while it is rebuilt.
#[must_use]
pub fn temporary_table_name(table: &str) -> String {
    format!("{REBUILD_TABLE_PREFIX}{table}")
}

/// How an alteration is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationPlan {
    /// `;`-terminated statements that alter the table in place.
    Direct(Vec<String>),
    /// The table has to be recreated.
    Rebuild(RebuildPlan),
}

impl MigrationPlan {
    /// Returns true if this plan rebuilds the table.
    #[must_use]
    pub const fn is_rebuild(&self) -> bool {
        matches!(self, Self::Rebuild(_))
    }

    /// Renders the whole plan as one script, including the rebuild steps a
    /// dialect would otherwise run itself.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Direct(statements) => statements.concat(),
            Self::Rebuild(plan) => plan.to_sql(),
        }
    }
}

/// Steps of a table rebuild, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildPlan {
    /// Table being rebuilt.
    pub table_name: String,
    /// Name the existing table is moved to.
    pub temporary_name: String,
    /// `DROP INDEX IF EXISTS` statements for index names the new table reuses.
    pub index_drops: Vec<String>,
    /// Moves the existing table out of the way.
    pub rename: String,
    /// Creates the target table (and its indexes) under the original name.
    pub create_script: String,
    /// Copies rows from the temporary table, if any column survives.
    pub copy: Option<String>,
    /// Drops the temporary table. Returned to the caller, never executed here.
    pub cleanup: String,
}

impl RebuildPlan {
    /// Runs every step except the cleanup and returns the cleanup statement.
    ///
    /// The caller executes the returned `DROP TABLE` in the same transaction
    /// once it is satisfied with the copy. A failure stops at the failing
    /// step with the table still renamed; rolling back the caller's
    /// transaction restores it.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by `conn`. Later steps are not run.
    pub async fn execute<C: SchemaConnection>(&self, conn: &mut C) -> Result<String> {
        info!(
            table = %self.table_name,
            temporary = %self.temporary_name,
            "Rebuilding table"
        );

        for sql in &self.index_drops {
            conn.execute(sql).await?;
        }
        conn.execute(&self.rename).await?;
        conn.execute_script(&self.create_script).await?;
        if let Some(copy) = &self.copy {
            conn.execute(copy).await?;
        } else {
            debug!(table = %self.table_name, "No surviving columns to copy");
        }

        info!(table = %self.table_name, "Table rebuilt, cleanup left to caller");
        Ok(self.cleanup.clone())
    }

    /// Renders every step, cleanup included, as one script.
    #[must_use]
    pub fn to_sql(&self) -> String {
        let mut sql = self.index_drops.concat();
        sql.push_str(&self.rename);
        sql.push_str(&self.create_script);
        if let Some(copy) = &self.copy {
            sql.push_str(copy);
        }
        sql.push_str(&self.cleanup);
        sql
    }
}
