//! Dialect-aware DDL synthesis for tables.
//!
//! `oxide-ddl` turns a declarative [`Table`](schema::Table) into the
//! `CREATE TABLE` script of a given engine, and an
//! [`Alteration`](alteration::Alteration) into the statements that bring an
//! existing table to its new shape.
//!
//! # Architecture
//!
//! - **Schema** - Column, index and table value types
//! - **Alteration** - The difference between a table and its desired shape
//! - **Dialect** - One [`DdlDialect`](dialect::DdlDialect) per engine
//!   (PostgreSQL, MySQL, SQLite)
//! - **Plan** - Direct statement lists or table rebuilds
//! - **Connection** - The narrow database interface a rebuild runs against
//!
//! Engines whose `ALTER TABLE` cannot retype or rename a column (SQLite)
//! rebuild the table instead: the old table is renamed to `__<table>`, the
//! target structure is created under the original name and the rows are
//! copied across. Run rebuilds inside a transaction and execute the returned
//! `DROP TABLE __<table>;` in that same transaction.
//!
//! # Example
//!
//! ```rust
//! use oxide_ddl::prelude::*;
//!
//! let alteration = Alteration::new("test")
//!     .add_column(Column::new("notes", "VARCHAR").length(2000))
//!     .drop_column("name");
//!
//! let sql = PostgresDialect::new().modify_table_sql(&alteration)?;
//! assert_eq!(
//!     sql,
//!     "ALTER TABLE test ADD COLUMN \"notes\" VARCHAR(2000), DROP COLUMN \"name\";"
//! );
//! # Ok::<(), oxide_ddl::SchemaError>(())
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Print the CREATE TABLE script of a table definition
//! oxide-ddl --dialect postgres create --table users.json
//!
//! # Apply an alteration to a SQLite database
//! oxide-ddl --database sqlite:app.db alter --alteration change.json
//! ```

pub mod alteration;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod plan;
pub mod schema;

pub use error::{Result, SchemaError};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::alteration::{Alteration, ColumnAlterations, IndexAlterations};
    pub use crate::connection::{SchemaConnection, SqliteSchemaConnection};
    pub use crate::dialect::{
        DdlDialect, DialectKind, MySqlDialect, PostgresDialect, SqliteDialect,
    };
    pub use crate::error::{Result, SchemaError};
    pub use crate::plan::{MigrationPlan, RebuildPlan};
    pub use crate::schema::{
        Column, DefaultValue, Index, IndexColumn, RenameableColumn, Table,
    };
}
