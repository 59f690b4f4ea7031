//! SQLite dialect.
//!
//! SQLite can add and drop columns in place but cannot retype or rename
//! them, nor change the primary key. Those changes use the table
//! recreation strategy: move the table aside, create the target structure
//! under the original name and copy the rows across.

use super::DdlDialect;
use crate::alteration::Alteration;
use crate::error::{Result, SchemaError};
use crate::plan::{MigrationPlan, RebuildPlan, temporary_table_name};
use crate::schema::{Column, RenameableColumn, Table};

/// SQLite dialect for DDL generation.
#[derive(Debug, Clone, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn direct_statements(&self, alteration: &Alteration) -> Vec<String> {
        let table = &alteration.table_name;
        let mut statements = Vec::new();

        for column in &alteration.columns.add_columns {
            statements.push(format!(
                "ALTER TABLE {table} ADD COLUMN {};",
                self.column_definition(column, false)
            ));
        }
        for name in &alteration.columns.drop_columns {
            statements.push(format!(
                "ALTER TABLE {table} DROP COLUMN {};",
                self.quote_identifier(name)
            ));
        }
        statements.extend(self.index_statements(table, &alteration.indexes));

        statements
    }

    fn rebuild_plan(&self, alteration: &Alteration, target: &Table) -> Result<RebuildPlan> {
        let table = &alteration.table_name;

        for modified in &alteration.columns.modify_columns {
            if target.get_column(modified.name()).is_none() {
                return Err(SchemaError::unsupported(
                    table,
                    format!(
                        "modified column '{}' is missing from the target table",
                        modified.name()
                    ),
                ));
            }
        }

        let temporary = temporary_table_name(table);

        let mut reused: Vec<&str> = Vec::new();
        let named = target
            .indexes
            .iter()
            .chain(&alteration.indexes.modify_indexes)
            .chain(&alteration.indexes.drop_indexes);
        for index in named {
            if !reused.contains(&index.name()) {
                reused.push(index.name());
            }
        }
        let index_drops = reused
            .into_iter()
            .map(|name| format!("DROP INDEX IF EXISTS {name};"))
            .collect();
        let rename = format!("ALTER TABLE {table} RENAME TO {temporary};");
        let copy = self.copy_sql(alteration, target, &temporary);
        let cleanup = self.generate_table_drop_sql(&temporary);

        Ok(RebuildPlan {
            table_name: table.clone(),
            temporary_name: temporary,
            index_drops,
            rename,
            create_script: self.create_table_sql(table, target),
            copy,
            cleanup,
        })
    }

    /// `INSERT ... SELECT` moving surviving rows into the new table.
    ///
    /// Added columns did not exist before and are left to their defaults.
    fn copy_sql(&self, alteration: &Alteration, target: &Table, temporary: &str) -> Option<String> {
        let (targets, sources): (Vec<String>, Vec<String>) = target
            .columns
            .iter()
            .filter(|c| !alteration.is_added_column(&c.name))
            .map(|c| {
                let source = alteration
                    .modified_column(&c.name)
                    .map_or(c.name.as_str(), RenameableColumn::source_name);
                (self.quote_identifier(&c.name), self.quote_identifier(source))
            })
            .unzip();

        if targets.is_empty() {
            return None;
        }
        Some(format!(
            "INSERT INTO {} ({}) SELECT {} FROM {temporary};",
            alteration.table_name,
            targets.join(", "),
            sources.join(", ")
        ))
    }
}

impl DdlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn map_type(&self, column: &Column) -> String {
        // Only INTEGER PRIMARY KEY aliases the rowid.
        if column.auto_increment {
            return "INTEGER".to_string();
        }
        super::sized_type(&super::declared_type(column), column)
    }

    fn auto_increment_keyword(&self, column: &Column, inline_primary_key: bool) -> Option<&'static str> {
        (column.auto_increment && inline_primary_key).then_some("AUTOINCREMENT")
    }

    // No boolean type; TRUE and FALSE are only keywords since 3.23.
    fn boolean_literal(&self, value: bool) -> &'static str {
        if value { "1" } else { "0" }
    }

    fn plan_alteration(
        &self,
        alteration: &Alteration,
        _existing_primary_key: Option<&str>,
    ) -> Result<MigrationPlan> {
        if !alteration.requires_rebuild() {
            return Ok(MigrationPlan::Direct(self.direct_statements(alteration)));
        }

        let target = alteration.target_table.as_ref().ok_or_else(|| {
            SchemaError::unsupported(
                &alteration.table_name,
                "a target table is required to rebuild",
            )
        })?;
        Ok(MigrationPlan::Rebuild(self.rebuild_plan(alteration, target)?))
    }
}
