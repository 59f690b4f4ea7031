//! Alteration types: the difference between a table's current structure and
//! the structure it should have.

use serde::{Deserialize, Serialize};

use crate::schema::{Column, Index, RenameableColumn, Table};

/// Column-level changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnAlterations {
    /// Columns to add.
    #[serde(default)]
    pub add_columns: Vec<Column>,
    /// Columns whose definition (and possibly name) changes.
    #[serde(default)]
    pub modify_columns: Vec<RenameableColumn>,
    /// Names of columns to drop.
    #[serde(default)]
    pub drop_columns: Vec<String>,
}

impl ColumnAlterations {
    /// Returns true if no column changes are specified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add_columns.is_empty() && self.modify_columns.is_empty() && self.drop_columns.is_empty()
    }
}

/// Index and primary key changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexAlterations {
    /// New primary key columns, present only when the key itself changes.
    #[serde(default)]
    pub new_primary_key_columns: Option<Vec<String>>,
    /// Indexes to create.
    #[serde(default)]
    pub add_indexes: Vec<Index>,
    /// Indexes to redefine (dropped and created again).
    #[serde(default)]
    pub modify_indexes: Vec<Index>,
    /// Indexes to drop.
    #[serde(default)]
    pub drop_indexes: Vec<Index>,
}

impl IndexAlterations {
    /// Returns true if no index or key changes are specified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.new_primary_key_columns.is_none()
            && self.add_indexes.is_empty()
            && self.modify_indexes.is_empty()
            && self.drop_indexes.is_empty()
    }
}

/// A requested change to an existing table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alteration {
    /// Table being altered.
    pub table_name: String,
    /// Column changes.
    #[serde(default)]
    pub columns: ColumnAlterations,
    /// Index and primary key changes.
    #[serde(default)]
    pub indexes: IndexAlterations,
    /// The full structure after the change. Only dialects that rebuild
    /// tables need it.
    #[serde(default)]
    pub target_table: Option<Table>,
}

impl Alteration {
    /// Creates an empty alteration of `table_name`.
    #[must_use]
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: ColumnAlterations::default(),
            indexes: IndexAlterations::default(),
            target_table: None,
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn add_column(mut self, column: Column) -> Self {
        self.columns.add_columns.push(column);
        self
    }

    /// Modifies a column; use [`RenameableColumn::renamed_from`] to rename it.
    #[must_use]
    pub fn modify_column(mut self, column: impl Into<RenameableColumn>) -> Self {
        self.columns.modify_columns.push(column.into());
        self
    }

    /// Drops a column.
    #[must_use]
    pub fn drop_column(mut self, name: impl Into<String>) -> Self {
        self.columns.drop_columns.push(name.into());
        self
    }

    /// Replaces the primary key with `columns`.
    #[must_use]
    pub fn primary_key<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.indexes.new_primary_key_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Creates an index.
    #[must_use]
    pub fn add_index(mut self, index: Index) -> Self {
        self.indexes.add_indexes.push(index);
        self
    }

    /// Redefines an index.
    #[must_use]
    pub fn modify_index(mut self, index: Index) -> Self {
        self.indexes.modify_indexes.push(index);
        self
    }

    /// Drops an index.
    #[must_use]
    pub fn drop_index(mut self, index: Index) -> Self {
        self.indexes.drop_indexes.push(index);
        self
    }

    /// Sets the post-alteration structure.
    #[must_use]
    pub fn target(mut self, table: Table) -> Self {
        self.target_table = Some(table);
        self
    }

    /// Returns true if any existing column is retyped or renamed.
    #[must_use]
    pub fn has_column_type_change(&self) -> bool {
        !self.columns.modify_columns.is_empty()
    }

    /// Returns true if the primary key is replaced.
    #[must_use]
    pub const fn has_primary_key_change(&self) -> bool {
        self.indexes.new_primary_key_columns.is_some()
    }

    /// Returns true if a dialect without live column alteration has to
    /// rebuild the table to apply this change.
    #[must_use]
    pub fn requires_rebuild(&self) -> bool {
        self.has_column_type_change() || self.has_primary_key_change()
    }

    /// Returns true if nothing changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.indexes.is_empty()
    }

    /// Finds the modification entry for the column named `name` after the change.
    #[must_use]
    pub fn modified_column(&self, name: &str) -> Option<&RenameableColumn> {
        self.columns
            .modify_columns
            .iter()
            .find(|c| c.column.name == name)
    }

    /// Returns true if `name` is one of the added columns.
    #[must_use]
    pub fn is_added_column(&self, name: &str) -> bool {
        self.columns.add_columns.iter().any(|c| c.name == name)
    }
}
