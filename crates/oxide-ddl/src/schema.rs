//! Table structure types.
//!
//! These are plain values built once by the caller (usually from a schema
//! comparison) and handed to a dialect by reference. Dialects never mutate
//! them. The JSON shape uses `camelCase` keys so that definitions exported by
//! other tooling can be loaded with [`load_json`].

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, SchemaError};

/// Longest identifier accepted for an index name.
pub const MAX_IDENTIFIER_LENGTH: usize = 64;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

static NUMERIC_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("numeric pattern is valid")
});

/// Checks that `name` can be embedded in SQL without quoting.
///
/// # Errors
///
/// Returns [`SchemaError::InvalidIdentifier`] if `name` is empty, longer than
/// [`MAX_IDENTIFIER_LENGTH`] or contains anything but letters, digits and
/// underscores.
pub fn validate_identifier(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "must not be empty"
    } else if name.len() > MAX_IDENTIFIER_LENGTH {
        "must be at most 64 characters"
    } else if !IDENTIFIER.is_match(name) {
        "must start with a letter or underscore and contain only letters, digits and underscores"
    } else {
        return Ok(());
    };
    Err(SchemaError::InvalidIdentifier {
        name: name.to_string(),
        reason,
    })
}

/// Reads a JSON-encoded [`Table`] or [`crate::alteration::Alteration`].
///
/// # Errors
///
/// Returns [`SchemaError::Io`] if the file cannot be read and
/// [`SchemaError::Serialization`] if it does not hold a valid definition.
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Default value for a column.
///
/// Numbers and booleans are rendered unquoted, text as a string literal.
/// Text that spells a plain decimal number counts as a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    /// Integer default.
    Integer(i64),
    /// Floating point default.
    Float(f64),
    /// Boolean default.
    Boolean(bool),
    /// Text default. An empty string means "no default".
    Text(String),
}

impl DefaultValue {
    /// Returns true if this value renders as an unquoted numeric literal.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        match self {
            Self::Integer(_) | Self::Float(_) => true,
            Self::Text(s) => NUMERIC_LITERAL.is_match(s),
            Self::Boolean(_) => false,
        }
    }

    /// Returns true if no `DEFAULT` clause should be emitted for this value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }
}

impl From<i64> for DefaultValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for DefaultValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for DefaultValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for DefaultValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Definition of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Column name.
    pub name: String,
    /// SQL type keyword as declared by the caller (`VARCHAR`, `INT`, ...).
    ///
    /// Each dialect maps it to its own spelling.
    #[serde(rename = "type")]
    pub sql_type: String,
    /// Type length, e.g. the `2000` in `VARCHAR(2000)`.
    #[serde(default)]
    pub length: Option<u32>,
    /// Type precision, rendered after the length: `DECIMAL(5,2)`.
    #[serde(default)]
    pub precision: Option<u32>,
    /// Default value.
    #[serde(default, rename = "defaultValue")]
    pub default: Option<DefaultValue>,
    /// Whether this column is part of the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Whether this column auto-increments. Callers are expected to only set
    /// this on primary-key columns.
    #[serde(default)]
    pub auto_increment: bool,
    /// Whether the column rejects NULL.
    #[serde(default)]
    pub not_null: bool,
}

impl Column {
    /// Creates a nullable column of the given type.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            length: None,
            precision: None,
            default: None,
            primary_key: false,
            auto_increment: false,
            not_null: false,
        }
    }

    /// Sets the type length.
    #[must_use]
    pub const fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Sets the type precision.
    #[must_use]
    pub const fn precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: impl Into<DefaultValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Marks the column as part of the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Marks the column as auto-incrementing.
    #[must_use]
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Sets the column as NOT NULL.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Returns the default value if a `DEFAULT` clause should be rendered.
    #[must_use]
    pub fn effective_default(&self) -> Option<&DefaultValue> {
        self.default.as_ref().filter(|d| !d.is_empty())
    }
}

/// A column definition used when modifying a table, optionally carrying the
/// name the column had before the change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameableColumn {
    /// The desired column definition.
    #[serde(flatten)]
    pub column: Column,
    /// Name of the column before this change, if it is being renamed.
    #[serde(default)]
    pub previous_name: Option<String>,
}

impl RenameableColumn {
    /// Wraps a column that keeps its name.
    #[must_use]
    pub const fn new(column: Column) -> Self {
        Self {
            column,
            previous_name: None,
        }
    }

    /// Records that the column used to be called `previous_name`.
    #[must_use]
    pub fn renamed_from(mut self, previous_name: impl Into<String>) -> Self {
        self.previous_name = Some(previous_name.into());
        self
    }

    /// The new column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.column.name
    }

    /// The name the existing data is stored under.
    #[must_use]
    pub fn source_name(&self) -> &str {
        self.previous_name.as_deref().unwrap_or(&self.column.name)
    }

    /// Returns the previous name if it differs from the new one.
    #[must_use]
    pub fn rename(&self) -> Option<&str> {
        self.previous_name
            .as_deref()
            .filter(|prev| *prev != self.column.name)
    }
}

impl From<Column> for RenameableColumn {
    fn from(column: Column) -> Self {
        Self::new(column)
    }
}

/// Tables are created from plain columns: rename metadata has no meaning
/// when there is no prior state.
impl From<RenameableColumn> for Column {
    fn from(column: RenameableColumn) -> Self {
        column.column
    }
}

/// One column of an index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexColumn {
    /// Column name.
    pub name: String,
    /// Prefix length in bytes; `None` indexes the full column.
    #[serde(default, deserialize_with = "deserialize_prefix_length")]
    pub max_bytes_to_index: Option<u32>,
}

impl IndexColumn {
    /// Indexes the full column.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_bytes_to_index: None,
        }
    }

    /// Indexes only the first `bytes` bytes of the column.
    #[must_use]
    pub fn prefix(name: impl Into<String>, bytes: u32) -> Self {
        Self {
            name: name.into(),
            max_bytes_to_index: Some(bytes),
        }
    }
}

impl From<&str> for IndexColumn {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

// -1 is the conventional "whole column" marker in exported schemas.
fn deserialize_prefix_length<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(n) if n <= 0 => Ok(None),
        Some(n) => u32::try_from(n)
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("prefix length {n} is too large"))),
    }
}

/// Definition of an index. The name is validated on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawIndex")]
pub struct Index {
    name: String,
    columns: Vec<IndexColumn>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    unique: bool,
}

#[derive(Deserialize)]
struct RawIndex {
    name: String,
    columns: Vec<IndexColumn>,
    #[serde(default)]
    unique: bool,
}

impl TryFrom<RawIndex> for Index {
    type Error = SchemaError;

    fn try_from(raw: RawIndex) -> Result<Self> {
        let index = Self::new(raw.name, raw.columns)?;
        Ok(if raw.unique { index.unique() } else { index })
    }
}

impl Index {
    /// Creates an index over `columns`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidIdentifier`] if `name` is not a safe SQL
    /// identifier.
    pub fn new<C: Into<IndexColumn>>(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = C>,
    ) -> Result<Self> {
        let name = name.into();
        validate_identifier(&name)?;
        Ok(Self {
            name,
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
        })
    }

    /// Makes this a unique index.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Index name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Indexed columns, in index order.
    #[must_use]
    pub fn columns(&self) -> &[IndexColumn] {
        &self.columns
    }

    /// Whether this is a unique index.
    #[must_use]
    pub const fn is_unique(&self) -> bool {
        self.unique
    }
}

/// Complete structure of a table.
///
/// Columns keep their insertion order, which is the order they are emitted in.
/// Column and index names are unique within a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    /// Table name.
    #[serde(rename = "tableName")]
    pub name: String,
    /// Column definitions.
    pub columns: Vec<Column>,
    /// Index definitions.
    pub indexes: Vec<Index>,
}

#[derive(Deserialize)]
struct RawTable {
    #[serde(rename = "tableName")]
    name: String,
    columns: Vec<Column>,
    #[serde(default)]
    indexes: Vec<Index>,
}

impl TryFrom<RawTable> for Table {
    type Error = SchemaError;

    fn try_from(raw: RawTable) -> Result<Self> {
        let duplicate = |kind: &'static str, name: &str| SchemaError::DuplicateName {
            table: raw.name.clone(),
            kind,
            name: name.to_string(),
        };
        for (i, column) in raw.columns.iter().enumerate() {
            if raw.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(duplicate("column", &column.name));
            }
        }
        for (i, index) in raw.indexes.iter().enumerate() {
            if raw.indexes[..i].iter().any(|x| x.name == index.name) {
                return Err(duplicate("index", &index.name));
            }
        }
        Ok(Self {
            name: raw.name,
            columns: raw.columns,
            indexes: raw.indexes,
        })
    }
}

impl Table {
    /// Creates an empty table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Adds a column, replacing any column of the same name in place.
    #[must_use]
    pub fn column(mut self, column: impl Into<Column>) -> Self {
        let column = column.into();
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        self
    }

    /// Adds an index, replacing any index of the same name in place.
    #[must_use]
    pub fn index(mut self, index: Index) -> Self {
        match self.indexes.iter_mut().find(|i| i.name == index.name) {
            Some(existing) => *existing = index,
            None => self.indexes.push(index),
        }
        self
    }

    /// Gets a column by name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Gets an index by name.
    #[must_use]
    pub fn get_index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// Primary key columns, in column order.
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.primary_key)
    }

    /// The column that carries an inline `PRIMARY KEY`, if any.
    ///
    /// That is the case only when the table has exactly one key column and
    /// it auto-increments; every other key goes into a trailing
    /// `PRIMARY KEY (...)` clause.
    #[must_use]
    pub fn inline_primary_key(&self) -> Option<&Column> {
        let mut keys = self.primary_key_columns();
        match (keys.next(), keys.next()) {
            (Some(only), None) if only.auto_increment => Some(only),
            _ => None,
        }
    }

    /// Primary key columns for the trailing `PRIMARY KEY (...)` clause.
    #[must_use]
    pub fn trailing_primary_key(&self) -> Vec<&str> {
        if self.inline_primary_key().is_some() {
            return Vec::new();
        }
        self.primary_key_columns().map(|c| c.name.as_str()).collect()
    }
}
