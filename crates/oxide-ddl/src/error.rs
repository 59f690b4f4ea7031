//! Error types for DDL generation and table rebuilds.

/// Errors that can occur while generating or applying schema changes.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// An identifier failed validation and cannot be embedded in SQL.
    #[error("Invalid identifier '{name}': {reason}")]
    InvalidIdentifier {
        /// The rejected identifier.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A table definition names the same column or index twice.
    #[error("Table '{table}' defines {kind} '{name}' more than once")]
    DuplicateName {
        /// Table being defined.
        table: String,
        /// `column` or `index`.
        kind: &'static str,
        /// The repeated name.
        name: String,
    },

    /// The alteration cannot be expressed by the selected dialect.
    #[error("Unsupported alteration of table '{table}': {reason}")]
    UnsupportedAlteration {
        /// Table being altered.
        table: String,
        /// What is missing or inconsistent.
        reason: String,
    },

    /// A rebuild was required but no connection was supplied to run it.
    #[error("Altering table '{0}' requires a table rebuild, which needs a database connection")]
    ConnectionRequired(String),

    /// The engine identifier does not name a known dialect.
    #[error("Unknown dialect: {0}")]
    UnknownDialect(String),

    /// Database error while running rebuild statements.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error (reading table or alteration files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SchemaError {
    pub(crate) fn unsupported(table: &str, reason: impl Into<String>) -> Self {
        Self::UnsupportedAlteration {
            table: table.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
