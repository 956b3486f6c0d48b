//! Error types for the engine.
//!
//! All public APIs return `EngineResult<T>` — no panics in library code.

use thiserror::Error;

/// Unified error type for all engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The statement text could not be tokenized or did not match any grammar rule.
    #[error("parse error: {0}")]
    Parse(String),

    /// A statement other than `CREATE DATABASE` / `USE` was issued with no database selected.
    #[error("no database selected")]
    NoDatabaseSelected,

    /// `USE` named a database that was never created.
    #[error("database '{0}' not found")]
    UnknownDatabase(String),

    /// Referenced a table that does not exist in the current database.
    #[error("table '{0}' not found")]
    UnknownTable(String),

    /// Referenced a column that does not exist on a table.
    #[error("column '{column}' not found on table '{table}'")]
    UnknownColumn { table: String, column: String },

    /// Insert would create a second row with the same primary-key value.
    #[error("duplicate primary key value on table '{table}'")]
    DuplicatePrimaryKey { table: String },

    /// `ADD TABLE` declared two columns with the same name.
    #[error("column '{column}' already exists on table '{table}'")]
    DuplicateColumn { table: String, column: String },

    /// A foreign key points at a table that does not exist.
    #[error("foreign key on '{table}.{column}' references missing table '{referenced_table}'")]
    MissingReferencedTable {
        table: String,
        column: String,
        referenced_table: String,
    },

    /// A foreign key points at a column that does not exist on the referenced table.
    #[error(
        "foreign key on '{table}.{column}' references missing column '{referenced_table}.{referenced_column}'"
    )]
    MissingReferencedColumn {
        table: String,
        column: String,
        referenced_table: String,
        referenced_column: String,
    },

    /// A foreign-key value has no matching row in the referenced table.
    #[error("foreign key violation on '{table}.{column}'")]
    ForeignKeyViolation { table: String, column: String },

    /// Delete/update referenced a primary-key value with no matching row.
    #[error("row with primary key not found in table '{0}'")]
    RowNotFound(String),

    /// `REMOVE`/`UPDATE`'s `WHERE` clause named a column that isn't the
    /// table's primary key.
    #[error("column '{column}' on table '{table}' is not the primary key; WHERE must name it")]
    NotPrimaryKeyColumn { table: String, column: String },

    /// `ADD TABLE` declared a second `PRIMARY_KEY` column.
    #[error("table '{0}' can only have one primary key")]
    DuplicatePrimaryKeyColumn(String),

    /// The binary database file failed a structural sanity check.
    #[error("corrupt database file: {0}")]
    CorruptFile(String),

    /// Standard I/O error surfaced while loading or saving a database file.
    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// Result type alias for all engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
