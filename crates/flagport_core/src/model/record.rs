//! Validated record view over dynamically-typed source rows.
//!
//! # Responsibility
//! - Keep one explicit validation step between raw rows and migration logic.
//! - Name the exact structural requirement: scope and value must be strings.
//!
//! # Invariants
//! - A constructed `FlagRecord` always holds string scope and value fields.
//! - Validation never inspects columns beyond the ones it is given.

use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One dynamically-typed row read from a legacy source table.
///
/// Column names map to JSON values converted from the row's native types;
/// the core only ever inspects the three columns named by a source schema.
pub type SourceRow = serde_json::Map<String, Value>;

/// Structural violation found while validating a source row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    MissingColumn(&'static str),
    NotAString(&'static str),
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingColumn(column) => write!(f, "missing column `{column}`"),
            Self::NotAString(column) => write!(f, "column `{column}` is not a string"),
        }
    }
}

impl Error for RecordError {}

/// Validated per-record view of a source row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagRecord {
    /// Serialized context scope, still undecoded.
    pub scope: String,
    /// Raw value payload, still undecoded.
    pub value: String,
}

impl FlagRecord {
    /// Validates one source row against the given scope/value column names.
    ///
    /// # Errors
    /// - `MissingColumn` when a required column is absent.
    /// - `NotAString` when a required column holds a non-string value.
    pub fn from_row(
        row: &SourceRow,
        scope_column: &'static str,
        value_column: &'static str,
    ) -> Result<Self, RecordError> {
        Ok(Self {
            scope: require_string(row, scope_column)?,
            value: require_string(row, value_column)?,
        })
    }
}

fn require_string(row: &SourceRow, column: &'static str) -> Result<String, RecordError> {
    match row.get(column) {
        None => Err(RecordError::MissingColumn(column)),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(_) => Err(RecordError::NotAString(column)),
    }
}
