//! Legacy source table access and feature grouping.
//!
//! # Responsibility
//! - Define the connection contract the migration engine reads through.
//! - Read whole legacy tables into dynamically-typed rows.
//! - Group rows by feature name ahead of per-feature migration.
//!
//! # Invariants
//! - Table identifiers are validated before SQL interpolation.
//! - Rows without a string feature name are dropped at this stage, silently;
//!   they are not recognizable as feature records at all.

use crate::model::record::SourceRow;
use log::debug;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Source read failure. Always fatal to the run that hits it.
#[derive(Debug)]
pub enum SourceError {
    InvalidTableName(String),
    Sqlite(rusqlite::Error),
    /// Non-sqlite backend failure, kept as a plain message.
    Backend(String),
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTableName(table) => write!(f, "invalid source table name `{table}`"),
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Backend(message) => write!(f, "{message}"),
        }
    }
}

impl Error for SourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::InvalidTableName(_) | Self::Backend(_) => None,
        }
    }
}

impl From<rusqlite::Error> for SourceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Read access to a legacy source store.
pub trait SourceConnection {
    /// Returns every row of the named table with its native column typing
    /// preserved as JSON values.
    fn fetch_all(&self, table: &str) -> Result<Vec<SourceRow>, SourceError>;
}

/// SQLite-backed source connection.
pub struct SqliteSourceConnection<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSourceConnection<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SourceConnection for SqliteSourceConnection<'_> {
    fn fetch_all(&self, table: &str) -> Result<Vec<SourceRow>, SourceError> {
        if !is_valid_identifier(table) {
            return Err(SourceError::InvalidTableName(table.to_string()));
        }

        let mut stmt = self.conn.prepare(&format!("SELECT * FROM {table};"))?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut records = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut record = SourceRow::new();
            for (index, column) in columns.iter().enumerate() {
                record.insert(column.clone(), json_value(row.get_ref(index)?));
            }
            records.push(record);
        }

        Ok(records)
    }
}

fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(number) => Value::from(number),
        ValueRef::Real(number) => serde_json::Number::from_f64(number)
            .map_or(Value::Null, Value::Number),
        ValueRef::Text(text) => Value::String(String::from_utf8_lossy(text).into_owned()),
        // Blob columns never belong to a flag schema; keep the row, drop the payload.
        ValueRef::Blob(_) => Value::Null,
    }
}

fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Fetches every row of `table` and groups the recognizable ones by the
/// feature name held in `name_column`.
///
/// Rows whose name column is missing or not a string are dropped without an
/// error entry. Grouping order is deterministic by feature name; record
/// order within a group follows source row order.
///
/// # Errors
/// Propagates connection failures unchanged; the caller treats them as fatal.
pub fn fetch_grouped<C: SourceConnection>(
    connection: &C,
    table: &str,
    name_column: &str,
) -> Result<BTreeMap<String, Vec<SourceRow>>, SourceError> {
    let rows = connection.fetch_all(table)?;

    let mut groups: BTreeMap<String, Vec<SourceRow>> = BTreeMap::new();
    let mut dropped = 0usize;
    for row in rows {
        let Some(name) = row.get(name_column).and_then(Value::as_str) else {
            dropped += 1;
            continue;
        };
        groups.entry(name.to_string()).or_default().push(row);
    }

    if dropped > 0 {
        debug!(
            "event=fetch_grouped module=source status=ok table={table} dropped_rows={dropped}"
        );
    }

    Ok(groups)
}
