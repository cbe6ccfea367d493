//! Target feature-flag store write interface.
//!
//! # Responsibility
//! - Define the driver contract the migration engine writes through.
//! - Provide the SQLite implementation over the target `flags` table.
//!
//! # Invariants
//! - One row per `(feature, scope)` pair in the target table; repeated
//!   writes for the same pair overwrite the value.
//! - A global write rewrites the value of every existing per-context row
//!   for that feature in addition to upserting the global row.

use crate::model::context::ResolvedContext;
use crate::scope::GLOBAL_SCOPE;
use rusqlite::{params, Connection};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Target store write failure. Non-fatal to the run; recorded per context.
#[derive(Debug)]
pub enum DriverError {
    Sqlite(rusqlite::Error),
    Encode(serde_json::Error),
    /// Non-sqlite backend failure, kept as a plain message.
    Backend(String),
}

impl Display for DriverError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "could not encode flag value: {err}"),
            Self::Backend(message) => write!(f, "{message}"),
        }
    }
}

impl Error for DriverError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Backend(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DriverError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for DriverError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Write interface of the target feature-flag store.
pub trait FlagDriver {
    /// Sets the feature value for one resolved context.
    fn set(
        &self,
        feature: &str,
        context: &ResolvedContext,
        value: &Value,
    ) -> Result<(), DriverError>;

    /// Sets the global feature value, applying to every context.
    fn set_for_all_contexts(&self, feature: &str, value: &Value) -> Result<(), DriverError>;
}

/// SQLite-backed driver writing into the target `flags` table.
pub struct SqliteFlagDriver<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFlagDriver<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn upsert(&self, feature: &str, scope: &str, value: &Value) -> Result<(), DriverError> {
        self.conn.execute(
            "INSERT INTO flags (feature, scope, value)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (feature, scope) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![feature, scope, serde_json::to_string(value)?],
        )?;
        Ok(())
    }
}

impl FlagDriver for SqliteFlagDriver<'_> {
    fn set(
        &self,
        feature: &str,
        context: &ResolvedContext,
        value: &Value,
    ) -> Result<(), DriverError> {
        self.upsert(feature, &context.scope_string(), value)
    }

    fn set_for_all_contexts(&self, feature: &str, value: &Value) -> Result<(), DriverError> {
        // Existing per-context rows pick up the new value as well; the
        // global row then covers every context seen later.
        self.conn.execute(
            "UPDATE flags
             SET value = ?1, updated_at = (strftime('%s', 'now') * 1000)
             WHERE feature = ?2;",
            params![serde_json::to_string(value)?, feature],
        )?;
        self.upsert(feature, GLOBAL_SCOPE, value)
    }
}
