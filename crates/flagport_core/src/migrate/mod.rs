//! Migration pipeline: contract, source schemas, and the shared engine.
//!
//! # Responsibility
//! - Define the public `Migrator` contract exposed to orchestration.
//! - Implement the per-feature, per-record migration pipeline once, shared
//!   across all supported legacy source formats.
//!
//! # Invariants
//! - The failure isolation unit is a single context; one bad record never
//!   aborts its feature or the run.
//! - Only a source fetch failure crosses the `migrate()` boundary as an
//!   error; everything else becomes a statistics entry.

use crate::source::SourceError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod engine;
mod schemas;

pub use engine::MigrationEngine;
pub use schemas::{FeatureFlagsSchema, FeatureStatesSchema, SourceSchema};

/// Engine over the legacy `feature_flags` table format.
pub type FeatureFlagsMigrator<C, R, D> = MigrationEngine<FeatureFlagsSchema, C, R, D>;

/// Engine over the legacy `feature_states` table format.
pub type FeatureStatesMigrator<C, R, D> = MigrationEngine<FeatureStatesSchema, C, R, D>;

/// Fatal migration failure. Per-context failures never surface here; they
/// are absorbed into the run statistics instead.
#[derive(Debug)]
pub enum MigrateError {
    Fetch(SourceError),
}

impl Display for MigrateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch(err) => write!(f, "could not fetch source records: {err}"),
        }
    }
}

impl Error for MigrateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fetch(err) => Some(err),
        }
    }
}

/// Public contract of one source-format migration pipeline.
pub trait Migrator {
    /// Runs the migration once, from a freshly zeroed statistics state.
    ///
    /// # Errors
    /// Returns an error only for unrecoverable top-level failures (the
    /// source fetch); partial statistics remain readable afterwards.
    fn migrate(&mut self) -> Result<(), MigrateError>;

    /// Returns the statistics of the current (or last) run. Callable at
    /// any time, including after a fatal failure.
    fn statistics(&self) -> &crate::stats::MigrationStats;
}
