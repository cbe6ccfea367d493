//! Core migration engine for feature-flag state.
//!
//! Moves per-context feature-flag values from legacy storage schemas into
//! the target flag store, isolating failures to single contexts and
//! producing run-scoped statistics. This crate is the single source of
//! truth for the pipeline's failure-isolation invariants.

pub mod db;
pub mod driver;
pub mod logging;
pub mod migrate;
pub mod model;
pub mod resolve;
pub mod scope;
pub mod source;
pub mod stats;

pub use driver::{DriverError, FlagDriver, SqliteFlagDriver};
pub use logging::{default_log_level, init_logging, logging_status};
pub use migrate::{
    FeatureFlagsMigrator, FeatureFlagsSchema, FeatureStatesMigrator, FeatureStatesSchema,
    MigrateError, MigrationEngine, Migrator, SourceSchema,
};
pub use model::context::{RawContextIdentity, ResolvedContext};
pub use model::record::{FlagRecord, RecordError, SourceRow};
pub use resolve::{
    ContextResolver, EntityResolver, ResolveError, SqliteEntityResolver, TagResolverRegistry,
};
pub use source::{fetch_grouped, SourceConnection, SourceError, SqliteSourceConnection};
pub use stats::MigrationStats;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
