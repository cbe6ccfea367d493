//! Shared migration engine over injected collaborators.

use crate::driver::FlagDriver;
use crate::migrate::{MigrateError, Migrator, SourceSchema};
use crate::model::context::RawContextIdentity;
use crate::model::record::{FlagRecord, SourceRow};
use crate::resolve::ContextResolver;
use crate::scope;
use crate::source::{fetch_grouped, SourceConnection};
use crate::stats::MigrationStats;
use log::{error, info, warn};
use std::marker::PhantomData;

/// Context descriptor used when a record is too malformed to carry one.
const UNKNOWN_CONTEXT: &str = "unknown";

/// Outcome of one failed record, consumed by the per-feature loop.
struct RecordFailure {
    context: String,
    reason: String,
}

impl RecordFailure {
    fn new(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            reason: reason.into(),
        }
    }
}

/// One source-format migration pipeline over injected collaborators.
///
/// The schema parameter `S` selects the legacy table layout and value
/// decoder; connection, resolver, and driver are external collaborators,
/// injected as trait implementations.
pub struct MigrationEngine<S, C, R, D> {
    connection: C,
    resolver: R,
    driver: D,
    stats: MigrationStats,
    _schema: PhantomData<S>,
}

impl<S, C, R, D> MigrationEngine<S, C, R, D>
where
    S: SourceSchema,
    C: SourceConnection,
    R: ContextResolver,
    D: FlagDriver,
{
    pub fn new(connection: C, resolver: R, driver: D) -> Self {
        Self {
            connection,
            resolver,
            driver,
            stats: MigrationStats::new(),
            _schema: PhantomData,
        }
    }

    /// Migrates one record. The returned failure carries the context
    /// descriptor and reason the caller turns into an error entry.
    fn migrate_record(&self, feature: &str, row: &SourceRow) -> Result<(), RecordFailure> {
        let record = FlagRecord::from_row(row, S::SCOPE_COLUMN, S::VALUE_COLUMN)
            .map_err(|err| RecordFailure::new(UNKNOWN_CONTEXT, err.to_string()))?;

        let value = S::decode_value(&record.value)
            .map_err(|err| RecordFailure::new(&record.scope, format!("invalid value: {err}")))?;

        match scope::decode(&record.scope) {
            RawContextIdentity::Global => self
                .driver
                .set_for_all_contexts(feature, &value)
                .map_err(|err| RecordFailure::new(&record.scope, err.to_string())),
            identity => {
                let resolved = self
                    .resolver
                    .resolve(&identity)
                    .map_err(|err| RecordFailure::new(&record.scope, err.to_string()))?
                    .ok_or_else(|| RecordFailure::new(&record.scope, "context not found"))?;

                self.driver
                    .set(feature, &resolved, &value)
                    .map_err(|err| RecordFailure::new(&record.scope, err.to_string()))
            }
        }
    }

    /// Migrates every record of one feature. Returns whether at least one
    /// context was migrated.
    fn migrate_feature(&mut self, feature: &str, rows: &[SourceRow]) -> bool {
        let mut migrated = 0u32;

        for row in rows {
            match self.migrate_record(feature, row) {
                Ok(()) => {
                    migrated += 1;
                    self.stats.record_context();
                }
                Err(failure) => {
                    warn!(
                        "event=context_migrate module=migrate status=error feature={feature} context={} reason={}",
                        failure.context, failure.reason
                    );
                    self.stats.record_error(format!(
                        "Failed to migrate context '{}' for feature '{}': {}",
                        failure.context, feature, failure.reason
                    ));
                }
            }
        }

        migrated > 0
    }
}

impl<S, C, R, D> Migrator for MigrationEngine<S, C, R, D>
where
    S: SourceSchema,
    C: SourceConnection,
    R: ContextResolver,
    D: FlagDriver,
{
    fn migrate(&mut self) -> Result<(), MigrateError> {
        self.stats.reset();
        info!(
            "event=migrate_run module=migrate status=start table={}",
            S::TABLE
        );

        let groups = match fetch_grouped(&self.connection, S::TABLE, S::NAME_COLUMN) {
            Ok(groups) => groups,
            Err(err) => {
                error!(
                    "event=migrate_run module=migrate status=error table={} error={err}",
                    S::TABLE
                );
                self.stats.record_error(format!("Migration failed: {err}"));
                return Err(MigrateError::Fetch(err));
            }
        };

        for (feature, rows) in &groups {
            if self.migrate_feature(feature, rows) {
                self.stats.record_feature();
            } else {
                // Per-context errors are already recorded; the feature is
                // simply not counted and the run moves on.
                warn!(
                    "event=feature_migrate module=migrate status=error feature={feature} reason=no_contexts_migrated"
                );
            }
        }

        info!(
            "event=migrate_run module=migrate status=ok table={} features={} contexts={} errors={}",
            S::TABLE,
            self.stats.features,
            self.stats.contexts,
            self.stats.errors.len()
        );
        Ok(())
    }

    fn statistics(&self) -> &MigrationStats {
        &self.stats
    }
}
