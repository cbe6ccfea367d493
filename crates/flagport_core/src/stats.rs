//! Run-scoped migration statistics.
//!
//! # Responsibility
//! - Count migrated features and contexts during one migration run.
//! - Keep an ordered log of human-readable failure descriptions.
//!
//! # Invariants
//! - `features` only counts features with at least one migrated context.
//! - Every `migrate()` call starts from a zeroed accumulator; statistics
//!   never accumulate across runs.

use serde::Serialize;

/// Counters and error log for a single migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationStats {
    /// Features with at least one successfully migrated context.
    pub features: u32,
    /// Successfully migrated individual records across all features.
    pub contexts: u32,
    /// One entry per failed context, plus one for a fatal run failure.
    pub errors: Vec<String>,
}

impl MigrationStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zeroes all counters and clears the error log.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub(crate) fn record_feature(&mut self) {
        self.features += 1;
    }

    pub(crate) fn record_context(&mut self) {
        self.contexts += 1;
    }

    pub(crate) fn record_error(&mut self, message: String) {
        self.errors.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::MigrationStats;

    #[test]
    fn fresh_stats_are_zeroed() {
        let stats = MigrationStats::new();
        assert_eq!(stats.features, 0);
        assert_eq!(stats.contexts, 0);
        assert!(stats.errors.is_empty());
        assert!(!stats.has_errors());
    }

    #[test]
    fn reset_clears_counters_and_errors() {
        let mut stats = MigrationStats::new();
        stats.record_feature();
        stats.record_context();
        stats.record_error("boom".to_string());

        stats.reset();
        assert_eq!(stats, MigrationStats::default());
    }

    #[test]
    fn errors_preserve_insertion_order() {
        let mut stats = MigrationStats::new();
        stats.record_error("first".to_string());
        stats.record_error("second".to_string());
        assert_eq!(stats.errors, vec!["first", "second"]);
    }
}
