//! Domain model for migrated feature-flag data.
//!
//! # Responsibility
//! - Define the validated record shape read from legacy tables.
//! - Define context identities before and after resolution.
//!
//! # Invariants
//! - A `FlagRecord` only exists after structural validation succeeded.
//! - Context identity decoding is total; resolution is the only fallible step.

pub mod context;
pub mod record;
