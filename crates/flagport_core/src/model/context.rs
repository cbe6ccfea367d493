//! Context identity model.
//!
//! # Responsibility
//! - Represent the decoded form of a serialized scope string.
//! - Represent the store-ready context produced by resolution.
//!
//! # Invariants
//! - `RawContextIdentity` covers every possible scope string (decode is total).
//! - `ResolvedContext` never represents the global case; global values bypass
//!   resolution and go through the driver's set-for-all-contexts path.

use serde::{Deserialize, Serialize};

/// Decoded identity of a serialized scope string.
///
/// Produced by [`crate::scope::decode`], which is total over all inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawContextIdentity {
    /// The literal `"null"` scope: a global value applying to every context.
    Global,
    /// An entity-scoped context: a type tag plus an opaque entity id.
    ///
    /// Only the first separator in the scope string is significant; any
    /// further separator characters stay inside `id` untouched.
    Entity { tag: String, id: String },
    /// A plain string context label.
    Plain(String),
}

/// Store-ready context produced by the resolution collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ResolvedContext {
    /// A plain label context, passed through resolution unchanged.
    Plain { label: String },
    /// A resolved entity context with its kind and stable key.
    Entity { kind: String, key: String },
}

impl ResolvedContext {
    pub fn plain(label: impl Into<String>) -> Self {
        Self::Plain {
            label: label.into(),
        }
    }

    pub fn entity(kind: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Entity {
            kind: kind.into(),
            key: key.into(),
        }
    }

    /// Returns the scope string used when persisting this context.
    ///
    /// Plain contexts persist as their label; entity contexts persist as
    /// `<kind>|<key>`, the same grammar the source store used.
    pub fn scope_string(&self) -> String {
        match self {
            Self::Plain { label } => label.clone(),
            Self::Entity { kind, key } => format!("{kind}{}{key}", crate::scope::ENTITY_SEPARATOR),
        }
    }
}
