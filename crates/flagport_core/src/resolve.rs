//! Context resolution collaborators.
//!
//! # Responsibility
//! - Define the resolver contract mapping raw identities to store-ready
//!   contexts.
//! - Provide a tag-keyed registry of entity resolver capabilities, so no
//!   entity class is ever hard-coded into the codec or the engine.
//!
//! # Invariants
//! - Plain identities resolve to themselves without any lookup.
//! - Global identities never reach a resolver; the engine routes them to
//!   the driver's set-for-all-contexts path.
//! - `Ok(None)` means "identity is well-formed but no such context exists";
//!   the engine treats it as a per-context failure.

use crate::model::context::{RawContextIdentity, ResolvedContext};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Context lookup failure. Non-fatal to the run; recorded per context.
#[derive(Debug)]
pub enum ResolveError {
    UnknownTag(String),
    InvalidEntityTable(String),
    Sqlite(rusqlite::Error),
    /// Non-sqlite lookup failure, kept as a plain message.
    Backend(String),
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTag(tag) => write!(f, "no resolver registered for tag `{tag}`"),
            Self::InvalidEntityTable(table) => write!(f, "invalid entity table name `{table}`"),
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Backend(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ResolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnknownTag(_) | Self::InvalidEntityTable(_) | Self::Backend(_) => None,
        }
    }
}

impl From<rusqlite::Error> for ResolveError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Maps a raw context identity to a store-ready context.
pub trait ContextResolver {
    /// Resolves one identity. `Ok(None)` is an explicit not-found result.
    fn resolve(
        &self,
        identity: &RawContextIdentity,
    ) -> Result<Option<ResolvedContext>, ResolveError>;
}

/// Resolves one kind of entity by its opaque id.
pub trait EntityResolver {
    fn resolve_entity(&self, id: &str) -> Result<Option<ResolvedContext>, ResolveError>;
}

/// Tag-keyed registry of entity resolver capabilities.
///
/// Plain identities pass through unresolved; entity identities dispatch to
/// the resolver registered for their tag.
#[derive(Default)]
pub struct TagResolverRegistry<'r> {
    resolvers: BTreeMap<String, Box<dyn EntityResolver + 'r>>,
}

impl<'r> TagResolverRegistry<'r> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one entity resolver for a scope tag, replacing any
    /// previous registration for the same tag.
    pub fn register(&mut self, tag: impl Into<String>, resolver: impl EntityResolver + 'r) {
        self.resolvers.insert(tag.into(), Box::new(resolver));
    }

    /// Returns sorted registered tags.
    pub fn tags(&self) -> Vec<&str> {
        self.resolvers.keys().map(String::as_str).collect()
    }
}

impl ContextResolver for TagResolverRegistry<'_> {
    fn resolve(
        &self,
        identity: &RawContextIdentity,
    ) -> Result<Option<ResolvedContext>, ResolveError> {
        match identity {
            // Globals are handled by the driver path; a registry lookup for
            // one is a caller bug, answered as not-found rather than panic.
            RawContextIdentity::Global => Ok(None),
            RawContextIdentity::Plain(label) => Ok(Some(ResolvedContext::plain(label.clone()))),
            RawContextIdentity::Entity { tag, id } => match self.resolvers.get(tag) {
                Some(resolver) => resolver.resolve_entity(id),
                None => Err(ResolveError::UnknownTag(tag.clone())),
            },
        }
    }
}

/// Entity resolver confirming existence against a SQLite table.
///
/// Produces `Entity { kind, key }` contexts when a row with the given id
/// exists in the configured table.
pub struct SqliteEntityResolver<'conn> {
    conn: &'conn Connection,
    table: String,
    kind: String,
}

impl<'conn> SqliteEntityResolver<'conn> {
    /// # Errors
    /// Rejects table names unusable as SQL identifiers.
    pub fn try_new(
        conn: &'conn Connection,
        table: impl Into<String>,
        kind: impl Into<String>,
    ) -> Result<Self, ResolveError> {
        let table = table.into();
        if !is_valid_identifier(&table) {
            return Err(ResolveError::InvalidEntityTable(table));
        }
        Ok(Self {
            conn,
            table,
            kind: kind.into(),
        })
    }
}

impl EntityResolver for SqliteEntityResolver<'_> {
    fn resolve_entity(&self, id: &str) -> Result<Option<ResolvedContext>, ResolveError> {
        let exists: Option<i64> = self
            .conn
            .query_row(
                &format!("SELECT 1 FROM {} WHERE id = ?1;", self.table),
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(exists.map(|_| ResolvedContext::entity(self.kind.clone(), id)))
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

#[cfg(test)]
mod tests {
    use super::{ContextResolver, EntityResolver, ResolveError, TagResolverRegistry};
    use crate::model::context::{RawContextIdentity, ResolvedContext};

    struct FixedResolver {
        known_id: &'static str,
    }

    impl EntityResolver for FixedResolver {
        fn resolve_entity(&self, id: &str) -> Result<Option<ResolvedContext>, ResolveError> {
            if id == self.known_id {
                Ok(Some(ResolvedContext::entity("user", id)))
            } else {
                Ok(None)
            }
        }
    }

    #[test]
    fn plain_identity_passes_through() {
        let registry = TagResolverRegistry::new();
        let resolved = registry
            .resolve(&RawContextIdentity::Plain("team-42".to_string()))
            .unwrap();
        assert_eq!(resolved, Some(ResolvedContext::plain("team-42")));
    }

    #[test]
    fn entity_identity_dispatches_by_tag() {
        let mut registry = TagResolverRegistry::new();
        registry.register("App\\User", FixedResolver { known_id: "7" });

        let found = registry
            .resolve(&RawContextIdentity::Entity {
                tag: "App\\User".to_string(),
                id: "7".to_string(),
            })
            .unwrap();
        assert_eq!(found, Some(ResolvedContext::entity("user", "7")));

        let missing = registry
            .resolve(&RawContextIdentity::Entity {
                tag: "App\\User".to_string(),
                id: "8".to_string(),
            })
            .unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn unregistered_tag_is_an_error() {
        let registry = TagResolverRegistry::new();
        let err = registry
            .resolve(&RawContextIdentity::Entity {
                tag: "App\\Team".to_string(),
                id: "1".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnknownTag(tag) if tag == "App\\Team"));
    }

    #[test]
    fn global_identity_is_never_resolved() {
        let registry = TagResolverRegistry::new();
        assert_eq!(registry.resolve(&RawContextIdentity::Global).unwrap(), None);
    }
}
