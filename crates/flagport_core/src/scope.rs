//! Serialized scope codec.
//!
//! # Responsibility
//! - Decode the persisted scope grammar into a context identity.
//! - Encode identities back into the same grammar for persistence.
//!
//! # Invariants
//! - Decoding is total: every string input yields exactly one identity.
//! - Only the first separator occurrence splits tag from id; the id keeps
//!   any further separator characters unchanged.

use crate::model::context::RawContextIdentity;

/// Scope literal marking a global (context-free) feature value.
pub const GLOBAL_SCOPE: &str = "null";

/// Separator between the entity type tag and the entity id.
pub const ENTITY_SEPARATOR: char = '|';

/// Decodes a serialized scope string into a raw context identity.
///
/// Grammar, checked in order:
/// - the literal `"null"` decodes to [`RawContextIdentity::Global`];
/// - any string containing `|` splits at the first occurrence into an
///   [`RawContextIdentity::Entity`] tag/id pair, even when the input was
///   not intended as one;
/// - everything else decodes to [`RawContextIdentity::Plain`].
pub fn decode(serialized: &str) -> RawContextIdentity {
    if serialized == GLOBAL_SCOPE {
        return RawContextIdentity::Global;
    }

    match serialized.split_once(ENTITY_SEPARATOR) {
        Some((tag, id)) => RawContextIdentity::Entity {
            tag: tag.to_string(),
            id: id.to_string(),
        },
        None => RawContextIdentity::Plain(serialized.to_string()),
    }
}

/// Encodes a raw context identity back into its serialized scope string.
///
/// Inverse of [`decode`] for every identity `decode` can produce.
pub fn encode(identity: &RawContextIdentity) -> String {
    match identity {
        RawContextIdentity::Global => GLOBAL_SCOPE.to_string(),
        RawContextIdentity::Entity { tag, id } => format!("{tag}{ENTITY_SEPARATOR}{id}"),
        RawContextIdentity::Plain(label) => label.clone(),
    }
}
