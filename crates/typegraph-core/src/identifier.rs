//! # Identifier Synthesis
//!
//! Identifiers assigned to records that arrive without `_id`.
//!
//! Format: `"/" + <last segment of the most specific type> + "/" + <token>`,
//! for example `/person/0f9c2d6e4b8a4c1e9d7f3a5b6c8e0d21`.
//!
//! The token is a v4 UUID in simple form: 32 lowercase hexadecimal
//! characters. Only near-certain uniqueness within one process is required.

use crate::NodeId;
use crate::primitives::UNTYPED_SEGMENT;
use uuid::Uuid;

/// Generate a fresh random token.
#[must_use]
pub fn token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// The `/<segment>/` prefix for identifiers of the given type.
#[must_use]
pub fn prefix_for(type_id: Option<&NodeId>) -> String {
    let segment = type_id.map_or(UNTYPED_SEGMENT, NodeId::last_segment);
    format!("/{}/", segment)
}

/// Synthesize an identifier for a record whose most specific type is `type_id`.
#[must_use]
pub fn synthesize(type_id: Option<&NodeId>) -> NodeId {
    NodeId(format!("{}{}", prefix_for(type_id), token()))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::TOKEN_LENGTH;
    use std::collections::BTreeSet;

    #[test]
    fn token_is_lowercase_hex_of_fixed_length() {
        let t = token();
        assert_eq!(t.len(), TOKEN_LENGTH);
        assert!(t.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn synthesized_id_uses_type_segment() {
        let id = synthesize(Some(&NodeId::new("/type/person")));
        assert!(id.as_str().starts_with("/person/"));
        assert_eq!(id.last_segment().len(), TOKEN_LENGTH);
    }

    #[test]
    fn untyped_records_get_fallback_segment() {
        assert_eq!(prefix_for(None), "/node/");
    }

    #[test]
    fn tokens_do_not_repeat() {
        let tokens: BTreeSet<_> = (0..1000).map(|_| token()).collect();
        assert_eq!(tokens.len(), 1000);
    }
}
