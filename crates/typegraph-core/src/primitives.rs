//! # Reserved Primitives
//!
//! Fixed identifiers, record keys and limits of the typed object graph.
//! These are compiled in and never change at runtime.

/// Identifier of the type of types.
///
/// A record whose most specific type is this identifier becomes a `TypeNode`;
/// every other record becomes an `Entity`.
pub const TYPE_TYPE: &str = "/type/type";

/// Path prefix reserved for type identifiers.
///
/// A `Collection` answers any lookup under this prefix with its own type.
pub const TYPE_PREFIX: &str = "/type/";

/// Record key holding a node's identifier.
pub const ID_KEY: &str = "_id";

/// Record key holding a node's type chain.
pub const TYPE_KEY: &str = "type";

/// Property kinds that hold literals rather than references.
pub const VALUE_TYPES: [&str; 5] = ["string", "object", "number", "boolean", "date"];

/// Kind assumed for a declaration that names none.
pub const DEFAULT_VALUE_KIND: &str = "string";

/// Path segment used when an identifier is synthesized for an untyped record.
pub const UNTYPED_SEGMENT: &str = "node";

/// Length of the random token appended to synthesized identifiers.
pub const TOKEN_LENGTH: usize = 32;

/// Maximum size of an exchange document accepted by the JSON decoders.
///
/// Checked before parsing so an oversized input is rejected without allocating
/// its value tree.
pub const MAX_EXCHANGE_DOCUMENT_SIZE: usize = 256 * 1024 * 1024; // 256 MB

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_type_lives_under_type_prefix() {
        assert!(TYPE_TYPE.starts_with(TYPE_PREFIX));
    }

    #[test]
    fn default_kind_is_a_value_type() {
        assert!(VALUE_TYPES.contains(&DEFAULT_VALUE_KIND));
    }
}
