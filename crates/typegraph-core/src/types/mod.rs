//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the typed object graph:
//! - Node identifiers (`NodeId`)
//! - Exchange values and records (`Value`, `Record`)
//! - Accepted property kinds (`ValueKind`)
//! - Error types (`GraphError`)
//!
//! ## Exchange Values
//!
//! Property values are carried as `serde_json::Value`. The workspace enables
//! `preserve_order`, so a `Record` iterates in insertion order. `Graph::merge`
//! relies on this to apply records in the order they were supplied.

use crate::primitives::TYPE_PREFIX;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use thiserror::Error;

pub use serde_json::Value;

/// A single exchange record: property name -> raw value.
pub type Record = serde_json::Map<String, Value>;

// =============================================================================
// NODE IDENTIFIER
// =============================================================================

/// Identifier of a node (TypeNode or Entity).
///
/// Types and entities share one namespace inside a `Graph`. Type identifiers
/// are conventionally paths under `/type/`, e.g. `/type/person`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a new identifier from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last `/`-separated segment: `person` for `/type/person`.
    #[must_use]
    pub fn last_segment(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Whether this identifier lives under the reserved `/type/` path.
    #[must_use]
    pub fn is_type_path(&self) -> bool {
        self.0.starts_with(TYPE_PREFIX)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Value::String(id.0)
    }
}

// =============================================================================
// VALUE KIND
// =============================================================================

/// One accepted kind of a property declaration.
///
/// The five value kinds hold literals. Any other tag is read as the
/// identifier of a type, meaning "reference to an entity of that type".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    Date,
    Object,
    Reference(NodeId),
}

impl ValueKind {
    /// Parse a kind tag. Unknown tags are type references.
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        match tag {
            "string" => Self::String,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "date" => Self::Date,
            "object" => Self::Object,
            other => Self::Reference(NodeId::new(other)),
        }
    }

    /// The tag as it appears in exchange records.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Object => "object",
            Self::Reference(id) => id.as_str(),
        }
    }

    /// True for the literal kinds (see `primitives::VALUE_TYPES`).
    #[must_use]
    pub fn is_value(&self) -> bool {
        !matches!(self, Self::Reference(_))
    }
}

impl From<String> for ValueKind {
    fn from(tag: String) -> Self {
        Self::parse(&tag)
    }
}

impl From<ValueKind> for String {
    fn from(kind: ValueKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised at the exchange-format and application boundaries.
///
/// Domain operations on `Graph`, `Collection` and `Entity` never fail: unknown
/// identifiers yield `None` and undeclared properties are dropped. Only
/// decoding, encoding and I/O return `Result<T, GraphError>`.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// A document parsed as JSON but does not have the exchange shape.
    #[error("Malformed exchange record: {0}")]
    MalformedRecord(String),

    /// A query specification is not a selector object.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A requested node does not exist.
    #[error("Node not found: {0}")]
    NotFound(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
