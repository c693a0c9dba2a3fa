//! # Query Module
//!
//! Selector queries shared by `Graph` and `Collection`.
//!
//! A query maps selector keys to one expected value or a list of them.
//! - `type` is compared against an entity's full type chain
//! - any other key is compared against the stored property value
//!
//! Within one key the expected values are alternatives (OR). Across keys
//! every selector must match (AND). Matching is a full scan: declared index
//! hints are never consulted.

use crate::collection::Collection;
use crate::entity::{Entity, Host, PropertyValue};
use crate::primitives::TYPE_KEY;
use crate::schema::TypeNode;
use crate::{GraphError, NodeId, Record, Value};
use std::borrow::Cow;
use std::cmp::Ordering;
use tracing::trace;

/// A selector query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    selectors: Record,
}

impl Query {
    /// Create an empty query. It matches every candidate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Query for entities whose type chain contains `type_id`.
    #[must_use]
    pub fn of_type(type_id: impl Into<String>) -> Self {
        Self::new().with(TYPE_KEY, Value::String(type_id.into()))
    }

    /// Add (or replace) a selector. Pass a `Value::Array` for alternatives.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, expected: impl Into<Value>) -> Self {
        self.selectors.insert(key.into(), expected.into());
        self
    }

    /// Read a query from a JSON object.
    pub fn from_value(value: Value) -> Result<Self, GraphError> {
        match value {
            Value::Object(selectors) => Ok(Self { selectors }),
            other => Err(GraphError::InvalidQuery(format!(
                "expected an object of selectors, got {}",
                other
            ))),
        }
    }

    /// The first type identifier named by the `type` selector.
    #[must_use]
    pub fn type_id(&self) -> Option<&str> {
        match self.selectors.get(TYPE_KEY)? {
            Value::String(id) => Some(id),
            Value::Array(ids) => ids.first().and_then(Value::as_str),
            _ => None,
        }
    }

    /// Constrain the query to a single type, replacing any `type` selector.
    pub fn set_type(&mut self, type_id: &NodeId) {
        self.selectors
            .insert(TYPE_KEY.to_string(), type_id.clone().into());
    }

    /// Iterate selectors in insertion order.
    pub fn selectors(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.selectors.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Whether `entity` satisfies every selector.
    #[must_use]
    pub fn matches(&self, entity: &Entity) -> bool {
        self.selectors.iter().all(|(key, expected)| {
            let wanted = alternatives(expected);
            if key == TYPE_KEY {
                entity.type_chain().iter().any(|id| names_any(wanted, id))
            } else {
                entity
                    .property(key)
                    .is_some_and(|stored| stored_matches(stored, wanted))
            }
        })
    }
}

/// A scalar expectation is a one-element list of alternatives.
fn alternatives(expected: &Value) -> &[Value] {
    match expected {
        Value::Array(items) => items,
        single => std::slice::from_ref(single),
    }
}

/// Whether any stored value (a list property is flattened) is wanted.
fn stored_matches(stored: &PropertyValue, wanted: &[Value]) -> bool {
    match stored {
        PropertyValue::Literal(Value::Array(items)) | PropertyValue::Literals(items) => {
            items.iter().any(|value| contains(wanted, value))
        }
        PropertyValue::Literal(value) => contains(wanted, value),
        PropertyValue::Link(id) => names_any(wanted, id),
        PropertyValue::Links(ids) => ids.iter().any(|id| names_any(wanted, id)),
    }
}

fn names_any(wanted: &[Value], id: &NodeId) -> bool {
    wanted.iter().any(|w| w.as_str() == Some(id.as_str()))
}

fn contains(wanted: &[Value], value: &Value) -> bool {
    wanted.iter().any(|w| values_equal(w, value))
}

/// Strict equality, except that numbers compare by value: `3` equals `3.0`.
fn values_equal(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(a), Value::Number(b)) if a != b => {
            (a.is_f64() || b.is_f64())
                && matches!(
                    (a.as_f64(), b.as_f64()),
                    (Some(x), Some(y)) if x.partial_cmp(&y) == Some(Ordering::Equal)
                )
        }
        _ => expected == actual,
    }
}

/// Run `query` over `candidates` and box the matches as a `Collection`.
///
/// The result borrows its members and its type from `host`; nothing is
/// copied. It is typed with `host`'s resolution of the query's `type`
/// selector. When that does not resolve, an empty type carrying the
/// requested identifier stands in. Matches keep candidate order.
pub fn select<'a, H, I>(host: &'a H, candidates: I, query: &Query) -> Collection<'a>
where
    H: Host,
    I: IntoIterator<Item = &'a Entity>,
{
    let type_node = match query.type_id().and_then(|id| host.type_node(id)) {
        Some(found) => Cow::Borrowed(found),
        None => Cow::Owned(TypeNode::new(query.type_id().unwrap_or_default(), "")),
    };

    let matched: Vec<Cow<'a, Entity>> = candidates
        .into_iter()
        .filter(|entity| query.matches(entity))
        .map(Cow::Borrowed)
        .collect();

    trace!(
        type_id = %type_node.id,
        selectors = query.selectors.len(),
        matched = matched.len(),
        "query scan complete"
    );
    Collection::create(type_node, matched)
}

// =============================================================================
// TESTS
// =============================================================================
