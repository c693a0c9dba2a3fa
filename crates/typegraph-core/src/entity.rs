//! # Entity
//!
//! Typed object instances and the `Host` seam they resolve through.
//!
//! An `Entity` never stores a link to its store. Every operation that needs
//! to resolve a type or dereference another entity takes the host (a `Graph`
//! or a `Collection`) as an argument, so there are no reference cycles and
//! no shared ownership between entities and their store.
//!
//! Property values are checked against the schema once, when written, and
//! stored as a tagged `PropertyValue`. Reads dispatch on that tag.

use crate::primitives::{ID_KEY, TYPE_KEY};
use crate::schema::{PropertyDecl, TypeNode};
use crate::{NodeId, Record, Value};
use std::collections::BTreeMap;
use tracing::trace;

// =============================================================================
// HOST
// =============================================================================

/// A borrowed view of any node a host can resolve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Type(&'a TypeNode),
    Object(&'a Entity),
}

impl<'a> NodeRef<'a> {
    #[must_use]
    pub fn id(&self) -> &'a NodeId {
        match *self {
            Self::Type(t) => &t.id,
            Self::Object(e) => e.id(),
        }
    }

    #[must_use]
    pub fn as_type(self) -> Option<&'a TypeNode> {
        match self {
            Self::Type(t) => Some(t),
            Self::Object(_) => None,
        }
    }

    #[must_use]
    pub fn as_entity(self) -> Option<&'a Entity> {
        match self {
            Self::Object(e) => Some(e),
            Self::Type(_) => None,
        }
    }

    #[must_use]
    pub fn is_deleted(&self) -> bool {
        match self {
            Self::Type(t) => t.is_deleted(),
            Self::Object(e) => e.is_deleted(),
        }
    }

    /// Exchange record of the referenced node.
    #[must_use]
    pub fn serialize(&self) -> Record {
        match self {
            Self::Type(t) => t.serialize(),
            Self::Object(e) => e.serialize(),
        }
    }
}

/// A store that resolves identifiers for entities.
///
/// Implemented by `Graph` and `Collection`.
pub trait Host {
    /// Look up any node by identifier.
    fn get(&self, id: &str) -> Option<NodeRef<'_>>;

    /// Look up a type by identifier.
    fn type_node(&self, id: &str) -> Option<&TypeNode> {
        self.get(id).and_then(NodeRef::as_type)
    }

    /// Look up an entity by identifier.
    fn entity(&self, id: &str) -> Option<&Entity> {
        self.get(id).and_then(NodeRef::as_entity)
    }
}

/// Walk `chain` from most to least specific and return the first declaration
/// of `name`. The chain is only read, never reordered.
pub fn resolve_declaration<'h, H: Host>(
    chain: &[NodeId],
    name: &str,
    host: &'h H,
) -> Option<&'h PropertyDecl> {
    chain
        .iter()
        .rev()
        .find_map(|type_id| host.type_node(type_id.as_str())?.property(name))
}

/// Normalize a `type` field to a chain: a non-empty string becomes a
/// one-element chain and a list keeps its string entries, even when that
/// leaves it empty. Anything else (`null`, `""`, a number) is `None` and
/// leaves an existing chain alone.
#[must_use]
pub fn supplied_type_chain(value: &Value) -> Option<Vec<NodeId>> {
    match value {
        Value::String(id) if !id.is_empty() => Some(vec![NodeId::new(id.as_str())]),
        Value::Array(ids) => Some(
            ids.iter()
                .filter_map(Value::as_str)
                .map(NodeId::new)
                .collect(),
        ),
        _ => None,
    }
}

// =============================================================================
// PROPERTY VALUES
// =============================================================================

/// A stored property value, tagged by its declaration at write time.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Unique literal.
    Literal(Value),
    /// Non-unique literals.
    Literals(Vec<Value>),
    /// Unique reference.
    Link(NodeId),
    /// Non-unique references.
    Links(Vec<NodeId>),
}

impl PropertyValue {
    /// Convert a raw value under `decl`.
    ///
    /// Returns `None` when nothing should be stored: a `null`, or a unique
    /// reference that is not an identifier string. Non-unique properties
    /// wrap a scalar into a one-element list.
    #[must_use]
    pub fn from_raw(decl: &PropertyDecl, raw: &Value) -> Option<Self> {
        if raw.is_null() {
            return None;
        }
        let value = match (decl.is_reference(), decl.unique) {
            (false, true) => Self::Literal(raw.clone()),
            (false, false) => Self::Literals(match raw {
                Value::Array(items) => items.clone(),
                scalar => vec![scalar.clone()],
            }),
            (true, true) => Self::Link(NodeId::new(raw.as_str()?)),
            (true, false) => Self::Links(match raw {
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(NodeId::new)
                    .collect(),
                scalar => scalar.as_str().map(NodeId::new).into_iter().collect(),
            }),
        };
        Some(value)
    }

    /// Raw exchange form. References serialize as their identifier strings.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Literal(v) => v.clone(),
            Self::Literals(vs) => Value::Array(vs.clone()),
            Self::Link(id) => id.clone().into(),
            Self::Links(ids) => Value::Array(ids.iter().cloned().map(Value::from).collect()),
        }
    }
}

/// The result of `Entity::get`: literals as stored, references dereferenced.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<'a> {
    Value(&'a Value),
    Values(&'a [Value]),
    Object(&'a Entity),
    /// One slot per stored identifier; `None` where the host has no such entity.
    Objects(Vec<Option<&'a Entity>>),
}

impl<'a> Resolved<'a> {
    #[must_use]
    pub fn as_value(&self) -> Option<&'a Value> {
        match *self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_values(&self) -> Option<&'a [Value]> {
        match *self {
            Self::Values(vs) => Some(vs),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&'a Entity> {
        match *self {
            Self::Object(e) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_objects(&self) -> Option<&[Option<&'a Entity>]> {
        match self {
            Self::Objects(es) => Some(es.as_slice()),
            _ => None,
        }
    }
}

// =============================================================================
// ENTITY
// =============================================================================

/// A pending update computed by `Entity::stage`.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedUpdate {
    types: Option<Vec<NodeId>>,
    assignments: Vec<(String, Option<PropertyValue>)>,
}

impl StagedUpdate {
    /// Number of properties the update will write or clear.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_none() && self.assignments.is_empty()
    }
}

/// A typed data object.
///
/// Invariant: every stored key had a declaration reachable through the type
/// chain when it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: NodeId,
    types: Vec<NodeId>,
    properties: BTreeMap<String, PropertyValue>,
    deleted: bool,
}

impl Entity {
    /// Construct an entity from `record`, resolving declarations through `host`.
    #[must_use]
    pub fn new<H: Host>(id: NodeId, record: &Record, host: &H) -> Self {
        let mut entity = Self {
            id,
            types: Vec::new(),
            properties: BTreeMap::new(),
            deleted: false,
        };
        entity.set(record, host);
        entity
    }

    #[must_use]
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// The type chain, general to specific.
    #[must_use]
    pub fn type_chain(&self) -> &[NodeId] {
        &self.types
    }

    #[must_use]
    pub fn properties(&self) -> &BTreeMap<String, PropertyValue> {
        &self.properties
    }

    /// The raw stored value of a property.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.deleted = true;
    }

    /// The most specific type, resolved through `host`.
    #[must_use]
    pub fn most_specific_type<'h, H: Host>(&self, host: &'h H) -> Option<&'h TypeNode> {
        self.types
            .last()
            .and_then(|type_id| host.type_node(type_id.as_str()))
    }

    /// The declaration of `name`. The more specific type wins a tie.
    #[must_use]
    pub fn resolve_declaration<'h, H: Host>(
        &self,
        name: &str,
        host: &'h H,
    ) -> Option<&'h PropertyDecl> {
        resolve_declaration(&self.types, name, host)
    }

    /// Read a property.
    ///
    /// Literals are returned as stored. References are dereferenced through
    /// `host`: a unique reference to a missing entity yields `None`, a
    /// missing member of a reference list yields a `None` slot. Undeclared
    /// or unset properties yield `None`.
    #[must_use]
    pub fn get<'a, H: Host>(&'a self, name: &str, host: &'a H) -> Option<Resolved<'a>> {
        self.resolve_declaration(name, host)?;
        match self.properties.get(name)? {
            PropertyValue::Literal(v) => Some(Resolved::Value(v)),
            PropertyValue::Literals(vs) => Some(Resolved::Values(vs)),
            PropertyValue::Link(id) => host.entity(id.as_str()).map(Resolved::Object),
            PropertyValue::Links(ids) => Some(Resolved::Objects(
                ids.iter().map(|id| host.entity(id.as_str())).collect(),
            )),
        }
    }

    /// Compute the effect of `set(record)` without applying it.
    ///
    /// A `type` field replaces the chain wholesale and later keys are checked
    /// against the new chain; an empty or `null` one is ignored. Keys with no
    /// declaration are dropped.
    #[must_use]
    pub fn stage<H: Host>(&self, record: &Record, host: &H) -> StagedUpdate {
        let types = record.get(TYPE_KEY).and_then(supplied_type_chain);
        let chain = types.as_deref().unwrap_or(&self.types);

        let mut assignments = Vec::new();
        for (key, raw) in record {
            if key == TYPE_KEY || key == ID_KEY {
                continue;
            }
            match resolve_declaration(chain, key, host) {
                Some(decl) => assignments.push((key.clone(), PropertyValue::from_raw(decl, raw))),
                None => trace!(entity = %self.id, property = %key, "dropping undeclared property"),
            }
        }

        StagedUpdate { types, assignments }
    }

    /// Apply a staged update.
    pub fn commit(&mut self, update: StagedUpdate) {
        if let Some(types) = update.types {
            self.types = types;
        }
        for (key, value) in update.assignments {
            match value {
                Some(value) => {
                    self.properties.insert(key, value);
                }
                None => {
                    self.properties.remove(&key);
                }
            }
        }
    }

    /// Replace-per-key merge of `record` into this entity.
    ///
    /// Only usable when `host` does not own `self`; stores holding the entity
    /// use `stage` and `commit`.
    pub fn set<H: Host>(&mut self, record: &Record, host: &H) {
        let update = self.stage(record, host);
        self.commit(update);
    }

    /// Exchange record: stored properties plus `_id` and `type`.
    #[must_use]
    pub fn serialize(&self) -> Record {
        let mut record: Record = self
            .properties
            .iter()
            .map(|(key, value)| (key.clone(), value.to_value()))
            .collect();
        record.insert(ID_KEY.to_string(), self.id.clone().into());
        record.insert(
            TYPE_KEY.to_string(),
            Value::Array(self.types.iter().cloned().map(Value::from).collect()),
        );
        record
    }
}

// =============================================================================
// TESTS
// =============================================================================
