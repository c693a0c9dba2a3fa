//! # Schema
//!
//! Type definitions for the object graph.
//!
//! A `TypeNode` declares the properties its instances may carry. Each
//! `PropertyDecl` fixes cardinality (`unique`) and the accepted kinds.
//! Whether a property holds literals or references is decided by the last
//! accepted kind alone.

use crate::primitives::{DEFAULT_VALUE_KIND, ID_KEY, TYPE_KEY, TYPE_TYPE};
use crate::{NodeId, Record, Value, ValueKind};
use std::collections::BTreeMap;
use tracing::warn;

// =============================================================================
// PROPERTY DECLARATION
// =============================================================================

/// Declaration of one property on a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDecl {
    /// Optional display name. Round-tripped, never interpreted.
    pub name: Option<String>,
    /// Accepted kinds, never empty.
    pub kinds: Vec<ValueKind>,
    /// Cardinality one (`true`) or many (`false`).
    pub unique: bool,
}

impl PropertyDecl {
    /// Create a declaration. An empty kind list falls back to `string`.
    #[must_use]
    pub fn new(kinds: Vec<ValueKind>, unique: bool) -> Self {
        let kinds = if kinds.is_empty() {
            vec![ValueKind::parse(DEFAULT_VALUE_KIND)]
        } else {
            kinds
        };
        Self {
            name: None,
            kinds,
            unique,
        }
    }

    /// A cardinality-one declaration of a single kind.
    #[must_use]
    pub fn unique(kind: &str) -> Self {
        Self::new(vec![ValueKind::parse(kind)], true)
    }

    /// A cardinality-many declaration of a single kind.
    #[must_use]
    pub fn many(kind: &str) -> Self {
        Self::new(vec![ValueKind::parse(kind)], false)
    }

    /// Attach a display name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Whether values of this property are identifiers of other entities.
    #[must_use]
    pub fn is_reference(&self) -> bool {
        self.kinds.last().is_some_and(|kind| !kind.is_value())
    }

    /// Read a declaration from its exchange form.
    ///
    /// `type` may be a single tag or a list of tags. A missing or non-boolean
    /// `unique` means `true`. Returns `None` if `value` is not an object.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let spec = value.as_object()?;
        let kinds = match spec.get(TYPE_KEY) {
            Some(Value::String(tag)) => vec![ValueKind::parse(tag)],
            Some(Value::Array(tags)) => tags
                .iter()
                .filter_map(Value::as_str)
                .map(ValueKind::parse)
                .collect(),
            _ => Vec::new(),
        };
        let unique = spec.get("unique").and_then(Value::as_bool).unwrap_or(true);

        let mut decl = Self::new(kinds, unique);
        decl.name = spec.get("name").and_then(Value::as_str).map(str::to_string);
        Some(decl)
    }

    /// Exchange form: `{name?, type: [...], unique}`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut spec = Record::new();
        if let Some(name) = &self.name {
            spec.insert("name".to_string(), Value::String(name.clone()));
        }
        spec.insert(
            TYPE_KEY.to_string(),
            Value::Array(
                self.kinds
                    .iter()
                    .map(|kind| Value::String(kind.as_str().to_string()))
                    .collect(),
            ),
        );
        spec.insert("unique".to_string(), Value::Bool(self.unique));
        Value::Object(spec)
    }
}

// =============================================================================
// INDEX HINT
// =============================================================================

/// A declared secondary index. Informational only: no index is built and
/// queries never consult it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHint {
    pub name: Option<String>,
    pub properties: Vec<String>,
}

impl IndexHint {
    fn from_value(name: Option<&str>, value: &Value) -> Option<Self> {
        let properties = match value {
            Value::Array(items) => items,
            Value::Object(spec) => spec.get("properties")?.as_array()?,
            _ => return None,
        };
        let name = name
            .or_else(|| value.get("name").and_then(Value::as_str))
            .map(str::to_string);
        Some(Self {
            name,
            properties: properties
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        })
    }

    /// Accepts the authoring form (`{name: {properties: [...]}}`) and the
    /// serialized form (`[[...], ...]`).
    fn parse_all(value: Option<&Value>) -> Vec<Self> {
        match value {
            Some(Value::Object(named)) => named
                .iter()
                .filter_map(|(name, spec)| Self::from_value(Some(name), spec))
                .collect(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|spec| Self::from_value(None, spec))
                .collect(),
            _ => Vec::new(),
        }
    }
}

// =============================================================================
// TYPE NODE
// =============================================================================

/// A schema node: the declared properties of one type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeNode {
    pub id: NodeId,
    pub name: String,
    pub properties: BTreeMap<String, PropertyDecl>,
    /// Opaque annotations.
    pub meta: Record,
    pub indexes: Vec<IndexHint>,
    deleted: bool,
}

impl TypeNode {
    /// Create a type with no properties.
    #[must_use]
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            properties: BTreeMap::new(),
            meta: Record::new(),
            indexes: Vec::new(),
            deleted: false,
        }
    }

    /// Declare a property.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, decl: PropertyDecl) -> Self {
        self.properties.insert(name.into(), decl);
        self
    }

    /// Declare an index hint over the given properties.
    #[must_use]
    pub fn with_index(mut self, name: impl Into<String>, properties: &[&str]) -> Self {
        self.indexes.push(IndexHint {
            name: Some(name.into()),
            properties: properties.iter().map(|p| (*p).to_string()).collect(),
        });
        self
    }

    /// Build a type from its specification record.
    ///
    /// Declarations that are not objects are skipped.
    #[must_use]
    pub fn from_record(id: NodeId, record: &Record) -> Self {
        let mut node = Self::new(
            id,
            record.get("name").and_then(Value::as_str).unwrap_or_default(),
        );

        if let Some(Value::Object(properties)) = record.get("properties") {
            for (key, spec) in properties {
                match PropertyDecl::from_value(spec) {
                    Some(decl) => {
                        node.properties.insert(key.clone(), decl);
                    }
                    None => warn!(
                        type_id = %node.id,
                        property = %key,
                        "skipping property declaration that is not an object"
                    ),
                }
            }
        }
        if let Some(Value::Object(meta)) = record.get("meta") {
            node.meta = meta.clone();
        }
        node.indexes = IndexHint::parse_all(record.get("indexes"));
        node
    }

    /// Look up a declaration declared directly on this type.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyDecl> {
        self.properties.get(name)
    }

    /// Whether this node has been soft-deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.deleted = true;
    }

    /// Exchange record of this type.
    #[must_use]
    pub fn serialize(&self) -> Record {
        let mut record = Record::new();
        record.insert(ID_KEY.to_string(), self.id.clone().into());
        record.insert(TYPE_KEY.to_string(), Value::String(TYPE_TYPE.to_string()));
        record.insert("name".to_string(), Value::String(self.name.clone()));
        record.insert(
            "properties".to_string(),
            Value::Object(
                self.properties
                    .iter()
                    .map(|(key, decl)| (key.clone(), decl.to_value()))
                    .collect(),
            ),
        );
        record.insert("meta".to_string(), Value::Object(self.meta.clone()));
        record.insert(
            "indexes".to_string(),
            Value::Array(
                self.indexes
                    .iter()
                    .map(|index| {
                        Value::Array(
                            index
                                .properties
                                .iter()
                                .map(|p| Value::String(p.clone()))
                                .collect(),
                        )
                    })
                    .collect(),
            ),
        );
        record
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn scalar_kind_is_normalized_to_list() {
        let decl = PropertyDecl::from_value(&json!({"type": "string"})).expect("decl");
        assert_eq!(decl.kinds, vec![ValueKind::String]);
    }

    #[test]
    fn unique_defaults_to_true() {
        let decl = PropertyDecl::from_value(&json!({"type": "number"})).expect("decl");
        assert!(decl.unique);

        let decl = PropertyDecl::from_value(&json!({"type": "number", "unique": "no"}))
            .expect("decl");
        assert!(decl.unique);

        let decl =
            PropertyDecl::from_value(&json!({"type": "number", "unique": false})).expect("decl");
        assert!(!decl.unique);
    }

    #[test]
    fn missing_kind_falls_back_to_string() {
        let decl = PropertyDecl::from_value(&json!({"unique": false})).expect("decl");
        assert_eq!(decl.kinds, vec![ValueKind::String]);
    }

    #[test]
    fn reference_is_decided_by_last_kind() {
        assert!(PropertyDecl::many("/type/animal").is_reference());
        assert!(!PropertyDecl::unique("date").is_reference());

        let mixed = PropertyDecl::new(
            vec![ValueKind::parse("/type/animal"), ValueKind::String],
            true,
        );
        assert!(!mixed.is_reference());
    }

    #[test]
    fn from_record_reads_all_sections() {
        let node = TypeNode::from_record(
            NodeId::new("/type/person"),
            &record(json!({
                "name": "Person",
                "properties": {
                    "name": {"name": "Name", "type": "string"},
                    "pet": {"type": ["/type/animal"], "unique": false},
                    "broken": "string"
                },
                "meta": {"color": "red"},
                "indexes": {"by_name": {"properties": ["name"]}}
            })),
        );

        assert_eq!(node.name, "Person");
        assert_eq!(node.properties.len(), 2);
        assert_eq!(
            node.property("name").and_then(|d| d.name.as_deref()),
            Some("Name")
        );
        assert!(node.property("pet").is_some_and(PropertyDecl::is_reference));
        assert_eq!(node.meta.get("color"), Some(&json!("red")));
        assert_eq!(node.indexes.len(), 1);
        assert_eq!(node.indexes[0].name.as_deref(), Some("by_name"));
    }

    #[test]
    fn serialize_emits_index_property_lists() {
        let node = TypeNode::new("/type/person", "Person")
            .with_property("name", PropertyDecl::unique("string"))
            .with_index("by_name", &["name"]);

        let out = node.serialize();
        assert_eq!(out.get("_id"), Some(&json!("/type/person")));
        assert_eq!(out.get("type"), Some(&json!("/type/type")));
        assert_eq!(out.get("indexes"), Some(&json!([["name"]])));
        assert_eq!(
            out.get("properties"),
            Some(&json!({"name": {"type": ["string"], "unique": true}}))
        );
    }

    #[test]
    fn serialized_form_reads_back() {
        let node = TypeNode::new("/type/person", "Person")
            .with_property("pet", PropertyDecl::many("/type/animal").named("Pets"))
            .with_index("by_pet", &["pet"]);

        let back = TypeNode::from_record(node.id.clone(), &node.serialize());
        assert_eq!(back.properties, node.properties);
        assert_eq!(back.indexes[0].properties, vec!["pet".to_string()]);
    }
}
