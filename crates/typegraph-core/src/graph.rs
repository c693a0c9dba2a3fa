//! # Graph Store
//!
//! The authoritative store of all TypeNodes and Entities.
//!
//! Nodes live in one insertion-ordered list. A `BTreeMap` maps each
//! identifier to its position, and the `types` / `objects` partitions hold
//! positions into the same list. Types and entities share one identifier
//! namespace.
//!
//! Nothing is ever removed: `del` only flags a node as deleted, and a
//! deleted node stays resolvable, enumerable and matchable.

use crate::collection::Collection;
use crate::entity::{Entity, Host, NodeRef, supplied_type_chain};
use crate::identifier;
use crate::primitives::{ID_KEY, TYPE_KEY, TYPE_TYPE};
use crate::query::{self, Query};
use crate::schema::TypeNode;
use crate::{NodeId, Record, Value};
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

// =============================================================================
// NODE
// =============================================================================

/// A node of the graph: a type or an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Type(TypeNode),
    Object(Entity),
}

impl Node {
    #[must_use]
    pub fn id(&self) -> &NodeId {
        match self {
            Self::Type(t) => &t.id,
            Self::Object(e) => e.id(),
        }
    }

    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.view().is_deleted()
    }

    /// Borrow as a `NodeRef`.
    #[must_use]
    pub fn view(&self) -> NodeRef<'_> {
        match self {
            Self::Type(t) => NodeRef::Type(t),
            Self::Object(e) => NodeRef::Object(e),
        }
    }

    #[must_use]
    pub fn serialize(&self) -> Record {
        self.view().serialize()
    }

    fn mark_deleted(&mut self) {
        match self {
            Self::Type(t) => t.mark_deleted(),
            Self::Object(e) => e.mark_deleted(),
        }
    }
}

// =============================================================================
// GRAPH IMPLEMENTATION
// =============================================================================

/// The main Graph structure.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Node storage in insertion order.
    nodes: Vec<Node>,

    /// Identifier -> position in `nodes`.
    keys: BTreeMap<NodeId, usize>,

    /// Positions of type nodes.
    types: Vec<usize>,

    /// Positions of entities.
    objects: Vec<usize>,
}

impl Graph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from an exchange record (`id -> record`).
    #[must_use]
    pub fn from_exchange(records: Record) -> Self {
        let mut graph = Self::new();
        graph.merge(records);
        graph
    }

    /// Upsert every `(id, record)` pair, in input order.
    ///
    /// Types must precede the entities whose properties they declare, since
    /// properties are checked against the schema as they are written.
    pub fn merge(&mut self, records: Record) -> &mut Self {
        for (id, value) in records {
            match value {
                Value::Object(mut record) => {
                    record.insert(ID_KEY.to_string(), Value::String(id));
                    self.set(record);
                }
                other => warn!(id = %id, value = %other, "skipping non-object record in merge"),
            }
        }
        self
    }

    /// Look up any node by identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<NodeRef<'_>> {
        self.keys
            .get(id)
            .and_then(|&position| self.nodes.get(position))
            .map(Node::view)
    }

    /// Position of a node in insertion order.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.keys.get(id).copied()
    }

    /// Insert or update one node.
    ///
    /// A record without `_id` is assigned `/<type segment>/<token>`. A record
    /// whose most specific type is `/type/type` creates a `TypeNode`, any
    /// other creates an `Entity`. An existing node is updated in place and
    /// keeps its position and partition.
    pub fn set(&mut self, mut record: Record) -> NodeRef<'_> {
        let types = record
            .get(TYPE_KEY)
            .and_then(supplied_type_chain)
            .unwrap_or_default();

        let id = match record.get(ID_KEY).and_then(Value::as_str) {
            Some(id) => NodeId::new(id),
            None => {
                let id = identifier::synthesize(types.last());
                record.insert(ID_KEY.to_string(), id.clone().into());
                id
            }
        };

        let position = match self.position(id.as_str()) {
            Some(position) => {
                self.update(position, &record);
                position
            }
            None => {
                let is_type = types.last().is_some_and(|t| t.as_str() == TYPE_TYPE);
                self.insert(id, &record, is_type)
            }
        };
        self.nodes[position].view()
    }

    fn insert(&mut self, id: NodeId, record: &Record, is_type: bool) -> usize {
        let node = if is_type {
            Node::Type(TypeNode::from_record(id.clone(), record))
        } else {
            Node::Object(Entity::new(id.clone(), record, &*self))
        };

        let position = self.nodes.len();
        debug!(id = %id, position, is_type, "registering node");
        self.keys.insert(id, position);
        if is_type {
            self.types.push(position);
        } else {
            self.objects.push(position);
        }
        self.nodes.push(node);
        position
    }

    fn update(&mut self, position: usize, record: &Record) {
        let replacement = match &self.nodes[position] {
            Node::Type(existing) => {
                if !declares_type(record) {
                    warn!(
                        id = %existing.id,
                        declared = existing.properties.len(),
                        "rebuilding type from a record not typed /type/type"
                    );
                }
                let mut rebuilt = TypeNode::from_record(existing.id.clone(), record);
                if existing.is_deleted() {
                    rebuilt.mark_deleted();
                }
                UpdateKind::Type(rebuilt)
            }
            Node::Object(entity) => UpdateKind::Object(entity.stage(record, &*self)),
        };

        trace!(id = %self.nodes[position].id(), position, "updating node in place");
        match (&mut self.nodes[position], replacement) {
            (Node::Type(existing), UpdateKind::Type(rebuilt)) => *existing = rebuilt,
            (Node::Object(entity), UpdateKind::Object(staged)) => entity.commit(staged),
            _ => {}
        }
    }

    /// Entities matching `query`, as a `Collection` borrowing them.
    #[must_use]
    pub fn find(&self, query: &Query) -> Collection<'_> {
        query::select(self, self.objects(), query)
    }

    /// Soft-delete a node. Unknown identifiers are ignored.
    pub fn del(&mut self, id: &str) {
        if let Some(position) = self.position(id) {
            debug!(id = %id, position, "marking node deleted");
            self.nodes[position].mark_deleted();
        }
    }

    /// Exchange record of the whole graph: `id -> record`, in node order.
    #[must_use]
    pub fn serialize(&self) -> Record {
        self.nodes
            .iter()
            .map(|node| (node.id().0.clone(), Value::Object(node.serialize())))
            .collect()
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// All type nodes in insertion order.
    pub fn types(&self) -> impl Iterator<Item = &TypeNode> {
        self.types
            .iter()
            .filter_map(|&position| match self.nodes.get(position) {
                Some(Node::Type(t)) => Some(t),
                _ => None,
            })
    }

    /// All entities in insertion order.
    pub fn objects(&self) -> impl Iterator<Item = &Entity> {
        self.objects
            .iter()
            .filter_map(|&position| match self.nodes.get(position) {
                Some(Node::Object(e)) => Some(e),
                _ => None,
            })
    }

    /// Total number of nodes, deleted ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Whether `record`'s most specific type is `/type/type`.
fn declares_type(record: &Record) -> bool {
    record
        .get(TYPE_KEY)
        .and_then(supplied_type_chain)
        .is_some_and(|chain| chain.last().is_some_and(|t| t.as_str() == TYPE_TYPE))
}

/// The two update paths of `Graph::update`, computed before mutation.
enum UpdateKind {
    Type(TypeNode),
    Object(crate::entity::StagedUpdate),
}

impl Host for Graph {
    fn get(&self, id: &str) -> Option<NodeRef<'_>> {
        Graph::get(self, id)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PropertyDecl;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    fn person_type() -> Record {
        record(json!({
            "_id": "/type/person",
            "type": "/type/type",
            "name": "Person",
            "properties": {
                "name": {"type": "string"},
                "friends": {"type": "/type/person", "unique": false}
            }
        }))
    }

    #[test]
    fn set_registers_types_and_objects() {
        let mut graph = Graph::new();
        graph.set(person_type());
        graph.set(record(json!({"_id": "/person/joe", "type": "/type/person", "name": "Joe"})));

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.types().count(), 1);
        assert_eq!(graph.objects().count(), 1);
        assert!(graph.type_node("/type/person").is_some());
        assert!(graph.entity("/person/joe").is_some());
    }

    #[test]
    fn set_synthesizes_id_from_type_segment() {
        let mut graph = Graph::new();
        graph.set(person_type());
        let id = graph
            .set(record(json!({"type": "/type/person", "name": "Anon"})))
            .id()
            .clone();

        assert!(id.as_str().starts_with("/person/"));
        assert!(graph.get(id.as_str()).is_some());
    }

    #[test]
    fn update_preserves_position_and_partition() {
        let mut graph = Graph::new();
        graph.set(person_type());
        graph.set(record(json!({"_id": "/person/joe", "type": "/type/person", "name": "Joe"})));
        graph.set(record(json!({"_id": "/person/ann", "type": "/type/person", "name": "Ann"})));

        graph.set(record(json!({"_id": "/person/joe", "name": "Joseph"})));

        assert_eq!(graph.position("/person/joe"), Some(1));
        assert_eq!(graph.objects().count(), 2);
        let joe = graph.entity("/person/joe").expect("joe");
        assert_eq!(joe.get("name", &graph).and_then(|r| r.as_value()), Some(&json!("Joseph")));
        assert_eq!(joe.type_chain(), &[NodeId::new("/type/person")]);
    }

    #[test]
    fn type_update_rebuilds_declarations() {
        let mut graph = Graph::new();
        graph.set(person_type());
        graph.set(record(json!({
            "_id": "/type/person",
            "type": "/type/type",
            "name": "Human",
            "properties": {"age": {"type": "number"}}
        })));

        let person = graph.type_node("/type/person").expect("type");
        assert_eq!(person.name, "Human");
        assert!(person.property("name").is_none());
        assert!(person.property("age").is_some());
        assert_eq!(graph.types().count(), 1);
    }

    #[test]
    fn untyped_record_on_a_type_id_still_rebuilds_it() {
        let mut graph = Graph::new();
        graph.set(person_type());

        let oops = record(json!({"_id": "/type/person", "name": "oops"}));
        assert!(!declares_type(&oops));
        assert!(declares_type(&person_type()));
        graph.set(oops);

        let person = graph.type_node("/type/person").expect("still a type");
        assert_eq!(person.name, "oops");
        assert!(person.properties.is_empty());
        assert_eq!(graph.types().count(), 1);
        assert_eq!(graph.objects().count(), 0);
    }

    #[test]
    fn null_type_update_keeps_entity_chain() {
        let mut graph = Graph::new();
        graph.set(person_type());
        graph.set(record(json!({"_id": "/person/joe", "type": "/type/person", "name": "Joe"})));

        graph.set(record(json!({"_id": "/person/joe", "type": null, "name": "Max"})));

        let joe = graph.entity("/person/joe").expect("joe");
        assert_eq!(joe.type_chain(), &[NodeId::new("/type/person")]);
        assert_eq!(joe.get("name", &graph).and_then(|r| r.as_value()), Some(&json!("Max")));
        assert_eq!(graph.find(&Query::of_type("/type/person")).len(), 1);
    }

    #[test]
    fn merge_applies_records_in_order() {
        let mut graph = Graph::new();
        graph.merge(record(json!({
            "/type/person": person_type(),
            "/person/b": {"type": "/type/person", "name": "B"},
            "/person/a": {"type": "/type/person", "name": "A"},
            "/person/bad": 42
        })));

        let ids: Vec<_> = graph.nodes().map(|n| n.id().as_str()).collect();
        assert_eq!(ids, vec!["/type/person", "/person/b", "/person/a"]);
    }

    #[test]
    fn stores_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Graph>();
        assert_send_sync::<Collection<'static>>();
    }

    #[test]
    fn get_unknown_is_none() {
        let graph = Graph::new();
        assert!(graph.get("/nothing").is_none());
    }

    #[test]
    fn del_flags_without_removing() {
        let mut graph = Graph::new();
        graph.set(person_type());
        graph.set(record(json!({"_id": "/person/joe", "type": "/type/person", "name": "Joe"})));

        graph.del("/person/joe");
        graph.del("/person/unknown");

        let joe = graph.get("/person/joe").expect("still resolvable");
        assert!(joe.is_deleted());
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.find(&Query::new().with("name", "Joe")).len(), 1);
    }

    #[test]
    fn deleted_type_stays_deleted_after_rebuild() {
        let mut graph = Graph::new();
        graph.set(person_type());
        graph.del("/type/person");
        graph.set(person_type());
        assert!(graph.get("/type/person").is_some_and(|n| n.is_deleted()));
    }

    #[test]
    fn references_resolve_through_graph() {
        let mut graph = Graph::new();
        graph.set(person_type());
        graph.set(record(json!({"_id": "/person/ann", "type": "/type/person", "name": "Ann"})));
        graph.set(record(json!({
            "_id": "/person/joe",
            "type": "/type/person",
            "friends": ["/person/ann", "/person/ghost"]
        })));

        let joe = graph.entity("/person/joe").expect("joe");
        let friends = joe.get("friends", &graph).expect("friends");
        let friends = friends.as_objects().expect("list");
        assert_eq!(friends[0].map(|e| e.id().as_str()), Some("/person/ann"));
        assert!(friends[1].is_none());
    }

    #[test]
    fn serialize_maps_every_node() {
        let mut graph = Graph::new();
        graph.set(
            TypeNode::new("/type/thing", "Thing")
                .with_property("label", PropertyDecl::unique("string"))
                .serialize(),
        );
        graph.set(record(json!({"_id": "/thing/1", "type": "/type/thing", "label": "x"})));

        let out = graph.serialize();
        assert_eq!(out.len(), 2);
        assert_eq!(
            out.get("/thing/1"),
            Some(&json!({"label": "x", "_id": "/thing/1", "type": ["/type/thing"]}))
        );
    }
}
