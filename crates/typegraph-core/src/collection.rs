//! # Collection
//!
//! A type-homogeneous, ordered, key-indexed view over entities.
//!
//! A collection keeps its own identifier index. It is built either from raw
//! records (every record goes through `add`, so it is typed and validated
//! against the collection type and owned by the collection) or from an
//! existing entity list, which is how query results are boxed. Boxed
//! members and a borrowed type are not copied: `Collection<'a>` holds them
//! as `Cow`, and `add` only clones a borrowed member when it updates it.
//!
//! As a `Host`, a collection answers every `/type/` lookup with its own type.

use crate::entity::{Entity, Host, NodeRef};
use crate::identifier;
use crate::primitives::{ID_KEY, TYPE_KEY, TYPE_PREFIX};
use crate::query::{self, Query};
use crate::schema::TypeNode;
use crate::{GraphError, NodeId, Record, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::ops::Deref;
use tracing::trace;

/// An ordered set of entities of one type.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<'a> {
    type_node: Cow<'a, TypeNode>,
    objects: Vec<Cow<'a, Entity>>,
    keys: BTreeMap<NodeId, usize>,
}

impl<'a> Collection<'a> {
    /// Build a collection of `type_node` from raw records.
    ///
    /// Each record is typed with `type_node` and assigned an identifier when
    /// it has none.
    #[must_use]
    pub fn new(type_node: TypeNode, records: impl IntoIterator<Item = Record>) -> Self {
        let mut collection = Self::create(Cow::Owned(type_node), Vec::new());
        for record in records {
            collection.add(record);
        }
        collection
    }

    /// Wrap existing entities without re-validating them.
    #[must_use]
    pub fn create(type_node: Cow<'a, TypeNode>, objects: Vec<Cow<'a, Entity>>) -> Self {
        let keys = objects
            .iter()
            .enumerate()
            .map(|(position, entity)| (entity.id().clone(), position))
            .collect();
        Self {
            type_node,
            objects,
            keys,
        }
    }

    /// Decode the `{type, objects}` exchange form.
    pub fn from_exchange(record: &Record) -> Result<Collection<'static>, GraphError> {
        let type_record = record
            .get(TYPE_KEY)
            .and_then(Value::as_object)
            .ok_or_else(|| GraphError::MalformedRecord("collection has no type record".into()))?;
        let type_id = type_record
            .get(ID_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| GraphError::MalformedRecord("collection type has no _id".into()))?;
        let type_node = TypeNode::from_record(NodeId::new(type_id), type_record);

        let records = match record.get("objects") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_object().cloned().ok_or_else(|| {
                        GraphError::MalformedRecord(format!(
                            "collection member is not an object: {}",
                            item
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(GraphError::MalformedRecord(format!(
                    "collection objects must be a list, got {}",
                    other
                )));
            }
        };

        Ok(Collection::new(type_node, records))
    }

    /// The collection's type.
    #[must_use]
    pub fn type_node(&self) -> &TypeNode {
        &self.type_node
    }

    /// Look up a member, or the collection type for any `/type/` identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<NodeRef<'_>> {
        if id.starts_with(TYPE_PREFIX) {
            return Some(NodeRef::Type(self.type_node()));
        }
        self.index(id)
            .and_then(|position| self.at(position))
            .map(NodeRef::Object)
    }

    /// Member at `position`.
    #[must_use]
    pub fn at(&self, position: usize) -> Option<&Entity> {
        self.objects.get(position).map(Deref::deref)
    }

    /// Position of the member with identifier `id`.
    #[must_use]
    pub fn index(&self, id: &str) -> Option<usize> {
        self.keys.get(id).copied()
    }

    /// Identifier of the member at `position`.
    #[must_use]
    pub fn key(&self, position: usize) -> Option<&NodeId> {
        self.at(position).map(Entity::id)
    }

    /// Insert or update a member.
    ///
    /// The record's `type` is forced to the collection type. An existing
    /// member is updated in place and keeps its position; a borrowed member
    /// is cloned into the collection first.
    pub fn add(&mut self, mut record: Record) -> &Entity {
        record.insert(TYPE_KEY.to_string(), self.type_node.id.clone().into());
        let id = match record.get(ID_KEY).and_then(Value::as_str) {
            Some(id) => NodeId::new(id),
            None => {
                let id = identifier::synthesize(Some(&self.type_node.id));
                record.insert(ID_KEY.to_string(), id.clone().into());
                id
            }
        };

        let position = match self.index(id.as_str()) {
            Some(position) => {
                let update = self.objects[position].stage(&record, &*self);
                self.objects[position].to_mut().commit(update);
                position
            }
            None => {
                let entity = Entity::new(id.clone(), &record, &*self);
                let position = self.objects.len();
                trace!(collection = %self.type_node.id, id = %id, position, "adding member");
                self.keys.insert(id, position);
                self.objects.push(Cow::Owned(entity));
                position
            }
        };
        &self.objects[position]
    }

    /// Members matching `query`, constrained to the collection type.
    #[must_use]
    pub fn find(&self, query: &Query) -> Collection<'_> {
        let mut query = query.clone();
        query.set_type(&self.type_node.id);
        query::select(self, self.iter(), &query)
    }

    /// Visit every member with its identifier and position.
    pub fn each<F>(&self, mut visit: F) -> &Self
    where
        F: FnMut(&Entity, &NodeId, usize),
    {
        for (position, entity) in self.iter().enumerate() {
            visit(entity, entity.id(), position);
        }
        self
    }

    /// Exchange form: `{type: <type record>, objects: [<entity record>, ...]}`.
    #[must_use]
    pub fn serialize(&self) -> Record {
        let mut record = Record::new();
        record.insert(
            TYPE_KEY.to_string(),
            Value::Object(self.type_node.serialize()),
        );
        record.insert(
            "objects".to_string(),
            Value::Array(
                self.iter()
                    .map(|entity| Value::Object(entity.serialize()))
                    .collect(),
            ),
        );
        record
    }

    pub fn iter(&self) -> Iter<'_, 'a> {
        Iter {
            inner: self.objects.iter(),
        }
    }

    /// Whether the member at `position` is held by reference.
    #[must_use]
    pub fn is_borrowed(&self, position: usize) -> bool {
        matches!(self.objects.get(position), Some(Cow::Borrowed(_)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Host for Collection<'_> {
    fn get(&self, id: &str) -> Option<NodeRef<'_>> {
        Collection::get(self, id)
    }
}

impl<'c, 'a> IntoIterator for &'c Collection<'a> {
    type Item = &'c Entity;
    type IntoIter = Iter<'c, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Members of a `Collection`, in order.
#[derive(Debug, Clone)]
pub struct Iter<'c, 'a> {
    inner: std::slice::Iter<'c, Cow<'a, Entity>>,
}

impl<'c> Iterator for Iter<'c, '_> {
    type Item = &'c Entity;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Deref::deref)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_, '_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(Deref::deref)
    }
}

impl ExactSizeIterator for Iter<'_, '_> {}

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

    fn animal() -> TypeNode {
        TypeNode::new("/type/animal", "Animal")
            .with_property("name", PropertyDecl::unique("string"))
            .with_property("species", PropertyDecl::unique("string"))
            .with_property("friend", PropertyDecl::unique("/type/animal"))
    }

    fn animals() -> Collection<'static> {
        Collection::new(
            animal(),
            vec![
                record(json!({"_id": "/animal/rex", "name": "Rex", "species": "dog"})),
                record(json!({"_id": "/animal/tom", "name": "Tom", "species": "cat", "friend": "/animal/rex"})),
                record(json!({"name": "Anon", "species": "dog"})),
            ],
        )
    }

    #[test]
    fn new_types_and_identifies_every_member() {
        let c = animals();
        assert_eq!(c.len(), 3);
        for entity in &c {
            assert_eq!(entity.type_chain(), &[NodeId::new("/type/animal")]);
        }
        let anon = c.key(2).expect("third member");
        assert!(anon.as_str().starts_with("/animal/"));
    }

    #[test]
    fn index_and_key_are_inverse() {
        let c = animals();
        for position in 0..c.len() {
            let key = c.key(position).expect("key");
            assert_eq!(c.index(key.as_str()), Some(position));
        }
        assert!(c.at(3).is_none());
        assert!(c.index("/animal/nobody").is_none());
    }

    #[test]
    fn any_type_path_resolves_to_own_type() {
        let c = animals();
        let t = c.get("/type/anything").and_then(NodeRef::as_type).expect("type");
        assert_eq!(t.name, "Animal");
        assert!(c.get("/animal/rex").and_then(NodeRef::as_entity).is_some());
    }

    #[test]
    fn add_forces_collection_type() {
        let mut c = animals();
        let added = c.add(record(json!({"_id": "/animal/x", "type": "/type/person", "name": "X"})));
        assert_eq!(added.type_chain(), &[NodeId::new("/type/animal")]);
        assert!(added.property("name").is_some());
    }

    #[test]
    fn add_updates_existing_member_in_place() {
        let mut c = animals();
        c.add(record(json!({"_id": "/animal/rex", "name": "Rexy"})));

        assert_eq!(c.len(), 3);
        assert_eq!(c.index("/animal/rex"), Some(0));
        let rex = c.at(0).expect("rex");
        assert_eq!(rex.get("name", &c).and_then(|r| r.as_value()), Some(&json!("Rexy")));
        assert_eq!(rex.get("species", &c).and_then(|r| r.as_value()), Some(&json!("dog")));
    }

    #[test]
    fn references_resolve_within_collection() {
        let c = animals();
        let tom = c.entity("/animal/tom").expect("tom");
        let friend = tom.get("friend", &c).and_then(|r| r.as_object()).expect("friend");
        assert_eq!(friend.id().as_str(), "/animal/rex");
    }

    #[test]
    fn find_is_constrained_to_collection_type() {
        let c = animals();
        let dogs = c.find(&Query::of_type("/type/other").with("species", "dog"));
        assert_eq!(dogs.len(), 2);
        assert_eq!(dogs.type_node().name, "Animal");
        assert_eq!(dogs.index("/animal/rex"), Some(0));
    }

    #[test]
    fn find_results_are_borrowed_until_updated() {
        let c = animals();
        let mut dogs = c.find(&Query::new().with("species", "dog"));
        assert!(std::ptr::eq(dogs.at(0).expect("rex"), c.at(0).expect("rex")));
        assert!(dogs.is_borrowed(0) && dogs.is_borrowed(1));

        dogs.add(record(json!({"_id": "/animal/rex", "name": "Rexy"})));

        assert!(!dogs.is_borrowed(0));
        assert!(dogs.is_borrowed(1));
        let renamed = dogs.at(0).and_then(|rex| rex.get("name", &dogs)).and_then(|r| r.as_value());
        assert_eq!(renamed, Some(&json!("Rexy")));
        let original = c.at(0).and_then(|rex| rex.get("name", &c)).and_then(|r| r.as_value());
        assert_eq!(original, Some(&json!("Rex")));
    }

    #[test]
    fn built_members_are_owned() {
        let c = animals();
        assert!((0..c.len()).all(|position| !c.is_borrowed(position)));
        assert!(!c.is_borrowed(c.len()));
    }

    #[test]
    fn each_visits_in_order() {
        let c = animals();
        let mut seen = Vec::new();
        c.each(|entity, id, position| {
            assert_eq!(entity.id(), id);
            seen.push(position);
        });
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn serialize_reads_back() {
        let c = animals();
        let back = Collection::from_exchange(&c.serialize()).expect("decode");
        assert_eq!(back.len(), c.len());
        assert_eq!(back.type_node().properties, c.type_node().properties);
        assert_eq!(back.key(1), c.key(1));
        assert_eq!(back.serialize(), c.serialize());
    }

    #[test]
    fn from_exchange_rejects_malformed_input() {
        assert!(Collection::from_exchange(&record(json!({"objects": []}))).is_err());
        assert!(
            Collection::from_exchange(&record(json!({
                "type": {"_id": "/type/a"},
                "objects": {"not": "a list"}
            })))
            .is_err()
        );
        assert!(
            Collection::from_exchange(&record(json!({
                "type": {"_id": "/type/a"},
                "objects": [1]
            })))
            .is_err()
        );
    }
}
