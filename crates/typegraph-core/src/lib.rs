//! # typegraph-core
//!
//! An in-memory typed object graph.
//!
//! The graph holds two kinds of node in one identifier namespace:
//! - `TypeNode`: a schema node declaring properties, their cardinality and
//!   whether they hold literals or references
//! - `Entity`: a data object whose type chain lists one or more types
//!
//! Entities only keep properties their types declare. References are stored
//! as identifiers and resolved lazily through a `Host` (a `Graph` or a
//! `Collection`). Queries scan a candidate set and return a `Collection`.
//!
//! ## Architectural Constraints
//!
//! - Pure and synchronous: no async, no I/O
//! - Domain operations never fail; only the exchange codecs return errors
//! - Nothing is removed: deletion is a soft flag

// =============================================================================
// MODULES
// =============================================================================

pub mod collection;
pub mod entity;
pub mod formats;
pub mod graph;
pub mod identifier;
pub mod primitives;
pub mod query;
pub mod schema;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{GraphError, NodeId, Record, Value, ValueKind};

// =============================================================================
// RE-EXPORTS: Graph Model
// =============================================================================

pub use collection::Collection;
pub use entity::{Entity, Host, NodeRef, PropertyValue, Resolved, StagedUpdate};
pub use graph::{Graph, Node};
pub use query::{Query, select};
pub use schema::{IndexHint, PropertyDecl, TypeNode};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{collection_from_json, collection_to_json, graph_from_json, graph_to_json};
