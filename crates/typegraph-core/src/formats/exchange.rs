//! # Exchange Format (JSON)
//!
//! JSON text encoding of graphs and collections.
//!
//! - Graph: one object mapping each identifier to its node record, in node
//!   order. `graph_from_json` merges it into a fresh graph.
//! - Collection: `{"type": <type record>, "objects": [<entity record>, ...]}`.
//!
//! Input size is validated against `MAX_EXCHANGE_DOCUMENT_SIZE` before any
//! parsing, so an oversized document never reaches `serde_json`.

use crate::primitives::MAX_EXCHANGE_DOCUMENT_SIZE;
use crate::{Collection, Graph, GraphError, Record, Value};

// =============================================================================
// HELPERS
// =============================================================================

fn encode(record: Record, pretty: bool) -> Result<String, GraphError> {
    let value = Value::Object(record);
    let text = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    };
    text.map_err(|e| GraphError::SerializationError(e.to_string()))
}

/// Parse `text` into a top-level JSON object.
fn decode(text: &str) -> Result<Record, GraphError> {
    if text.len() > MAX_EXCHANGE_DOCUMENT_SIZE {
        return Err(GraphError::DeserializationError(format!(
            "Document size {} bytes exceeds maximum allowed {} bytes",
            text.len(),
            MAX_EXCHANGE_DOCUMENT_SIZE
        )));
    }

    let value: Value = serde_json::from_str(text).map_err(|e| {
        GraphError::DeserializationError(format!("Failed to parse exchange document: {}", e))
    })?;

    match value {
        Value::Object(record) => Ok(record),
        other => Err(GraphError::MalformedRecord(format!(
            "exchange document must be an object, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

// =============================================================================
// GRAPH
// =============================================================================

/// Encode a graph as JSON text.
pub fn graph_to_json(graph: &Graph, pretty: bool) -> Result<String, GraphError> {
    encode(graph.serialize(), pretty)
}

/// Decode JSON text into a new graph.
///
/// Records are merged in document order, so types must appear before the
/// entities that use them. Non-object records are skipped.
pub fn graph_from_json(text: &str) -> Result<Graph, GraphError> {
    decode(text).map(Graph::from_exchange)
}

// =============================================================================
// COLLECTION
// =============================================================================

/// Encode a collection as JSON text.
pub fn collection_to_json(collection: &Collection<'_>, pretty: bool) -> Result<String, GraphError> {
    encode(collection.serialize(), pretty)
}

/// Decode JSON text into a new collection.
pub fn collection_from_json(text: &str) -> Result<Collection<'static>, GraphError> {
    Collection::from_exchange(&decode(text)?)
}

// =============================================================================
// TESTS
// =============================================================================
