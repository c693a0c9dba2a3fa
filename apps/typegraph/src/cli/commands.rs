//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//! Each command takes a loaded `Graph` and returns the text to print.

use serde_json::json;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};
use typegraph_core::{
    Entity, Graph, GraphError, NodeRef, Query, Record, Resolved, Value, collection_to_json,
    graph_from_json, graph_to_json, primitives::MAX_EXCHANGE_DOCUMENT_SIZE,
};

/// Output switches shared by all commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    pub json: bool,
    pub pretty: bool,
    pub verbose: bool,
}

impl Output {
    fn render(self, value: &Value) -> Result<String, GraphError> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        text.map_err(|e| GraphError::SerializationError(e.to_string()))
    }
}

// =============================================================================
// DOCUMENT INPUT
// =============================================================================

/// Read the exchange document at `path` as text.
///
/// The file is opened once and sized through the open handle, so the file
/// that was checked is the file that is read. A path that is not a regular
/// file is an `IoError`. A file over `limit` bytes is refused before reading
/// with the same `DeserializationError` that `graph_from_json` raises for an
/// oversized document.
fn read_document(path: &Path, limit: u64) -> Result<String, GraphError> {
    let io_error = |action: &str, e: std::io::Error| {
        GraphError::IoError(format!("Cannot {} '{}': {}", action, path.display(), e))
    };

    let mut file = File::open(path).map_err(|e| io_error("open", e))?;
    let metadata = file.metadata().map_err(|e| io_error("inspect", e))?;
    if !metadata.is_file() {
        return Err(GraphError::IoError(format!(
            "'{}' is not a regular file",
            path.display()
        )));
    }
    if metadata.len() > limit {
        return Err(GraphError::DeserializationError(format!(
            "Document '{}' is {} bytes, over the {} byte limit",
            path.display(),
            metadata.len(),
            limit
        )));
    }

    let mut text = String::new();
    file.read_to_string(&mut text).map_err(|e| io_error("read", e))?;
    Ok(text)
}

/// Read an exchange document into a new graph.
pub fn load_graph(path: &Path) -> Result<Graph, GraphError> {
    let text = read_document(path, MAX_EXCHANGE_DOCUMENT_SIZE as u64)?;
    let graph = graph_from_json(&text)?;

    info!(
        path = %path.display(),
        bytes = text.len(),
        nodes = graph.len(),
        types = graph.types().count(),
        "loaded exchange document"
    );
    Ok(graph)
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show node counts.
pub fn cmd_status(graph: &Graph, path: &Path, output: Output) -> Result<String, GraphError> {
    let types = graph.types().count();
    let objects = graph.objects().count();
    let deleted = graph.nodes().filter(|node| node.is_deleted()).count();

    if output.json {
        return output.render(&json!({
            "input": path.to_string_lossy(),
            "node_count": graph.len(),
            "type_count": types,
            "object_count": objects,
            "deleted_count": deleted
        }));
    }

    let mut out = String::new();
    out.push_str("typegraph Status\n");
    out.push_str("================\n");
    out.push_str(&format!("Input:   {}\n", path.display()));
    out.push('\n');
    out.push_str(&format!("Nodes:   {}\n", graph.len()));
    out.push_str(&format!("Types:   {}\n", types));
    out.push_str(&format!("Objects: {}\n", objects));
    out.push_str(&format!("Deleted: {}", deleted));
    Ok(out)
}

// =============================================================================
// SCHEMA COMMAND
// =============================================================================

/// List types and their property declarations.
pub fn cmd_schema(graph: &Graph, output: Output) -> Result<String, GraphError> {
    if output.json {
        let types: Vec<Value> = graph
            .types()
            .map(|t| Value::Object(t.serialize()))
            .collect();
        return output.render(&Value::Array(types));
    }

    let mut lines = Vec::new();
    for type_node in graph.types() {
        let name = if type_node.name.is_empty() {
            String::new()
        } else {
            format!(" ({})", type_node.name)
        };
        let deleted = if type_node.is_deleted() { " [deleted]" } else { "" };
        lines.push(format!("{}{}{}", type_node.id, name, deleted));

        for (property, decl) in &type_node.properties {
            let kinds: Vec<&str> = decl.kinds.iter().map(|k| k.as_str()).collect();
            let cardinality = if decl.unique { "one" } else { "many" };
            let role = if decl.is_reference() { "reference" } else { "value" };
            lines.push(format!(
                "  {}: {} ({}, {})",
                property,
                kinds.join(" | "),
                cardinality,
                role
            ));
        }

        if output.verbose {
            for index in &type_node.indexes {
                lines.push(format!(
                    "  index {}: [{}]",
                    index.name.as_deref().unwrap_or("-"),
                    index.properties.join(", ")
                ));
            }
        }
    }

    if lines.is_empty() {
        return Ok("No types defined".to_string());
    }
    Ok(lines.join("\n"))
}

// =============================================================================
// GET COMMAND
// =============================================================================

/// Expand every reference property of `entity` into the referenced records.
fn resolve_references(entity: &Entity, graph: &Graph) -> Record {
    let mut record = entity.serialize();
    for name in entity.properties().keys() {
        let expanded = match entity.get(name, graph) {
            Some(Resolved::Object(target)) => Value::Object(target.serialize()),
            Some(Resolved::Objects(targets)) => Value::Array(
                targets
                    .into_iter()
                    .map(|t| t.map_or(Value::Null, |e| Value::Object(e.serialize())))
                    .collect(),
            ),
            Some(Resolved::Value(_) | Resolved::Values(_)) => continue,
            None => Value::Null,
        };
        record.insert(name.clone(), expanded);
    }
    record
}

/// Print one node's record.
pub fn cmd_get(graph: &Graph, id: &str, resolve: bool, output: Output) -> Result<String, GraphError> {
    let node = graph
        .get(id)
        .ok_or_else(|| GraphError::NotFound(id.to_string()))?;

    let record = match node {
        NodeRef::Object(entity) if resolve => resolve_references(entity, graph),
        other => other.serialize(),
    };
    debug!(id = %id, resolve, keys = record.len(), "rendering node");
    output.render(&Value::Object(record))
}

// =============================================================================
// FIND COMMAND
// =============================================================================

/// Run a selector query given as JSON text.
pub fn cmd_find(graph: &Graph, query: &str, output: Output) -> Result<String, GraphError> {
    let value: Value = serde_json::from_str(query)
        .map_err(|e| GraphError::InvalidQuery(format!("Query is not valid JSON: {}", e)))?;
    let query = Query::from_value(value)?;

    let result = graph.find(&query);
    debug!(matched = result.len(), "query complete");

    if output.json {
        return collection_to_json(&result, output.pretty);
    }

    let label = if result.type_node().name.is_empty() {
        result.type_node().id.to_string()
    } else {
        result.type_node().name.clone()
    };
    let mut lines = vec![format!("{} match(es) of type {}", result.len(), label)];
    for entity in &result {
        if output.verbose {
            lines.push(format!("  {}", Value::Object(entity.serialize())));
        } else {
            lines.push(format!("  {}", entity.id()));
        }
    }
    Ok(lines.join("\n"))
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Serialize, reparse and compare.
pub fn cmd_check(graph: &Graph, output: Output) -> Result<String, GraphError> {
    let text = graph_to_json(graph, false)?;
    let copy = graph_from_json(&text)?;

    let original = graph.serialize();
    let reparsed = copy.serialize();
    if original != reparsed {
        let differing = original
            .iter()
            .filter(|(id, record)| reparsed.get(id.as_str()) != Some(*record))
            .count();
        return Err(GraphError::SerializationError(format!(
            "Round trip changed {} of {} node(s)",
            differing,
            original.len()
        )));
    }

    if output.json {
        return output.render(&json!({
            "round_trip": "ok",
            "node_count": copy.len(),
            "bytes": text.len()
        }));
    }
    Ok(format!(
        "Round trip OK: {} node(s), {} bytes",
        copy.len(),
        text.len()
    ))
}

// =============================================================================
// TESTS
// =============================================================================
