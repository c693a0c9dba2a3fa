//! # Formats Module
//!
//! Textual encodings of the exchange format.
//!
//! File I/O operations are in the app layer.

mod exchange;

pub use exchange::{collection_from_json, collection_to_json, graph_from_json, graph_to_json};
