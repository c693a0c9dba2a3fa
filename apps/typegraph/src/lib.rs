//! # typegraph
//!
//! Command-line inspection of typed object graphs.
//!
//! The binary in `main.rs` only parses arguments, installs logging and
//! prints; everything it runs lives here so it can be tested directly.

pub mod cli;
pub mod config;
