//! # typegraph CLI Module
//!
//! This module implements the CLI interface for typegraph.
//!
//! ## Available Commands
//!
//! - `status` - Show node counts
//! - `schema` - List types and their property declarations
//! - `get` - Print one node, optionally with references expanded
//! - `find` - Run a selector query
//! - `check` - Verify that the document survives a serialize/parse round trip

mod commands;

use crate::config::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use typegraph_core::GraphError;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// typegraph - typed object graph inspector
///
/// Loads a JSON exchange document into memory and answers questions about it.
#[derive(Parser, Debug)]
#[command(name = "typegraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the exchange document
    #[arg(short, long, global = true)]
    pub input: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show node counts
    Status,

    /// List types and their property declarations
    Schema,

    /// Print one node's record
    Get {
        /// Node identifier, e.g. /person/joe
        id: String,

        /// Expand reference properties into the referenced records
        #[arg(short, long)]
        resolve: bool,
    },

    /// Run a selector query, e.g. '{"type": "/type/animal", "name": "Rex"}'
    Find {
        /// Query as a JSON object
        query: String,
    },

    /// Serialize, reparse and compare the loaded graph
    Check,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments and resolved config.
///
/// Returns the text to print.
pub fn execute(cli: Cli, config: &Config) -> Result<String, GraphError> {
    let path = config.input.as_deref().ok_or_else(|| {
        GraphError::IoError(
            "No input document: pass --input or set TYPEGRAPH_INPUT".to_string(),
        )
    })?;
    let graph = load_graph(path)?;
    let output = Output {
        json: cli.json,
        pretty: config.pretty,
        verbose: cli.verbose,
    };

    match cli.command {
        Some(Commands::Status) | None => cmd_status(&graph, path, output),
        Some(Commands::Schema) => cmd_schema(&graph, output),
        Some(Commands::Get { id, resolve }) => cmd_get(&graph, &id, resolve, output),
        Some(Commands::Find { query }) => cmd_find(&graph, &query, output),
        Some(Commands::Check) => cmd_check(&graph, output),
    }
}
