//! # typegraph
//!
//! Command-line inspector for typed object graphs.
//!
//! ## Usage
//!
//! ```bash
//! typegraph --input zoo.json status
//! typegraph --input zoo.json schema
//! typegraph --input zoo.json get /person/joe --resolve --pretty
//! typegraph --input zoo.json find '{"type": "/type/animal", "name": "Rex"}'
//! TYPEGRAPH_LOG_FORMAT=json typegraph --input zoo.json check
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use typegraph::cli;
use typegraph::config::{Config, LogFormat};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // The subscriber depends on the config, so config errors go to stderr directly.
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config
            .with_env(|key| std::env::var(key).ok())
            .with_flags(cli.input.as_deref(), cli.pretty),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config, cli.verbose);

    match cli::execute(cli, &config) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            tracing::error!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured filter.
fn init_tracing(config: &Config, verbose: bool) {
    let default_filter = if verbose {
        "typegraph=debug,typegraph_core=debug"
    } else {
        config.log_filter()
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match config.log_format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
