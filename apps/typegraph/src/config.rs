//! # Configuration
//!
//! Settings are layered, later layers winning:
//! 1. Built-in defaults
//! 2. TOML file (`--config`, or `typegraph.toml` in the working directory)
//! 3. Environment (`TYPEGRAPH_INPUT`, `TYPEGRAPH_LOG_FORMAT`)
//! 4. Command-line flags

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use typegraph_core::GraphError;

/// Config file picked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "typegraph.toml";

/// Default `EnvFilter` directive.
pub const DEFAULT_LOG_FILTER: &str = "typegraph=info";

/// Environment variable naming the exchange document.
pub const ENV_INPUT: &str = "TYPEGRAPH_INPUT";

/// Environment variable selecting the log format (`text` or `json`).
pub const ENV_LOG_FORMAT: &str = "TYPEGRAPH_LOG_FORMAT";

/// Maximum config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Parse a format name. Anything other than `json` is text.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Resolved application settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Exchange document to load.
    pub input: Option<PathBuf>,
    /// Log output format.
    pub log_format: LogFormat,
    /// `EnvFilter` directive; `RUST_LOG` still takes precedence.
    pub log_filter: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Config {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, GraphError> {
        toml::from_str(text)
            .map_err(|e| GraphError::DeserializationError(format!("Invalid config: {}", e)))
    }

    /// Read a config file.
    pub fn from_file(path: &Path) -> Result<Self, GraphError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            GraphError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(GraphError::IoError(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            GraphError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// Load the explicit config file, else `typegraph.toml` if present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, GraphError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply environment overrides read through `lookup`.
    #[must_use]
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(input) = lookup(ENV_INPUT).filter(|v| !v.is_empty()) {
            self.input = Some(PathBuf::from(input));
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            self.log_format = LogFormat::parse(&format);
        }
        self
    }

    /// Apply command-line overrides.
    #[must_use]
    pub fn with_flags(mut self, input: Option<&Path>, pretty: bool) -> Self {
        if let Some(input) = input {
            self.input = Some(input.to_path_buf());
        }
        self.pretty |= pretty;
        self
    }

    /// The filter directive to install.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}
