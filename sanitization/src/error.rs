//! Error types.
//!
//! Sanitization itself never fails: content-level risks degrade to omission.
//! These errors cover the surfaces around the engine: registry lookups, rule
//! construction, configuration loading, and leaving the value model for JSON.

use std::path::PathBuf;

/// Errors raised by the backend registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No Rule Set is registered under the requested backend name.
    #[error("no rules registered for backend: {0}")]
    NotFound(String),
    /// Registration was attempted after the registry was frozen.
    #[error("registry is frozen; cannot register backend: {0}")]
    Frozen(String),
}

/// Errors raised while building rule set components from patterns.
#[derive(Debug, thiserror::Error)]
pub enum RuleSetError {
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors raised when converting a [`Value`](crate::Value) to JSON.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValueError {
    /// The value graph references one of its own ancestors.
    #[error("value graph contains a cycle")]
    Cycle,
    /// The value holds a host instance with no JSON form.
    #[error("`{type_name}` instances have no JSON representation")]
    Unrepresentable { type_name: String },
}

/// Errors raised while loading rule set configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read rule configuration {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse rule configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("backend `{backend}`: {source}")]
    RuleSet {
        backend: String,
        #[source]
        source: RuleSetError,
    },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
