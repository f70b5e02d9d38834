//! Rule Sets declared as data.
//!
//! A configuration document maps backend names to declarative Rule Sets:
//!
//! ```json
//! {
//!   "backends": {
//!     "graph": {
//!       "forbidden_keys": [{ "prefix": "$" }, { "pattern": "(?i)^eval$" }],
//!       "key_transform": "[.:]",
//!       "strip_value_patterns": ["[\\r\\n]"],
//!       "strip_unknown_types": true
//!     }
//!   }
//! }
//! ```
//!
//! Every field except the backend name is optional. Parsing only checks the
//! document's shape. Patterns are compiled once, by [`BackendsConfig::build_all`]
//! or [`BackendsConfig::register_into`], and an invalid regex fails the whole
//! build before any Rule Set is registered.

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, RuleSetError},
    registry::Registry,
    rules::{KeyMatcher, KeyTransform, PassThrough, RuleSet, StripPatterns},
};

/// A forbidden-key matcher as written in configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeyMatcherConfig {
    /// Key starts with the given text.
    Prefix(String),
    /// Unanchored regex search.
    Pattern(String),
}

impl KeyMatcherConfig {
    fn build(&self) -> Result<KeyMatcher, RuleSetError> {
        match self {
            Self::Prefix(prefix) => Ok(KeyMatcher::prefix(prefix.as_str())),
            Self::Pattern(pattern) => KeyMatcher::pattern(pattern),
        }
    }
}

/// One declarative Rule Set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RuleSetConfig {
    #[serde(default)]
    pub forbidden_keys: Vec<KeyMatcherConfig>,
    /// Character-class pattern replaced by `_` in keys.
    #[serde(default)]
    pub key_transform: Option<String>,
    /// Patterns removed from string values, in order. Empty means values pass
    /// through unchanged.
    #[serde(default)]
    pub strip_value_patterns: Vec<String>,
    #[serde(default)]
    pub strip_unknown_types: bool,
}

impl RuleSetConfig {
    /// Compiles every pattern and builds the Rule Set.
    pub fn build(&self) -> Result<RuleSet, RuleSetError> {
        let mut rules = if self.strip_value_patterns.is_empty() {
            RuleSet::new(PassThrough)
        } else {
            RuleSet::new(StripPatterns::new(&self.strip_value_patterns)?)
        };

        for matcher in &self.forbidden_keys {
            rules = rules.forbid(matcher.build()?);
        }
        if let Some(pattern) = &self.key_transform {
            rules = rules.with_key_transform(KeyTransform::new(pattern)?);
        }
        Ok(rules.with_strip_unknown_types(self.strip_unknown_types))
    }
}

/// A configuration document: backend name to Rule Set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendsConfig {
    #[serde(default)]
    pub backends: BTreeMap<String, RuleSetConfig>,
}

impl BackendsConfig {
    /// Parses a JSON document. Patterns are not compiled yet.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Builds every Rule Set, in backend name order.
    pub fn build_all(&self) -> Result<Vec<(String, RuleSet)>, ConfigError> {
        self.backends
            .iter()
            .map(|(backend, config)| {
                config
                    .build()
                    .map(|rules| (backend.clone(), rules))
                    .map_err(|source| ConfigError::RuleSet {
                        backend: backend.clone(),
                        source,
                    })
            })
            .collect()
    }

    /// Builds every Rule Set and registers it, replacing existing entries with
    /// the same name. Nothing is registered when any Rule Set fails to build.
    pub fn register_into(&self, registry: &Registry) -> Result<(), ConfigError> {
        for (backend, rules) in self.build_all()? {
            registry.register(backend, rules)?;
        }
        Ok(())
    }
}
