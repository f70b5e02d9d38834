//! Backend registry and the top-level `sanitize` entrypoint.
//!
//! A [`Registry`] maps backend names to shared [`RuleSet`]s. Registration is
//! expected at startup; [`Registry::freeze`] ends that phase, after which the
//! registry is read-only and `register` fails with [`RegistryError::Frozen`].
//!
//! The free functions ([`register`], [`get_rules`], [`freeze`], [`sanitize`])
//! operate on a process-wide registry preloaded with the reference backends
//! (when the `backends` feature is enabled).

use std::{
    collections::HashMap,
    sync::{Arc, LazyLock},
};

use parking_lot::RwLock;

use crate::{
    engine::{Engine, Sanitized, DEFAULT_MAX_DEPTH},
    error::RegistryError,
    rules::{RuleSet, RulesOverride},
    value::Value,
};

/// Options for one [`sanitize`] call.
#[derive(Clone, Debug)]
pub struct SanitizeOptions {
    backend: String,
    max_depth: usize,
    rules_override: Option<RulesOverride>,
}

impl SanitizeOptions {
    /// Options for `backend` with [`DEFAULT_MAX_DEPTH`] and no override.
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            max_depth: DEFAULT_MAX_DEPTH,
            rules_override: None,
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_rules_override(mut self, overrides: RulesOverride) -> Self {
        self.rules_override = Some(overrides);
        self
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn rules_override(&self) -> Option<&RulesOverride> {
        self.rules_override.as_ref()
    }
}

#[derive(Default)]
struct State {
    rules: HashMap<String, Arc<RuleSet>>,
    frozen: bool,
}

/// Name-indexed Rule Set lookup.
#[derive(Default)]
pub struct Registry {
    state: RwLock<State>,
}

impl Registry {
    /// Creates an empty, unfrozen registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the reference Rule Sets.
    #[cfg(feature = "backends")]
    pub fn with_reference_backends() -> Self {
        let rules = crate::backends::reference_rule_sets()
            .into_iter()
            .map(|(name, rules)| (name.to_owned(), Arc::new(rules)))
            .collect();
        Self {
            state: RwLock::new(State {
                rules,
                frozen: false,
            }),
        }
    }

    /// Installs or replaces the Rule Set for `backend`.
    pub fn register(
        &self,
        backend: impl Into<String>,
        rules: impl Into<Arc<RuleSet>>,
    ) -> Result<(), RegistryError> {
        let backend = backend.into();
        let mut state = self.state.write();
        if state.frozen {
            return Err(RegistryError::Frozen(backend));
        }
        let replaced = state.rules.insert(backend.clone(), rules.into()).is_some();
        tracing::debug!(backend = backend.as_str(), replaced, "registered rule set");
        Ok(())
    }

    /// Returns the Rule Set registered for `backend`.
    pub fn get_rules(&self, backend: &str) -> Result<Arc<RuleSet>, RegistryError> {
        self.state
            .read()
            .rules
            .get(backend)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(backend.to_owned()))
    }

    pub fn contains(&self, backend: &str) -> bool {
        self.state.read().rules.contains_key(backend)
    }

    /// Registered backend names, sorted.
    pub fn backends(&self) -> Vec<String> {
        let mut names: Vec<_> = self.state.read().rules.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Ends the registration phase. Idempotent.
    pub fn freeze(&self) {
        let mut state = self.state.write();
        if !state.frozen {
            state.frozen = true;
            tracing::info!(backends = state.rules.len(), "rule registry frozen");
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.state.read().frozen
    }

    /// Looks up the backend's Rule Set, applies the override and sanitizes
    /// `input`.
    ///
    /// The only error is an unregistered backend.
    pub fn sanitize(
        &self,
        input: &Value,
        options: &SanitizeOptions,
    ) -> Result<Sanitized, RegistryError> {
        let base = self.get_rules(options.backend())?;
        let rules = match options.rules_override() {
            Some(overrides) => Arc::new(base.merged(overrides)),
            None => base,
        };
        Ok(Engine::with_max_depth(&rules, options.max_depth()).sanitize(input))
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("Registry")
            .field("backends", &state.rules.keys().collect::<Vec<_>>())
            .field("frozen", &state.frozen)
            .finish()
    }
}

// =============================================================================
// Process-wide registry
// =============================================================================

static GLOBAL: LazyLock<Registry> = LazyLock::new(|| {
    #[cfg(feature = "backends")]
    let registry = Registry::with_reference_backends();
    #[cfg(not(feature = "backends"))]
    let registry = Registry::new();
    registry
});

/// The process-wide registry used by the free functions.
pub fn global() -> &'static Registry {
    &GLOBAL
}

/// Installs or replaces a Rule Set in the process-wide registry.
pub fn register(backend: impl Into<String>, rules: impl Into<Arc<RuleSet>>) -> Result<(), RegistryError> {
    GLOBAL.register(backend, rules)
}

/// Returns a Rule Set from the process-wide registry.
pub fn get_rules(backend: &str) -> Result<Arc<RuleSet>, RegistryError> {
    GLOBAL.get_rules(backend)
}

/// Freezes the process-wide registry.
pub fn freeze() {
    GLOBAL.freeze();
}

/// Sanitizes `input` with a backend from the process-wide registry.
///
/// ```rust
/// use sanitization::{sanitize, SanitizeOptions, Value};
/// use serde_json::json;
///
/// let input = Value::from(json!({ "username": { "$gt": "" }, "na.me": "alice" }));
/// let clean = sanitize(&input, &SanitizeOptions::new("mongo")).unwrap();
///
/// let clean = clean.unwrap_or_absent().to_json().unwrap();
/// assert_eq!(clean, json!({ "username": {}, "na_me": "alice" }));
/// ```
pub fn sanitize(input: &Value, options: &SanitizeOptions) -> Result<Sanitized, RegistryError> {
    GLOBAL.sanitize(input, options)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::rules::{KeyMatcher, PassThrough};

    #[test]
    fn unknown_backend_is_not_found() {
        let registry = Registry::new();
        let err = registry.get_rules("cassandra").unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(name) if name == "cassandra"));

        let err = registry
            .sanitize(&Value::Null, &SanitizeOptions::new("cassandra"))
            .unwrap_err();
        assert_eq!(err.to_string(), "no rules registered for backend: cassandra");
    }

    #[test]
    fn register_replaces_existing_rules() {
        let registry = Registry::new();
        registry
            .register("custom", RuleSet::new(PassThrough))
            .unwrap();
        registry
            .register("custom", RuleSet::new(PassThrough).forbid(KeyMatcher::prefix("x")))
            .unwrap();
        assert!(registry.get_rules("custom").unwrap().is_forbidden("xy"));
        assert_eq!(registry.backends(), vec!["custom".to_owned()]);
    }

    #[test]
    fn frozen_registry_rejects_registration_but_serves_lookups() {
        let registry = Registry::new();
        registry.register("a", RuleSet::default()).unwrap();
        registry.freeze();
        registry.freeze();
        assert!(registry.is_frozen());

        let err = registry.register("b", RuleSet::default()).unwrap_err();
        assert!(matches!(err, RegistryError::Frozen(name) if name == "b"));
        assert!(registry.contains("a"));
        assert!(!registry.contains("b"));
    }

    #[test]
    fn override_applies_to_one_call_only() {
        let registry = Registry::new();
        registry
            .register("custom", RuleSet::default().forbid(KeyMatcher::prefix("secret")))
            .unwrap();
        let input = Value::from(json!({ "secret": 1, "open": 2 }));

        let options = SanitizeOptions::new("custom")
            .with_rules_override(RulesOverride::new().forbidden_keys([]));
        let relaxed = registry.sanitize(&input, &options).unwrap().unwrap_or_absent();
        assert_eq!(relaxed.to_json().unwrap(), json!({ "secret": 1, "open": 2 }));

        let strict = registry
            .sanitize(&input, &SanitizeOptions::new("custom"))
            .unwrap()
            .unwrap_or_absent();
        assert_eq!(strict.to_json().unwrap(), json!({ "open": 2 }));
    }

    #[test]
    fn max_depth_option_reaches_the_engine() {
        let registry = Registry::new();
        registry.register("custom", RuleSet::default()).unwrap();
        let input = Value::from(json!({ "a": { "b": 1 } }));
        let options = SanitizeOptions::new("custom").with_max_depth(1);
        let output = registry.sanitize(&input, &options).unwrap().unwrap_or_absent();
        assert_eq!(output.to_json().unwrap(), json!({ "a": {} }));
    }

    #[cfg(feature = "backends")]
    #[test]
    fn reference_registry_holds_four_backends() {
        let registry = Registry::with_reference_backends();
        assert_eq!(
            registry.backends(),
            vec!["elasticsearch", "mongo", "redis", "sql"]
        );
        assert!(!registry.is_frozen());
    }

    #[test]
    fn options_default_to_fifty_levels() {
        let options = SanitizeOptions::new("sql");
        assert_eq!(options.backend(), "sql");
        assert_eq!(options.max_depth(), 50);
        assert!(options.rules_override().is_none());
    }
}
