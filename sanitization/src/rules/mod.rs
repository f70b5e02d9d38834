//! Rule Sets: the per-backend configuration the engine consumes.
//!
//! A Rule Set is pure data plus one capability:
//!
//! - **forbidden keys**: matchers whose keys are dropped,
//! - **key transform**: a character class replaced by [`KEY_PLACEHOLDER`],
//! - **value scrubber**: the [`ValueScrubber`] applied to every leaf,
//! - **unknown-type policy**: whether host instances are stripped.
//!
//! Rule Sets are built with consuming methods and never mutated afterwards.
//! The pollution-key guard lives in [`guard`] and is not part of a Rule Set.

use std::{borrow::Cow, fmt, sync::Arc};

use regex::{NoExpand, Regex};

use crate::{error::RuleSetError, value::Value};

mod guard;
mod scrubber;

pub(crate) use guard::{screen_key, KeyVerdict};
pub use guard::{is_pollution_key, matches_forbidden, POLLUTION_KEYS};
pub(crate) use scrubber::scrub_text;
pub use scrubber::{PassThrough, StripPatterns, ValueScrubber};

/// Replacement for every key character matched by a [`KeyTransform`].
pub const KEY_PLACEHOLDER: &str = "_";

fn compile(pattern: &str) -> Result<Regex, RuleSetError> {
    Regex::new(pattern).map_err(|source| RuleSetError::InvalidPattern {
        pattern: pattern.to_owned(),
        source,
    })
}

// =============================================================================
// KeyMatcher
// =============================================================================

/// A forbidden-key test.
#[derive(Clone, Debug)]
pub enum KeyMatcher {
    /// Matches keys starting with the given text.
    Prefix(String),
    /// Matches keys the regex finds a match in (unanchored unless the pattern
    /// anchors itself).
    Pattern(Regex),
}

impl KeyMatcher {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self, RuleSetError> {
        compile(pattern).map(Self::Pattern)
    }

    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Prefix(prefix) => key.starts_with(prefix.as_str()),
            Self::Pattern(pattern) => pattern.is_match(key),
        }
    }
}

impl From<Regex> for KeyMatcher {
    fn from(pattern: Regex) -> Self {
        Self::Pattern(pattern)
    }
}

// =============================================================================
// KeyTransform
// =============================================================================

/// Replaces every match of a pattern in a key with [`KEY_PLACEHOLDER`].
#[derive(Clone, Debug)]
pub struct KeyTransform {
    pattern: Regex,
}

impl KeyTransform {
    pub fn new(pattern: &str) -> Result<Self, RuleSetError> {
        compile(pattern).map(Self::from_regex)
    }

    pub fn from_regex(pattern: Regex) -> Self {
        Self { pattern }
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    /// Returns the key with every match replaced. Borrows when nothing matched.
    pub fn apply<'k>(&self, key: &'k str) -> Cow<'k, str> {
        self.pattern.replace_all(key, NoExpand(KEY_PLACEHOLDER))
    }
}

// =============================================================================
// RuleSet
// =============================================================================

/// Backend-scoped sanitization rules.
///
/// ```rust
/// use sanitization::{KeyMatcher, KeyTransform, PassThrough, RuleSet};
///
/// let rules = RuleSet::new(PassThrough)
///     .forbid(KeyMatcher::pattern(r"^\$").unwrap())
///     .with_key_transform(KeyTransform::new(r"\.").unwrap())
///     .with_strip_unknown_types(true);
/// assert!(rules.is_forbidden("$where"));
/// assert_eq!(rules.transform_key("na.me"), "na_me");
/// ```
#[derive(Clone)]
pub struct RuleSet {
    forbidden_keys: Vec<KeyMatcher>,
    key_transform: Option<KeyTransform>,
    sanitize_value: Arc<dyn ValueScrubber>,
    strip_unknown_types: bool,
}

impl RuleSet {
    /// Creates a Rule Set with the given scrubber, no forbidden keys, no key
    /// transform, and host instances passed through.
    pub fn new(scrubber: impl ValueScrubber + 'static) -> Self {
        Self::with_shared_scrubber(Arc::new(scrubber))
    }

    /// Like [`RuleSet::new`], reusing an already shared scrubber.
    pub fn with_shared_scrubber(scrubber: Arc<dyn ValueScrubber>) -> Self {
        Self {
            forbidden_keys: Vec::new(),
            key_transform: None,
            sanitize_value: scrubber,
            strip_unknown_types: false,
        }
    }

    /// Appends a forbidden-key matcher.
    #[must_use]
    pub fn forbid(mut self, matcher: KeyMatcher) -> Self {
        self.forbidden_keys.push(matcher);
        self
    }

    /// Replaces the forbidden-key matchers.
    #[must_use]
    pub fn with_forbidden_keys(mut self, matchers: impl IntoIterator<Item = KeyMatcher>) -> Self {
        self.forbidden_keys = matchers.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_key_transform(mut self, transform: KeyTransform) -> Self {
        self.key_transform = Some(transform);
        self
    }

    #[must_use]
    pub fn with_strip_unknown_types(mut self, strip: bool) -> Self {
        self.strip_unknown_types = strip;
        self
    }

    pub fn forbidden_keys(&self) -> &[KeyMatcher] {
        &self.forbidden_keys
    }

    pub fn key_transform(&self) -> Option<&KeyTransform> {
        self.key_transform.as_ref()
    }

    pub fn scrubber(&self) -> &dyn ValueScrubber {
        self.sanitize_value.as_ref()
    }

    pub fn strips_unknown_types(&self) -> bool {
        self.strip_unknown_types
    }

    /// Returns `true` when a forbidden-key matcher accepts `key`.
    ///
    /// This does not include the pollution guard, which the engine applies
    /// on its own.
    pub fn is_forbidden(&self, key: &str) -> bool {
        matches_forbidden(key, &self.forbidden_keys)
    }

    /// Applies the key transform, if any.
    pub fn transform_key<'k>(&self, key: &'k str) -> Cow<'k, str> {
        match &self.key_transform {
            Some(transform) => transform.apply(key),
            None => Cow::Borrowed(key),
        }
    }

    /// Applies the value scrubber to one leaf.
    pub fn scrub_value(&self, value: Value) -> Value {
        self.sanitize_value.scrub_value(value)
    }

    /// Returns a copy with every field present in `overrides` replaced.
    ///
    /// Missing override fields fall back to this Rule Set; overrides are not
    /// validated.
    #[must_use]
    pub fn merged(&self, overrides: &RulesOverride) -> Self {
        Self {
            forbidden_keys: overrides
                .forbidden_keys
                .clone()
                .unwrap_or_else(|| self.forbidden_keys.clone()),
            key_transform: overrides
                .key_transform
                .clone()
                .or_else(|| self.key_transform.clone()),
            sanitize_value: overrides
                .sanitize_value
                .clone()
                .unwrap_or_else(|| Arc::clone(&self.sanitize_value)),
            strip_unknown_types: overrides
                .strip_unknown_types
                .unwrap_or(self.strip_unknown_types),
        }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new(PassThrough)
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("forbidden_keys", &self.forbidden_keys)
            .field(
                "key_transform",
                &self.key_transform.as_ref().map(KeyTransform::as_str),
            )
            .field("sanitize_value", &self.sanitize_value)
            .field("strip_unknown_types", &self.strip_unknown_types)
            .finish()
    }
}

// =============================================================================
// RulesOverride
// =============================================================================

/// Per-call replacements for Rule Set fields. `None` keeps the base value.
#[derive(Clone, Debug, Default)]
pub struct RulesOverride {
    pub forbidden_keys: Option<Vec<KeyMatcher>>,
    pub key_transform: Option<KeyTransform>,
    pub sanitize_value: Option<Arc<dyn ValueScrubber>>,
    pub strip_unknown_types: Option<bool>,
}

impl RulesOverride {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn forbidden_keys(mut self, matchers: impl IntoIterator<Item = KeyMatcher>) -> Self {
        self.forbidden_keys = Some(matchers.into_iter().collect());
        self
    }

    #[must_use]
    pub fn key_transform(mut self, transform: KeyTransform) -> Self {
        self.key_transform = Some(transform);
        self
    }

    #[must_use]
    pub fn sanitize_value(mut self, scrubber: impl ValueScrubber + 'static) -> Self {
        self.sanitize_value = Some(Arc::new(scrubber));
        self
    }

    #[must_use]
    pub fn strip_unknown_types(mut self, strip: bool) -> Self {
        self.strip_unknown_types = Some(strip);
        self
    }
}
