//! Key-safety guards owned by the engine.
//!
//! The pollution-key denylist is fixed and runs before any Rule Set logic, so
//! no backend configuration can re-enable it.

use std::borrow::Cow;

use super::{KeyMatcher, RuleSet};

/// Key names used to walk or reassign an object's inheritance chain.
pub const POLLUTION_KEYS: [&str; 3] = ["__proto__", "prototype", "constructor"];

/// Returns `true` when `key` is exactly one of [`POLLUTION_KEYS`].
pub fn is_pollution_key(key: &str) -> bool {
    POLLUTION_KEYS.contains(&key)
}

/// Returns `true` when any matcher accepts `key`.
pub fn matches_forbidden(key: &str, matchers: &[KeyMatcher]) -> bool {
    matchers.iter().any(|matcher| matcher.matches(key))
}

/// What happens to one key of a keyed container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum KeyVerdict<'k> {
    /// Dropped by the pollution guard.
    Pollution,
    /// Dropped by the Rule Set's forbidden keys.
    Forbidden,
    /// Kept, possibly under a transformed name.
    Keep(Cow<'k, str>),
}

/// Runs the pollution guard, the forbidden-key check and the key transform,
/// in that order.
///
/// A transformed key goes through both guards again: `_.proto__` must not come
/// out as `__proto__`.
pub(crate) fn screen_key<'k>(rules: &RuleSet, key: &'k str) -> KeyVerdict<'k> {
    if is_pollution_key(key) {
        return KeyVerdict::Pollution;
    }
    if matches_forbidden(key, rules.forbidden_keys()) {
        return KeyVerdict::Forbidden;
    }
    let transformed = rules.transform_key(key);
    if let Cow::Owned(renamed) = &transformed {
        if is_pollution_key(renamed) {
            return KeyVerdict::Pollution;
        }
        if matches_forbidden(renamed, rules.forbidden_keys()) {
            return KeyVerdict::Forbidden;
        }
    }
    KeyVerdict::Keep(transformed)
}
