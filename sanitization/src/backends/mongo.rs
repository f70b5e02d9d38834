//! Document store rules.

use std::sync::LazyLock;

use regex::Regex;

use crate::rules::{KeyMatcher, KeyTransform, PassThrough, RuleSet};

static OPERATOR_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$").expect("operator key pattern is valid"));
static DOTTED_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.").expect("dot pattern is valid"));

/// Drops `$`-prefixed operator keys and replaces `.` in keys, which the
/// document store would read as a path separator.
///
/// Values pass through unchanged: no numeric or boolean coercion.
pub fn mongo() -> RuleSet {
    RuleSet::new(PassThrough)
        .forbid(KeyMatcher::Pattern(OPERATOR_KEY.clone()))
        .forbid(KeyMatcher::prefix("__proto__"))
        .forbid(KeyMatcher::prefix("prototype"))
        .forbid(KeyMatcher::prefix("constructor"))
        .with_key_transform(KeyTransform::from_regex(DOTTED_PATH.clone()))
        .with_strip_unknown_types(true)
}
