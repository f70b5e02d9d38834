//! Search engine rules.

use std::sync::LazyLock;

use regex::Regex;

use crate::rules::{KeyMatcher, PassThrough, RuleSet};

static SCRIPT_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^script$").expect("script key pattern is valid"));

/// Drops any key named `script`, in any letter case and at any depth, which
/// removes scripting from query DSL payloads.
pub fn elasticsearch() -> RuleSet {
    RuleSet::new(PassThrough)
        .forbid(KeyMatcher::Pattern(SCRIPT_KEY.clone()))
        .with_strip_unknown_types(true)
}
