//! Cache protocol rules.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    rules::{KeyTransform, RuleSet, StripPatterns, ValueScrubber},
    value::Value,
};

static LINE_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\r\n\x00]").expect("line break pattern is valid"));
static LINE_BREAK_STRIPPER: LazyLock<StripPatterns> =
    LazyLock::new(|| StripPatterns::from_regexes(vec![LINE_BREAKS.clone()]));

/// Removes CR, LF and NUL from string values, so a value cannot terminate a
/// protocol line.
#[derive(Clone, Copy, Debug, Default)]
pub struct CrlfScrubber;

impl ValueScrubber for CrlfScrubber {
    fn scrub_value(&self, value: Value) -> Value {
        LINE_BREAK_STRIPPER.scrub_value(value)
    }
}

/// Replaces CR, LF and NUL in keys and removes them from values.
pub fn redis() -> RuleSet {
    RuleSet::new(CrlfScrubber)
        .with_key_transform(KeyTransform::from_regex(LINE_BREAKS.clone()))
        .with_strip_unknown_types(true)
}
