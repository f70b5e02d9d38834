//! Relational engine rules.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    rules::{KeyTransform, RuleSet, StripPatterns, ValueScrubber},
    value::Value,
};

static STATEMENT_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(";").expect("separator pattern is valid"));

static INJECTION_TOKENS: LazyLock<StripPatterns> = LazyLock::new(|| {
    StripPatterns::new([
        // control characters
        r"[\x00\x08\t\x1a\n\r]",
        // comments and statement terminators
        r"(--|;|/\*|\*/)",
        // quotes, backslash, parentheses
        r#"["'\\()]"#,
    ])
    .expect("sql token patterns are valid")
});

/// Removes control characters, comment markers, statement terminators, quotes,
/// backslashes and parentheses from string values, in that order.
#[derive(Clone, Copy, Debug, Default)]
pub struct SqlScrubber;

impl ValueScrubber for SqlScrubber {
    fn scrub_value(&self, value: Value) -> Value {
        INJECTION_TOKENS.scrub_value(value)
    }
}

/// Replaces `;` in keys and strips obvious injection tokens from values.
///
/// Always use parameterized queries. This only reduces obvious patterns.
pub fn sql() -> RuleSet {
    RuleSet::new(SqlScrubber)
        .with_key_transform(KeyTransform::from_regex(STATEMENT_SEPARATOR.clone()))
        .with_strip_unknown_types(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scrub(text: &str) -> Value {
        SqlScrubber.scrub_value(Value::from(text))
    }

    #[test]
    fn classic_injection_is_flattened() {
        assert_eq!(
            scrub("Robert'); DROP TABLE users;--"),
            Value::from("Robert DROP TABLE users")
        );
    }

    #[test]
    fn control_characters_are_removed() {
        assert_eq!(scrub("a\0b\x08c\td\x1ae\nf\rg"), Value::from("abcdefg"));
    }

    #[test]
    fn comment_markers_are_removed() {
        assert_eq!(scrub("x /* y */ z -- w"), Value::from("x  y  z  w"));
    }

    #[test]
    fn quotes_and_backslashes_are_removed() {
        assert_eq!(scrub(r#"say "hi" \ it's (ok)"#), Value::from("say hi  its ok"));
    }

    #[test]
    fn non_strings_are_untouched() {
        assert_eq!(SqlScrubber.scrub_value(Value::Int(25)), Value::Int(25));
        assert_eq!(SqlScrubber.scrub_value(Value::Null), Value::Null);
    }

    #[test]
    fn semicolons_in_keys_become_placeholders() {
        assert_eq!(sql().transform_key("a;b"), "a_b");
        assert!(sql().forbidden_keys().is_empty());
    }
}
