//! Leaf-value scrubbers.
//!
//! A scrubber is a pure transformation from one primitive value to another.
//! Scrubbers never see containers: the engine only hands them leaves.

use std::{borrow::Cow, fmt};

use regex::{NoExpand, Regex};

use crate::{error::RuleSetError, value::Value};

/// Per-backend transformation applied to every primitive leaf.
///
/// Implementations must be pure and stateless: a single scrubber is shared by
/// every call that uses its Rule Set, across threads.
pub trait ValueScrubber: Send + Sync + fmt::Debug {
    /// Scrubs one primitive value. Returning [`Value::Absent`] omits the leaf.
    fn scrub_value(&self, value: Value) -> Value;
}

/// Scrubber that returns every value unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassThrough;

impl ValueScrubber for PassThrough {
    fn scrub_value(&self, value: Value) -> Value {
        value
    }
}

/// Scrubber that removes every match of an ordered list of patterns from
/// string leaves. Non-string values pass through.
///
/// Patterns run in order, each over the output of the previous one. The whole
/// list is repeated until a pass removes nothing, so a match that only forms
/// once a later pattern has joined its halves is removed too.
#[derive(Clone, Debug)]
pub struct StripPatterns {
    patterns: Vec<Regex>,
}

impl StripPatterns {
    /// Compiles `patterns` in order.
    pub fn new<I, S>(patterns: I) -> Result<Self, RuleSetError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(pattern).map_err(|source| RuleSetError::InvalidPattern {
                    pattern: pattern.to_owned(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Wraps already compiled patterns.
    pub fn from_regexes(patterns: Vec<Regex>) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }

    /// Removes every match of every pattern from `text`.
    pub fn strip<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut out = Cow::Borrowed(text);
        loop {
            let before = out.len();
            for pattern in &self.patterns {
                let stripped = match pattern.replace_all(&out, NoExpand("")) {
                    Cow::Owned(stripped) => Some(stripped),
                    Cow::Borrowed(_) => None,
                };
                if let Some(stripped) = stripped {
                    out = Cow::Owned(stripped);
                }
            }
            // Every effective removal shortens the text.
            if out.len() == before {
                return out;
            }
        }
    }
}

impl ValueScrubber for StripPatterns {
    fn scrub_value(&self, value: Value) -> Value {
        match value {
            Value::String(text) => {
                let stripped = match self.strip(&text) {
                    Cow::Owned(stripped) => Some(stripped),
                    Cow::Borrowed(_) => None,
                };
                Value::String(stripped.unwrap_or(text))
            }
            other => other,
        }
    }
}

/// Runs `scrubber` over a string and returns the scrubbed string.
///
/// A scrubber that turns the string into something else (null, absent, a
/// number) yields an empty string, since the caller needs text back.
pub(crate) fn scrub_text<S>(scrubber: &S, text: String) -> String
where
    S: ValueScrubber + ?Sized,
{
    match scrubber.scrub_value(Value::String(text)) {
        Value::String(scrubbed) => scrubbed,
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_through_is_identity() {
        assert_eq!(PassThrough.scrub_value(Value::from("a;b")), Value::from("a;b"));
        assert_eq!(PassThrough.scrub_value(Value::Null), Value::Null);
    }

    #[test]
    fn strip_patterns_run_in_order() {
        // The second pattern only matches once the first has joined the halves.
        let scrubber = StripPatterns::new(["x", "ab"]).unwrap();
        assert_eq!(scrubber.strip("axbc"), "c");
    }

    #[test]
    fn strip_patterns_repeat_until_nothing_matches() {
        // Removing `x` joins a new `ab` that the first pass already went past.
        let scrubber = StripPatterns::new(["ab", "x"]).unwrap();
        assert_eq!(scrubber.strip("aaxbb"), "");
    }

    #[test]
    fn strip_patterns_leave_non_strings_alone() {
        let scrubber = StripPatterns::new(["1"]).unwrap();
        assert_eq!(scrubber.scrub_value(Value::Int(11)), Value::Int(11));
        assert_eq!(scrubber.scrub_value(Value::Bool(true)), Value::Bool(true));
    }

    #[test]
    fn strip_patterns_borrow_when_nothing_matches() {
        let scrubber = StripPatterns::new([r"\d"]).unwrap();
        assert!(matches!(scrubber.strip("letters"), Cow::Borrowed(_)));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = StripPatterns::new(["ok", "(unclosed"]).unwrap_err();
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn scrub_text_falls_back_to_empty_for_non_strings() {
        #[derive(Debug)]
        struct Nullify;
        impl ValueScrubber for Nullify {
            fn scrub_value(&self, _value: Value) -> Value {
                Value::Null
            }
        }
        assert_eq!(scrub_text(&Nullify, "anything".into()), "");
        assert_eq!(scrub_text(&PassThrough, "kept".into()), "kept");
    }
}
