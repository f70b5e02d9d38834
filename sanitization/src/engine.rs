//! The recursive traversal engine.
//!
//! [`Engine::sanitize`] walks a [`Value`] graph and builds a sanitized copy
//! under one [`RuleSet`]. Classification runs in a fixed order:
//!
//! 1. depth guard (`depth > max_depth` omits the value),
//! 2. primitives go through the Rule Set's value scrubber,
//! 3. timestamps and patterns pass through unchanged,
//! 4. arrays are mapped element by element (omitted elements become holes),
//! 5. host instances are stripped or passed through by reference,
//! 6. objects are rebuilt key by key behind the key guards.
//!
//! Objects already visited in the current call map to the output object that
//! was allocated for them, so cyclic inputs produce cyclic outputs of the same
//! shape and traversal always terminates.
//!
//! The engine never fails. Anything it cannot keep safely is omitted.

use std::collections::HashMap;

use crate::{
    rules::{screen_key, KeyVerdict, RuleSet},
    value::{Object, Value, ValueKind},
};

/// Recursion ceiling used when the caller does not pass one.
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// Outcome of sanitizing one value.
#[derive(Clone, Debug, PartialEq)]
#[must_use]
pub enum Sanitized {
    /// The sanitized copy.
    Value(Value),
    /// The value must not appear in the output at all.
    Omit,
}

impl Sanitized {
    /// Returns the sanitized value, or `None` when omitted.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Omit => None,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Omit => None,
        }
    }

    pub fn is_omit(&self) -> bool {
        matches!(self, Self::Omit)
    }

    /// Returns the sanitized value, or [`Value::Absent`] when omitted.
    pub fn unwrap_or_absent(self) -> Value {
        self.into_value().unwrap_or_default()
    }
}

/// Applies one [`RuleSet`] to value graphs.
///
/// An engine borrows its Rule Set and holds no per-call state, so one engine
/// can sanitize any number of values.
///
/// ```rust
/// use sanitization::{Engine, KeyTransform, PassThrough, RuleSet, Value};
///
/// let rules = RuleSet::new(PassThrough).with_key_transform(KeyTransform::new(r"\.").unwrap());
/// let input = Value::from(serde_json::json!({ "a.b": 1, "__proto__": {} }));
///
/// let output = Engine::new(&rules).sanitize(&input).unwrap_or_absent();
/// assert_eq!(output.to_json().unwrap(), serde_json::json!({ "a_b": 1 }));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Engine<'r> {
    rules: &'r RuleSet,
    max_depth: usize,
}

impl<'r> Engine<'r> {
    /// Creates an engine with [`DEFAULT_MAX_DEPTH`].
    pub fn new(rules: &'r RuleSet) -> Self {
        Self::with_max_depth(rules, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(rules: &'r RuleSet, max_depth: usize) -> Self {
        Self { rules, max_depth }
    }

    pub fn rules(&self) -> &'r RuleSet {
        self.rules
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Sanitizes `input`, leaving it untouched.
    pub fn sanitize(&self, input: &Value) -> Sanitized {
        Traversal::new(self.rules, self.max_depth).visit(input, 0)
    }

    /// Screens one key: `None` when it is a pollution or forbidden key,
    /// otherwise the (possibly transformed) key.
    pub(crate) fn screen_key(&self, key: &str) -> Option<String> {
        match screen_key(self.rules, key) {
            KeyVerdict::Keep(key) => Some(key.into_owned()),
            KeyVerdict::Pollution | KeyVerdict::Forbidden => {
                tracing::trace!(key, "dropping rejected key");
                None
            }
        }
    }
}

/// State for one top-level call.
struct Traversal<'r> {
    rules: &'r RuleSet,
    max_depth: usize,
    /// Input object identity to the output object built for it.
    visited: HashMap<usize, Object>,
}

impl<'r> Traversal<'r> {
    fn new(rules: &'r RuleSet, max_depth: usize) -> Self {
        Self {
            rules,
            max_depth,
            visited: HashMap::new(),
        }
    }

    fn visit(&mut self, input: &Value, depth: usize) -> Sanitized {
        if depth > self.max_depth {
            tracing::trace!(depth, max_depth = self.max_depth, "depth limit reached");
            return Sanitized::Omit;
        }

        match input.kind() {
            ValueKind::Primitive => match self.rules.scrub_value(input.clone()) {
                Value::Absent => Sanitized::Omit,
                scrubbed => Sanitized::Value(scrubbed),
            },
            ValueKind::OpaqueSafe => Sanitized::Value(input.clone()),
            ValueKind::Sequence => {
                let items = input.as_array().unwrap_or_default();
                let mapped = items
                    .iter()
                    .map(|item| self.visit(item, depth + 1).unwrap_or_absent())
                    .collect();
                Sanitized::Value(Value::Array(mapped))
            }
            ValueKind::Instance => {
                if self.rules.strips_unknown_types() {
                    tracing::trace!(
                        type_name = input.type_name(),
                        depth,
                        "stripping unknown type"
                    );
                    Sanitized::Omit
                } else {
                    Sanitized::Value(input.clone())
                }
            }
            ValueKind::Keyed => match input.as_object() {
                Some(object) => Sanitized::Value(Value::Object(self.visit_object(object, depth))),
                None => Sanitized::Omit,
            },
        }
    }

    fn visit_object(&mut self, input: &Object, depth: usize) -> Object {
        if let Some(output) = self.visited.get(&input.id()) {
            return output.clone();
        }

        let output = Object::new();
        self.visited.insert(input.id(), output.clone());

        let entries = input.borrow();
        for (key, value) in entries.iter() {
            let key = match screen_key(self.rules, key) {
                KeyVerdict::Keep(key) => key,
                KeyVerdict::Pollution => {
                    tracing::trace!(key = key.as_str(), depth, "dropping pollution key");
                    continue;
                }
                KeyVerdict::Forbidden => {
                    tracing::trace!(key = key.as_str(), depth, "dropping forbidden key");
                    continue;
                }
            };

            if let Sanitized::Value(value) = self.visit(value, depth + 1) {
                output.insert(key.into_owned(), value);
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        rules::{KeyMatcher, KeyTransform, PassThrough, StripPatterns, ValueScrubber},
        value::Instance,
    };

    fn nested(levels: usize) -> Value {
        let mut value = Value::from("leaf");
        for _ in 0..levels {
            value = Value::Object(Object::from_entries([("a", value)]));
        }
        value
    }

    fn depth_of(value: &Value) -> usize {
        match value {
            Value::Object(object) => object.get("a").map_or(0, |inner| 1 + depth_of(&inner)),
            _ => 0,
        }
    }

    #[test]
    fn primitives_go_through_the_scrubber() {
        let rules = RuleSet::new(StripPatterns::new([";"]).unwrap());
        let engine = Engine::new(&rules);
        assert_eq!(
            engine.sanitize(&Value::from("a;b")),
            Sanitized::Value(Value::from("ab"))
        );
        assert_eq!(engine.sanitize(&Value::Int(3)), Sanitized::Value(Value::Int(3)));
        assert_eq!(engine.sanitize(&Value::Null), Sanitized::Value(Value::Null));
    }

    #[test]
    fn absent_scrubber_output_omits() {
        #[derive(Debug)]
        struct DropNulls;
        impl ValueScrubber for DropNulls {
            fn scrub_value(&self, value: Value) -> Value {
                if value.is_null() {
                    Value::Absent
                } else {
                    value
                }
            }
        }

        let rules = RuleSet::new(DropNulls);
        let input = Value::from(json!({ "a": null, "b": 1 }));
        let output = Engine::new(&rules).sanitize(&input).unwrap_or_absent();
        assert_eq!(output.to_json().unwrap(), json!({ "b": 1 }));
    }

    #[test]
    fn depth_equal_to_the_limit_is_kept() {
        let rules = RuleSet::default();
        let engine = Engine::with_max_depth(&rules, 3);

        let kept = engine.sanitize(&nested(3)).unwrap_or_absent();
        assert_eq!(depth_of(&kept), 3);

        // One more level: the leaf sits past the limit and its entry is dropped.
        let truncated = engine.sanitize(&nested(4)).unwrap_or_absent();
        assert_eq!(depth_of(&truncated), 3);
    }

    #[test]
    fn zero_depth_still_processes_the_root() {
        let rules = RuleSet::default();
        let engine = Engine::with_max_depth(&rules, 0);
        assert_eq!(
            engine.sanitize(&Value::from("x")),
            Sanitized::Value(Value::from("x"))
        );
        let output = engine.sanitize(&nested(1)).unwrap_or_absent();
        assert!(output.as_object().unwrap().is_empty());
    }

    #[test]
    fn opaque_values_pass_through() {
        let rules = RuleSet::new(StripPatterns::new(["a"]).unwrap());
        let pattern = Value::Pattern(regex::Regex::new("a+").unwrap());
        assert_eq!(
            Engine::new(&rules).sanitize(&pattern),
            Sanitized::Value(pattern.clone())
        );
    }

    #[test]
    fn omitted_array_elements_leave_holes() {
        let rules = RuleSet::default().with_strip_unknown_types(true);
        let input = Value::Array(vec![
            Value::from(1),
            Value::Instance(Instance::bytes(vec![0])),
            Value::from(3),
        ]);
        let output = Engine::new(&rules).sanitize(&input).unwrap_or_absent();
        assert_eq!(
            output,
            Value::Array(vec![Value::from(1), Value::Absent, Value::from(3)])
        );
    }

    #[test]
    fn instances_pass_through_by_reference_when_kept() {
        let rules = RuleSet::default();
        let buffer = Instance::bytes(vec![1, 2]);
        let output = Engine::new(&rules)
            .sanitize(&Value::Instance(buffer.clone()))
            .unwrap_or_absent();
        assert!(output.as_instance().unwrap().ptr_eq(&buffer));
    }

    #[test]
    fn key_guards_run_in_order() {
        let rules = RuleSet::default()
            .forbid(KeyMatcher::prefix("$"))
            .with_key_transform(KeyTransform::new(r"\.").unwrap());
        let input = Value::from(json!({
            "__proto__": { "polluted": true },
            "$where": "1",
            "a.b": "kept",
        }));
        let output = Engine::new(&rules).sanitize(&input).unwrap_or_absent();
        assert_eq!(output.to_json().unwrap(), json!({ "a_b": "kept" }));
    }

    #[test]
    fn later_colliding_key_wins() {
        let rules = RuleSet::default().with_key_transform(KeyTransform::new(r"\.").unwrap());

        let input = Value::from(json!({ "a_b": 2, "a.b": 1 }));
        let output = Engine::new(&rules).sanitize(&input).unwrap_or_absent();
        assert_eq!(output.to_json().unwrap(), json!({ "a_b": 1 }));

        let input = Value::from(json!({ "a.b": 1, "a_b": 2 }));
        let output = Engine::new(&rules).sanitize(&input).unwrap_or_absent();
        assert_eq!(output.to_json().unwrap(), json!({ "a_b": 2 }));
    }

    #[test]
    fn key_order_is_preserved() {
        let rules = RuleSet::default()
            .forbid(KeyMatcher::prefix("$"))
            .with_key_transform(KeyTransform::new(r"\.").unwrap());
        let input = Value::from(json!({ "zeta": 1, "$skip": 0, "alpha": -1, "m.id": 1 }));
        let output = Engine::new(&rules).sanitize(&input).unwrap_or_absent();
        assert_eq!(output.as_object().unwrap().keys(), vec!["zeta", "alpha", "m_id"]);
    }

    #[test]
    fn cycles_are_mirrored() {
        let input = Object::new();
        input.insert("name", "root");
        input.insert("self", input.clone());

        let rules = RuleSet::default();
        let output = Engine::new(&rules)
            .sanitize(&Value::Object(input.clone()))
            .unwrap_or_absent();
        let output = output.as_object().unwrap().clone();

        assert!(!output.ptr_eq(&input));
        let inner = output.get("self").unwrap();
        assert!(inner.as_object().unwrap().ptr_eq(&output));

        input.clear();
        output.clear();
    }

    #[test]
    fn shared_subtrees_stay_shared() {
        let shared = Object::from_entries([("v", Value::from(1))]);
        let input = Object::from_entries([
            ("left", Value::Object(shared.clone())),
            ("right", Value::Object(shared)),
        ]);

        let rules = RuleSet::default();
        let output = Engine::new(&rules)
            .sanitize(&Value::Object(input))
            .unwrap_or_absent();
        let output = output.as_object().unwrap();
        let left = output.get("left").unwrap();
        let right = output.get("right").unwrap();
        assert!(left.as_object().unwrap().ptr_eq(right.as_object().unwrap()));
    }

    #[test]
    fn input_is_not_modified() {
        let rules = RuleSet::new(StripPatterns::new([";"]).unwrap()).forbid(KeyMatcher::prefix("x"));
        let input = Value::from(json!({ "x": 1, "y": "a;b" }));
        let before = input.to_json().unwrap();
        let _ = Engine::new(&rules).sanitize(&input);
        assert_eq!(input.to_json().unwrap(), before);
    }

    #[test]
    fn rules_are_reusable_across_engines() {
        let rules = RuleSet::new(PassThrough);
        let a = Engine::new(&rules);
        let b = Engine::with_max_depth(&rules, 1);
        assert!(std::ptr::eq(a.rules(), b.rules()));
        assert_eq!(a.max_depth(), DEFAULT_MAX_DEPTH);
    }
}
