//! Typed scrubbing: running statically typed data through a Rule Set.
//!
//! - [`Scrubbable`]: types that can be walked (derived via `#[derive(Scrub)]`)
//! - [`ScrubText`]: string-like leaves an explicit scrubber can be applied to
//! - [`Scrub`]: user-facing `.scrub()` / `.scrub_for()`
//! - [`ScrubMapper`]: what a walk calls at each leaf; implemented by [`Engine`]
//!
//! ## Field Handling
//!
//! | Annotation | Generated Code | Behavior |
//! |------------|----------------|----------|
//! | None | Pass through | Field unchanged (external types work) |
//! | `#[scrub]` | `Scrubbable::scrub_with` | Walk with the Rule Set |
//! | `#[scrub(Scrubber)]` | `ScrubText::scrub_text` | Apply `Scrubber::default()` to text |
//!
//! Walking a string applies the Rule Set's value scrubber. Walking a
//! string-keyed map screens its keys exactly as the engine screens object keys:
//! pollution keys and forbidden keys drop the entry, kept keys are transformed.
//! Walking a [`Value`] runs the full engine on it.

use std::{
    borrow::Cow,
    collections::{BTreeMap, HashMap},
    hash::BuildHasher,
};

use crate::{
    engine::Engine,
    error::RegistryError,
    registry,
    rules::{scrub_text, RuleSet, ValueScrubber},
    value::{Object, Value},
};

// =============================================================================
// ScrubMapper - what a typed walk calls into
// =============================================================================

/// Leaf operations used by [`Scrubbable`] implementations.
pub trait ScrubMapper {
    /// Sanitizes a dynamic value. Omitted values come back as
    /// [`Value::Absent`].
    fn map_value(&self, value: Value) -> Value;

    /// Scrubs one string leaf.
    fn map_text(&self, text: String) -> String;

    /// Screens one map key. `None` drops the entry.
    fn map_key(&self, key: &str) -> Option<String>;
}

impl ScrubMapper for Engine<'_> {
    fn map_value(&self, value: Value) -> Value {
        self.sanitize(&value).unwrap_or_absent()
    }

    fn map_text(&self, text: String) -> String {
        scrub_text(self.rules().scrubber(), text)
    }

    fn map_key(&self, key: &str) -> Option<String> {
        self.screen_key(key)
    }
}

// =============================================================================
// Scrubbable - types that can be walked
// =============================================================================

/// A type that can be walked with a [`ScrubMapper`].
///
/// Derive it with `#[derive(Scrub)]` on your own structs and enums.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Scrubbable`",
    label = "this type cannot be walked by the sanitizer",
    note = "use `#[derive(Scrub)]` on the type definition",
    note = "or remove `#[scrub]` from the field to pass it through unchanged"
)]
pub trait Scrubbable: Sized {
    /// Consumes `self` and returns the scrubbed copy.
    #[must_use]
    fn scrub_with<M: ScrubMapper>(self, mapper: &M) -> Self;
}

macro_rules! impl_scrubbable_passthrough {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scrubbable for $ty {
                fn scrub_with<M: ScrubMapper>(self, _mapper: &M) -> Self {
                    self
                }
            }
        )*
    };
}

impl_scrubbable_passthrough!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, (),
);

impl Scrubbable for String {
    fn scrub_with<M: ScrubMapper>(self, mapper: &M) -> Self {
        mapper.map_text(self)
    }
}

impl Scrubbable for Cow<'_, str> {
    fn scrub_with<M: ScrubMapper>(self, mapper: &M) -> Self {
        Cow::Owned(mapper.map_text(self.into_owned()))
    }
}

impl Scrubbable for Value {
    fn scrub_with<M: ScrubMapper>(self, mapper: &M) -> Self {
        mapper.map_value(self)
    }
}

impl Scrubbable for Object {
    fn scrub_with<M: ScrubMapper>(self, mapper: &M) -> Self {
        match mapper.map_value(Value::Object(self)) {
            Value::Object(object) => object,
            _ => Object::new(),
        }
    }
}

impl<T> Scrubbable for Option<T>
where
    T: Scrubbable,
{
    fn scrub_with<M: ScrubMapper>(self, mapper: &M) -> Self {
        self.map(|value| value.scrub_with(mapper))
    }
}

impl<T> Scrubbable for Vec<T>
where
    T: Scrubbable,
{
    fn scrub_with<M: ScrubMapper>(self, mapper: &M) -> Self {
        self.into_iter()
            .map(|value| value.scrub_with(mapper))
            .collect()
    }
}

impl<T> Scrubbable for Box<T>
where
    T: Scrubbable,
{
    fn scrub_with<M: ScrubMapper>(self, mapper: &M) -> Self {
        Box::new((*self).scrub_with(mapper))
    }
}

impl<V> Scrubbable for BTreeMap<String, V>
where
    V: Scrubbable,
{
    fn scrub_with<M: ScrubMapper>(self, mapper: &M) -> Self {
        self.into_iter()
            .filter_map(|(key, value)| {
                mapper
                    .map_key(&key)
                    .map(|key| (key, value.scrub_with(mapper)))
            })
            .collect()
    }
}

impl<V, S> Scrubbable for HashMap<String, V, S>
where
    V: Scrubbable,
    S: BuildHasher + Clone,
{
    fn scrub_with<M: ScrubMapper>(self, mapper: &M) -> Self {
        let hasher = self.hasher().clone();
        let mut result = HashMap::with_hasher(hasher);
        result.extend(self.into_iter().filter_map(|(key, value)| {
            mapper
                .map_key(&key)
                .map(|key| (key, value.scrub_with(mapper)))
        }));
        result
    }
}

// =============================================================================
// ScrubText - string-like leaves for an explicit scrubber
// =============================================================================

/// String-like values (and wrappers of them) an explicit [`ValueScrubber`] can
/// be applied to.
///
/// This is what `#[scrub(SomeScrubber)]` calls. Scalars do not implement it:
/// a number has no text to scrub.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not text a scrubber can be applied to",
    label = "`#[scrub(Scrubber)]` needs a string-like field",
    note = "scrubbers apply to `String`, `Cow<str>`, and `Option`/`Vec`/`Box` of them",
    note = "if `{Self}` derives `Scrub`, use bare `#[scrub]` to walk into it"
)]
pub trait ScrubText: Sized {
    #[must_use]
    fn scrub_text<S: ValueScrubber + ?Sized>(self, scrubber: &S) -> Self;
}

impl ScrubText for String {
    fn scrub_text<S: ValueScrubber + ?Sized>(self, scrubber: &S) -> Self {
        scrub_text(scrubber, self)
    }
}

impl ScrubText for Cow<'_, str> {
    fn scrub_text<S: ValueScrubber + ?Sized>(self, scrubber: &S) -> Self {
        Cow::Owned(scrub_text(scrubber, self.into_owned()))
    }
}

impl<T> ScrubText for Option<T>
where
    T: ScrubText,
{
    fn scrub_text<S: ValueScrubber + ?Sized>(self, scrubber: &S) -> Self {
        self.map(|value| value.scrub_text(scrubber))
    }
}

impl<T> ScrubText for Vec<T>
where
    T: ScrubText,
{
    fn scrub_text<S: ValueScrubber + ?Sized>(self, scrubber: &S) -> Self {
        self.into_iter()
            .map(|value| value.scrub_text(scrubber))
            .collect()
    }
}

impl<T> ScrubText for Box<T>
where
    T: ScrubText,
{
    fn scrub_text<S: ValueScrubber + ?Sized>(self, scrubber: &S) -> Self {
        Box::new((*self).scrub_text(scrubber))
    }
}

// =============================================================================
// Scrub - user-facing entrypoint
// =============================================================================

/// Public entrypoint for typed scrubbing, blanket-implemented for every
/// [`Scrubbable`] type.
pub trait Scrub: Scrubbable {
    /// Scrubs the value with `rules`.
    #[must_use]
    fn scrub(self, rules: &RuleSet) -> Self {
        self.scrub_with(&Engine::new(rules))
    }

    /// Scrubs the value with a backend from the process-wide registry.
    fn scrub_for(self, backend: &str) -> Result<Self, RegistryError> {
        let rules = registry::get_rules(backend)?;
        Ok(self.scrub(&rules))
    }
}

impl<T> Scrub for T where T: Scrubbable {}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use serde_json::json;

    use super::*;
    use crate::rules::{KeyMatcher, KeyTransform, PassThrough, StripPatterns};

    fn semicolons() -> RuleSet {
        RuleSet::new(StripPatterns::new([";"]).unwrap())
            .forbid(KeyMatcher::prefix("$"))
            .with_key_transform(KeyTransform::new(r"\.").unwrap())
    }

    #[test]
    fn strings_use_the_rule_set_scrubber() {
        assert_eq!("a;b".to_owned().scrub(&semicolons()), "ab");
        let cow: Cow<'_, str> = Cow::Borrowed("x;");
        assert_eq!(cow.scrub(&semicolons()), "x");
    }

    #[test]
    fn scalars_are_untouched() {
        assert_eq!(42_i32.scrub(&semicolons()), 42);
        assert!(true.scrub(&semicolons()));
    }

    #[test]
    fn wrappers_walk_their_contents() {
        let rules = semicolons();
        assert_eq!(Some("a;".to_owned()).scrub(&rules), Some("a".to_owned()));
        assert_eq!(
            vec!["1;".to_owned(), "2".to_owned()].scrub(&rules),
            vec!["1".to_owned(), "2".to_owned()]
        );
        assert_eq!(*Box::new("b;".to_owned()).scrub(&rules), "b");
    }

    #[test]
    fn map_keys_go_through_the_key_guards() {
        let rules = semicolons();
        let mut map = BTreeMap::new();
        map.insert("$where".to_owned(), "x".to_owned());
        map.insert("__proto__".to_owned(), "x".to_owned());
        map.insert("a.b".to_owned(), "v;".to_owned());

        let scrubbed = map.scrub(&rules);
        assert_eq!(scrubbed.len(), 1);
        assert_eq!(scrubbed["a_b"], "v");
    }

    #[test]
    fn hash_maps_keep_their_hasher_and_screen_keys() {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        map.insert("constructor".into(), vec![]);
        map.insert("list".into(), vec!["a;".into()]);
        let scrubbed = map.scrub(&semicolons());
        assert_eq!(scrubbed.len(), 1);
        assert_eq!(scrubbed["list"], vec!["a".to_owned()]);
    }

    #[test]
    fn dynamic_values_run_the_engine() {
        let value = Value::from(json!({ "$gt": 1, "ok": "a;" }));
        let scrubbed = value.scrub(&semicolons());
        assert_eq!(scrubbed.to_json().unwrap(), json!({ "ok": "a" }));
    }

    #[test]
    fn objects_stay_objects() {
        let object = Object::from_entries([("a.b", Value::from(1))]);
        let scrubbed = object.scrub(&semicolons());
        assert_eq!(scrubbed.keys(), vec!["a_b".to_owned()]);
    }

    #[test]
    fn scrub_text_applies_an_explicit_scrubber() {
        let scrubber = StripPatterns::new(["-"]).unwrap();
        assert_eq!("a-b".to_owned().scrub_text(&scrubber), "ab");
        assert_eq!(
            Some(vec!["x-".to_owned()]).scrub_text(&scrubber),
            Some(vec!["x".to_owned()])
        );
        assert_eq!("keep".to_owned().scrub_text(&PassThrough), "keep");
    }

    #[cfg(feature = "backends")]
    #[test]
    fn scrub_for_uses_the_registry() {
        let cleaned = "a\r\nb".to_owned().scrub_for("redis").unwrap();
        assert_eq!(cleaned, "ab");
        assert!("x".to_owned().scrub_for("no-such-backend").is_err());
    }
}
