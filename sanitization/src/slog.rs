//! Adapters for emitting sanitized values through `slog`.
//!
//! This module provides `slog::Value` implementations that serialize sanitized
//! outputs as structured JSON via `slog`'s nested-value support.
//!
//! It is responsible for:
//! - Ensuring the logged representation is the sanitized output, never the
//!   original value.
//! - Avoiding fallible logging APIs: values JSON cannot express (cycles, host
//!   instances) and serialization failures are logged as placeholder strings.
//!
//! It does not configure `slog` or choose Rule Sets.

use serde::Serialize;
use serde_json::Value as JsonValue;
use slog::{Key, Record, Result as SlogResult, Serializer, Value as SlogValue};

use crate::{
    engine::Sanitized,
    rules::RuleSet,
    typed::{Scrub, Scrubbable},
};

/// Placeholder logged when a sanitized value has no JSON form.
pub const UNSERIALIZABLE_PLACEHOLDER: &str = "Failed to serialize sanitized value";

/// A `slog::Value` that emits an owned sanitized payload as structured JSON.
#[derive(Clone, Debug, PartialEq)]
pub struct SanitizedJson {
    value: JsonValue,
}

impl SanitizedJson {
    fn new(value: JsonValue) -> Self {
        Self { value }
    }

    fn placeholder() -> Self {
        Self::new(JsonValue::String(UNSERIALIZABLE_PLACEHOLDER.to_owned()))
    }

    /// The JSON that will be logged.
    pub fn as_json(&self) -> &JsonValue {
        &self.value
    }
}

impl SlogValue for SanitizedJson {
    fn serialize(
        &self,
        record: &Record<'_>,
        key: Key,
        serializer: &mut dyn Serializer,
    ) -> SlogResult {
        let nested = slog::Serde(self.value.clone());
        SlogValue::serialize(&nested, record, key, serializer)
    }
}

/// Converts an engine outcome into a loggable value.
///
/// An omitted outcome logs as `null`.
///
/// ## Example
/// ```ignore
/// use sanitization::slog::IntoSanitizedJson;
///
/// info!(logger, "query"; "filter" => sanitize(&filter, &options)?.into_sanitized_json());
/// ```
pub trait IntoSanitizedJson {
    fn into_sanitized_json(self) -> SanitizedJson;
}

impl IntoSanitizedJson for Sanitized {
    fn into_sanitized_json(self) -> SanitizedJson {
        match self {
            Self::Value(value) => value
                .to_json()
                .map_or_else(|_| SanitizedJson::placeholder(), SanitizedJson::new),
            Self::Omit => SanitizedJson::new(JsonValue::Null),
        }
    }
}

/// Scrubs a typed value with a Rule Set and converts the result into a
/// loggable value. The unscrubbed value is never serialized.
pub trait IntoScrubbedJson: Scrubbable + Serialize {
    fn into_scrubbed_json(self, rules: &RuleSet) -> SanitizedJson {
        let scrubbed = self.scrub(rules);
        serde_json::to_value(scrubbed).map_or_else(|_| SanitizedJson::placeholder(), SanitizedJson::new)
    }
}

impl<T> IntoScrubbedJson for T where T: Scrubbable + Serialize {}
