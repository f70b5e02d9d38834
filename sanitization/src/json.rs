//! Conversion between [`Value`] and `serde_json::Value`.
//!
//! Decoding JSON always succeeds. Encoding can fail for graphs JSON cannot
//! express: cycles and host instances.

use serde_json::{Map, Number, Value as JsonValue};

use crate::{
    error::ValueError,
    value::{Object, Value},
};

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => from_number(&n),
            JsonValue::String(s) => Self::String(s),
            JsonValue::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            JsonValue::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

fn from_number(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Int(i)
    } else if let Some(u) = n.as_u64() {
        Value::BigInt(i128::from(u))
    } else {
        n.as_f64().map_or(Value::Null, Value::Float)
    }
}

impl Value {
    /// Encodes this value as JSON.
    ///
    /// - `Absent` entries are skipped in objects and encoded as `null` in
    ///   arrays (and at the top level).
    /// - Timestamps become RFC 3339 strings and patterns their source text.
    /// - Big integers become numbers when they fit `i64`/`u64`, otherwise
    ///   decimal strings.
    /// - Non-finite floats become `null`.
    ///
    /// # Errors
    ///
    /// [`ValueError::Cycle`] when an object contains one of its ancestors and
    /// [`ValueError::Unrepresentable`] for host instances.
    pub fn to_json(&self) -> Result<JsonValue, ValueError> {
        let mut ancestors = Vec::new();
        encode(self, &mut ancestors)
    }
}

fn encode(value: &Value, ancestors: &mut Vec<usize>) -> Result<JsonValue, ValueError> {
    Ok(match value {
        Value::Absent | Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::from(*i),
        Value::Float(x) => Number::from_f64(*x).map_or(JsonValue::Null, JsonValue::Number),
        Value::BigInt(n) => encode_big_int(*n),
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Timestamp(t) => JsonValue::String(t.to_rfc3339()),
        Value::Pattern(re) => JsonValue::String(re.as_str().to_owned()),
        Value::Array(items) => JsonValue::Array(
            items
                .iter()
                .map(|item| encode(item, ancestors))
                .collect::<Result<_, _>>()?,
        ),
        Value::Instance(instance) => {
            return Err(ValueError::Unrepresentable {
                type_name: instance.type_name().to_owned(),
            })
        }
        Value::Object(object) => encode_object(object, ancestors)?,
    })
}

fn encode_big_int(n: i128) -> JsonValue {
    if let Ok(i) = i64::try_from(n) {
        JsonValue::from(i)
    } else if let Ok(u) = u64::try_from(n) {
        JsonValue::from(u)
    } else {
        JsonValue::String(n.to_string())
    }
}

fn encode_object(object: &Object, ancestors: &mut Vec<usize>) -> Result<JsonValue, ValueError> {
    let id = object.id();
    if ancestors.contains(&id) {
        return Err(ValueError::Cycle);
    }
    ancestors.push(id);

    let mut map = Map::new();
    let result = object
        .borrow()
        .iter()
        .filter(|(_, value)| !value.is_absent())
        .try_for_each(|(key, value)| -> Result<(), ValueError> {
            map.insert(key.clone(), encode(value, ancestors)?);
            Ok(())
        });

    ancestors.pop();
    result.map(|()| JsonValue::Object(map))
}
