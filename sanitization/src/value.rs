//! The value model walked by the engine.
//!
//! Every decoded value is represented as a [`Value`], a tagged variant whose
//! classification ([`ValueKind`]) drives traversal. Keyed containers are held
//! by shared reference ([`Object`]) so that identity, and therefore cycles, can
//! be expressed and mirrored.
//!
//! `Value` is deliberately single-threaded (`Rc`): a value graph belongs to the
//! call that sanitizes it.

use std::{
    any::Any,
    borrow::Cow,
    cell::{Ref, RefCell},
    fmt,
    rc::Rc,
};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use regex::Regex;

type Entries = IndexMap<String, Value>;

/// Coarse classification of a [`Value`], in the order the engine checks it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Absent, null, booleans, numbers and strings.
    Primitive,
    /// Built-ins that are structurally inert (timestamps, patterns).
    OpaqueSafe,
    /// Ordered sequences.
    Sequence,
    /// Host instances with their own identity or behavior.
    Instance,
    /// Plain string-keyed containers.
    Keyed,
}

/// A decoded value.
#[derive(Clone, Default)]
pub enum Value {
    /// No value at all. Dropped from keyed containers, kept as a hole in arrays.
    #[default]
    Absent,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Integers outside the `i64` range.
    BigInt(i128),
    String(String),
    Timestamp(DateTime<Utc>),
    Pattern(Regex),
    Array(Vec<Value>),
    Instance(Instance),
    Object(Object),
}

impl Value {
    /// Returns the classification used for dispatch.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Absent
            | Self::Null
            | Self::Bool(_)
            | Self::Int(_)
            | Self::Float(_)
            | Self::BigInt(_)
            | Self::String(_) => ValueKind::Primitive,
            Self::Timestamp(_) | Self::Pattern(_) => ValueKind::OpaqueSafe,
            Self::Array(_) => ValueKind::Sequence,
            Self::Instance(_) => ValueKind::Instance,
            Self::Object(_) => ValueKind::Keyed,
        }
    }

    /// Short name of the variant, or the host type name for instances.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Absent => "absent",
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::BigInt(_) => "bigint",
            Self::String(_) => "string",
            Self::Timestamp(_) => "timestamp",
            Self::Pattern(_) => "pattern",
            Self::Array(_) => "array",
            Self::Instance(instance) => instance.type_name(),
            Self::Object(_) => "object",
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Self::Instance(instance) => Some(instance),
            _ => None,
        }
    }
}

// =============================================================================
// Object - plain keyed container
// =============================================================================

/// A plain string-keyed container with reference identity.
///
/// Cloning an `Object` clones the handle, not the entries: both handles see the
/// same map and compare identical under [`Object::ptr_eq`]. Entries iterate in
/// insertion order; re-inserting an existing key keeps its position.
///
/// An object that (directly or indirectly) contains itself forms a reference
/// cycle and is not freed on drop. Call [`Object::clear`] to break it.
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<Entries>>);

impl Object {
    /// Creates an empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an object from key/value pairs. Later duplicates win.
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self(Rc::new(RefCell::new(map)))
    }

    /// Inserts an entry, returning the previous value under that key.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value.into())
    }

    /// Returns a clone of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    /// Removes an entry, keeping the order of the others.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Returns the keys in iteration order.
    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    /// Returns a snapshot of the entries in iteration order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Removes every entry. Breaks any cycle running through this object.
    pub fn clear(&self) {
        // Move the entries out first so that nested drops never observe a
        // borrowed map.
        let entries = std::mem::take(&mut *self.0.borrow_mut());
        drop(entries);
    }

    /// Returns `true` when both handles refer to the same object.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Identity of the underlying allocation.
    pub(crate) fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub(crate) fn borrow(&self) -> Ref<'_, Entries> {
        self.0.borrow()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

// =============================================================================
// Instance - non-plain host values
// =============================================================================

/// A host value the engine does not look inside: byte buffers, map/set-like
/// collections, callables, or any other type with its own identity.
///
/// Instances compare by identity. Cloning shares the payload.
#[derive(Clone)]
pub struct Instance {
    type_name: Cow<'static, str>,
    payload: Rc<dyn Any>,
}

impl Instance {
    pub fn new<T: Any>(type_name: impl Into<Cow<'static, str>>, payload: T) -> Self {
        Self {
            type_name: type_name.into(),
            payload: Rc::new(payload),
        }
    }

    /// Wraps a binary buffer.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new("Bytes", bytes.into())
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref()
    }

    /// Returns `true` when both handles share one payload.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.payload), Rc::as_ptr(&other.payload))
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({})", self.type_name)
    }
}

// =============================================================================
// Equality
// =============================================================================

impl PartialEq for Value {
    /// Structural equality. Containers already under comparison are assumed
    /// equal, so cyclic graphs with the same shape compare equal.
    fn eq(&self, other: &Self) -> bool {
        let mut in_progress = Vec::new();
        values_eq(self, other, &mut in_progress)
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        let mut in_progress = Vec::new();
        objects_eq(self, other, &mut in_progress)
    }
}

#[allow(clippy::float_cmp)]
fn values_eq(a: &Value, b: &Value, in_progress: &mut Vec<(usize, usize)>) -> bool {
    match (a, b) {
        (Value::Absent, Value::Absent) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::BigInt(x), Value::BigInt(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Timestamp(x), Value::Timestamp(y)) => x == y,
        (Value::Pattern(x), Value::Pattern(y)) => x.as_str() == y.as_str(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .zip(y)
                    .all(|(x, y)| values_eq(x, y, in_progress))
        }
        (Value::Instance(x), Value::Instance(y)) => x.ptr_eq(y),
        (Value::Object(x), Value::Object(y)) => objects_eq(x, y, in_progress),
        _ => false,
    }
}

fn objects_eq(a: &Object, b: &Object, in_progress: &mut Vec<(usize, usize)>) -> bool {
    if a.ptr_eq(b) {
        return true;
    }
    let pair = (a.id(), b.id());
    if in_progress.contains(&pair) {
        return true;
    }
    in_progress.push(pair);

    // Key order does not take part in equality.
    let (left, right) = (a.borrow(), b.borrow());
    left.len() == right.len()
        && left.iter().all(|(key, lv)| {
            right
                .get(key)
                .is_some_and(|rv| values_eq(lv, rv, in_progress))
        })
}

// =============================================================================
// Debug
// =============================================================================

/// Debug adapter that prints `<cycle>` instead of re-entering an ancestor.
struct DebugValue<'a> {
    value: &'a Value,
    ancestors: &'a RefCell<Vec<usize>>,
}

impl fmt::Debug for DebugValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Absent => f.write_str("Absent"),
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::BigInt(n) => write!(f, "{n}n"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Timestamp(t) => write!(f, "Timestamp({})", t.to_rfc3339()),
            Value::Pattern(re) => write!(f, "Pattern(/{}/)", re.as_str()),
            Value::Array(items) => f
                .debug_list()
                .entries(items.iter().map(|value| DebugValue {
                    value,
                    ancestors: self.ancestors,
                }))
                .finish(),
            Value::Instance(instance) => fmt::Debug::fmt(instance, f),
            Value::Object(object) => {
                let id = object.id();
                if self.ancestors.borrow().contains(&id) {
                    return f.write_str("<cycle>");
                }
                self.ancestors.borrow_mut().push(id);
                let entries = object.borrow();
                let result = f
                    .debug_map()
                    .entries(entries.iter().map(|(key, value)| {
                        (
                            key,
                            DebugValue {
                                value,
                                ancestors: self.ancestors,
                            },
                        )
                    }))
                    .finish();
                self.ancestors.borrow_mut().pop();
                result
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ancestors = RefCell::new(Vec::new());
        fmt::Debug::fmt(
            &DebugValue {
                value: self,
                ancestors: &ancestors,
            },
            f,
        )
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&Value::Object(self.clone()), f)
    }
}

// =============================================================================
// Conversions
// =============================================================================

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::$variant(value.into())
                }
            }
        )*
    };
}

impl_from_for_value!(
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    i128 => BigInt,
    f32 => Float,
    f64 => Float,
    String => String,
    &str => String,
    DateTime<Utc> => Timestamp,
    Regex => Pattern,
    Vec<Value> => Array,
    Instance => Instance,
    Object => Object,
);

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or_else(|_| Self::BigInt(i128::from(value)), Self::Int)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
