//! Dynamic value graph shared by the plain and class sides of a conversion
//!
//! A [`Value`] is either a primitive or a shared handle to a container.
//! Containers are reference counted so one value can be reachable from
//! several places, and so cycles can be represented at all. Identity of a
//! container is the address of its handle; the conversion engine relies on
//! it to terminate cycles and to preserve structural sharing.
//!
//! Objects carry an optional [`ClassId`]: `None` is a plain object (the
//! shape a JSON parser produces), `Some` is an instance of a registered class.

use crate::error::{Error, Result};
use crate::types::ClassId;
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// Insertion-ordered field storage
pub type Fields = IndexMap<String, Value>;

/// Shared handle to an object
pub type ObjectRef = Rc<RefCell<Object>>;

/// Shared handle to an array or set
pub type ListRef = Rc<RefCell<Vec<Value>>>;

/// Shared handle to a dictionary-like map
pub type MapRef = Rc<RefCell<Fields>>;

/// An object: plain when `class` is `None`, a class instance otherwise
#[derive(Clone, Default)]
pub struct Object {
    class: Option<ClassId>,
    fields: Fields,
}

impl Object {
    /// An empty plain object
    pub fn plain() -> Self {
        Self::default()
    }

    /// An empty, field-less instance of `class`
    pub fn instance(class: ClassId) -> Self {
        Self {
            class: Some(class),
            fields: Fields::new(),
        }
    }

    pub fn with_fields(class: Option<ClassId>, fields: Fields) -> Self {
        Self { class, fields }
    }

    pub fn class(&self) -> Option<ClassId> {
        self.class
    }

    pub fn is_instance(&self) -> bool {
        self.class.is_some()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Insert or replace a field, keeping the original position on replace
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A node of a value tree or graph
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Bytes(Vec<u8>),
    Date(DateTime<Utc>),
    Array(ListRef),
    Set(ListRef),
    Map(MapRef),
    Object(ObjectRef),
}

impl Value {
    /// An empty plain object
    pub fn plain_object() -> Self {
        Value::Object(Rc::new(RefCell::new(Object::plain())))
    }

    /// A plain object with the given fields
    pub fn object<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let fields = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Value::Object(Rc::new(RefCell::new(Object::with_fields(None, fields))))
    }

    /// An empty instance of `class`
    pub fn instance(class: ClassId) -> Self {
        Value::Object(Rc::new(RefCell::new(Object::instance(class))))
    }

    /// An instance of `class` with the given fields
    pub fn instance_with<K, I>(class: ClassId, fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let fields = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Value::Object(Rc::new(RefCell::new(Object::with_fields(Some(class), fields))))
    }

    pub fn array<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::Array(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    /// A set-like sequence; duplicates are not checked
    pub fn set<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::Set(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    /// An empty dictionary-like map
    pub fn empty_map() -> Self {
        Value::Map(Rc::new(RefCell::new(Fields::new())))
    }

    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let entries = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    /// Whether this value has no inner structure to walk
    pub fn is_primitive(&self) -> bool {
        !matches!(
            self,
            Value::Array(_) | Value::Set(_) | Value::Map(_) | Value::Object(_)
        )
    }

    /// `null` or `undefined`
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    /// Short name of the variant, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::Array(_) => "array",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Class of an object value, `None` for plain objects and non-objects
    pub fn class_id(&self) -> Option<ClassId> {
        self.as_object().and_then(|obj| obj.borrow().class())
    }

    pub fn is_instance(&self) -> bool {
        self.class_id().is_some()
    }

    /// Read a field of an object or an entry of a map
    pub fn get(&self, key: &str) -> Option<Value> {
        match self {
            Value::Object(obj) => obj.borrow().get(key).cloned(),
            Value::Map(entries) => entries.borrow().get(key).cloned(),
            _ => None,
        }
    }

    /// Write a field of an object or an entry of a map.
    ///
    /// Returns `false` when this value is not keyed.
    pub fn set_field(&self, key: impl Into<String>, value: Value) -> bool {
        match self {
            Value::Object(obj) => {
                obj.borrow_mut().insert(key, value);
                true
            }
            Value::Map(entries) => {
                entries.borrow_mut().insert(key.into(), value);
                true
            }
            _ => false,
        }
    }

    /// Snapshot of the members of an array or set
    pub fn items(&self) -> Option<Vec<Value>> {
        match self {
            Value::Array(items) | Value::Set(items) => Some(items.borrow().clone()),
            _ => None,
        }
    }

    /// Number of members of a container
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Array(items) | Value::Set(items) => Some(items.borrow().len()),
            Value::Map(entries) => Some(entries.borrow().len()),
            Value::Object(obj) => Some(obj.borrow().len()),
            _ => None,
        }
    }

    /// Reference identity of a container, `None` for primitives
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::Array(items) | Value::Set(items) => Some(Rc::as_ptr(items) as *const () as usize),
            Value::Map(entries) => Some(Rc::as_ptr(entries) as *const () as usize),
            Value::Object(obj) => Some(Rc::as_ptr(obj) as *const () as usize),
            _ => None,
        }
    }

    /// Whether both values are the same container
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Render this value as a JSON tree.
    ///
    /// Dates become RFC 3339 strings, bytes become arrays of numbers, maps
    /// become objects and sets become arrays. Undefined object fields are
    /// omitted. Fails if the graph contains a cycle.
    pub fn to_json(&self) -> Result<JsonValue> {
        let mut stack = Vec::new();
        self.to_json_at("$", &mut stack)
    }

    fn to_json_at(&self, path: &str, stack: &mut Vec<usize>) -> Result<JsonValue> {
        let identity = self.identity();
        if let Some(id) = identity {
            if stack.contains(&id) {
                return Err(Error::CircularReference {
                    path: path.to_string(),
                });
            }
            stack.push(id);
        }

        let rendered = match self {
            Value::Undefined | Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Bytes(bytes) => JsonValue::Array(bytes.iter().map(|b| JsonValue::from(*b)).collect()),
            Value::Date(date) => JsonValue::String(date.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Value::Array(items) | Value::Set(items) => {
                let items = items.borrow();
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    out.push(item.to_json_at(&format!("{}[{}]", path, index), stack)?);
                }
                JsonValue::Array(out)
            }
            Value::Map(entries) => fields_to_json(&entries.borrow(), path, stack)?,
            Value::Object(obj) => fields_to_json(obj.borrow().fields(), path, stack)?,
        };

        if identity.is_some() {
            stack.pop();
        }
        Ok(rendered)
    }
}

/// Text form of a number: integral values print without a fraction
pub(crate) fn format_number(n: f64) -> String {
    if n == 0.0 {
        // -0 prints as 0
        return "0".to_string();
    }
    n.to_string()
}

fn number_to_json(n: f64) -> JsonValue {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        JsonValue::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null)
    }
}

fn fields_to_json(fields: &Fields, path: &str, stack: &mut Vec<usize>) -> Result<JsonValue> {
    let mut out = serde_json::Map::new();
    for (key, value) in fields {
        if matches!(value, Value::Undefined) {
            continue;
        }
        out.insert(key.clone(), value.to_json_at(&format!("{}.{}", path, key), stack)?);
    }
    Ok(JsonValue::Object(out))
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::array(items.into_iter().map(Value::from)),
            JsonValue::Object(fields) => Value::object(fields.into_iter().map(|(k, v)| (k, Value::from(v)))),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(date: DateTime<Utc>) -> Self {
        Value::Date(date)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

// Structural equality. Container pairs already under comparison are assumed
// equal, which makes comparison of isomorphic cyclic graphs terminate.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        let mut seen = HashSet::new();
        deep_eq(self, other, &mut seen)
    }
}

fn deep_eq(a: &Value, b: &Value, seen: &mut HashSet<(usize, usize)>) -> bool {
    if let (Some(x), Some(y)) = (a.identity(), b.identity()) {
        if x == y || !seen.insert((x, y)) {
            return true;
        }
    }

    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Bytes(x), Value::Bytes(y)) => x == y,
        (Value::Date(x), Value::Date(y)) => x == y,
        (Value::Array(x), Value::Array(y)) | (Value::Set(x), Value::Set(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(l, r)| deep_eq(l, r, seen))
        }
        (Value::Map(x), Value::Map(y)) => fields_eq(&x.borrow(), &y.borrow(), seen),
        (Value::Object(x), Value::Object(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.class() == y.class() && fields_eq(x.fields(), y.fields(), seen)
        }
        _ => false,
    }
}

fn fields_eq(x: &Fields, y: &Fields, seen: &mut HashSet<(usize, usize)>) -> bool {
    x.len() == y.len()
        && x.iter().all(|(key, left)| {
            y.get(key)
                .map(|right| deep_eq(left, right, seen))
                .unwrap_or(false)
        })
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stack = RefCell::new(Vec::new());
        Tracked { value: self, stack: &stack }.fmt(f)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stack = RefCell::new(Vec::new());
        write_object(self, &stack, f)
    }
}

/// Debug adapter that prints revisited containers as `<circular>`
struct Tracked<'a> {
    value: &'a Value,
    stack: &'a RefCell<Vec<usize>>,
}

impl fmt::Debug for Tracked<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let identity = self.value.identity();
        if let Some(id) = identity {
            if self.stack.borrow().contains(&id) {
                return f.write_str("<circular>");
            }
            self.stack.borrow_mut().push(id);
        }

        let stack = self.stack;
        let result = match self.value {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{:?}", b),
            Value::Number(n) => write!(f, "{:?}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bytes(bytes) => write!(f, "Bytes({:?})", bytes),
            Value::Date(date) => write!(f, "Date({})", date.to_rfc3339()),
            Value::Array(items) => f
                .debug_list()
                .entries(items.borrow().iter().map(|value| Tracked { value, stack }))
                .finish(),
            Value::Set(items) => {
                f.write_str("Set")?;
                f.debug_list()
                    .entries(items.borrow().iter().map(|value| Tracked { value, stack }))
                    .finish()
            }
            Value::Map(entries) => {
                f.write_str("Map")?;
                f.debug_map()
                    .entries(entries.borrow().iter().map(|(k, value)| (k, Tracked { value, stack })))
                    .finish()
            }
            Value::Object(obj) => write_object(&obj.borrow(), stack, f),
        };

        if identity.is_some() {
            self.stack.borrow_mut().pop();
        }
        result
    }
}

fn write_object(obj: &Object, stack: &RefCell<Vec<usize>>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Some(class) = obj.class() {
        write!(f, "{} ", class)?;
    }
    f.debug_map()
        .entries(obj.fields().iter().map(|(k, value)| (k, Tracked { value, stack })))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_builds_plain_tree() {
        let value = Value::from(json!({"name": "Johny", "tags": ["a", "b"], "age": 25}));
        assert!(!value.is_instance());
        assert_eq!(value.get("name"), Some(Value::from("Johny")));
        assert_eq!(value.get("age"), Some(Value::from(25)));
        assert_eq!(value.get("tags").and_then(|t| t.len()), Some(2));
    }

    #[test]
    fn test_to_json_round_trip() {
        let input = json!({"id": 1, "score": 2.5, "nested": {"ok": true, "none": null}});
        let value = Value::from(input.clone());
        assert_eq!(value.to_json().unwrap(), input);
    }

    #[test]
    fn test_to_json_omits_undefined_fields() {
        let value = Value::object([("a", Value::from(1)), ("b", Value::Undefined)]);
        assert_eq!(value.to_json().unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_to_json_rejects_cycles() {
        let a = Value::plain_object();
        let b = Value::plain_object();
        a.set_field("next", b.clone());
        b.set_field("next", a.clone());

        let err = a.to_json().unwrap_err();
        match err {
            Error::CircularReference { path } => assert_eq!(path, "$.next.next"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_shared_reference_renders_twice() {
        let shared = Value::from(json!({"x": 1}));
        let root = Value::object([("a", shared.clone()), ("b", shared)]);
        assert_eq!(root.to_json().unwrap(), json!({"a": {"x": 1}, "b": {"x": 1}}));
    }

    #[test]
    fn test_equality_is_structural_and_class_aware() {
        let class = ClassId::next();
        let a = Value::instance_with(class, [("name", Value::from("x"))]);
        let b = Value::instance_with(class, [("name", Value::from("x"))]);
        let plain = Value::object([("name", Value::from("x"))]);
        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
        assert_ne!(a, plain);
    }

    #[test]
    fn test_cyclic_equality_and_debug_terminate() {
        let a = Value::plain_object();
        a.set_field("me", a.clone());
        let b = Value::plain_object();
        b.set_field("me", b.clone());

        assert_eq!(a, b);
        assert!(format!("{:?}", a).contains("<circular>"));
    }

    #[test]
    fn test_integral_numbers_render_as_integers() {
        assert_eq!(Value::from(3.0).to_json().unwrap(), json!(3));
        assert_eq!(Value::from(0.5).to_json().unwrap(), json!(0.5));
        assert_eq!(Value::Number(f64::NAN).to_json().unwrap(), json!(null));
    }
}
