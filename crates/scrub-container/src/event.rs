//! Event model.
//!
//! Field values carry an explicit type tag on the wire:
//!
//! ```json
//! {"name": "pid", "value": {"type": "int", "value": 4242}}
//! ```
//!
//! A value whose tag is not recognized, or whose payload does not fit the
//! model, is kept verbatim as [`TypedValue::Opaque`] and written back exactly
//! as it was read. Keys the model does not name are kept in `extra` on every
//! record type, so a recording round-trips without loss.

use chrono::{DateTime, FixedOffset};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread: Option<ThreadRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Start time with the offset it was recorded in.
    pub start_time: Option<DateTime<FixedOffset>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ns: Option<u64>,

    #[serde(default)]
    pub fields: Vec<Field>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<StackTrace>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            categories: Vec::new(),
            thread: None,
            start_time: None,
            duration_ns: None,
            fields: Vec::new(),
            stack_trace: None,
            metadata: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<TypedValue>) -> Self {
        self.fields.push(Field::new(name, value));
        self
    }

    pub fn with_thread(mut self, name: impl Into<String>) -> Self {
        self.thread = Some(ThreadRef {
            name: name.into(),
            ..ThreadRef::default()
        });
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// First top-level field with the given name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Thread name, if the event has a thread.
    pub fn thread_name(&self) -> Option<&str> {
        self.thread.as_ref().map(|t| t.name.as_str())
    }
}

/// Thread identity of an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Stack trace attached to an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackTrace {
    #[serde(default)]
    pub truncated: bool,
    pub frames: Vec<StackFrame>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytecode_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A named, typed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: TypedValue,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<TypedValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            annotations: BTreeMap::new(),
            extra: Map::new(),
        }
    }
}

/// Field value.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<TypedValue>),
    Object(Vec<Field>),
    /// Value with an unrecognized type tag or an out-of-range payload, kept as read.
    Opaque(Value),
}

impl TypedValue {
    /// Wire type tag.
    pub fn type_tag(&self) -> &str {
        match self {
            TypedValue::Null => "null",
            TypedValue::Bool(_) => "bool",
            TypedValue::Int(_) => "int",
            TypedValue::Float(_) => "float",
            TypedValue::String(_) => "string",
            TypedValue::Array(_) => "array",
            TypedValue::Object(_) => "object",
            TypedValue::Opaque(raw) => raw.get("type").and_then(Value::as_str).unwrap_or("opaque"),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Decode a tagged JSON value.
    pub fn from_json(raw: Value) -> Result<Self, String> {
        let tag = match raw.get("type") {
            Some(Value::String(tag)) => tag.clone(),
            _ => return Err("typed value must be an object with a string \"type\" tag".to_string()),
        };
        let payload = raw.get("value");
        let bad = |expected: &str| format!("\"{}\" value must be {}", tag, expected);

        let value = match tag.as_str() {
            "null" => TypedValue::Null,
            "bool" | "boolean" => TypedValue::Bool(
                payload
                    .and_then(Value::as_bool)
                    .ok_or_else(|| bad("a boolean"))?,
            ),
            "int" | "long" => match payload {
                Some(Value::Number(n)) => match n.as_i64() {
                    Some(i) => TypedValue::Int(i),
                    // unsigned values past i64::MAX (addresses, ids)
                    None if n.is_u64() => TypedValue::Opaque(raw),
                    None => return Err(bad("an integer")),
                },
                _ => return Err(bad("an integer")),
            },
            "float" | "double" => match payload {
                // non-finite floats are written as null
                Some(Value::Null) => TypedValue::Float(f64::NAN),
                other => TypedValue::Float(
                    other
                        .and_then(Value::as_f64)
                        .ok_or_else(|| bad("a number"))?,
                ),
            },
            "string" => TypedValue::String(
                payload
                    .and_then(Value::as_str)
                    .ok_or_else(|| bad("a string"))?
                    .to_string(),
            ),
            "array" => {
                let items = payload
                    .and_then(Value::as_array)
                    .ok_or_else(|| bad("an array"))?;
                TypedValue::Array(
                    items
                        .iter()
                        .cloned()
                        .map(TypedValue::from_json)
                        .collect::<Result<_, _>>()?,
                )
            }
            "object" => {
                let fields = payload.cloned().ok_or_else(|| bad("a field list"))?;
                TypedValue::Object(serde_json::from_value(fields).map_err(|e| e.to_string())?)
            }
            _ => TypedValue::Opaque(raw),
        };
        Ok(value)
    }
}

impl Serialize for TypedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let TypedValue::Opaque(raw) = self {
            return raw.serialize(serializer);
        }
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.type_tag())?;
        match self {
            TypedValue::Null | TypedValue::Opaque(_) => {}
            TypedValue::Bool(b) => map.serialize_entry("value", b)?,
            TypedValue::Int(i) => map.serialize_entry("value", i)?,
            TypedValue::Float(f) => map.serialize_entry("value", f)?,
            TypedValue::String(s) => map.serialize_entry("value", s)?,
            TypedValue::Array(items) => map.serialize_entry("value", items)?,
            TypedValue::Object(fields) => map.serialize_entry("value", fields)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TypedValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        TypedValue::from_json(raw).map_err(D::Error::custom)
    }
}

impl From<&str> for TypedValue {
    fn from(s: &str) -> Self {
        TypedValue::String(s.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(s: String) -> Self {
        TypedValue::String(s)
    }
}

impl From<i64> for TypedValue {
    fn from(i: i64) -> Self {
        TypedValue::Int(i)
    }
}

impl From<f64> for TypedValue {
    fn from(f: f64) -> Self {
        TypedValue::Float(f)
    }
}

impl From<bool> for TypedValue {
    fn from(b: bool) -> Self {
        TypedValue::Bool(b)
    }
}

impl From<Vec<TypedValue>> for TypedValue {
    fn from(items: Vec<TypedValue>) -> Self {
        TypedValue::Array(items)
    }
}

impl From<Vec<Field>> for TypedValue {
    fn from(fields: Vec<Field>) -> Self {
        TypedValue::Object(fields)
    }
}
