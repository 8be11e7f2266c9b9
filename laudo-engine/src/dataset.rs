//! Dataset snapshot
//!
//! A flat mapping from normalized key to [Value]. Keys are normalized once on insertion
//! (trimmed, upper-cased, inner spaces to `_`), so `"numero processo"`, `"NUMERO_PROCESSO"`
//! and `" Numero Processo "` are the same key. Record fields follow the same rule.
//!
//! The engine only ever reads a dataset; it is built by the caller before generation.

use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("dataset must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Normalize a key: trim, upper-case, spaces to underscores.
pub fn normalize_key(key: &str) -> String {
    key.trim()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    /// Integers above `i64::MAX`.
    Unsigned(u64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    /// Value as a non-negative integer, when it is one.
    ///
    /// Text is accepted when it is a plain run of digits (surrounding blanks allowed);
    /// floats only when they have no fractional part.
    pub fn as_non_negative_integer(&self) -> Option<u64> {
        match self {
            Scalar::Integer(n) => u64::try_from(*n).ok(),
            Scalar::Unsigned(n) => Some(*n),
            Scalar::Float(f) if f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64 => {
                Some(*f as u64)
            }
            Scalar::Text(text) => {
                let text = text.trim();
                if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
                    text.parse().ok()
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Truthiness used for flags such as "questions skipped".
    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Bool(b) => *b,
            Scalar::Integer(n) => *n != 0,
            Scalar::Unsigned(n) => *n != 0,
            Scalar::Float(f) => *f != 0.0,
            Scalar::Text(text) => matches!(
                text.trim().to_lowercase().as_str(),
                "true" | "sim" | "s" | "yes" | "y" | "1"
            ),
        }
    }

    /// Text form, with booleans rendered through the given labels.
    pub fn render(&self, yes: &str, no: &str) -> String {
        match self {
            Scalar::Bool(true) => yes.to_string(),
            Scalar::Bool(false) => no.to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(text) => write!(f, "{}", text),
            Scalar::Integer(n) => write!(f, "{}", n),
            Scalar::Unsigned(n) => write!(f, "{}", n),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// One entry of a nested collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Scalar>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: impl Into<Scalar>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<Scalar>) {
        self.fields.insert(normalize_key(field), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Scalar> {
        self.fields.get(&normalize_key(field))
    }

    /// Non-blank text of a field.
    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field)
            .map(|value| value.to_string())
            .filter(|text| !text.trim().is_empty())
    }

    pub fn values(&self) -> impl Iterator<Item = &Scalar> {
        self.fields.values()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    List(Vec<String>),
    Records(Vec<Record>),
}

impl Value {
    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::List(_) | Value::Records(_))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Records of a nested collection. An empty list counts as an empty collection.
    pub fn as_records(&self) -> Option<&[Record]> {
        match self {
            Value::Records(records) => Some(records),
            Value::List(items) if items.is_empty() => Some(&[]),
            _ => None,
        }
    }
}

macro_rules! scalar_into_value {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::Scalar(value.into())
            }
        })*
    };
}

scalar_into_value!(&str, String, i64, f64, bool);

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        Value::Scalar(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

impl From<Vec<Record>> for Value {
    fn from(records: Vec<Record>) -> Self {
        Value::Records(records)
    }
}

/// Read-only snapshot of the data for one generation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    values: BTreeMap<String, Value>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(normalize_key(key), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(&normalize_key(key))
    }

    pub fn scalar(&self, key: &str) -> Option<&Scalar> {
        self.get(key).and_then(Value::as_scalar)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn from_json_str(source: &str) -> Result<Self, DatasetError> {
        let json: Json = serde_json::from_str(source)?;
        Self::from_json_value(&json)
    }

    /// Build a dataset from a JSON object.
    ///
    /// Scalars map to [Value::Scalar], arrays of scalars to [Value::List], arrays of objects
    /// to [Value::Records]. `null` leaves the key out; nested objects are skipped.
    pub fn from_json_value(json: &Json) -> Result<Self, DatasetError> {
        let Json::Object(map) = json else {
            return Err(DatasetError::NotAnObject(json_kind(json)));
        };
        let mut dataset = Dataset::new();
        for (key, value) in map {
            match value {
                Json::Null => {}
                Json::Array(items) => {
                    dataset.insert(key, array_value(key, items));
                }
                Json::Object(_) => {
                    tracing::warn!(key = %key, "nested object in dataset ignored");
                }
                scalar => {
                    if let Some(scalar) = json_scalar(scalar) {
                        dataset.insert(key, scalar);
                    }
                }
            }
        }
        Ok(dataset)
    }
}

fn array_value(key: &str, items: &[Json]) -> Value {
    if items.iter().any(Json::is_object) {
        let records = items
            .iter()
            .filter_map(|item| match item {
                Json::Object(fields) => {
                    let mut record = Record::new();
                    for (field, value) in fields {
                        if let Some(scalar) = json_scalar(value) {
                            record.insert(field, scalar);
                        }
                    }
                    Some(record)
                }
                _ => {
                    tracing::warn!(key = %key, "non-object entry in record list ignored");
                    None
                }
            })
            .collect();
        Value::Records(records)
    } else {
        Value::List(
            items
                .iter()
                .filter_map(json_scalar)
                .map(|scalar| scalar.to_string())
                .collect(),
        )
    }
}

fn json_scalar(value: &Json) -> Option<Scalar> {
    match value {
        Json::String(text) => Some(Scalar::Text(text.clone())),
        Json::Bool(b) => Some(Scalar::Bool(*b)),
        Json::Number(n) => n
            .as_i64()
            .map(Scalar::Integer)
            .or_else(|| n.as_u64().map(Scalar::Unsigned))
            .or_else(|| n.as_f64().map(Scalar::Float)),
        _ => None,
    }
}

fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}
