//! Parameter encoding
//!
//! Parameter objects are plain structs deriving `Serialize`. Their serde
//! attributes carry the per-field rules:
//!
//! - `#[serde(rename = "...")]` gives the transport name (alias)
//! - `Option<T>` with `skip_serializing_if = "Option::is_none"` omits absent fields
//! - `#[serde(with = "flag::option")]` turns `true`/`false` into `Y`/`N`
//!
//! [`encode`] then expands the declared nested-mapping fields one level deep
//! into `name[key]` entries and returns the flat [`EncodedParams`] map.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{BitrixError, Result};

/// Nested-mapping fields used across the REST API
pub const DEFAULT_NESTED: &[&str] = &["filter", "data", "order"];

/// A typed parameter object for one remote call
pub trait BitrixParams: Serialize {
    /// Transport names of the fields expanded into `name[key]` entries
    const NESTED: &'static [&'static str] = DEFAULT_NESTED;

    /// Encode into the flat transport map
    fn to_bx_params(&self) -> Result<EncodedParams> {
        encode(self, Self::NESTED)
    }
}

/// Flatten a serializable parameter object.
///
/// Fields serializing to `null` are dropped. A field listed in `nested` whose
/// value is a JSON object is replaced by one `field[key]` entry per member,
/// values unchanged (structured members are not expanded further). Every
/// other field is kept as is under its serialized name.
pub fn encode<P: Serialize + ?Sized>(params: &P, nested: &[&str]) -> Result<EncodedParams> {
    let fields = match serde_json::to_value(params) {
        Ok(Value::Object(fields)) => fields,
        Ok(other) => {
            return Err(BitrixError::validation(format!(
                "parameters must encode to an object, got {}",
                json_kind(&other)
            )))
        }
        Err(e) => return Err(BitrixError::validation(e.to_string())),
    };

    let mut encoded = EncodedParams::new();
    for (name, value) in fields {
        match value {
            Value::Null => {}
            Value::Object(entries) if nested.contains(&name.as_str()) => {
                for (key, entry) in entries {
                    encoded.insert(format!("{name}[{key}]"), entry);
                }
            }
            value => encoded.insert(name, value),
        }
    }

    Ok(encoded)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Flat transport parameters: key to value, ordered by key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodedParams(BTreeMap<String, Value>);

impl EncodedParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Render as form fields.
    ///
    /// Scalars become their text form, `null` an empty string. A list repeats
    /// the key once per element. Objects, and lists inside lists, are sent
    /// as compact JSON text.
    pub fn to_form(&self) -> Vec<(String, String)> {
        let mut form = Vec::with_capacity(self.0.len());
        for (key, value) in &self.0 {
            match value {
                Value::Array(items) => {
                    for item in items {
                        form.push((key.clone(), form_text(item)));
                    }
                }
                other => form.push((key.clone(), form_text(other))),
            }
        }
        form
    }
}

fn form_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        structured => structured.to_string(),
    }
}

impl FromIterator<(String, Value)> for EncodedParams {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Map<String, Value>> for EncodedParams {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

/// `Y`/`N` boolean flags
pub mod flag {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "Y" } else { "N" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let value = Value::deserialize(deserializer)?;
        parse(&value).ok_or_else(|| {
            serde::de::Error::custom(format!("expected a Y/N flag, got {}", value))
        })
    }

    fn parse(value: &Value) -> Option<bool> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) if s.eq_ignore_ascii_case("y") => Some(true),
            Value::String(s) if s.eq_ignore_ascii_case("n") => Some(false),
            _ => None,
        }
    }

    /// `Option<bool>` variant; pair with `skip_serializing_if = "Option::is_none"`
    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<bool>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(flag) => super::serialize(flag, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<bool>, D::Error> {
            match Option::<Value>::deserialize(deserializer)? {
                None | Some(Value::Null) => Ok(None),
                Some(value) => parse(&value).map(Some).ok_or_else(|| {
                    serde::de::Error::custom(format!("expected a Y/N flag, got {}", value))
                }),
            }
        }
    }
}

/// Raw bytes sent as a base64 string (single-phase file upload)
pub mod payload {
    use base64::Engine;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(
        value: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => {
                serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
            }
            None => serializer.serialize_none(),
        }
    }
}
