//! Response decoding
//!
//! Result records are structs deriving `Deserialize`. Strict records carry
//! `#[serde(deny_unknown_fields)]`; records whose shape depends on the
//! request (CRM items) collect unknown keys through `#[serde(flatten)]`.
//! The helpers in [`lenient`] accept the mixed number/string representations
//! the API uses for identifiers.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{BitrixError, Result};

/// Validate a raw JSON value into a typed record
pub fn decode<T: DeserializeOwned>(raw: Value) -> Result<T> {
    serde_json::from_value(raw).map_err(|e| BitrixError::Validation(e.to_string()))
}

/// Field deserializers that coerce between numbers and numeric strings
pub mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    // 2^63 is the first float past i64::MAX
    const I64_LOW: f64 = -9_223_372_036_854_775_808.0;
    const I64_HIGH: f64 = 9_223_372_036_854_775_808.0;

    fn to_int(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && (I64_LOW..I64_HIGH).contains(f))
                    .map(|f| f as i64)
            }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Integer given as a number or a numeric string
    pub fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        to_int(&value).ok_or_else(|| D::Error::custom(format!("expected an integer, got {}", value)))
    }

    /// Optional integer; `null` and empty strings mean absent
    pub fn opt_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(value) => to_int(&value)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("expected an integer, got {}", value))),
        }
    }

    /// String identifier given as a string or a number
    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(D::Error::custom(format!("expected a string, got {}", other))),
        }
    }
}
