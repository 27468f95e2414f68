//! Document field values.
//!
//! [`Value`] is the typed field model. On the wire it uses the REST/JSON
//! encoding, where every value is a single-key object naming its type:
//!
//! ```json
//! {"integerValue": "42"}
//! {"mapValue": {"fields": {"name": {"stringValue": "Ada"}}}}
//! ```
//!
//! Callers normally never build values by hand: [`to_fields`] turns any
//! `Serialize` type into a field map and [`from_fields`] reverses it.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A document field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireValue", into = "WireValue")]
pub enum Value {
    /// Null.
    Null,
    /// Boolean.
    Boolean(bool),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit float.
    Double(f64),
    /// Timestamp with nanosecond precision.
    Timestamp(DateTime<Utc>),
    /// UTF-8 string.
    String(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Fully-qualified name of another document.
    Reference(String),
    /// Ordered list of values.
    Array(Vec<Value>),
    /// Nested map of values.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Converts a JSON value.
    ///
    /// Integers that fit in `i64` become [`Value::Integer`], other numbers
    /// become [`Value::Double`].
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts to plain JSON.
    ///
    /// Timestamps render as RFC 3339 strings, bytes as base64, references as
    /// their resource name. Non-finite doubles become null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Double(d) => serde_json::Number::from_f64(*d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Timestamp(t) => {
                serde_json::Value::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::String(STANDARD.encode(b)),
            Value::Reference(r) => serde_json::Value::String(r.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
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

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Timestamp(t)
    }
}

/// Converts document data into a field map.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `data` does not serialize to a JSON
/// object, or [`Error::Serialization`] if it cannot be serialized at all.
pub fn to_fields<T: Serialize + ?Sized>(data: &T) -> Result<BTreeMap<String, Value>> {
    match serde_json::to_value(data)? {
        serde_json::Value::Object(map) => Ok(map
            .into_iter()
            .map(|(k, v)| (k, Value::from_json(v)))
            .collect()),
        other => Err(Error::invalid_argument(format!(
            "document data must be a map, got {}",
            json_kind(&other)
        ))),
    }
}

/// Converts a field map back into a caller type.
pub fn from_fields<T: DeserializeOwned>(fields: &BTreeMap<String, Value>) -> Result<T> {
    let object: serde_json::Map<String, serde_json::Value> = fields
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect();
    Ok(serde_json::from_value(serde_json::Value::Object(object))?)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// ============================================================================
// Wire encoding
// ============================================================================

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum WireValue {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(#[serde(with = "int64_string")] i64),
    DoubleValue(#[serde(with = "double_json")] f64),
    TimestampValue(DateTime<Utc>),
    StringValue(String),
    BytesValue(#[serde(with = "base64_bytes")] Vec<u8>),
    ReferenceValue(String),
    ArrayValue(WireArray),
    MapValue(WireMap),
}

#[derive(Serialize, Deserialize)]
struct WireArray {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    values: Vec<Value>,
}

#[derive(Serialize, Deserialize)]
struct WireMap {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    fields: BTreeMap<String, Value>,
}

impl From<WireValue> for Value {
    fn from(wire: WireValue) -> Self {
        match wire {
            WireValue::NullValue(()) => Value::Null,
            WireValue::BooleanValue(b) => Value::Boolean(b),
            WireValue::IntegerValue(i) => Value::Integer(i),
            WireValue::DoubleValue(d) => Value::Double(d),
            WireValue::TimestampValue(t) => Value::Timestamp(t),
            WireValue::StringValue(s) => Value::String(s),
            WireValue::BytesValue(b) => Value::Bytes(b),
            WireValue::ReferenceValue(r) => Value::Reference(r),
            WireValue::ArrayValue(a) => Value::Array(a.values),
            WireValue::MapValue(m) => Value::Map(m.fields),
        }
    }
}

impl From<Value> for WireValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => WireValue::NullValue(()),
            Value::Boolean(b) => WireValue::BooleanValue(b),
            Value::Integer(i) => WireValue::IntegerValue(i),
            Value::Double(d) => WireValue::DoubleValue(d),
            Value::Timestamp(t) => WireValue::TimestampValue(t),
            Value::String(s) => WireValue::StringValue(s),
            Value::Bytes(b) => WireValue::BytesValue(b),
            Value::Reference(r) => WireValue::ReferenceValue(r),
            Value::Array(values) => WireValue::ArrayValue(WireArray { values }),
            Value::Map(fields) => WireValue::MapValue(WireMap { fields }),
        }
    }
}

/// int64 fields travel as decimal strings in REST/JSON.
mod int64_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Str(String),
            Num(i64),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Str(s) => s.parse().map_err(serde::de::Error::custom),
            Repr::Num(n) => Ok(n),
        }
    }
}

/// Non-finite doubles travel as the strings `NaN`, `Infinity` and
/// `-Infinity` in REST/JSON.
mod double_json {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value.is_infinite() {
            serializer.serialize_str(if *value > 0.0 { "Infinity" } else { "-Infinity" })
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Num(f64),
            Str(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Num(n) => Ok(n),
            Repr::Str(s) => match s.as_str() {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                other => other.parse().map_err(serde::de::Error::custom),
            },
        }
    }
}

/// Byte fields travel as standard base64 in REST/JSON.
mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_wire_encoding() {
        assert_eq!(serde_json::to_value(Value::Null).unwrap(), json!({"nullValue": null}));
        assert_eq!(
            serde_json::to_value(Value::Integer(42)).unwrap(),
            json!({"integerValue": "42"})
        );
        assert_eq!(
            serde_json::to_value(Value::Bytes(b"hi".to_vec())).unwrap(),
            json!({"bytesValue": "aGk="})
        );
        assert_eq!(
            serde_json::to_value(Value::Map(BTreeMap::from([(
                "a".to_string(),
                Value::from("x")
            )])))
            .unwrap(),
            json!({"mapValue": {"fields": {"a": {"stringValue": "x"}}}})
        );
    }

    #[test]
    fn test_wire_decoding() {
        let value: Value = serde_json::from_value(json!({
            "arrayValue": {"values": [
                {"integerValue": "7"},
                {"booleanValue": true},
                {"timestampValue": "2021-02-20T00:00:00Z"}
            ]}
        }))
        .unwrap();

        assert_eq!(
            value,
            Value::Array(vec![
                Value::Integer(7),
                Value::Boolean(true),
                Value::Timestamp(Utc.with_ymd_and_hms(2021, 2, 20, 0, 0, 0).unwrap()),
            ])
        );
    }

    #[test]
    fn test_non_finite_doubles() {
        let decode = |json| match serde_json::from_value::<Value>(json).unwrap() {
            Value::Double(d) => d,
            other => panic!("not a double: {other:?}"),
        };
        assert!(decode(json!({"doubleValue": "NaN"})).is_nan());
        assert_eq!(decode(json!({"doubleValue": "Infinity"})), f64::INFINITY);
        assert_eq!(decode(json!({"doubleValue": "-Infinity"})), f64::NEG_INFINITY);
        assert_eq!(decode(json!({"doubleValue": 1.5})), 1.5);
        assert!(serde_json::from_value::<Value>(json!({"doubleValue": "lots"})).is_err());

        assert_eq!(
            serde_json::to_value(Value::Double(f64::NEG_INFINITY)).unwrap(),
            json!({"doubleValue": "-Infinity"})
        );
        assert_eq!(
            serde_json::to_value(Value::Double(2.5)).unwrap(),
            json!({"doubleValue": 2.5})
        );
    }

    #[test]
    fn test_empty_array_decodes() {
        let value: Value = serde_json::from_value(json!({"arrayValue": {}})).unwrap();
        assert_eq!(value, Value::Array(vec![]));
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct City {
        name: String,
        population: i64,
        area: f64,
        tags: Vec<String>,
        capital: Option<bool>,
    }

    #[test]
    fn test_fields_from_struct() {
        let city = City {
            name: "Oslo".into(),
            population: 700_000,
            area: 454.0,
            tags: vec!["north".into()],
            capital: None,
        };
        let fields = to_fields(&city).unwrap();
        assert_eq!(fields["name"], Value::from("Oslo"));
        assert_eq!(fields["population"], Value::Integer(700_000));
        assert_eq!(fields["area"], Value::Double(454.0));
        assert_eq!(fields["capital"], Value::Null);

        let back: City = from_fields(&fields).unwrap();
        assert_eq!(back, city);
    }

    #[test]
    fn test_fields_reject_non_map() {
        let err = to_fields(&vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
