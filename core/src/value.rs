//! Scalar value model shared by parameters, row cells and filter constraints.

use std::fmt;

use serde::de::Deserializer;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::{Result, TableKitError};

/// A runtime value bound into a statement or read out of a row.
///
/// Filter constraints arrive as JSON, so the conversions from
/// `serde_json::Value` are lossless for everything the request surface can
/// carry; JSON objects are kept as [`Value::Json`] rather than flattened.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// NULL value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (i64)
    Integer(i64),
    /// Real value (f64)
    Real(f64),
    /// Text value
    Text(String),
    /// Binary value
    Blob(Vec<u8>),
    /// Point-in-time value
    Timestamp(OffsetDateTime),
    /// Ordered list of values (e.g. a `between` or `in` constraint payload)
    Array(Vec<Value>),
    /// Structured JSON payload that is none of the above
    Json(serde_json::Value),
}

impl Value {
    /// Returns true if this value is NULL.
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the integer value if this is an integer.
    #[inline]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the real value if this is a real.
    #[inline]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the text value if this is text.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Returns the boolean value if this is a boolean.
    #[inline]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the element list if this is an array.
    #[inline]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    /// Renders this value the way an export cell renders it: timestamps as
    /// RFC 3339, booleans as `1`/`0`, composite values as compact JSON,
    /// NULL as the empty string, everything else in native string form.
    pub fn render(&self) -> Result<String> {
        match self {
            Value::Null => Ok(String::new()),
            Value::Bool(value) => Ok(if *value { "1" } else { "0" }.to_string()),
            Value::Integer(value) => Ok(value.to_string()),
            Value::Real(value) => Ok(value.to_string()),
            Value::Text(value) => Ok(value.clone()),
            Value::Blob(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
            Value::Timestamp(ts) => ts
                .format(&Rfc3339)
                .map_err(|e| TableKitError::Format(e.to_string())),
            Value::Array(_) | Value::Json(_) => serde_json::to_string(self)
                .map_err(|e| TableKitError::Format(e.to_string())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Ok(text) => f.write_str(&text),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<OffsetDateTime> for Value {
    fn from(value: OffsetDateTime) -> Self {
        Value::Timestamp(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(values)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    Value::Real(n.as_f64().unwrap_or_default())
                }
            }
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            object @ serde_json::Value::Object(_) => Value::Json(object),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(value) => serializer.serialize_bool(*value),
            Value::Integer(value) => serializer.serialize_i64(*value),
            Value::Real(value) => serializer.serialize_f64(*value),
            Value::Text(value) => serializer.serialize_str(value),
            Value::Blob(bytes) => {
                let mut seq = serializer.serialize_seq(Some(bytes.len()))?;
                for byte in bytes {
                    seq.serialize_element(byte)?;
                }
                seq.end()
            }
            Value::Timestamp(ts) => {
                let text = ts.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
                serializer.serialize_str(&text)
            }
            Value::Array(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
            Value::Json(json) => json.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(Value::from(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn converts_json_payloads() {
        let raw = serde_json::json!([1, "two", 3.5, null, true]);
        let value = Value::from(raw);
        let items = value.as_array().unwrap();
        assert_eq!(items[0], Value::Integer(1));
        assert_eq!(items[1], Value::Text("two".to_string()));
        assert_eq!(items[2], Value::Real(3.5));
        assert_eq!(items[3], Value::Null);
        assert_eq!(items[4], Value::Bool(true));
    }

    #[test]
    fn renders_export_cells() {
        assert_eq!(Value::Null.render().unwrap(), "");
        assert_eq!(Value::Bool(true).render().unwrap(), "1");
        assert_eq!(Value::Bool(false).render().unwrap(), "0");
        assert_eq!(Value::Integer(42).render().unwrap(), "42");
        assert_eq!(
            Value::Timestamp(datetime!(2024-05-04 12:30:00 UTC))
                .render()
                .unwrap(),
            "2024-05-04T12:30:00Z"
        );
        assert_eq!(
            Value::Array(vec![Value::Integer(1), Value::Text("a".into())])
                .render()
                .unwrap(),
            r#"[1,"a"]"#
        );
    }
}
