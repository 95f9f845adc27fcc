//! The document value model.
//!
//! A document is a tree of [`Value`]s whose root is always an object. Member
//! order inside objects carries no meaning, so objects are kept in a
//! [`BTreeMap`] and compare equal regardless of insertion order. Array order is
//! significant and preserved exactly.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Error, Result};

/// A node of a document tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
  Null,
  Bool(bool),
  Integer(i64),
  Float(f64),
  String(String),
  Array(Vec<Value>),
  Object(BTreeMap<String, Value>),
  /// Accepted by the value model but rejected by the store with
  /// [`Error::NotImplemented`].
  Datetime(DateTime<Utc>),
}

impl Value {
  /// An empty object, the shape of a document with no members.
  pub fn empty_object() -> Self { Self::Object(BTreeMap::new()) }

  pub fn is_container(&self) -> bool {
    matches!(self, Self::Array(_) | Self::Object(_))
  }

  pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
    match self {
      Self::Object(map) => Some(map),
      _ => None,
    }
  }

  pub fn as_array(&self) -> Option<&[Value]> {
    match self {
      Self::Array(items) => Some(items),
      _ => None,
    }
  }

  /// Member lookup on objects; `None` for every other shape.
  pub fn get(&self, key: &str) -> Option<&Value> {
    self.as_object().and_then(|map| map.get(key))
  }

  /// Short name of the variant, used in error messages.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Null => "null",
      Self::Bool(_) => "boolean",
      Self::Integer(_) => "integer",
      Self::Float(_) => "float",
      Self::String(_) => "string",
      Self::Array(_) => "array",
      Self::Object(_) => "object",
      Self::Datetime(_) => "datetime",
    }
  }
}

// ─── JSON interop ────────────────────────────────────────────────────────────

impl TryFrom<serde_json::Value> for Value {
  type Error = Error;

  /// Fails only for integers outside the `i64` range, which have no lossless
  /// stored form.
  fn try_from(json: serde_json::Value) -> Result<Self> {
    Ok(match json {
      serde_json::Value::Null => Self::Null,
      serde_json::Value::Bool(b) => Self::Bool(b),
      serde_json::Value::Number(n) => {
        if let Some(i) = n.as_i64() {
          Self::Integer(i)
        } else if n.is_u64() {
          return Err(Error::TypeMapping(format!(
            "integer {n} does not fit in a signed 64-bit value"
          )));
        } else {
          match n.as_f64() {
            Some(f) => Self::Float(f),
            None => {
              return Err(Error::TypeMapping(format!("unrepresentable number {n}")));
            }
          }
        }
      }
      serde_json::Value::String(s) => Self::String(s),
      serde_json::Value::Array(items) => Self::Array(
        items
          .into_iter()
          .map(Value::try_from)
          .collect::<Result<_>>()?,
      ),
      serde_json::Value::Object(members) => Self::Object(
        members
          .into_iter()
          .map(|(k, v)| Ok((k, Value::try_from(v)?)))
          .collect::<Result<_>>()?,
      ),
    })
  }
}

impl From<Value> for serde_json::Value {
  fn from(value: Value) -> Self {
    match value {
      Value::Null => Self::Null,
      Value::Bool(b) => Self::Bool(b),
      Value::Integer(i) => Self::from(i),
      // Non-finite floats have no JSON form.
      Value::Float(f) => serde_json::Number::from_f64(f)
        .map(Self::Number)
        .unwrap_or(Self::Null),
      Value::String(s) => Self::String(s),
      Value::Array(items) => Self::Array(items.into_iter().map(Into::into).collect()),
      Value::Object(members) => Self::Object(
        members.into_iter().map(|(k, v)| (k, v.into())).collect(),
      ),
      Value::Datetime(dt) => Self::String(dt.to_rfc3339()),
    }
  }
}

impl std::str::FromStr for Value {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let json: serde_json::Value = serde_json::from_str(s)?;
    Value::try_from(json)
  }
}

// ─── Scalar conversions ──────────────────────────────────────────────────────

impl From<bool> for Value {
  fn from(b: bool) -> Self { Self::Bool(b) }
}

impl From<i64> for Value {
  fn from(i: i64) -> Self { Self::Integer(i) }
}

impl From<i32> for Value {
  fn from(i: i32) -> Self { Self::Integer(i64::from(i)) }
}

impl From<f64> for Value {
  fn from(f: f64) -> Self { Self::Float(f) }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self { Self::String(s.to_owned()) }
}

impl From<String> for Value {
  fn from(s: String) -> Self { Self::String(s) }
}

impl From<DateTime<Utc>> for Value {
  fn from(dt: DateTime<Utc>) -> Self { Self::Datetime(dt) }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
  fn from(items: Vec<T>) -> Self {
    Self::Array(items.into_iter().map(Into::into).collect())
  }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self { v.map_or(Self::Null, Into::into) }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self::Object(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn json_numbers_keep_integer_and_float_apart() {
    let v = Value::try_from(json!({"i": 5, "f": 5.0, "n": -3})).unwrap();
    assert_eq!(v.get("i"), Some(&Value::Integer(5)));
    assert_eq!(v.get("f"), Some(&Value::Float(5.0)));
    assert_eq!(v.get("n"), Some(&Value::Integer(-3)));
  }

  #[test]
  fn oversized_unsigned_integer_is_a_type_mapping_error() {
    let err = Value::try_from(json!({"big": u64::MAX})).unwrap_err();
    assert!(matches!(err, Error::TypeMapping(_)));
  }

  #[test]
  fn object_equality_ignores_member_order() {
    let a: Value = r#"{"x": 1, "y": [true, null]}"#.parse().unwrap();
    let b: Value = r#"{"y": [true, null], "x": 1}"#.parse().unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn array_equality_respects_order() {
    let a: Value = "[1, 2, 3]".parse().unwrap();
    let b: Value = "[3, 2, 1]".parse().unwrap();
    assert_ne!(a, b);
  }

  #[test]
  fn converts_back_to_json() {
    let original = json!({"a": 1, "b": [1.5, "s", false, null], "c": {"d": {}}});
    let value = Value::try_from(original.clone()).unwrap();
    assert_eq!(serde_json::Value::from(value), original);
  }

  #[test]
  fn serializes_as_plain_json() {
    let value: Value = [("k", Value::from(vec![1, 2]))].into_iter().collect();
    assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"k":[1,2]}"#);
  }

  #[test]
  fn malformed_text_is_a_json_error() {
    let err = "{not json".parse::<Value>().unwrap_err();
    assert!(matches!(err, Error::Json(_)));
  }
}
