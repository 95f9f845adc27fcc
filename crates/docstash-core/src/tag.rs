//! Value type tags and the leaf encoding used by the fragment table.
//!
//! Every fragment row carries a [`TypeTag`]. Leaf tags additionally carry a
//! [`Scalar`] payload; container tags (object, array) carry none, and their
//! presence as a row is itself the container marker.
//!
//! Tag codes are persisted and must never change. Codes 0 and 1 are avoided so
//! a tag can never be confused with a stored boolean.

use crate::{Error, Result, Value};

// ─── Tags ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum TypeTag {
  Null     = 5,
  Object   = 10,
  Array    = 15,
  String   = 20,
  Integer  = 25,
  Float    = 30,
  Boolean  = 35,
  /// Reserved; no value is ever stored with this tag.
  Datetime = 40,
}

impl TypeTag {
  pub const fn code(self) -> i64 { self as i64 }

  pub fn from_code(code: i64) -> Option<Self> {
    Some(match code {
      5 => Self::Null,
      10 => Self::Object,
      15 => Self::Array,
      20 => Self::String,
      25 => Self::Integer,
      30 => Self::Float,
      35 => Self::Boolean,
      40 => Self::Datetime,
      _ => return None,
    })
  }

  pub fn is_container(self) -> bool { matches!(self, Self::Object | Self::Array) }
}

// ─── Stored scalars ──────────────────────────────────────────────────────────

/// The storable form of a leaf value, independent of any database driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
}

// ─── Tagger ──────────────────────────────────────────────────────────────────

/// Classify a value into its persisted tag.
///
/// Datetimes are reserved and rejected with [`Error::NotImplemented`];
/// non-finite floats have no faithful stored form and are rejected with
/// [`Error::TypeMapping`].
pub fn classify(value: &Value) -> Result<TypeTag> {
  match value {
    Value::Object(_) => Ok(TypeTag::Object),
    Value::Array(_) => Ok(TypeTag::Array),
    Value::String(_) => Ok(TypeTag::String),
    Value::Integer(_) => Ok(TypeTag::Integer),
    Value::Float(f) if f.is_finite() => Ok(TypeTag::Float),
    Value::Float(f) => Err(Error::TypeMapping(format!("non-finite float {f}"))),
    Value::Bool(_) => Ok(TypeTag::Boolean),
    Value::Null => Ok(TypeTag::Null),
    Value::Datetime(_) => Err(Error::NotImplemented("datetime values")),
  }
}

/// Encode a value under `tag`.
///
/// Returns `None` for containers, which the shredder must recurse into, and
/// `Some(scalar)` for leaves. A value that does not match `tag` is a
/// [`Error::TypeMapping`] error; nothing is coerced.
pub fn encode(value: &Value, tag: TypeTag) -> Result<Option<Scalar>> {
  let scalar = match (tag, value) {
    (TypeTag::Object, Value::Object(_)) | (TypeTag::Array, Value::Array(_)) => {
      return Ok(None);
    }
    (TypeTag::String, Value::String(s)) => Scalar::Text(s.clone()),
    (TypeTag::Integer, Value::Integer(i)) => Scalar::Integer(*i),
    (TypeTag::Float, Value::Float(f)) => Scalar::Real(*f),
    (TypeTag::Boolean, Value::Bool(b)) => Scalar::Integer(i64::from(*b)),
    (TypeTag::Null, Value::Null) => Scalar::Null,
    (TypeTag::Datetime, _) => return Err(Error::NotImplemented("datetime values")),
    (tag, value) => {
      return Err(Error::TypeMapping(format!(
        "cannot encode a {} value as {tag:?}",
        value.kind()
      )));
    }
  };
  Ok(Some(scalar))
}

/// Decode a stored leaf back into a value. Inverse of [`encode`].
///
/// Integer payloads are accepted for float tags because SQLite may hand back
/// a whole-valued real as an integer.
pub fn decode(tag: TypeTag, scalar: Scalar) -> Result<Value> {
  match (tag, scalar) {
    (TypeTag::String, Scalar::Text(s)) => Ok(Value::String(s)),
    (TypeTag::Integer, Scalar::Integer(i)) => Ok(Value::Integer(i)),
    (TypeTag::Float, Scalar::Real(f)) => Ok(Value::Float(f)),
    (TypeTag::Float, Scalar::Integer(i)) => Ok(Value::Float(i as f64)),
    (TypeTag::Boolean, Scalar::Integer(i)) => Ok(Value::Bool(i != 0)),
    (TypeTag::Null, _) => Ok(Value::Null),
    (TypeTag::Datetime, _) => Err(Error::NotImplemented("datetime values")),
    (TypeTag::Object | TypeTag::Array, _) => Err(Error::TypeMapping(format!(
      "{tag:?} is a container tag and has no scalar form"
    ))),
    (tag, scalar) => Err(Error::TypeMapping(format!(
      "stored scalar {scalar:?} does not match tag {tag:?}"
    ))),
  }
}
