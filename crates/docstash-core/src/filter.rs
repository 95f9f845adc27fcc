//! Conjunctive document filters.
//!
//! A [`Filter`] is a flat list of `field → condition` clauses that must all
//! hold for a document to match. A clause holds when the document contains a
//! fragment, at any depth, whose key is `field` and whose value satisfies the
//! condition. The pseudo-field [`ID_FIELD`] addresses the document identifier
//! instead of a fragment key.
//!
//! Only equality and membership are supported; backends compile filters into
//! parameterised predicates.

use crate::{DocumentId, Error, Result, Value};

/// Pseudo-field naming the document identifier.
pub const ID_FIELD: &str = "_id";

// ─── Filter values ───────────────────────────────────────────────────────────

/// A value a filter can compare against.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
  String(String),
  Integer(i64),
  Float(f64),
  /// Compared in its stored text form.
  Id(DocumentId),
}

impl FilterValue {
  pub fn is_numeric(&self) -> bool { matches!(self, Self::Integer(_) | Self::Float(_)) }
}

impl From<&str> for FilterValue {
  fn from(s: &str) -> Self { Self::String(s.to_owned()) }
}

impl From<String> for FilterValue {
  fn from(s: String) -> Self { Self::String(s) }
}

impl From<i64> for FilterValue {
  fn from(i: i64) -> Self { Self::Integer(i) }
}

impl From<i32> for FilterValue {
  fn from(i: i32) -> Self { Self::Integer(i64::from(i)) }
}

impl From<f64> for FilterValue {
  fn from(f: f64) -> Self { Self::Float(f) }
}

impl From<DocumentId> for FilterValue {
  fn from(id: DocumentId) -> Self { Self::Id(id) }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
  Eq(FilterValue),
  /// Membership in a list. An empty list matches nothing.
  In(Vec<FilterValue>),
}

// ─── Filter ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
  clauses: Vec<(String, Condition)>,
}

impl Filter {
  /// The empty filter, which matches every document.
  pub fn new() -> Self { Self::default() }

  /// Filter on a single document identifier.
  pub fn by_id(id: DocumentId) -> Self { Self::new().eq(ID_FIELD, id) }

  pub fn eq(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
    self.clauses.push((field.into(), Condition::Eq(value.into())));
    self
  }

  pub fn is_in<V: Into<FilterValue>>(
    mut self,
    field: impl Into<String>,
    values: impl IntoIterator<Item = V>,
  ) -> Self {
    let values = values.into_iter().map(Into::into).collect();
    self.clauses.push((field.into(), Condition::In(values)));
    self
  }

  pub fn clauses(&self) -> &[(String, Condition)] { &self.clauses }

  pub fn is_empty(&self) -> bool { self.clauses.is_empty() }
}

fn scalar_filter_value(field: &str, value: Value) -> Result<FilterValue> {
  match value {
    Value::String(s) => Ok(FilterValue::String(s)),
    Value::Integer(i) => Ok(FilterValue::Integer(i)),
    Value::Float(f) => Ok(FilterValue::Float(f)),
    other => Err(Error::Filter {
      field:  field.to_owned(),
      reason: format!("{} values cannot be filtered on", other.kind()),
    }),
  }
}

impl TryFrom<Value> for Filter {
  type Error = Error;

  /// Build a filter from an object mapping fields to strings, numbers, or
  /// lists of those.
  fn try_from(value: Value) -> Result<Self> {
    let members = match value {
      Value::Object(members) => members,
      other => {
        return Err(Error::Filter {
          field:  String::new(),
          reason: format!("a filter must be an object, not {}", other.kind()),
        });
      }
    };

    let mut filter = Filter::new();
    for (field, value) in members {
      let condition = match value {
        Value::Array(items) => Condition::In(
          items
            .into_iter()
            .map(|item| match item {
              Value::Array(_) | Value::Object(_) => Err(Error::Filter {
                field:  field.clone(),
                reason: "list members must be scalars".into(),
              }),
              item => scalar_filter_value(&field, item),
            })
            .collect::<Result<_>>()?,
        ),
        value => Condition::Eq(scalar_filter_value(&field, value)?),
      };
      filter.clauses.push((field, condition));
    }
    Ok(filter)
  }
}

impl TryFrom<serde_json::Value> for Filter {
  type Error = Error;

  fn try_from(json: serde_json::Value) -> Result<Self> {
    Filter::try_from(Value::try_from(json)?)
  }
}

impl std::str::FromStr for Filter {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Filter::try_from(s.parse::<Value>()?) }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn builds_from_json_object() {
    let filter = Filter::try_from(json!({"k": "x", "n": 3, "tags": ["a", 2]})).unwrap();
    assert_eq!(filter.clauses().len(), 3);
    assert!(filter.clauses().contains(&(
      "k".to_owned(),
      Condition::Eq(FilterValue::String("x".into()))
    )));
    assert!(filter.clauses().contains(&(
      "tags".to_owned(),
      Condition::In(vec![FilterValue::String("a".into()), FilterValue::Integer(2)])
    )));
  }

  #[test]
  fn builder_matches_parsed_form() {
    let built = Filter::new().eq("k", "x");
    let parsed: Filter = r#"{"k": "x"}"#.parse().unwrap();
    assert_eq!(built, parsed);
  }

  #[test]
  fn boolean_and_null_values_are_rejected() {
    for bad in [json!({"k": true}), json!({"k": null}), json!({"k": {"nested": 1}})] {
      let err = Filter::try_from(bad).unwrap_err();
      assert!(matches!(err, Error::Filter { ref field, .. } if field == "k"));
    }
  }

  #[test]
  fn nested_lists_are_rejected() {
    let err = Filter::try_from(json!({"k": [[1]]})).unwrap_err();
    assert!(matches!(err, Error::Filter { .. }));
  }

  #[test]
  fn non_object_filter_is_rejected() {
    let err = Filter::try_from(json!([1, 2])).unwrap_err();
    assert!(matches!(err, Error::Filter { .. }));
  }

  #[test]
  fn by_id_uses_the_id_pseudo_field() {
    let id = DocumentId::generate();
    let filter = Filter::by_id(id);
    assert_eq!(
      filter.clauses(),
      &[(ID_FIELD.to_owned(), Condition::Eq(FilterValue::Id(id)))]
    );
  }
}
