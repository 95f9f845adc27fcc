//! Compiling [`Filter`]s into parameterised SQL predicates.
//!
//! Each clause becomes a predicate on the documents table's `uuid` column and
//! clauses are joined with `AND`. Field names and values are only ever bound
//! as parameters; the SQL text contains nothing but placeholders, quoted table
//! names, and type tag codes.

use docstash_core::{
  Condition, DocumentId, Error as CoreError, Filter, FilterValue, TypeTag,
  filter::ID_FIELD,
};
use rusqlite::types::Value as SqlValue;

use crate::{Result, encode::encode_filter_value, schema::Tables};

/// A `WHERE` expression and the arguments for its placeholders, in order.
#[derive(Debug)]
pub(crate) struct Predicate {
  pub sql:    String,
  pub params: Vec<SqlValue>,
}

pub(crate) fn compile(filter: &Filter, tables: &Tables) -> Result<Predicate> {
  let mut clauses = Vec::with_capacity(filter.clauses().len());
  let mut params = Vec::new();

  for (field, condition) in filter.clauses() {
    let clause = if field == ID_FIELD {
      compile_id(condition, &mut params)?
    } else {
      compile_field(field, condition, tables, &mut params)
    };
    clauses.push(clause);
  }

  let sql = if clauses.is_empty() { "1".to_owned() } else { clauses.join(" AND ") };
  Ok(Predicate { sql, params })
}

fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }

fn compile_id(condition: &Condition, params: &mut Vec<SqlValue>) -> Result<String> {
  let values: &[FilterValue] = match condition {
    Condition::Eq(value) => std::slice::from_ref(value),
    Condition::In(values) => values,
  };
  let ids = values.iter().map(canonical_id).collect::<Result<Vec<_>>>()?;

  Ok(match condition {
    Condition::Eq(_) => {
      params.extend(ids);
      "uuid = ?".to_owned()
    }
    Condition::In(_) if ids.is_empty() => "0".to_owned(),
    Condition::In(_) => {
      let sql = format!("uuid IN ({})", placeholders(ids.len()));
      params.extend(ids);
      sql
    }
  })
}

/// Ids are stored lowercase and hyphenated; any spelling `Uuid` accepts is
/// rewritten to that form before binding.
fn canonical_id(value: &FilterValue) -> Result<SqlValue> {
  let invalid = |reason: String| CoreError::Filter { field: ID_FIELD.to_owned(), reason };
  let id: DocumentId = match value {
    FilterValue::Id(id) => *id,
    FilterValue::String(text) => text
      .parse()
      .map_err(|_| invalid(format!("{text:?} is not a document id")))?,
    other => {
      return Err(invalid(format!("document ids are compared as text, got {other:?}")).into());
    }
  };
  Ok(SqlValue::Text(id.encode()))
}

fn compile_field(
  field:     &str,
  condition: &Condition,
  tables:    &Tables,
  params:    &mut Vec<SqlValue>,
) -> String {
  let text = TypeTag::String.code();
  let (integer, float) = (TypeTag::Integer.code(), TypeTag::Float.code());

  let (type_test, value_test) = match condition {
    Condition::In(values) if values.is_empty() => return "0".to_owned(),
    Condition::Eq(value) if value.is_numeric() => {
      (format!("type IN ({integer}, {float})"), "value = ?".to_owned())
    }
    Condition::Eq(_) => (format!("type = {text}"), "value = ?".to_owned()),
    Condition::In(values) => (
      format!("type IN ({text}, {integer}, {float})"),
      format!("value IN ({})", placeholders(values.len())),
    ),
  };

  params.push(SqlValue::Text(field.to_owned()));
  match condition {
    Condition::Eq(value) => params.push(encode_filter_value(value)),
    Condition::In(values) => params.extend(values.iter().map(encode_filter_value)),
  }

  format!(
    "uuid IN (SELECT doc_id FROM {} WHERE key = ? AND {type_test} AND {value_test})",
    tables.data
  )
}
