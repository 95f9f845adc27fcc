//! Conversions between docstash core types and SQLite column values.
//!
//! Document and fragment ids are stored as hyphenated lowercase UUID strings.
//! Leaf payloads go into the untyped `value` column as whatever SQLite storage
//! class matches their [`Scalar`] form.

use docstash_core::{FilterValue, Scalar};
use rusqlite::types::Value as SqlValue;

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_scalar(scalar: Scalar) -> SqlValue {
  match scalar {
    Scalar::Null => SqlValue::Null,
    Scalar::Integer(i) => SqlValue::Integer(i),
    Scalar::Real(f) => SqlValue::Real(f),
    Scalar::Text(s) => SqlValue::Text(s),
  }
}

/// `None` for blobs, which docstash never writes.
pub fn decode_scalar(value: SqlValue) -> Option<Scalar> {
  match value {
    SqlValue::Null => Some(Scalar::Null),
    SqlValue::Integer(i) => Some(Scalar::Integer(i)),
    SqlValue::Real(f) => Some(Scalar::Real(f)),
    SqlValue::Text(s) => Some(Scalar::Text(s)),
    SqlValue::Blob(_) => None,
  }
}

// ─── Filter values ───────────────────────────────────────────────────────────

pub fn encode_filter_value(value: &FilterValue) -> SqlValue {
  match value {
    FilterValue::String(s) => SqlValue::Text(s.clone()),
    FilterValue::Integer(i) => SqlValue::Integer(*i),
    FilterValue::Float(f) => SqlValue::Real(*f),
    FilterValue::Id(id) => SqlValue::Text(id.encode()),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// One fragment row as read from a collection's data table.
#[derive(Debug, Clone)]
pub struct RawFragment {
  pub fragment_id: String,
  pub parent_id:   Option<String>,
  pub key:         String,
  pub tag:         i64,
  pub value:       SqlValue,
}

impl RawFragment {
  /// Map a row selected with `Tables::select_fragments_sql`.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      fragment_id: row.get(0)?,
      parent_id:   row.get(1)?,
      key:         row.get(2)?,
      tag:         row.get(3)?,
      value:       row.get(4)?,
    })
  }
}
