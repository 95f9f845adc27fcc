//! Shredding: writing a document tree as fragment rows.

use docstash_core::{
  DocumentId, Error as CoreError, Value,
  tag::{classify, encode},
};
use rusqlite::{Transaction, types::Value as SqlValue};
use uuid::Uuid;

use crate::{Result, encode::encode_scalar, schema::Tables};

/// Write the existence row and every fragment of `root` inside `tx`.
///
/// Returns the number of fragments written. The caller owns the transaction:
/// on any error it must not commit, and dropping it rolls back every row
/// written here.
///
/// Traversal uses an explicit work list; members of the root are at depth 1
/// and no fragment may sit deeper than `max_depth`.
pub(crate) fn shred(
  tx:        &Transaction<'_>,
  tables:    &Tables,
  id:        DocumentId,
  root:      &Value,
  max_depth: usize,
) -> Result<usize> {
  if !matches!(root, Value::Object(_)) {
    return Err(
      CoreError::TypeMapping(format!(
        "a document root must be an object, not {}",
        root.kind()
      ))
      .into(),
    );
  }

  let doc_id = id.encode();
  tx.prepare_cached(&tables.insert_document_sql())?
    .execute(rusqlite::params![doc_id])?;

  let mut insert = tx.prepare_cached(&tables.insert_fragment_sql())?;
  let mut written = 0;
  let mut work: Vec<(&Value, Option<String>, usize)> = vec![(root, None, 0)];

  while let Some((node, parent_id, parent_depth)) = work.pop() {
    let children: Vec<(String, &Value)> = match node {
      Value::Object(members) => members.iter().map(|(k, v)| (k.clone(), v)).collect(),
      Value::Array(items) => items.iter().enumerate().map(|(i, v)| (i.to_string(), v)).collect(),
      _ => continue,
    };

    let depth = parent_depth + 1;
    if depth > max_depth && !children.is_empty() {
      return Err(CoreError::NestingLimitExceeded { depth, max: max_depth }.into());
    }

    for (key, value) in children {
      let tag = classify(value)?;
      let scalar = encode(value, tag)?;
      let is_container = scalar.is_none();
      let fragment_id = Uuid::now_v7().hyphenated().to_string();

      insert.execute(rusqlite::params![
        fragment_id,
        doc_id,
        parent_id.as_deref(),
        key,
        tag.code(),
        scalar.map_or(SqlValue::Null, encode_scalar),
      ])?;
      written += 1;

      if is_container {
        work.push((value, Some(fragment_id), depth));
      }
    }
  }

  Ok(written)
}
