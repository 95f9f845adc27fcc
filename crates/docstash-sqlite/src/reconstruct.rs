//! Reconstruction: rebuilding a document tree from its fragment rows.
//!
//! The rows of one document are read in a single query and indexed by parent
//! id once, so rebuilding is linear in the number of fragments. Containers are
//! created top-down from an explicit frontier and then filled bottom-up; array
//! members are placed by their recorded index, never by discovery order.

use std::collections::{BTreeMap, HashMap};

use docstash_core::{DocumentId, Error as CoreError, TypeTag, Value, tag::decode};
use rusqlite::Connection;

use crate::{
  Error, Result,
  encode::{RawFragment, decode_scalar},
  schema::Tables,
};

/// Read every fragment of `id` in one statement.
pub(crate) fn load_fragments(
  conn:   &Connection,
  tables: &Tables,
  id:     &DocumentId,
) -> Result<Vec<RawFragment>> {
  let mut stmt = conn.prepare_cached(&tables.select_fragments_sql())?;
  let rows = stmt
    .query_map(rusqlite::params![id.encode()], RawFragment::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// A node under construction.
enum Slot {
  Object(BTreeMap<String, Value>),
  /// Members tagged with their recorded index, in arbitrary order.
  Array(Vec<(usize, Value)>),
  Leaf(Value),
}

/// Where a finished node is attached in its parent.
enum Key {
  Member(String),
  Index(usize),
}

/// Rebuild the tree of `id` from its fragments. No fragments yields an empty
/// object.
pub(crate) fn reconstruct(id: DocumentId, fragments: Vec<RawFragment>) -> Result<Value> {
  let corrupt = |reason: String| Error::CorruptDocument { id, reason };
  let total = fragments.len();

  let mut children: HashMap<Option<String>, Vec<RawFragment>> = HashMap::new();
  for fragment in fragments {
    children.entry(fragment.parent_id.clone()).or_default().push(fragment);
  }

  // `slots[i + 1]` is attached to its parent via `links[i]`; slot 0 is the root.
  let mut slots = vec![Slot::Object(BTreeMap::new())];
  let mut links: Vec<(usize, Key)> = Vec::with_capacity(total);
  let mut frontier: Vec<(Option<String>, usize)> = vec![(None, 0)];
  let mut visited = 0;

  while let Some((parent_id, parent)) = frontier.pop() {
    let Some(rows) = children.remove(&parent_id) else { continue };

    for row in rows {
      visited += 1;

      let key = match slots[parent] {
        Slot::Array(_) => Key::Index(row.key.parse().map_err(|_| {
          corrupt(format!("array member has non-index key {:?}", row.key))
        })?),
        _ => Key::Member(row.key),
      };

      let tag = TypeTag::from_code(row.tag)
        .ok_or_else(|| corrupt(format!("unknown type tag {}", row.tag)))?;
      let slot = match tag {
        TypeTag::Object => Slot::Object(BTreeMap::new()),
        TypeTag::Array => Slot::Array(Vec::new()),
        leaf => {
          let scalar = decode_scalar(row.value)
            .ok_or_else(|| corrupt("blob payload in value column".into()))?;
          Slot::Leaf(decode(leaf, scalar).map_err(|e| match e {
            CoreError::NotImplemented(_) => Error::Core(e),
            other => corrupt(other.to_string()),
          })?)
        }
      };

      slots.push(slot);
      links.push((parent, key));
      if tag.is_container() {
        frontier.push((Some(row.fragment_id), slots.len() - 1));
      }
    }
  }

  if visited != total {
    return Err(corrupt(format!(
      "{} of {total} fragments are unreachable from the root",
      total - visited
    )));
  }

  // Every slot is pushed after its parent, so popping from the end always
  // finishes a node before the node it belongs to.
  while let Some((parent, key)) = links.pop() {
    let Some(slot) = slots.pop() else { break };
    let value = finish(slot).map_err(&corrupt)?;
    match (&mut slots[parent], key) {
      (Slot::Object(members), Key::Member(name)) => {
        if members.insert(name.clone(), value).is_some() {
          return Err(corrupt(format!("duplicate member {name:?}")));
        }
      }
      (Slot::Array(items), Key::Index(index)) => items.push((index, value)),
      _ => return Err(corrupt("fragment attached to a leaf".into())),
    }
  }

  match slots.pop() {
    Some(root) => finish(root).map_err(corrupt),
    None => Ok(Value::empty_object()),
  }
}

fn finish(slot: Slot) -> std::result::Result<Value, String> {
  match slot {
    Slot::Object(members) => Ok(Value::Object(members)),
    Slot::Leaf(value) => Ok(value),
    Slot::Array(mut items) => {
      items.sort_by_key(|(index, _)| *index);
      if let Some((position, (index, _))) =
        items.iter().enumerate().find(|(position, (index, _))| position != index)
      {
        return Err(format!("array index {index} found at position {position}"));
      }
      Ok(Value::Array(items.into_iter().map(|(_, value)| value).collect()))
    }
  }
}

#[cfg(test)]
mod tests {
  use rusqlite::types::Value as SqlValue;

  use super::*;

  fn row(id: &str, parent: Option<&str>, key: &str, tag: TypeTag, value: SqlValue) -> RawFragment {
    RawFragment {
      fragment_id: id.into(),
      parent_id:   parent.map(Into::into),
      key:         key.into(),
      tag:         tag.code(),
      value,
    }
  }

  #[test]
  fn no_fragments_is_an_empty_object() {
    let doc = reconstruct(DocumentId::generate(), vec![]).unwrap();
    assert_eq!(doc, Value::empty_object());
  }

  #[test]
  fn array_members_are_placed_by_index_not_discovery_order() {
    let rows = vec![
      row("b", None, "b", TypeTag::Array, SqlValue::Null),
      row("b2", Some("b"), "2", TypeTag::Integer, SqlValue::Integer(3)),
      row("b0", Some("b"), "0", TypeTag::Integer, SqlValue::Integer(1)),
      row("b1", Some("b"), "1", TypeTag::Integer, SqlValue::Integer(2)),
    ];
    let doc = reconstruct(DocumentId::generate(), rows).unwrap();
    assert_eq!(doc, r#"{"b": [1, 2, 3]}"#.parse::<Value>().unwrap());
  }

  #[test]
  fn children_listed_before_their_parent_are_still_attached() {
    let rows = vec![
      row("leaf", Some("inner"), "x", TypeTag::Boolean, SqlValue::Integer(1)),
      row("inner", Some("outer"), "0", TypeTag::Object, SqlValue::Null),
      row("outer", None, "list", TypeTag::Array, SqlValue::Null),
    ];
    let doc = reconstruct(DocumentId::generate(), rows).unwrap();
    assert_eq!(doc, r#"{"list": [{"x": true}]}"#.parse::<Value>().unwrap());
  }

  #[test]
  fn gap_in_array_indices_is_corrupt() {
    let rows = vec![
      row("a", None, "a", TypeTag::Array, SqlValue::Null),
      row("a0", Some("a"), "0", TypeTag::Null, SqlValue::Null),
      row("a2", Some("a"), "2", TypeTag::Null, SqlValue::Null),
    ];
    let err = reconstruct(DocumentId::generate(), rows).unwrap_err();
    assert!(matches!(err, Error::CorruptDocument { .. }));
  }

  #[test]
  fn orphaned_fragment_is_corrupt() {
    let rows = vec![
      row("a", None, "a", TypeTag::Integer, SqlValue::Integer(1)),
      row("lost", Some("missing-parent"), "x", TypeTag::Integer, SqlValue::Integer(2)),
    ];
    let err = reconstruct(DocumentId::generate(), rows).unwrap_err();
    assert!(matches!(err, Error::CorruptDocument { .. }));
  }

  #[test]
  fn unknown_tag_is_corrupt() {
    let mut bad = row("a", None, "a", TypeTag::Integer, SqlValue::Integer(1));
    bad.tag = 1;
    let err = reconstruct(DocumentId::generate(), vec![bad]).unwrap_err();
    assert!(matches!(err, Error::CorruptDocument { .. }));
  }

  #[test]
  fn scalar_not_matching_tag_is_corrupt() {
    let rows = vec![row("a", None, "a", TypeTag::Integer, SqlValue::Text("1".into()))];
    let err = reconstruct(DocumentId::generate(), rows).unwrap_err();
    assert!(matches!(err, Error::CorruptDocument { .. }));
  }
}
