//! SQL schema for the catalog and for each collection.
//!
//! Table names cannot be bound as parameters, so collection names are
//! normalised and restricted to `[a-z_][a-z0-9_]*` before they ever reach a
//! statement, and are always emitted double-quoted.

use crate::{Error, Result};

/// DDL for the catalog database; idempotent thanks to `IF NOT EXISTS`.
pub const SYSTEM_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS collections (
    uuid TEXT PRIMARY KEY,       -- collection id
    name TEXT NOT NULL UNIQUE    -- normalised collection name
);
";

/// Name of the catalog database file, without extension.
pub const SYSTEM_DATABASE: &str = "system";

/// Trim and lowercase `name`, then check it is usable as a table name.
pub fn normalize_collection_name(name: &str) -> Result<String> {
  let normalized = name.trim().to_lowercase();

  let mut chars = normalized.chars();
  let well_formed = chars
    .next()
    .is_some_and(|c| c == '_' || c.is_ascii_lowercase())
    && chars.all(|c| c == '_' || c.is_ascii_lowercase() || c.is_ascii_digit());

  // `system` would share the catalog's database file.
  if !well_formed || normalized == SYSTEM_DATABASE || normalized.starts_with("sqlite_") {
    return Err(Error::InvalidCollectionName(name.to_owned()));
  }
  Ok(normalized)
}

// ─── Collection tables ───────────────────────────────────────────────────────

/// Quoted table identifiers for one collection.
#[derive(Debug, Clone)]
pub struct Tables {
  /// Document-existence table, keyed by document id.
  pub documents: String,
  /// Fragment table.
  pub data:      String,
  doc_index:     String,
  key_index:     String,
}

impl Tables {
  /// `name` must already have passed [`normalize_collection_name`].
  pub fn new(name: &str) -> Self {
    Self {
      documents: format!("\"{name}\""),
      data:      format!("\"{name}_data\""),
      doc_index: format!("\"{name}_data_doc_idx\""),
      key_index: format!("\"{name}_data_key_idx\""),
    }
  }

  pub fn ddl(&self) -> String {
    let Self { documents, data, doc_index, key_index } = self;
    format!(
      "
CREATE TABLE IF NOT EXISTS {documents} (
    uuid TEXT PRIMARY KEY                  -- document id
);

-- One row per key/value pair of a document.
CREATE TABLE IF NOT EXISTS {data} (
    uuid        TEXT PRIMARY KEY,          -- fragment id
    doc_id      TEXT NOT NULL REFERENCES {documents}(uuid),
    parent_uuid TEXT,                      -- NULL for members of the root
    key         TEXT NOT NULL,             -- member name or decimal index
    type        INTEGER NOT NULL,          -- TypeTag code
    value                                  -- untyped: stored as bound
);

CREATE INDEX IF NOT EXISTS {doc_index} ON {data}(doc_id);
-- Serves every filter clause: key = ? AND type ... AND value ...
CREATE INDEX IF NOT EXISTS {key_index} ON {data}(key, type, value);
"
    )
  }

  pub fn insert_document_sql(&self) -> String {
    format!("INSERT INTO {} (uuid) VALUES (?1)", self.documents)
  }

  pub fn insert_fragment_sql(&self) -> String {
    format!(
      "INSERT INTO {} (uuid, doc_id, parent_uuid, key, type, value)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      self.data
    )
  }

  pub fn document_exists_sql(&self) -> String {
    format!("SELECT 1 FROM {} WHERE uuid = ?1", self.documents)
  }

  pub fn select_fragments_sql(&self) -> String {
    format!(
      "SELECT uuid, parent_uuid, key, type, value FROM {} WHERE doc_id = ?1",
      self.data
    )
  }

  pub fn delete_fragments_sql(&self) -> String {
    format!("DELETE FROM {} WHERE doc_id = ?1", self.data)
  }

  pub fn delete_document_sql(&self) -> String {
    format!("DELETE FROM {} WHERE uuid = ?1", self.documents)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn names_are_trimmed_and_lowercased() {
    assert_eq!(normalize_collection_name("  Users ").unwrap(), "users");
    assert_eq!(normalize_collection_name("_audit_2024").unwrap(), "_audit_2024");
  }

  #[test]
  fn unsafe_names_are_rejected() {
    for bad in ["", "1abc", "bad-name", "a b", "x\"; DROP TABLE y; --", "system", "sqlite_master"] {
      assert!(
        matches!(normalize_collection_name(bad), Err(Error::InvalidCollectionName(_))),
        "{bad:?} should be rejected"
      );
    }
  }

  #[test]
  fn ddl_is_valid_and_idempotent() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    let tables = Tables::new("things");
    conn.execute_batch(&tables.ddl()).unwrap();
    conn.execute_batch(&tables.ddl()).unwrap();
    conn.execute_batch(SYSTEM_SCHEMA).unwrap();
  }

  #[test]
  fn filter_lookups_use_the_key_index() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    let tables = Tables::new("things");
    conn.execute_batch(&tables.ddl()).unwrap();

    let sql = format!(
      "EXPLAIN QUERY PLAN SELECT doc_id FROM {} WHERE key = ?1 AND type = 20 AND value = ?2",
      tables.data
    );
    let mut stmt = conn.prepare(&sql).unwrap();
    let plan = stmt
      .query_map(rusqlite::params!["k", "x"], |row| row.get::<_, String>(3))
      .unwrap()
      .collect::<rusqlite::Result<Vec<_>>>()
      .unwrap();

    assert!(
      plan.iter().any(|step| step.contains("things_data_key_idx")),
      "{plan:?}"
    );
  }

  #[test]
  fn catalog_table_name_is_a_usable_collection_name() {
    assert_eq!(normalize_collection_name("Collections").unwrap(), "collections");
  }
}
