//! [`SqliteCollection`]: the SQLite implementation of [`DocumentCollection`].

use std::fs;

use docstash_core::{
  DocumentCollection, DocumentId, DocumentInput, Error as CoreError, Filter, StoreConfig,
  Value,
};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  pool::ConnectionPool,
  predicate,
  reconstruct::{load_fragments, reconstruct},
  schema::{Tables, normalize_collection_name},
  shred::shred,
};

/// A collection stored in `<dir>/<name>.sqlite` with its own connection pool.
pub struct SqliteCollection {
  name:      String,
  tables:    Tables,
  pool:      ConnectionPool,
  max_depth: usize,
}

impl SqliteCollection {
  /// Open (or create) the collection `name` under `config.dir` and make sure
  /// its tables exist.
  pub fn open(config: &StoreConfig, name: &str) -> Result<Self> {
    config.validate()?;
    let name = normalize_collection_name(name)?;
    fs::create_dir_all(&config.dir)?;

    let path = config.dir.join(format!("{name}.sqlite"));
    let pool = ConnectionPool::open(&path, config)?;
    let tables = Tables::new(&name);
    pool.acquire().execute_batch(&tables.ddl())?;

    info!(collection = %name, path = %path.display(), "opened collection");
    Ok(Self { name, tables, pool, max_depth: config.max_nesting_depth })
  }

  /// The collection's connection pool.
  pub fn pool(&self) -> &ConnectionPool { &self.pool }
}

impl std::fmt::Debug for SqliteCollection {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SqliteCollection")
      .field("name", &self.name)
      .field("path", &self.pool.path())
      .finish_non_exhaustive()
  }
}

impl DocumentCollection for SqliteCollection {
  type Error = Error;

  fn name(&self) -> &str { &self.name }

  fn insert_one<D: Into<DocumentInput>>(
    &self,
    document: D,
    id: Option<DocumentId>,
  ) -> Result<DocumentId> {
    let root = document.into().into_value()?;
    let id = id.unwrap_or_else(DocumentId::generate);

    let mut conn = self.pool.acquire();
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    // Dropping `tx` without committing rolls back every row written so far.
    match shred(&tx, &self.tables, id, &root, self.max_depth) {
      Ok(fragments) => {
        tx.commit()?;
        debug!(collection = %self.name, %id, fragments, "inserted document");
        Ok(id)
      }
      Err(e) => {
        warn!(collection = %self.name, %id, error = %e, "insert rolled back");
        Err(e)
      }
    }
  }

  fn find_one(&self, id: DocumentId) -> Result<Option<Value>> {
    let mut conn = self.pool.acquire();
    let tx = conn.transaction()?;

    let exists = tx
      .prepare_cached(&self.tables.document_exists_sql())?
      .query_row(rusqlite::params![id.encode()], |_| Ok(()))
      .optional()?
      .is_some();
    if !exists {
      return Ok(None);
    }

    let fragments = load_fragments(&tx, &self.tables, &id)?;
    tx.finish()?;
    reconstruct(id, fragments).map(Some)
  }

  fn count_documents(&self, filter: &Filter) -> Result<u64> {
    let predicate = predicate::compile(filter, &self.tables)?;
    let sql = format!(
      "SELECT COUNT(*) FROM {} WHERE {}",
      self.tables.documents, predicate.sql
    );

    let conn = self.pool.acquire();
    let count: i64 = conn.prepare_cached(&sql)?.query_row(
      rusqlite::params_from_iter(predicate.params.iter()),
      |row| row.get(0),
    )?;
    Ok(count.max(0) as u64)
  }

  fn delete_one(&self, filter: &Filter) -> Result<DocumentId> {
    let predicate = predicate::compile(filter, &self.tables)?;
    let sql = format!(
      "SELECT uuid FROM {} WHERE {} ORDER BY uuid LIMIT 1",
      self.tables.documents, predicate.sql
    );

    let mut conn = self.pool.acquire();
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let target: Option<String> = tx
      .prepare_cached(&sql)?
      .query_row(rusqlite::params_from_iter(predicate.params.iter()), |row| {
        row.get(0)
      })
      .optional()?;
    let Some(target) = target else {
      return Err(Error::NotFound);
    };

    let removed = tx
      .prepare_cached(&self.tables.delete_fragments_sql())?
      .execute(rusqlite::params![target])?;
    tx.prepare_cached(&self.tables.delete_document_sql())?
      .execute(rusqlite::params![target])?;
    tx.commit()?;

    let id: DocumentId = target.parse()?;
    debug!(collection = %self.name, %id, fragments = removed, "deleted document");
    Ok(id)
  }

  fn update(&self, _filter: &Filter, _document: Value) -> Result<()> {
    Err(CoreError::NotImplemented("update").into())
  }
}
