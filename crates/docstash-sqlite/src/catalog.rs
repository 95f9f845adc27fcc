//! The catalog: the registry of collections in a store directory.
//!
//! Registrations are persisted in `<dir>/system.sqlite`. Opened collections
//! are cached by normalised name, so asking for the same collection twice
//! yields the same handle.

use std::{collections::HashMap, fs, sync::Arc};

use docstash_core::StoreConfig;
use parking_lot::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Result,
  collection::SqliteCollection,
  pool::ConnectionPool,
  schema::{SYSTEM_DATABASE, SYSTEM_SCHEMA, normalize_collection_name},
};

/// A persisted collection registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
  pub collection_id: Uuid,
  pub name:          String,
}

pub struct Catalog {
  config:      StoreConfig,
  pool:        ConnectionPool,
  collections: Mutex<HashMap<String, Arc<SqliteCollection>>>,
}

impl Catalog {
  /// Open (or create) the catalog under `config.dir`.
  pub fn open(config: StoreConfig) -> Result<Self> {
    config.validate()?;
    fs::create_dir_all(&config.dir)?;

    let path = config.dir.join(format!("{SYSTEM_DATABASE}.sqlite"));
    let pool = ConnectionPool::open(&path, &config)?;
    pool.acquire().execute_batch(SYSTEM_SCHEMA)?;

    info!(dir = %config.dir.display(), "opened catalog");
    Ok(Self { config, pool, collections: Mutex::new(HashMap::new()) })
  }

  /// Return the collection called `name`, registering and creating it on
  /// first use.
  ///
  /// The name is trimmed and lowercased first; every spelling of the same
  /// normalised name returns the same [`Arc`].
  pub fn add_collection(&self, name: &str) -> Result<Arc<SqliteCollection>> {
    let name = normalize_collection_name(name)?;

    // Held across the open so two callers cannot race to create one collection.
    let mut collections = self.collections.lock();
    if let Some(existing) = collections.get(&name) {
      return Ok(Arc::clone(existing));
    }

    let collection = Arc::new(SqliteCollection::open(&self.config, &name)?);
    let registered = self.pool.acquire().execute(
      "INSERT INTO collections (uuid, name) VALUES (?1, ?2)
       ON CONFLICT(name) DO NOTHING",
      rusqlite::params![Uuid::now_v7().hyphenated().to_string(), name],
    )?;
    if registered > 0 {
      info!(collection = %name, "registered collection");
    } else {
      debug!(collection = %name, "collection already registered");
    }

    collections.insert(name, Arc::clone(&collection));
    Ok(collection)
  }

  /// Every registered collection, in registration order.
  pub fn list_collections(&self) -> Result<Vec<CatalogEntry>> {
    let conn = self.pool.acquire();
    let mut stmt = conn.prepare_cached("SELECT uuid, name FROM collections ORDER BY uuid")?;
    let rows = stmt
      .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    rows
      .into_iter()
      .map(|(uuid, name)| -> Result<CatalogEntry> {
        Ok(CatalogEntry { collection_id: Uuid::parse_str(&uuid)?, name })
      })
      .collect()
  }

  pub fn config(&self) -> &StoreConfig { &self.config }
}
