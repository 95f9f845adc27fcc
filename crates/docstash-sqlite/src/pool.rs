//! A fixed-size pool of SQLite connections.
//!
//! All connections are opened up front. [`ConnectionPool::acquire`] blocks
//! while every connection is in use; the returned [`PooledConnection`] hands
//! its connection back when dropped, on every exit path.

use std::{
  collections::VecDeque,
  ops::{Deref, DerefMut},
  path::{Path, PathBuf},
};

use docstash_core::StoreConfig;
use parking_lot::{Condvar, Mutex};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::Result;

pub struct ConnectionPool {
  path:      PathBuf,
  size:      usize,
  wal:       bool,
  idle:      Mutex<VecDeque<Connection>>,
  available: Condvar,
}

impl ConnectionPool {
  /// Open `config.pool_size` connections to the database at `path`, creating
  /// the file if needed.
  pub fn open(path: impl AsRef<Path>, config: &StoreConfig) -> Result<Self> {
    config.validate()?;
    let path = path.as_ref().to_path_buf();

    let mut idle = VecDeque::with_capacity(config.pool_size);
    let mut wal = true;
    for _ in 0..config.pool_size {
      let (conn, conn_wal) = open_connection(&path, config)?;
      wal &= conn_wal;
      idle.push_back(conn);
    }
    if !wal {
      warn!(path = %path.display(), "WAL journal mode unavailable; writers will block readers");
    }

    info!(path = %path.display(), size = config.pool_size, wal, "opened connection pool");
    Ok(Self {
      path,
      size: config.pool_size,
      wal,
      idle: Mutex::new(idle),
      available: Condvar::new(),
    })
  }

  /// Take a connection, waiting for one to be released if none is idle.
  pub fn acquire(&self) -> PooledConnection<'_> {
    let mut idle = self.idle.lock();
    loop {
      if let Some(conn) = idle.pop_front() {
        return PooledConnection { pool: self, conn: Some(conn) };
      }
      debug!(path = %self.path.display(), "connection pool exhausted; waiting");
      self.available.wait(&mut idle);
    }
  }

  fn release(&self, conn: Connection) {
    self.idle.lock().push_back(conn);
    self.available.notify_one();
  }

  /// Total number of connections owned by the pool.
  pub fn size(&self) -> usize { self.size }

  /// Connections not currently handed out.
  pub fn idle(&self) -> usize { self.idle.lock().len() }

  pub fn path(&self) -> &Path { &self.path }

  /// Whether every connection is in WAL journal mode.
  pub fn is_wal(&self) -> bool { self.wal }
}

/// Returns the connection and whether SQLite accepted WAL mode for it.
fn open_connection(path: &Path, config: &StoreConfig) -> Result<(Connection, bool)> {
  let conn = Connection::open(path)?;
  conn.busy_timeout(config.busy_timeout())?;
  conn.set_prepared_statement_cache_capacity(config.cached_statements);
  // Readers keep working while a writer holds the lock.
  let mode = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
    row.get::<_, String>(0)
  })?;
  conn.pragma_update(None, "foreign_keys", true)?;
  Ok((conn, mode.eq_ignore_ascii_case("wal")))
}

// ─── Guard ───────────────────────────────────────────────────────────────────

/// A connection borrowed from a [`ConnectionPool`].
pub struct PooledConnection<'a> {
  pool: &'a ConnectionPool,
  /// `Some` until the guard is dropped.
  conn: Option<Connection>,
}

impl Deref for PooledConnection<'_> {
  type Target = Connection;

  fn deref(&self) -> &Connection {
    self.conn.as_ref().expect("pooled connection used after release")
  }
}

impl DerefMut for PooledConnection<'_> {
  fn deref_mut(&mut self) -> &mut Connection {
    self.conn.as_mut().expect("pooled connection used after release")
  }
}

impl Drop for PooledConnection<'_> {
  fn drop(&mut self) {
    if let Some(conn) = self.conn.take() {
      self.pool.release(conn);
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{sync::mpsc, thread, time::Duration};

  use tempfile::TempDir;

  use super::*;

  fn pool(size: usize) -> (TempDir, ConnectionPool) {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig { pool_size: size, ..StoreConfig::in_dir(dir.path()) };
    let pool = ConnectionPool::open(dir.path().join("pool.sqlite"), &config).unwrap();
    (dir, pool)
  }

  #[test]
  fn opens_exactly_pool_size_connections() {
    let (_dir, pool) = pool(3);
    assert_eq!(pool.size(), 3);
    assert_eq!(pool.idle(), 3);
  }

  #[test]
  fn connections_use_wal_and_foreign_keys() {
    let (_dir, pool) = pool(1);
    let conn = pool.acquire();
    let mode: String = conn.query_row("PRAGMA journal_mode", [], |r| r.get(0)).unwrap();
    let fks: i64 = conn.query_row("PRAGMA foreign_keys", [], |r| r.get(0)).unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
    assert_eq!(fks, 1);
    assert!(pool.is_wal());
  }

  #[test]
  fn pool_reports_when_wal_is_refused() {
    // In-memory databases only support the `memory` journal mode.
    let config = StoreConfig { pool_size: 1, ..StoreConfig::default() };
    let pool = ConnectionPool::open(":memory:", &config).unwrap();
    assert!(!pool.is_wal());
    assert_eq!(pool.idle(), 1);
  }

  #[test]
  fn acquire_blocks_until_a_connection_is_released() {
    let (_dir, pool) = pool(2);
    let first = pool.acquire();
    let second = pool.acquire();
    assert_eq!(pool.idle(), 0);

    let (tx, rx) = mpsc::channel();
    thread::scope(|s| {
      s.spawn(|| {
        let conn = pool.acquire();
        let one: i64 = conn.query_row("SELECT 1", [], |r| r.get(0)).unwrap();
        tx.send(one).unwrap();
      });

      // The third caller is parked while both connections are out.
      assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

      drop(first);
      assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 1);
    });

    drop(second);
    assert_eq!(pool.idle(), 2);
  }

  #[test]
  fn connection_returns_on_error_paths() {
    let (_dir, pool) = pool(1);

    let failed: Result<()> = (|| {
      let conn = pool.acquire();
      conn.execute_batch("SELECT * FROM no_such_table")?;
      Ok(())
    })();

    assert!(failed.is_err());
    assert_eq!(pool.idle(), 1);
  }

  #[test]
  fn zero_sized_pool_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig { pool_size: 0, ..StoreConfig::in_dir(dir.path()) };
    assert!(ConnectionPool::open(dir.path().join("p.sqlite"), &config).is_err());
  }
}
