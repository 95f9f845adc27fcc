//! Error type for `docstash-sqlite`.

use docstash_core::DocumentId;
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] docstash_core::Error),

  /// Any failure reported by SQLite, including busy and lock timeouts.
  #[error("database error: {0}")]
  Storage(#[from] rusqlite::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("invalid collection name: {0:?}")]
  InvalidCollectionName(String),

  /// Stored fragments do not form a valid tree.
  #[error("document {id} is corrupt: {reason}")]
  CorruptDocument { id: DocumentId, reason: String },

  #[error("no document matches the filter")]
  NotFound,
}

impl Error {
  /// Whether the operation failed only because another connection held a
  /// lock past the busy timeout, so retrying may succeed.
  pub fn is_retryable(&self) -> bool {
    match self {
      Self::Storage(rusqlite::Error::SqliteFailure(e, _)) => {
        matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
      }
      _ => false,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
