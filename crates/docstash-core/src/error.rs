//! Error types for `docstash-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A value cannot be represented by any persisted type tag.
  #[error("type mapping error: {0}")]
  TypeMapping(String),

  #[error("not implemented: {0}")]
  NotImplemented(&'static str),

  #[error("nesting depth {depth} exceeds the configured maximum of {max}")]
  NestingLimitExceeded { depth: usize, max: usize },

  #[error("unsupported filter on {field:?}: {reason}")]
  Filter { field: String, reason: String },

  #[error("invalid configuration: {0}")]
  InvalidConfig(String),

  #[error("invalid document id: {0}")]
  InvalidId(#[from] uuid::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
