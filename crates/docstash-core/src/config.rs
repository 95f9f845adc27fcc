//! Store configuration.
//!
//! Deserialised by the binary from a TOML file and `DOCSTASH_*` environment
//! variables; every field has a documented default.

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
  /// Directory holding `system.sqlite` and one `<collection>.sqlite` per
  /// collection. Created on open if missing.
  pub dir:               PathBuf,
  /// Maximum root-to-fragment path length of a stored document.
  pub max_nesting_depth: usize,
  /// Connections opened per collection (and for the catalog).
  pub pool_size:         usize,
  /// Prepared statements cached per connection.
  pub cached_statements: usize,
  /// How long a connection waits on a locked database before failing with a
  /// busy error.
  pub busy_timeout_ms:   u64,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      dir:               PathBuf::from(".docstash"),
      max_nesting_depth: 100,
      pool_size:         10,
      cached_statements: 128,
      busy_timeout_ms:   5000,
    }
  }
}

impl StoreConfig {
  /// Defaults, rooted at `dir`.
  pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into(), ..Self::default() }
  }

  pub fn busy_timeout(&self) -> Duration { Duration::from_millis(self.busy_timeout_ms) }

  pub fn validate(&self) -> Result<()> {
    if self.pool_size == 0 {
      return Err(Error::InvalidConfig("pool_size must be at least 1".into()));
    }
    if self.max_nesting_depth == 0 {
      return Err(Error::InvalidConfig(
        "max_nesting_depth must be at least 1".into(),
      ));
    }
    Ok(())
  }
}
