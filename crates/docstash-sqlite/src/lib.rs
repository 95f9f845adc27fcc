//! SQLite backend for the docstash document store.
//!
//! Documents are shredded into one row per key/value pair and rebuilt on
//! read. Each collection lives in its own database file with its own bounded
//! connection pool; the [`Catalog`] hands out collections by name.

mod collection;
mod encode;
mod predicate;
mod reconstruct;
mod schema;
mod shred;

pub mod catalog;
pub mod error;
pub mod pool;

pub use catalog::{Catalog, CatalogEntry};
pub use collection::SqliteCollection;
pub use error::{Error, Result};
pub use pool::{ConnectionPool, PooledConnection};
