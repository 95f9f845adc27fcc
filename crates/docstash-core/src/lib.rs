//! Core types and trait definitions for the docstash document store.
//!
//! This crate has no database dependencies. It defines the document value
//! model, the stable type tags used to persist leaf values, document
//! identifiers, filters, configuration, and the [`store::DocumentCollection`]
//! trait that storage backends implement.

pub mod config;
pub mod error;
pub mod filter;
pub mod id;
pub mod store;
pub mod tag;
pub mod value;

pub use config::StoreConfig;
pub use error::{Error, Result};
pub use filter::{Condition, Filter, FilterValue};
pub use id::DocumentId;
pub use store::{DocumentCollection, DocumentInput};
pub use tag::{Scalar, TypeTag};
pub use value::Value;
