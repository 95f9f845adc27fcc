//! The `DocumentCollection` trait and its input type.
//!
//! The trait is implemented by storage backends (e.g. `docstash-sqlite`).
//! Callers that only insert, read, count, and delete documents can depend on
//! this abstraction rather than on a concrete backend.

use crate::{DocumentId, Filter, Result, Value};

// ─── Input ───────────────────────────────────────────────────────────────────

/// A document handed to [`DocumentCollection::insert_one`].
///
/// A native tree and its serialized JSON text are equivalent inputs and are
/// stored identically.
#[derive(Debug, Clone)]
pub enum DocumentInput {
  Tree(Value),
  Json(serde_json::Value),
  Text(String),
}

impl DocumentInput {
  /// Resolve the input to a tree, parsing text if needed.
  pub fn into_value(self) -> Result<Value> {
    match self {
      Self::Tree(value) => Ok(value),
      Self::Json(json) => Value::try_from(json),
      Self::Text(text) => text.parse(),
    }
  }
}

impl From<Value> for DocumentInput {
  fn from(value: Value) -> Self { Self::Tree(value) }
}

impl From<serde_json::Value> for DocumentInput {
  fn from(json: serde_json::Value) -> Self { Self::Json(json) }
}

impl From<String> for DocumentInput {
  fn from(text: String) -> Self { Self::Text(text) }
}

impl From<&str> for DocumentInput {
  fn from(text: &str) -> Self { Self::Text(text.to_owned()) }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A named set of documents.
///
/// Documents are insert-once: they are written whole, read whole, and removed
/// whole. All methods block the calling thread.
pub trait DocumentCollection: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The normalised collection name.
  fn name(&self) -> &str;

  /// Store a document atomically and return its identifier.
  ///
  /// A fresh identifier is generated when `id` is `None`. Either every part of
  /// the document is stored or none of it is.
  fn insert_one<D: Into<DocumentInput>>(
    &self,
    document: D,
    id: Option<DocumentId>,
  ) -> Result<DocumentId, Self::Error>;

  /// Rebuild a stored document. Returns `None` if no document has `id`.
  fn find_one(&self, id: DocumentId) -> Result<Option<Value>, Self::Error>;

  /// Count documents satisfying every clause of `filter`.
  fn count_documents(&self, filter: &Filter) -> Result<u64, Self::Error>;

  /// Remove the first document (in identifier order) matching `filter` and
  /// return its identifier.
  fn delete_one(&self, filter: &Filter) -> Result<DocumentId, Self::Error>;

  /// Reserved. Documents cannot be modified in place.
  fn update(&self, filter: &Filter, document: Value) -> Result<(), Self::Error>;
}
