//! Document identifiers.
//!
//! Identifiers are UUIDv7 values: 128 bits, unique, and time-ordered. They are
//! stored as lowercase hyphenated strings, whose lexical order matches
//! creation order.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
  /// Generate a fresh identifier ordered after every previously generated one
  /// in this process.
  pub fn generate() -> Self { Self(Uuid::now_v7()) }

  pub fn as_uuid(&self) -> &Uuid { &self.0 }

  /// The stored text form.
  pub fn encode(&self) -> String { self.0.hyphenated().to_string() }
}

impl From<Uuid> for DocumentId {
  fn from(uuid: Uuid) -> Self { Self(uuid) }
}

impl fmt::Display for DocumentId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.0.hyphenated(), f)
  }
}

impl FromStr for DocumentId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> { Ok(Self(Uuid::parse_str(s)?)) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn generated_ids_sort_in_creation_order() {
    let ids: Vec<DocumentId> = (0..64).map(|_| DocumentId::generate()).collect();
    let texts: Vec<String> = ids.iter().map(DocumentId::encode).collect();

    let mut sorted = texts.clone();
    sorted.sort();
    assert_eq!(texts, sorted);
  }

  #[test]
  fn text_form_round_trips() {
    let id = DocumentId::generate();
    let parsed: DocumentId = id.to_string().parse().unwrap();
    assert_eq!(parsed, id);
    assert_eq!(id.encode(), id.to_string());
  }

  #[test]
  fn garbage_is_rejected() {
    assert!(matches!(
      "not-an-id".parse::<DocumentId>(),
      Err(Error::InvalidId(_))
    ));
  }
}
