//! Entities: named things observed in documents.
//!
//! Identity is `(normalized_name, kind)`. Observing an existing entity again
//! bumps its occurrence count instead of creating a second row.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::Fingerprint;

// ─── Kind ────────────────────────────────────────────────────────────────────

/// The category of a named entity. Unrecognised labels are kept verbatim
/// (upper-cased) so external recognisers can use their own taxonomies.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityKind {
  Person,
  Organization,
  Location,
  Custom(String),
}

impl EntityKind {
  /// The label stored in the `kind` column.
  pub fn as_str(&self) -> &str {
    match self {
      Self::Person => "PERSON",
      Self::Organization => "ORG",
      Self::Location => "LOCATION",
      Self::Custom(label) => label,
    }
  }
}

impl From<&str> for EntityKind {
  fn from(label: &str) -> Self {
    let upper = label.trim().to_uppercase();
    match upper.as_str() {
      "PERSON" | "PER" => Self::Person,
      "ORG" | "ORGANIZATION" | "ORGANISATION" => Self::Organization,
      "LOCATION" | "LOC" | "GPE" => Self::Location,
      _ => Self::Custom(upper),
    }
  }
}

impl From<String> for EntityKind {
  fn from(label: String) -> Self { Self::from(label.as_str()) }
}

impl From<EntityKind> for String {
  fn from(kind: EntityKind) -> Self { kind.as_str().to_owned() }
}

impl fmt::Display for EntityKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Entity ──────────────────────────────────────────────────────────────────

/// A stored entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
  pub entity_id:       Uuid,
  /// Spelling from the first observation.
  pub name:            String,
  /// Identity key; see [`normalize_name`].
  pub normalized_name: String,
  pub kind:            EntityKind,
  /// Incremented on every observation; never decreases.
  pub occurrences:     u64,
  /// Weak back-reference to the document that introduced the entity.
  pub first_seen:      Option<Fingerprint>,
  pub created_at:      DateTime<Utc>,
}

/// Input to [`crate::store::CorpusStore::add_entity`].
#[derive(Debug, Clone)]
pub struct NewEntity {
  pub name:       String,
  pub kind:       EntityKind,
  pub first_seen: Option<Fingerprint>,
}

impl NewEntity {
  pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
    Self { name: name.into(), kind, first_seen: None }
  }

  pub fn seen_in(mut self, fingerprint: Fingerprint) -> Self {
    self.first_seen = Some(fingerprint);
    self
  }

  pub fn normalized_name(&self) -> String { normalize_name(&self.name) }
}

/// An opaque `(name, kind)` pair produced by an entity recogniser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityMention {
  pub name: String,
  pub kind: EntityKind,
}

impl EntityMention {
  pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
    Self { name: name.into(), kind }
  }

  /// The identity key this mention resolves to.
  pub fn identity(&self) -> (String, EntityKind) {
    (normalize_name(&self.name), self.kind.clone())
  }
}

/// Case-insensitive identity key: trimmed, lower-cased, inner whitespace
/// runs collapsed to a single space.
pub fn normalize_name(name: &str) -> String {
  name
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalize_name_is_case_and_space_insensitive() {
    assert_eq!(normalize_name("  John   SMITH "), "john smith");
    assert_eq!(normalize_name("john smith"), normalize_name("John Smith"));
  }

  #[test]
  fn kind_parses_common_labels() {
    assert_eq!(EntityKind::from("person"), EntityKind::Person);
    assert_eq!(EntityKind::from("ORGANIZATION"), EntityKind::Organization);
    assert_eq!(EntityKind::from("gpe"), EntityKind::Location);
    assert_eq!(
      EntityKind::from("money"),
      EntityKind::Custom("MONEY".into())
    );
  }

  #[test]
  fn kind_label_round_trips_through_string() {
    for kind in [
      EntityKind::Person,
      EntityKind::Organization,
      EntityKind::Location,
      EntityKind::Custom("VESSEL".into()),
    ] {
      assert_eq!(EntityKind::from(String::from(kind.clone())), kind);
    }
  }

  #[test]
  fn mention_identity_ignores_case() {
    let a = EntityMention::new("Ghislaine Doe", EntityKind::Person);
    let b = EntityMention::new("GHISLAINE  doe", EntityKind::Person);
    assert_eq!(a.identity(), b.identity());
  }
}
