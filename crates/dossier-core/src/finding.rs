//! Findings: append-only detector output.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, document::Fingerprint};

/// Which detector produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
  BridgeEntity,
  BenfordsViolation,
  SilenceInterval,
}

impl FindingKind {
  pub const ALL: [Self; 3] =
    [Self::BridgeEntity, Self::BenfordsViolation, Self::SilenceInterval];

  /// The discriminant stored in the `kind` column.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::BridgeEntity => "bridge_entity",
      Self::BenfordsViolation => "benfords_violation",
      Self::SilenceInterval => "silence_interval",
    }
  }
}

impl FromStr for FindingKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Self::ALL
      .into_iter()
      .find(|k| k.as_str() == s)
      .ok_or_else(|| Error::UnknownFindingKind(s.to_owned()))
  }
}

impl fmt::Display for FindingKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Low,
  Medium,
  High,
}

impl Severity {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Low => "low",
      Self::Medium => "medium",
      Self::High => "high",
    }
  }
}

impl FromStr for Severity {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "low" => Ok(Self::Low),
      "medium" => Ok(Self::Medium),
      "high" => Ok(Self::High),
      other => Err(Error::UnknownSeverity(other.to_owned())),
    }
  }
}

/// A persisted finding. Never mutated once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
  pub finding_id:  Uuid,
  pub kind:        FindingKind,
  pub severity:    Severity,
  pub entity_id:   Option<Uuid>,
  pub fingerprint: Option<Fingerprint>,
  pub description: String,
  /// The detector's numeric evidence.
  pub metadata:    serde_json::Value,
  pub detected_at: DateTime<Utc>,
}

/// Input to [`crate::store::CorpusStore::add_finding`]. The id and
/// `detected_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewFinding {
  pub kind:        FindingKind,
  pub severity:    Severity,
  pub entity_id:   Option<Uuid>,
  pub fingerprint: Option<Fingerprint>,
  pub description: String,
  pub metadata:    serde_json::Value,
}

impl NewFinding {
  pub fn new(
    kind: FindingKind,
    severity: Severity,
    description: impl Into<String>,
  ) -> Self {
    Self {
      kind,
      severity,
      entity_id: None,
      fingerprint: None,
      description: description.into(),
      metadata: serde_json::Value::Null,
    }
  }

  pub fn with_entity(mut self, entity_id: Uuid) -> Self {
    self.entity_id = Some(entity_id);
    self
  }

  pub fn with_document(mut self, fingerprint: Fingerprint) -> Self {
    self.fingerprint = Some(fingerprint);
    self
  }

  pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
    self.metadata = metadata;
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kind_discriminant_matches_serde_tag() {
    for kind in FindingKind::ALL {
      let json = serde_json::to_value(kind).unwrap();
      assert_eq!(json, serde_json::Value::String(kind.as_str().into()));
      assert_eq!(kind.as_str().parse::<FindingKind>().unwrap(), kind);
    }
  }

  #[test]
  fn unknown_kind_is_an_error() {
    assert!(matches!(
      "gap".parse::<FindingKind>(),
      Err(Error::UnknownFindingKind(_))
    ));
  }

  #[test]
  fn severity_orders_low_to_high() {
    assert!(Severity::High > Severity::Medium);
    assert!(Severity::Medium > Severity::Low);
  }
}
