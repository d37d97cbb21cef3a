//! Documents: the content-addressed unit of the corpus.
//!
//! A document is identified by the SHA-256 digest of its raw bytes. Text is
//! normalised once at ingestion; afterwards the only mutation a document ever
//! sees is the transition from `unanalyzed` to `analyzed`.

use std::{fmt, path::Path, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Fingerprint ─────────────────────────────────────────────────────────────

/// Lowercase hex SHA-256 digest of a document's byte content.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
  /// Length of the hex encoding of a 256-bit digest.
  pub const HEX_LEN: usize = 64;

  /// Wrap a raw 32-byte digest.
  pub fn from_digest(digest: [u8; 32]) -> Self { Self(hex::encode(digest)) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl FromStr for Fingerprint {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let valid = s.len() == Self::HEX_LEN
      && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if valid {
      Ok(Self(s.to_owned()))
    } else {
      Err(Error::InvalidFingerprint(s.to_owned()))
    }
  }
}

impl TryFrom<String> for Fingerprint {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<Fingerprint> for String {
  fn from(fp: Fingerprint) -> Self { fp.0 }
}

impl fmt::Display for Fingerprint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Analysis status ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
  #[default]
  Unanalyzed,
  Analyzed,
}

impl AnalysisStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Unanalyzed => "unanalyzed",
      Self::Analyzed => "analyzed",
    }
  }
}

impl FromStr for AnalysisStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "unanalyzed" => Ok(Self::Unanalyzed),
      "analyzed" => Ok(Self::Analyzed),
      other => Err(Error::UnknownAnalysisStatus(other.to_owned())),
    }
  }
}

// ─── Document ────────────────────────────────────────────────────────────────

/// A stored document. At most one exists per [`Fingerprint`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
  pub fingerprint: Fingerprint,
  /// Logical path the bytes were first ingested from.
  pub path:        String,
  /// Normalised extracted text.
  pub text:        String,
  pub category:    Option<String>,
  pub source:      Option<String>,
  /// Server-assigned; never changes after creation.
  pub ingested_at: DateTime<Utc>,
  pub status:      AnalysisStatus,
  pub analyzed_at: Option<DateTime<Utc>>,
}

impl Document {
  /// The final path component, falling back to the full logical path.
  pub fn file_name(&self) -> &str {
    Path::new(&self.path)
      .file_name()
      .and_then(|n| n.to_str())
      .unwrap_or(&self.path)
  }
}

/// Input to [`crate::store::CorpusStore::add_document`]. Timestamps and
/// status are always set by the store.
#[derive(Debug, Clone)]
pub struct NewDocument {
  pub fingerprint: Fingerprint,
  pub path:        String,
  pub text:        String,
  pub category:    Option<String>,
  pub source:      Option<String>,
}

impl NewDocument {
  /// Build a document, deriving category and source tags from the file name.
  pub fn new(
    fingerprint: Fingerprint,
    path: impl Into<String>,
    text: impl Into<String>,
  ) -> Self {
    let path = path.into();
    let (category, source) = classify(&path);
    Self { fingerprint, path, text: text.into(), category, source }
  }
}

/// Derive `(category, source)` from a `CATEGORY-SOURCE-IDENTIFIER.ext` name.
pub fn classify(path: &str) -> (Option<String>, Option<String>) {
  let stem = Path::new(path)
    .file_stem()
    .and_then(|s| s.to_str())
    .unwrap_or_default();
  let mut parts = stem.split('-').map(str::trim);

  let category = parts.next().filter(|p| !p.is_empty()).map(str::to_owned);
  let source = category
    .as_ref()
    .and_then(|_| parts.next())
    .filter(|p| !p.is_empty())
    .map(str::to_owned);
  (category, source)
}

#[cfg(test)]
mod tests {
  use super::*;

  const HEX: &str =
    "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

  #[test]
  fn fingerprint_accepts_lowercase_hex() {
    let fp: Fingerprint = HEX.parse().unwrap();
    assert_eq!(fp.as_str(), HEX);
    assert_eq!(fp.to_string(), HEX);
  }

  #[test]
  fn fingerprint_rejects_wrong_length_and_case() {
    assert!("abc".parse::<Fingerprint>().is_err());
    assert!(HEX.to_uppercase().parse::<Fingerprint>().is_err());
  }

  #[test]
  fn fingerprint_from_digest_is_hex() {
    let fp = Fingerprint::from_digest([0xab; 32]);
    assert_eq!(fp.as_str().len(), Fingerprint::HEX_LEN);
    assert!(fp.as_str().starts_with("abab"));
  }

  #[test]
  fn classify_reads_naming_convention() {
    assert_eq!(
      classify("scans/FLIGHT-LOG-000123.txt"),
      (Some("FLIGHT".into()), Some("LOG".into()))
    );
    assert_eq!(classify("memo.pdf"), (Some("memo".into()), None));
    assert_eq!(classify(""), (None, None));
  }

  #[test]
  fn new_document_classifies_nested_path() {
    let doc = NewDocument::new(
      Fingerprint::from_digest([0; 32]),
      "a/b/EMAIL-001-7.txt",
      "",
    );
    assert_eq!(doc.category.as_deref(), Some("EMAIL"));
    assert_eq!(doc.source.as_deref(), Some("001"));
  }
}
