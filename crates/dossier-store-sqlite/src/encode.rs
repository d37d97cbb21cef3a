//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Finding metadata is stored
//! as compact JSON. UUIDs are stored as hyphenated lowercase strings and
//! fingerprints as lowercase hex.

use chrono::{DateTime, Utc};
use dossier_core::{
  cooccurrence::CooccurrenceEdge,
  document::{AnalysisStatus, Document, Fingerprint},
  entity::{Entity, EntityKind, NewEntity},
  finding::{Finding, FindingKind, Severity},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Fingerprint ─────────────────────────────────────────────────────────────

pub fn decode_fingerprint(s: &str) -> Result<Fingerprint> { Ok(s.parse()?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list shared by every `documents` query; order matches
/// [`RawDocument::from_row`].
pub const DOCUMENT_COLUMNS: &str = "fingerprint, path, text, category, \
                                    source, ingested_at, status, analyzed_at";

/// Raw strings read directly from a `documents` row.
pub struct RawDocument {
  pub fingerprint: String,
  pub path:        String,
  pub text:        String,
  pub category:    Option<String>,
  pub source:      Option<String>,
  pub ingested_at: String,
  pub status:      String,
  pub analyzed_at: Option<String>,
}

impl RawDocument {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      fingerprint: row.get(0)?,
      path:        row.get(1)?,
      text:        row.get(2)?,
      category:    row.get(3)?,
      source:      row.get(4)?,
      ingested_at: row.get(5)?,
      status:      row.get(6)?,
      analyzed_at: row.get(7)?,
    })
  }

  pub fn into_document(self) -> Result<Document> {
    Ok(Document {
      fingerprint: decode_fingerprint(&self.fingerprint)?,
      path:        self.path,
      text:        self.text,
      category:    self.category,
      source:      self.source,
      ingested_at: decode_dt(&self.ingested_at)?,
      status:      self.status.parse::<AnalysisStatus>()?,
      analyzed_at: self.analyzed_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

pub const ENTITY_COLUMNS: &str = "entity_id, name, normalized_name, kind, \
                                  occurrences, first_seen, created_at";

/// Raw strings read directly from an `entities` row.
pub struct RawEntity {
  pub entity_id:       String,
  pub name:            String,
  pub normalized_name: String,
  pub kind:            String,
  pub occurrences:     i64,
  pub first_seen:      Option<String>,
  pub created_at:      String,
}

impl RawEntity {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      entity_id:       row.get(0)?,
      name:            row.get(1)?,
      normalized_name: row.get(2)?,
      kind:            row.get(3)?,
      occurrences:     row.get(4)?,
      first_seen:      row.get(5)?,
      created_at:      row.get(6)?,
    })
  }

  pub fn into_entity(self) -> Result<Entity> {
    Ok(Entity {
      entity_id:       decode_uuid(&self.entity_id)?,
      name:            self.name,
      normalized_name: self.normalized_name,
      kind:            EntityKind::from(self.kind),
      occurrences:     self.occurrences.max(0) as u64,
      first_seen:      self
        .first_seen
        .as_deref()
        .map(decode_fingerprint)
        .transpose()?,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Column values for an entity observation, ready to bind.
pub struct EntityRow {
  pub entity_id:       String,
  pub name:            String,
  pub normalized_name: String,
  pub kind:            String,
  pub first_seen:      Option<String>,
  pub created_at:      String,
}

impl EntityRow {
  pub fn new(input: NewEntity, now: DateTime<Utc>) -> Self {
    Self {
      entity_id:       encode_uuid(Uuid::new_v4()),
      normalized_name: input.normalized_name(),
      kind:            input.kind.as_str().to_owned(),
      first_seen:      input.first_seen.map(String::from),
      name:            input.name,
      created_at:      encode_dt(now),
    }
  }

  /// Insert on first observation, otherwise bump `occurrences`. Returns
  /// whether a row was created, and the row as it now stands. Callers run
  /// this inside a transaction.
  pub fn upsert(&self, conn: &rusqlite::Connection) -> rusqlite::Result<(bool, RawEntity)> {
    let inserted = conn.execute(
      "INSERT OR IGNORE INTO entities (
         entity_id, name, normalized_name, kind, occurrences, first_seen, created_at
       ) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6)",
      rusqlite::params![
        self.entity_id,
        self.name,
        self.normalized_name,
        self.kind,
        self.first_seen,
        self.created_at,
      ],
    )? == 1;

    if !inserted {
      conn.execute(
        "UPDATE entities SET occurrences = occurrences + 1
         WHERE normalized_name = ?1 AND kind = ?2",
        rusqlite::params![self.normalized_name, self.kind],
      )?;
    }

    let raw = conn.query_row(
      &format!(
        "SELECT {ENTITY_COLUMNS} FROM entities
         WHERE normalized_name = ?1 AND kind = ?2"
      ),
      rusqlite::params![self.normalized_name, self.kind],
      RawEntity::from_row,
    )?;
    Ok((inserted, raw))
  }
}

/// Raw strings read directly from a `cooccurrences` row.
pub struct RawCooccurrence {
  pub entity_a:    String,
  pub entity_b:    String,
  pub fingerprint: String,
}

impl RawCooccurrence {
  pub fn into_edge(self) -> Result<CooccurrenceEdge> {
    Ok(CooccurrenceEdge {
      entity_a:    decode_uuid(&self.entity_a)?,
      entity_b:    decode_uuid(&self.entity_b)?,
      fingerprint: decode_fingerprint(&self.fingerprint)?,
    })
  }
}

pub const FINDING_COLUMNS: &str = "finding_id, kind, severity, entity_id, \
                                   fingerprint, description, metadata_json, \
                                   detected_at";

/// Column values for one `findings` insert.
pub struct FindingRow {
  pub finding_id:    String,
  pub kind:          &'static str,
  pub severity:      &'static str,
  pub entity_id:     Option<String>,
  pub fingerprint:   Option<String>,
  pub description:   String,
  pub metadata_json: String,
  pub detected_at:   String,
}

impl FindingRow {
  pub fn encode(finding: &Finding) -> Self {
    Self {
      finding_id:    encode_uuid(finding.finding_id),
      kind:          finding.kind.as_str(),
      severity:      finding.severity.as_str(),
      entity_id:     finding.entity_id.map(encode_uuid),
      fingerprint:   finding.fingerprint.as_ref().map(ToString::to_string),
      description:   finding.description.clone(),
      metadata_json: finding.metadata.to_string(),
      detected_at:   encode_dt(finding.detected_at),
    }
  }

  pub fn insert(&self, conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute(
      "INSERT INTO findings (
         finding_id, kind, severity, entity_id, fingerprint,
         description, metadata_json, detected_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
      rusqlite::params![
        self.finding_id,
        self.kind,
        self.severity,
        self.entity_id,
        self.fingerprint,
        self.description,
        self.metadata_json,
        self.detected_at,
      ],
    )?;
    Ok(())
  }
}

/// Raw strings read directly from a `findings` row.
pub struct RawFinding {
  pub finding_id:    String,
  pub kind:          String,
  pub severity:      String,
  pub entity_id:     Option<String>,
  pub fingerprint:   Option<String>,
  pub description:   String,
  pub metadata_json: String,
  pub detected_at:   String,
}

impl RawFinding {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      finding_id:    row.get(0)?,
      kind:          row.get(1)?,
      severity:      row.get(2)?,
      entity_id:     row.get(3)?,
      fingerprint:   row.get(4)?,
      description:   row.get(5)?,
      metadata_json: row.get(6)?,
      detected_at:   row.get(7)?,
    })
  }

  pub fn into_finding(self) -> Result<Finding> {
    Ok(Finding {
      finding_id:  decode_uuid(&self.finding_id)?,
      kind:        self.kind.parse::<FindingKind>()?,
      severity:    self.severity.parse::<Severity>()?,
      entity_id:   self.entity_id.as_deref().map(decode_uuid).transpose()?,
      fingerprint: self
        .fingerprint
        .as_deref()
        .map(decode_fingerprint)
        .transpose()?,
      description: self.description,
      metadata:    serde_json::from_str(&self.metadata_json)?,
      detected_at: decode_dt(&self.detected_at)?,
    })
  }
}
