//! [`SqliteStore`] is the SQLite implementation of [`CorpusStore`].

use std::{collections::HashMap, path::Path};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use dossier_core::{
  cooccurrence::{CooccurrenceEdge, canonical_pair},
  document::{AnalysisStatus, Document, Fingerprint, NewDocument},
  entity::{Entity, NewEntity},
  finding::{Finding, FindingKind, NewFinding},
  store::{
    AnalysisCommit, CooccurrenceOutcome, CorpusStats, CorpusStore,
    DocumentAnalysis, DocumentInsert, EntityObservation,
  },
};

use crate::{
  Error, Result,
  encode::{
    DOCUMENT_COLUMNS, ENTITY_COLUMNS, EntityRow, FINDING_COLUMNS, FindingRow,
    RawCooccurrence, RawDocument, RawEntity, RawFinding, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Dossier corpus store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run raw SQL against the connection.
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a `documents` query with an optional `WHERE` clause, in insertion
  /// order.
  async fn query_documents(&self, filter: Option<&'static str>) -> Result<Vec<Document>> {
    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let where_clause = filter.map(|f| format!("WHERE {f}")).unwrap_or_default();
        let sql = format!(
          "SELECT {DOCUMENT_COLUMNS} FROM documents {where_clause} ORDER BY rowid"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawDocument::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_document).collect()
  }
}

/// Assign an id and detection time to a finding about to be written.
fn new_finding(input: NewFinding) -> Finding {
  Finding {
    finding_id:  Uuid::new_v4(),
    kind:        input.kind,
    severity:    input.severity,
    entity_id:   input.entity_id,
    fingerprint: input.fingerprint,
    description: input.description,
    metadata:    input.metadata,
    detected_at: Utc::now(),
  }
}

// ─── CorpusStore impl ────────────────────────────────────────────────────────

impl CorpusStore for SqliteStore {
  type Error = Error;

  // ── Documents ─────────────────────────────────────────────────────────────

  async fn add_document(&self, input: NewDocument) -> Result<DocumentInsert> {
    let document = Document {
      fingerprint: input.fingerprint,
      path:        input.path,
      text:        input.text,
      category:    input.category,
      source:      input.source,
      ingested_at: Utc::now(),
      status:      AnalysisStatus::Unanalyzed,
      analyzed_at: None,
    };

    let fp_str     = document.fingerprint.to_string();
    let path       = document.path.clone();
    let text       = document.text.clone();
    let category   = document.category.clone();
    let source     = document.source.clone();
    let at_str     = encode_dt(document.ingested_at);
    let status_str = document.status.as_str();

    // The primary key turns a lost race into a zero-row insert.
    let inserted = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "INSERT OR IGNORE INTO documents (
             fingerprint, path, text, category, source, ingested_at, status
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![fp_str, path, text, category, source, at_str, status_str],
        )?;
        Ok(changed == 1)
      })
      .await?;

    if inserted {
      Ok(DocumentInsert::Inserted(document))
    } else {
      tracing::debug!(fingerprint = %document.fingerprint, "document already stored");
      Ok(DocumentInsert::Duplicate(document.fingerprint))
    }
  }

  async fn get_document(&self, fingerprint: &Fingerprint) -> Result<Option<Document>> {
    let fp_str = fingerprint.to_string();

    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE fingerprint = ?1"),
            rusqlite::params![fp_str],
            RawDocument::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  async fn list_documents(&self) -> Result<Vec<Document>> {
    self.query_documents(None).await
  }

  async fn documents_needing_analysis(&self) -> Result<Vec<Document>> {
    self.query_documents(Some("status = 'unanalyzed'")).await
  }

  async fn mark_analyzed(&self, fingerprint: &Fingerprint) -> Result<bool> {
    let fp_str     = fingerprint.to_string();
    let at_str     = encode_dt(Utc::now());
    let status_str = AnalysisStatus::Analyzed.as_str();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE documents SET status = ?2, analyzed_at = ?3 WHERE fingerprint = ?1",
          rusqlite::params![fp_str, status_str, at_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn commit_analysis(&self, analysis: DocumentAnalysis) -> Result<Option<AnalysisCommit>> {
    let DocumentAnalysis { fingerprint, entities, findings } = analysis;
    let now = Utc::now();

    let fp_str       = fingerprint.to_string();
    let at_str       = encode_dt(now);
    let status_str   = AnalysisStatus::Analyzed.as_str();
    let entity_rows  = entities
      .into_iter()
      .map(|e| EntityRow::new(e, now))
      .collect::<Vec<_>>();
    let findings     = findings.into_iter().map(new_finding).collect::<Vec<_>>();
    let finding_rows = findings.iter().map(FindingRow::encode).collect::<Vec<_>>();

    let committed: Option<(Vec<RawEntity>, u64)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // Claim the document first; an analysed or unknown document makes
        // the whole commit a no-op.
        let claimed = tx.execute(
          "UPDATE documents SET status = ?2, analyzed_at = ?3
           WHERE fingerprint = ?1 AND status = 'unanalyzed'",
          rusqlite::params![fp_str, status_str, at_str],
        )? == 1;
        if !claimed {
          return Ok(None);
        }

        let mut raws = Vec::with_capacity(entity_rows.len());
        for row in &entity_rows {
          raws.push(row.upsert(&tx)?.1);
        }

        // Hyphenated lowercase ids sort the same way as the uuids.
        let mut ids = raws.iter().map(|r| r.entity_id.clone()).collect::<Vec<_>>();
        ids.sort();
        ids.dedup();

        let mut pairs = 0;
        for (i, a) in ids.iter().enumerate() {
          for b in &ids[i + 1..] {
            pairs += tx.execute(
              "INSERT OR IGNORE INTO cooccurrences (entity_a, entity_b, fingerprint)
               VALUES (?1, ?2, ?3)",
              rusqlite::params![a, b, fp_str],
            )? as u64;
          }
        }

        for row in &finding_rows {
          row.insert(&tx)?;
        }

        tx.commit()?;
        Ok(Some((raws, pairs)))
      })
      .await?;

    let Some((raws, cooccurrences)) = committed else {
      tracing::debug!(%fingerprint, "document already analysed or unknown, nothing committed");
      return Ok(None);
    };

    let entities = raws
      .into_iter()
      .map(RawEntity::into_entity)
      .collect::<Result<Vec<_>>>()?;
    Ok(Some(AnalysisCommit { entities, cooccurrences, findings }))
  }

  // ── Entities ──────────────────────────────────────────────────────────────

  async fn add_entity(&self, input: NewEntity) -> Result<EntityObservation> {
    let row = EntityRow::new(input, Utc::now());

    let (created, raw): (bool, RawEntity) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let observed = row.upsert(&tx)?;
        tx.commit()?;
        Ok(observed)
      })
      .await?;

    let entity = raw.into_entity()?;
    Ok(if created {
      EntityObservation::Created(entity)
    } else {
      EntityObservation::Observed(entity)
    })
  }

  async fn get_entity(&self, id: Uuid) -> Result<Option<Entity>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawEntity> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {ENTITY_COLUMNS} FROM entities WHERE entity_id = ?1"),
            rusqlite::params![id_str],
            RawEntity::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawEntity::into_entity).transpose()
  }

  async fn list_entities(&self) -> Result<Vec<Entity>> {
    let raws: Vec<RawEntity> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ENTITY_COLUMNS} FROM entities ORDER BY rowid"
        ))?;
        let rows = stmt
          .query_map([], RawEntity::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEntity::into_entity).collect()
  }

  // ── Co-occurrence ─────────────────────────────────────────────────────────

  async fn record_cooccurrence(
    &self,
    a: Uuid,
    b: Uuid,
    fingerprint: &Fingerprint,
  ) -> Result<CooccurrenceOutcome> {
    let (first, second) = canonical_pair(a, b).ok_or(Error::SelfCooccurrence(a))?;

    let a_str  = encode_uuid(first);
    let b_str  = encode_uuid(second);
    let fp_str = fingerprint.to_string();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO cooccurrences (entity_a, entity_b, fingerprint)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![a_str, b_str, fp_str],
        )?)
      })
      .await?;

    Ok(if changed == 1 {
      CooccurrenceOutcome::Recorded
    } else {
      CooccurrenceOutcome::AlreadyRecorded
    })
  }

  async fn list_cooccurrences(&self) -> Result<Vec<CooccurrenceEdge>> {
    let raws: Vec<RawCooccurrence> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT entity_a, entity_b, fingerprint FROM cooccurrences ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawCooccurrence {
              entity_a:    row.get(0)?,
              entity_b:    row.get(1)?,
              fingerprint: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCooccurrence::into_edge).collect()
  }

  // ── Findings ──────────────────────────────────────────────────────────────

  async fn add_finding(&self, input: NewFinding) -> Result<Finding> {
    let finding = new_finding(input);
    let row = FindingRow::encode(&finding);

    self
      .conn
      .call(move |conn| {
        row.insert(conn)?;
        Ok(())
      })
      .await?;

    Ok(finding)
  }

  async fn list_findings(&self, kind: Option<FindingKind>) -> Result<Vec<Finding>> {
    let kind_str = kind.map(FindingKind::as_str);

    let raws: Vec<RawFinding> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {FINDING_COLUMNS} FROM findings
           WHERE ?1 IS NULL OR kind = ?1
           ORDER BY rowid"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![kind_str], RawFinding::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFinding::into_finding).collect()
  }

  // ── Statistics ────────────────────────────────────────────────────────────

  async fn stats(&self) -> Result<CorpusStats> {
    let (counts, by_kind): ([i64; 5], Vec<(String, i64)>) = self
      .conn
      .call(|conn| {
        let count = |sql: &str| conn.query_row(sql, [], |r| r.get::<_, i64>(0));
        let counts = [
          count("SELECT COUNT(*) FROM documents")?,
          count("SELECT COUNT(*) FROM documents WHERE status = 'unanalyzed'")?,
          count("SELECT COUNT(*) FROM entities")?,
          count("SELECT COUNT(*) FROM cooccurrences")?,
          count("SELECT COUNT(*) FROM findings")?,
        ];

        let mut stmt =
          conn.prepare("SELECT kind, COUNT(*) FROM findings GROUP BY kind")?;
        let by_kind = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((counts, by_kind))
      })
      .await?;

    let findings_by_kind = by_kind
      .into_iter()
      .map(|(kind, n)| -> Result<(FindingKind, u64)> {
        Ok((kind.parse()?, n.max(0) as u64))
      })
      .collect::<Result<HashMap<_, _>>>()?;

    let [documents, unanalyzed, entities, cooccurrences, findings] =
      counts.map(|n| n.max(0) as u64);

    Ok(CorpusStats {
      documents,
      unanalyzed,
      entities,
      cooccurrences,
      findings,
      findings_by_kind,
    })
  }
}
