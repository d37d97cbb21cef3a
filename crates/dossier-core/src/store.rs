//! The `CorpusStore` trait and its outcome types.
//!
//! The trait is implemented by storage backends (e.g. `dossier-store-sqlite`).
//! The ingestion pipeline and the detectors depend on this abstraction, not on
//! any concrete backend.

use std::{collections::HashMap, future::Future};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  cooccurrence::CooccurrenceEdge,
  document::{Document, Fingerprint, NewDocument},
  entity::{Entity, NewEntity},
  finding::{Finding, FindingKind, NewFinding},
};

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// Result of [`CorpusStore::add_document`]. A duplicate is an expected
/// outcome, not an error.
#[derive(Debug, Clone)]
pub enum DocumentInsert {
  Inserted(Document),
  /// A document with this fingerprint already exists; nothing was written.
  Duplicate(Fingerprint),
}

impl DocumentInsert {
  pub fn fingerprint(&self) -> &Fingerprint {
    match self {
      Self::Inserted(doc) => &doc.fingerprint,
      Self::Duplicate(fp) => fp,
    }
  }

  pub fn is_duplicate(&self) -> bool { matches!(self, Self::Duplicate(_)) }
}

/// Result of [`CorpusStore::add_entity`].
#[derive(Debug, Clone)]
pub enum EntityObservation {
  /// First sighting; a new row was created with `occurrences == 1`.
  Created(Entity),
  /// The identity already existed; its count was incremented.
  Observed(Entity),
}

impl EntityObservation {
  pub fn entity(&self) -> &Entity {
    match self {
      Self::Created(e) | Self::Observed(e) => e,
    }
  }

  pub fn into_entity(self) -> Entity {
    match self {
      Self::Created(e) | Self::Observed(e) => e,
    }
  }
}

/// Result of [`CorpusStore::record_cooccurrence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooccurrenceOutcome {
  Recorded,
  AlreadyRecorded,
}

/// Everything one analysed document contributes to the corpus.
#[derive(Debug, Clone)]
pub struct DocumentAnalysis {
  pub fingerprint: Fingerprint,
  /// One entry per recognised mention; pairs are derived by the store.
  pub entities:    Vec<NewEntity>,
  pub findings:    Vec<NewFinding>,
}

/// What [`CorpusStore::commit_analysis`] wrote.
#[derive(Debug, Clone)]
pub struct AnalysisCommit {
  /// Entity rows after this document's observations, in input order.
  pub entities:      Vec<Entity>,
  /// Pair rows newly inserted for this document.
  pub cooccurrences: u64,
  pub findings:      Vec<Finding>,
}

/// Row counts across the corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStats {
  pub documents:        u64,
  pub unanalyzed:       u64,
  pub entities:         u64,
  pub cooccurrences:    u64,
  pub findings:         u64,
  pub findings_by_kind: HashMap<FindingKind, u64>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a corpus store backend.
///
/// Every mutating operation is atomic with respect to its own uniqueness
/// invariant, so repeating a call with the same arguments is safe. Findings
/// are append-only.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait CorpusStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Documents ─────────────────────────────────────────────────────────

  /// Insert a document keyed by its fingerprint. If the fingerprint is
  /// already present (including a concurrent insert winning the race), the
  /// call reports [`DocumentInsert::Duplicate`].
  fn add_document(
    &self,
    input: NewDocument,
  ) -> impl Future<Output = Result<DocumentInsert, Self::Error>> + Send + '_;

  /// Retrieve a document by fingerprint. Returns `None` if not found.
  fn get_document<'a>(
    &'a self,
    fingerprint: &'a Fingerprint,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + 'a;

  /// List every document, oldest ingestion first.
  fn list_documents(
    &self,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + '_;

  /// Documents whose status is still `unanalyzed`, oldest ingestion first.
  fn documents_needing_analysis(
    &self,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + '_;

  /// Set a document's status to `analyzed` and stamp the time. Returns
  /// `false` if no such document exists.
  fn mark_analyzed<'a>(
    &'a self,
    fingerprint: &'a Fingerprint,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Record a document's entity observations, every pair among the
  /// distinct entities, and its findings, and mark it analysed, all in one
  /// atomic step. If any write fails nothing is kept and the document stays
  /// queued. Returns `None` without writing when the document is unknown or
  /// already analysed, so a retry never counts an observation twice.
  fn commit_analysis(
    &self,
    analysis: DocumentAnalysis,
  ) -> impl Future<Output = Result<Option<AnalysisCommit>, Self::Error>> + Send + '_;

  // ── Entities ──────────────────────────────────────────────────────────

  /// Create the entity on first observation, otherwise increment its count.
  fn add_entity(
    &self,
    input: NewEntity,
  ) -> impl Future<Output = Result<EntityObservation, Self::Error>> + Send + '_;

  /// Retrieve an entity by id. Returns `None` if not found.
  fn get_entity(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Entity>, Self::Error>> + Send + '_;

  /// List every entity.
  fn list_entities(
    &self,
  ) -> impl Future<Output = Result<Vec<Entity>, Self::Error>> + Send + '_;

  // ── Co-occurrence ─────────────────────────────────────────────────────

  /// Record that two distinct entities co-occur in a document. The pair is
  /// stored in canonical order; recording it again is a no-op. Returns an
  /// error for a self-pair.
  fn record_cooccurrence<'a>(
    &'a self,
    a: Uuid,
    b: Uuid,
    fingerprint: &'a Fingerprint,
  ) -> impl Future<Output = Result<CooccurrenceOutcome, Self::Error>> + Send + 'a;

  /// List every `(pair, document)` row.
  fn list_cooccurrences(
    &self,
  ) -> impl Future<Output = Result<Vec<CooccurrenceEdge>, Self::Error>> + Send + '_;

  // ── Findings ──────────────────────────────────────────────────────────

  /// Append a finding and return the persisted record.
  fn add_finding(
    &self,
    input: NewFinding,
  ) -> impl Future<Output = Result<Finding, Self::Error>> + Send + '_;

  /// List findings in detection order, optionally restricted to one kind.
  fn list_findings(
    &self,
    kind: Option<FindingKind>,
  ) -> impl Future<Output = Result<Vec<Finding>, Self::Error>> + Send + '_;

  // ── Statistics ────────────────────────────────────────────────────────

  fn stats(
    &self,
  ) -> impl Future<Output = Result<CorpusStats, Self::Error>> + Send + '_;
}
