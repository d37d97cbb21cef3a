//! Ingestion Pipeline: hash, dedup check, extract, normalise, store.

use std::path::{Path, PathBuf};

use dossier_core::{
  config::IngestConfig,
  document::{Fingerprint, NewDocument},
  store::{CorpusStore, DocumentInsert},
};
use walkdir::WalkDir;

use crate::{
  Error, Result, extract::TextExtractor, hasher::fingerprint_file,
  normalize::normalize_text,
};

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
  /// New content was extracted and stored.
  Ingested(Fingerprint),
  /// These bytes are already in the store; nothing was extracted.
  Duplicate(Fingerprint),
}

impl IngestOutcome {
  pub fn fingerprint(&self) -> &Fingerprint {
    match self {
      Self::Ingested(fp) | Self::Duplicate(fp) => fp,
    }
  }
}

/// Counts from one directory scan; `ingested + duplicate + failed == scanned`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
  pub scanned:   u64,
  pub ingested:  u64,
  pub duplicate: u64,
  pub failed:    u64,
}

/// Owns the store handle, the extraction strategy, and ingestion settings.
pub struct IngestPipeline<S, E> {
  store:     S,
  extractor: E,
  config:    IngestConfig,
}

impl<S: CorpusStore, E: TextExtractor> IngestPipeline<S, E> {
  pub fn new(store: S, extractor: E, config: IngestConfig) -> Self {
    Self { store, extractor, config }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn config(&self) -> &IngestConfig { &self.config }

  /// Ingest one file.
  ///
  /// The fingerprint check runs before extraction, so already-stored content
  /// never reaches the extractor. Files with no extractable text are not
  /// stored and come back as [`Error::NoText`].
  pub async fn ingest(&self, path: &Path) -> Result<IngestOutcome> {
    let fingerprint = fingerprint_file(path).await?;

    if self
      .store
      .get_document(&fingerprint)
      .await
      .map_err(Error::store)?
      .is_some()
    {
      tracing::debug!(path = %path.display(), %fingerprint, "duplicate content, skipping");
      return Ok(IngestOutcome::Duplicate(fingerprint));
    }

    let raw = self
      .extractor
      .extract(path)
      .await?
      .ok_or_else(|| Error::NoText(path.to_owned()))?;
    let text = normalize_text(&raw);
    if text.is_empty() {
      return Err(Error::NoText(path.to_owned()));
    }

    let input = NewDocument::new(fingerprint, path.display().to_string(), text);
    match self.store.add_document(input).await.map_err(Error::store)? {
      DocumentInsert::Inserted(doc) => {
        tracing::info!(
          path = %path.display(),
          fingerprint = %doc.fingerprint,
          chars = doc.text.chars().count(),
          "ingested document"
        );
        Ok(IngestOutcome::Ingested(doc.fingerprint))
      }
      // Another writer stored the same bytes between our check and insert.
      DocumentInsert::Duplicate(fp) => {
        tracing::debug!(path = %path.display(), fingerprint = %fp, "lost insert race");
        Ok(IngestOutcome::Duplicate(fp))
      }
    }
  }

  /// Files under `dir` with a supported extension, sorted by path.
  pub fn scan(&self, dir: &Path, recursive: bool) -> Vec<PathBuf> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    WalkDir::new(dir)
      .max_depth(max_depth)
      .sort_by_file_name()
      .into_iter()
      .filter_map(|e| e.ok())
      .filter(|e| e.file_type().is_file())
      .filter(|e| {
        e.path()
          .extension()
          .and_then(|ext| ext.to_str())
          .is_some_and(|ext| self.config.supports_extension(ext))
      })
      .map(|e| e.into_path())
      .collect()
  }

  /// Ingest every supported file under `dir`, continuing past per-file
  /// failures.
  pub async fn ingest_directory(&self, dir: &Path, recursive: bool) -> Result<IngestReport> {
    if !dir.is_dir() {
      return Err(Error::NotADirectory(dir.to_owned()));
    }

    let files = self.scan(dir, recursive);
    tracing::info!(dir = %dir.display(), files = files.len(), recursive, "scanning directory");

    let mut report = IngestReport::default();
    for path in &files {
      report.scanned += 1;
      match self.ingest(path).await {
        Ok(IngestOutcome::Ingested(_)) => report.ingested += 1,
        Ok(IngestOutcome::Duplicate(_)) => report.duplicate += 1,
        Err(e) => {
          tracing::error!(path = %path.display(), error = %e, "failed to ingest file");
          report.failed += 1;
        }
      }
    }

    tracing::info!(
      scanned = report.scanned,
      ingested = report.ingested,
      duplicate = report.duplicate,
      failed = report.failed,
      "ingestion finished"
    );
    Ok(report)
  }
}
