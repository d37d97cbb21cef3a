//! One incremental analysis pass over a corpus store.
//!
//! New documents get entity extraction, co-occurrence recording and the
//! Benford test, then are marked analysed. The bridge and timeline detectors
//! then run over the whole corpus.

use dossier_core::{
  config::AnalysisConfig,
  document::Document,
  entity::NewEntity,
  store::{CorpusStore, DocumentAnalysis},
};
use serde::Serialize;

use crate::{
  Error, Result,
  benford::{BenfordEngine, BenfordOutcome},
  bridge::BridgeDetector,
  graph::CooccurrenceGraph,
  recognize::EntityRecognizer,
  sink::{FindingsSink, benford_finding, bridge_finding, log_recorded, silence_finding},
  timeline::{TimelineAuditor, TimelineSummary},
};

/// Counts from one pass. Always returned, even when documents failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisReport {
  pub documents_analyzed:   u64,
  pub documents_failed:     u64,
  pub entities_observed:    u64,
  pub benford_tested:       u64,
  pub benford_inconclusive: u64,
  pub benford_violations:   u64,
  pub bridges:              u64,
  pub silence_intervals:    u64,
  pub timeline:             TimelineSummary,
}

pub struct Analyzer<R> {
  recognizer: R,
  benford:    BenfordEngine,
  bridge:     BridgeDetector,
  timeline:   TimelineAuditor,
}

impl<R: EntityRecognizer> Analyzer<R> {
  pub fn new(recognizer: R, config: AnalysisConfig) -> Self {
    Self {
      recognizer,
      benford: BenfordEngine::new(config.benford),
      bridge: BridgeDetector::new(config.bridge),
      timeline: TimelineAuditor::new(config.timeline),
    }
  }

  /// Run one pass. Per-document failures are logged and counted; only a
  /// failure in the corpus-wide stages aborts the pass.
  pub async fn run<S: CorpusStore>(&self, store: &S) -> Result<AnalysisReport> {
    let sink = FindingsSink::new(store);
    let mut report = AnalysisReport::default();

    let mut pending = store
      .documents_needing_analysis()
      .await
      .map_err(Error::store)?;
    pending.sort_by(|a, b| {
      a.ingested_at
        .cmp(&b.ingested_at)
        .then_with(|| a.fingerprint.cmp(&b.fingerprint))
    });
    tracing::info!(documents = pending.len(), "analysing new documents");

    for doc in &pending {
      match self.analyze_document(store, doc, &mut report).await {
        Ok(true) => report.documents_analyzed += 1,
        Ok(false) => {
          tracing::debug!(path = %doc.path, "document was analysed elsewhere, skipping");
        }
        Err(e) => {
          tracing::error!(
            path = %doc.path,
            fingerprint = %doc.fingerprint,
            error = %e,
            "document analysis failed"
          );
          report.documents_failed += 1;
        }
      }
    }

    // Network analysis over the full store.
    let entities = store.list_entities().await.map_err(Error::store)?;
    let edges = store.list_cooccurrences().await.map_err(Error::store)?;
    let graph = CooccurrenceGraph::from_store_rows(&entities, &edges);
    let bridges = self.bridge.detect(&graph);
    report.bridges = sink.record_all(bridges.iter().map(bridge_finding)).await? as u64;

    // Timeline over every document, old and new.
    let documents = store.list_documents().await.map_err(Error::store)?;
    let audit = self.timeline.audit(&documents);
    report.silence_intervals =
      sink.record_all(audit.intervals.iter().map(silence_finding)).await? as u64;
    report.timeline = audit.summary;

    tracing::info!(
      analysed = report.documents_analyzed,
      failed = report.documents_failed,
      benford_violations = report.benford_violations,
      bridges = report.bridges,
      silence_intervals = report.silence_intervals,
      "analysis pass finished"
    );
    Ok(report)
  }

  /// Recognise, test and commit one document. Every write for the document
  /// lands in a single store commit, so a failure leaves it queued with no
  /// partial counts. Returns `false` if the store had nothing to commit.
  async fn analyze_document<S: CorpusStore>(
    &self,
    store: &S,
    doc: &Document,
    report: &mut AnalysisReport,
  ) -> Result<bool> {
    let entities = self
      .recognizer
      .recognize(&doc.text)
      .into_iter()
      .map(|m| NewEntity::new(m.name, m.kind).seen_in(doc.fingerprint.clone()))
      .collect();

    let outcome = self.benford.test_text(&doc.text);
    let findings = match &outcome {
      BenfordOutcome::Tested(test) if test.is_violation => vec![benford_finding(doc, test)],
      _ => Vec::new(),
    };

    let analysis = DocumentAnalysis {
      fingerprint: doc.fingerprint.clone(),
      entities,
      findings,
    };
    let Some(commit) = store
      .commit_analysis(analysis)
      .await
      .map_err(Error::store)?
    else {
      return Ok(false);
    };

    report.entities_observed += commit.entities.len() as u64;
    match outcome {
      BenfordOutcome::Inconclusive { sample_size } => {
        tracing::debug!(path = %doc.path, sample_size, "too few numbers for a Benford test");
        report.benford_inconclusive += 1;
      }
      BenfordOutcome::Tested(test) => {
        report.benford_tested += 1;
        if test.is_violation {
          report.benford_violations += 1;
        }
      }
    }
    commit.findings.iter().for_each(log_recorded);
    Ok(true)
  }
}

#[cfg(test)]
mod tests {
  use dossier_core::{
    document::{Fingerprint, NewDocument},
    entity::EntityKind,
    finding::FindingKind,
  };
  use dossier_store_sqlite::SqliteStore;

  use super::*;
  use crate::recognize::{CapitalizedNameRecognizer, StaticRecognizer};

  fn fp(byte: u8) -> Fingerprint { Fingerprint::from_digest([byte; 32]) }

  async fn seed(store: &SqliteStore, byte: u8, path: &str, text: &str) {
    store
      .add_document(NewDocument::new(fp(byte), path, text))
      .await
      .unwrap();
  }

  fn star_recognizer() -> StaticRecognizer {
    ["Center", "Aaron", "Bella", "Cyrus", "Delia"]
      .into_iter()
      .fold(StaticRecognizer::default(), |r, n| r.with(n, EntityKind::Person))
  }

  async fn star_corpus() -> SqliteStore {
    let store = SqliteStore::open_in_memory().await.unwrap();
    seed(&store, 1, "LOG-A-1.txt", "Center met Aaron on 2005-03-10.").await;
    seed(&store, 2, "LOG-B-2.txt", "Center met Bella on 2005-04-25.").await;
    seed(&store, 3, "LOG-C-3.txt", "Center met Cyrus on 2005-07-15.").await;
    seed(&store, 4, "LOG-D-4.txt", "Center met Delia on 2005-07-20.").await;
    store
  }

  #[tokio::test]
  async fn star_corpus_end_to_end() {
    let store = star_corpus().await;
    let analyzer = Analyzer::new(star_recognizer(), AnalysisConfig::default());

    let report = analyzer.run(&store).await.unwrap();
    assert_eq!(report.documents_analyzed, 4);
    assert_eq!(report.documents_failed, 0);
    assert_eq!(report.bridges, 1);
    assert_eq!(report.silence_intervals, 2);
    assert_eq!(report.benford_inconclusive, 4);
    assert_eq!(report.timeline.distinct_dates, 4);

    let bridges = store.list_findings(Some(FindingKind::BridgeEntity)).await.unwrap();
    assert_eq!(bridges[0].metadata["name"], "Center");
    assert_eq!(bridges[0].metadata["degree"], 4);

    let gaps = store.list_findings(Some(FindingKind::SilenceInterval)).await.unwrap();
    assert_eq!(gaps[0].metadata["gap_days"], 81);
    assert_eq!(gaps[1].metadata["gap_days"], 46);

    let entities = store.list_entities().await.unwrap();
    let center = entities.iter().find(|e| e.name == "Center").unwrap();
    assert_eq!(center.occurrences, 4);
    assert_eq!(center.first_seen, Some(fp(1)));
    assert_eq!(store.list_cooccurrences().await.unwrap().len(), 4);
  }

  #[tokio::test]
  async fn second_pass_adds_no_documents_or_entities() {
    let store = star_corpus().await;
    let analyzer = Analyzer::new(star_recognizer(), AnalysisConfig::default());

    analyzer.run(&store).await.unwrap();
    let before = store.stats().await.unwrap();

    let again = analyzer.run(&store).await.unwrap();
    assert_eq!(again.documents_analyzed, 0);
    assert_eq!(again.entities_observed, 0);

    let after = store.stats().await.unwrap();
    assert_eq!(after.documents, before.documents);
    assert_eq!(after.entities, before.entities);
    assert_eq!(after.cooccurrences, before.cooccurrences);
    assert_eq!(after.unanalyzed, 0);
    // Corpus-wide detectors re-append.
    assert!(after.findings > before.findings);
  }

  #[tokio::test]
  async fn fabricated_ledger_is_flagged() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let ledger = (100..160).map(|n| n.to_string()).collect::<Vec<_>>().join(" ");
    seed(&store, 1, "LEDGER-BANK-1.txt", &ledger).await;
    seed(&store, 2, "NOTE-X-2.txt", "12 34 56").await;

    let report = Analyzer::new(CapitalizedNameRecognizer, AnalysisConfig::default())
      .run(&store)
      .await
      .unwrap();
    assert_eq!(report.benford_tested, 1);
    assert_eq!(report.benford_inconclusive, 1);
    assert_eq!(report.benford_violations, 1);

    let findings = store
      .list_findings(Some(FindingKind::BenfordsViolation))
      .await
      .unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].fingerprint, Some(fp(1)));
    assert_eq!(findings[0].metadata["sample_size"], 60);
  }

  #[tokio::test]
  async fn empty_corpus_is_quiet() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let report = Analyzer::new(CapitalizedNameRecognizer, AnalysisConfig::default())
      .run(&store)
      .await
      .unwrap();
    assert_eq!(report, AnalysisReport::default());
  }
}
