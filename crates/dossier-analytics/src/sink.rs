//! Findings Sink: detector output to typed, severity-tagged findings.

use dossier_core::{
  document::Document,
  finding::{Finding, FindingKind, NewFinding, Severity},
  store::CorpusStore,
};
use serde_json::json;

use crate::{
  Error, Result, benford::BenfordTest, bridge::Bridge, timeline::SilenceInterval,
};

pub fn bridge_finding(bridge: &Bridge) -> NewFinding {
  NewFinding::new(
    FindingKind::BridgeEntity,
    Severity::High,
    format!(
      "{} links otherwise separate groups (centrality {:.3}, degree {})",
      bridge.name, bridge.centrality, bridge.degree
    ),
  )
  .with_entity(bridge.entity_id)
  .with_metadata(json!({
    "name":       bridge.name,
    "centrality": bridge.centrality,
    "degree":     bridge.degree,
  }))
}

pub fn benford_finding(doc: &Document, test: &BenfordTest) -> NewFinding {
  NewFinding::new(
    FindingKind::BenfordsViolation,
    Severity::High,
    format!(
      "{}: leading digits deviate from Benford's law (chi-square {:.2} > {:.3}, n = {})",
      doc.file_name(),
      test.chi_square,
      test.threshold,
      test.sample_size
    ),
  )
  .with_document(doc.fingerprint.clone())
  .with_metadata(json!({
    "path":               doc.path,
    "chi_square":         test.chi_square,
    "threshold":          test.threshold,
    "degrees_of_freedom": test.degrees_of_freedom,
    "sample_size":        test.sample_size,
    "digits":             test.digits,
    "round_share":        test.round_share,
    "very_round_share":   test.very_round_share,
    "excessive_rounding": test.excessive_rounding,
  }))
}

pub fn silence_finding(interval: &SilenceInterval) -> NewFinding {
  NewFinding::new(
    FindingKind::SilenceInterval,
    Severity::Medium,
    format!(
      "No dated activity for {} days between {} and {}",
      interval.gap_days, interval.start, interval.end
    ),
  )
  .with_document(interval.before.fingerprint.clone())
  .with_metadata(json!({
    "start":    interval.start,
    "end":      interval.end,
    "gap_days": interval.gap_days,
    "before":   interval.before,
    "after":    interval.after,
  }))
}

pub(crate) fn log_recorded(finding: &Finding) {
  tracing::info!(
    kind = %finding.kind,
    severity = finding.severity.as_str(),
    description = %finding.description,
    "finding recorded"
  );
}

/// Appends findings to a store.
pub struct FindingsSink<'a, S> {
  store: &'a S,
}

impl<'a, S: CorpusStore> FindingsSink<'a, S> {
  pub fn new(store: &'a S) -> Self { Self { store } }

  pub async fn record(&self, finding: NewFinding) -> Result<Finding> {
    let finding = self.store.add_finding(finding).await.map_err(Error::store)?;
    log_recorded(&finding);
    Ok(finding)
  }

  /// Record each finding in order, returning how many were written.
  pub async fn record_all(
    &self,
    findings: impl IntoIterator<Item = NewFinding>,
  ) -> Result<usize> {
    let mut written = 0;
    for finding in findings {
      self.record(finding).await?;
      written += 1;
    }
    Ok(written)
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use dossier_core::document::Fingerprint;
  use uuid::Uuid;

  use super::*;
  use crate::timeline::DocumentRef;

  #[test]
  fn bridge_metadata_carries_evidence() {
    let id = Uuid::new_v4();
    let f = bridge_finding(&Bridge {
      entity_id:  id,
      name:       "Center".into(),
      centrality: 1.0,
      degree:     4,
    });
    assert_eq!(f.kind, FindingKind::BridgeEntity);
    assert_eq!(f.severity, Severity::High);
    assert_eq!(f.entity_id, Some(id));
    assert_eq!(f.metadata["degree"], 4);
    assert_eq!(f.metadata["centrality"], 1.0);
  }

  #[test]
  fn silence_cites_bounding_documents() {
    let before = DocumentRef {
      path:        "a.txt".into(),
      fingerprint: Fingerprint::from_digest([1; 32]),
    };
    let after = DocumentRef {
      path:        "b.txt".into(),
      fingerprint: Fingerprint::from_digest([2; 32]),
    };
    let f = silence_finding(&SilenceInterval {
      start: NaiveDate::from_ymd_opt(2005, 4, 25).unwrap(),
      end: NaiveDate::from_ymd_opt(2005, 7, 15).unwrap(),
      gap_days: 81,
      before: before.clone(),
      after,
    });
    assert_eq!(f.severity, Severity::Medium);
    assert_eq!(f.fingerprint, Some(before.fingerprint));
    assert_eq!(f.metadata["start"], "2005-04-25");
    assert_eq!(f.metadata["after"]["path"], "b.txt");
    assert!(f.description.contains("81 days"));
  }
}
