//! Tunable thresholds for ingestion and the three detectors.
//!
//! Every field has a default, and every struct deserialises with
//! `#[serde(default)]`, so a configuration file only needs to name the values
//! it overrides.

use serde::{Deserialize, Serialize};

// ─── Ingestion ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
  /// Native extraction yielding fewer trimmed characters than this falls
  /// back to OCR.
  pub min_text_len: usize,
  /// Descend into subdirectories when scanning.
  pub recursive:    bool,
  /// Lower-case file extensions (without the dot) considered for ingestion.
  pub extensions:   Vec<String>,
}

impl Default for IngestConfig {
  fn default() -> Self {
    Self {
      min_text_len: 100,
      recursive:    true,
      extensions:   ["pdf", "jpg", "jpeg", "png", "txt"]
        .into_iter()
        .map(str::to_owned)
        .collect(),
    }
  }
}

impl IngestConfig {
  pub fn supports_extension(&self, ext: &str) -> bool {
    self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
  }
}

// ─── Detectors ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
  /// Normalised betweenness a node must exceed.
  pub min_centrality: f64,
  /// Degree a node must stay below.
  pub max_degree:     usize,
}

impl Default for BridgeConfig {
  fn default() -> Self { Self { min_centrality: 0.1, max_degree: 5 } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenfordConfig {
  /// Documents with fewer usable numbers are inconclusive.
  pub min_sample_size:      usize,
  /// Chi-square critical value; 15.507 is p = 0.05 at 8 degrees of freedom.
  pub chi_square_threshold: f64,
  /// Share of values >= 1000 divisible by 1000 reported as excessive.
  pub round_number_share:   f64,
}

impl Default for BenfordConfig {
  fn default() -> Self {
    Self {
      min_sample_size:      30,
      chi_square_threshold: 15.507,
      round_number_share:   0.30,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
  /// Gaps strictly longer than this many days are silence intervals.
  pub gap_threshold_days: i64,
  /// Parsed dates outside `min_year..=max_year` are discarded as noise.
  pub min_year:           i32,
  pub max_year:           i32,
}

impl Default for TimelineConfig {
  fn default() -> Self {
    Self { gap_threshold_days: 20, min_year: 1900, max_year: 2050 }
  }
}

/// All detector settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
  pub bridge:   BridgeConfig,
  pub benford:  BenfordConfig,
  pub timeline: TimelineConfig,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_documented_values() {
    let cfg = AnalysisConfig::default();
    assert_eq!(cfg.benford.min_sample_size, 30);
    assert!((cfg.benford.chi_square_threshold - 15.507).abs() < 1e-9);
    assert_eq!(cfg.timeline.gap_threshold_days, 20);
    assert!((cfg.bridge.min_centrality - 0.1).abs() < 1e-9);
    assert_eq!(cfg.bridge.max_degree, 5);
    assert_eq!(IngestConfig::default().min_text_len, 100);
  }

  #[test]
  fn partial_override_keeps_other_defaults() {
    let cfg: AnalysisConfig =
      serde_json::from_str(r#"{ "timeline": { "gap_threshold_days": 45 } }"#)
        .unwrap();
    assert_eq!(cfg.timeline.gap_threshold_days, 45);
    assert_eq!(cfg.timeline.min_year, 1900);
    assert_eq!(cfg.bridge.max_degree, 5);
  }

  #[test]
  fn extension_check_ignores_case() {
    let cfg = IngestConfig::default();
    assert!(cfg.supports_extension("PDF"));
    assert!(!cfg.supports_extension("docx"));
  }
}
