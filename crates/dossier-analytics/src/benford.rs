//! Benford Anomaly Engine: leading-digit chi-square test per document.

use std::sync::LazyLock;

use dossier_core::config::BenfordConfig;
use regex::Regex;
use serde::Serialize;

/// Nine digit categories minus one constraint.
pub const DEGREES_OF_FREEDOM: u32 = 8;

/// Integers or decimals, optionally with thousands separators.
static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\b(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?\b").expect("valid number pattern")
});

/// Benford's expected share for leading digit `d` in `1..=9`.
pub fn expected_share(d: u8) -> f64 { (1.0 + 1.0 / f64::from(d)).log10() }

/// One usable numeric token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
  pub leading_digit: u8,
  pub value:         f64,
}

/// Pull Benford samples from free text.
///
/// Tokens need at least two digits. Bare four-digit integers in 1900–2099
/// are taken for calendar years and skipped, as is any token without a
/// non-zero digit.
pub fn extract_samples(text: &str) -> Vec<Sample> {
  NUMBER
    .find_iter(text)
    .filter_map(|m| parse_token(m.as_str()))
    .collect()
}

fn parse_token(token: &str) -> Option<Sample> {
  let digits = token.bytes().filter(u8::is_ascii_digit).count();
  if digits < 2 {
    return None;
  }

  let plain: String = token.chars().filter(|&c| c != ',').collect();
  if token.len() == 4 && digits == 4 {
    if let Ok(year) = plain.parse::<u32>() {
      if (1900..=2099).contains(&year) {
        return None;
      }
    }
  }

  let leading_digit = token
    .bytes()
    .find(|b| (b'1'..=b'9').contains(b))
    .map(|b| b - b'0')?;
  let value = plain.parse::<f64>().ok()?;
  Some(Sample { leading_digit, value })
}

// ─── Results ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigitRow {
  pub digit:          u8,
  pub observed:       u64,
  pub expected:       f64,
  pub observed_share: f64,
  pub expected_share: f64,
}

/// A completed test on a large-enough sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenfordTest {
  pub sample_size:        usize,
  pub chi_square:         f64,
  pub threshold:          f64,
  pub degrees_of_freedom: u32,
  pub is_violation:       bool,
  pub digits:             Vec<DigitRow>,
  /// Share of all samples that are multiples of 1000 and at least 1000.
  pub round_share:        f64,
  /// Share of all samples that are multiples of 10000 and at least 1000.
  pub very_round_share:   f64,
  pub excessive_rounding: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BenfordOutcome {
  /// Too few samples to say anything; never a violation.
  Inconclusive { sample_size: usize },
  Tested(BenfordTest),
}

impl BenfordOutcome {
  pub fn is_violation(&self) -> bool {
    matches!(self, Self::Tested(t) if t.is_violation)
  }

  pub fn sample_size(&self) -> usize {
    match self {
      Self::Inconclusive { sample_size } => *sample_size,
      Self::Tested(t) => t.sample_size,
    }
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct BenfordEngine {
  config: BenfordConfig,
}

impl BenfordEngine {
  pub fn new(config: BenfordConfig) -> Self { Self { config } }

  pub fn test_text(&self, text: &str) -> BenfordOutcome {
    self.test_samples(&extract_samples(text))
  }

  pub fn test_samples(&self, samples: &[Sample]) -> BenfordOutcome {
    let samples: Vec<&Sample> = samples
      .iter()
      .filter(|s| (1..=9).contains(&s.leading_digit))
      .collect();
    let n = samples.len();
    if n < self.config.min_sample_size || n == 0 {
      return BenfordOutcome::Inconclusive { sample_size: n };
    }

    let mut counts = [0u64; 9];
    for s in &samples {
      counts[usize::from(s.leading_digit - 1)] += 1;
    }

    let total = n as f64;
    let mut chi_square = 0.0;
    let digits: Vec<DigitRow> = (1..=9u8)
      .map(|d| {
        let observed = counts[usize::from(d - 1)];
        let share = expected_share(d);
        let expected = share * total;
        chi_square += (observed as f64 - expected).powi(2) / expected;
        DigitRow {
          digit: d,
          observed,
          expected,
          observed_share: observed as f64 / total,
          expected_share: share,
        }
      })
      .collect();

    let share_divisible = |by: f64| {
      if samples.is_empty() {
        return 0.0;
      }
      let round = samples
        .iter()
        .filter(|s| s.value >= 1000.0 && s.value % by == 0.0)
        .count();
      round as f64 / samples.len() as f64
    };
    let round_share = share_divisible(1000.0);
    let very_round_share = share_divisible(10000.0);

    BenfordOutcome::Tested(BenfordTest {
      sample_size: n,
      chi_square,
      threshold: self.config.chi_square_threshold,
      degrees_of_freedom: DEGREES_OF_FREEDOM,
      is_violation: chi_square > self.config.chi_square_threshold,
      digits,
      round_share,
      very_round_share,
      excessive_rounding: round_share > self.config.round_number_share,
    })
  }
}
