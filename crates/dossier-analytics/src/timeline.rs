//! Timeline Auditor: silence intervals in corpus-wide dated activity.

use std::{
  collections::{BTreeMap, btree_map::Entry},
  sync::LazyLock,
};

use chrono::{Datelike, NaiveDate};
use dossier_core::{
  config::TimelineConfig,
  document::{Document, Fingerprint},
};
use regex::Regex;
use serde::Serialize;

// ─── Date extraction ─────────────────────────────────────────────────────────

/// `MM/DD/YYYY`
static SLASH_US: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").expect("valid date pattern")
});
/// `MM-DD-YYYY`
static DASH_US: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\b(\d{1,2})-(\d{1,2})-(\d{4})\b").expect("valid date pattern")
});
/// `YYYY-MM-DD`
static ISO: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("valid date pattern")
});
/// `March 10, 2005`, `Mar. 10 2005`
static MONTH_FIRST: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\b([A-Z][a-z]+)\.?\s+(\d{1,2}),?\s+(\d{4})\b").expect("valid date pattern")
});
/// `10 March 2005`
static DAY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\b(\d{1,2})\s+([A-Z][a-z]+)\.?,?\s+(\d{4})\b").expect("valid date pattern")
});

const MONTHS: [&str; 12] = [
  "january", "february", "march", "april", "may", "june", "july", "august",
  "september", "october", "november", "december",
];

/// Full month name, three-letter abbreviation, or `Sept`.
fn month_number(word: &str) -> Option<u32> {
  let word = word.to_ascii_lowercase();
  if word == "sept" {
    return Some(9);
  }
  MONTHS
    .iter()
    .position(|m| *m == word || (word.len() == 3 && m.starts_with(word.as_str())))
    .map(|i| i as u32 + 1)
}

fn ymd(y: &str, m: u32, d: &str) -> Option<NaiveDate> {
  NaiveDate::from_ymd_opt(y.parse().ok()?, m, d.parse().ok()?)
}

/// Every parseable date in `text`, in pattern order. Tokens that match a
/// pattern but name an impossible date are dropped.
pub fn parse_dates(text: &str) -> Vec<NaiveDate> {
  let mut dates = Vec::new();

  for re in [&*SLASH_US, &*DASH_US] {
    dates.extend(re.captures_iter(text).filter_map(|c| {
      ymd(&c[3], c[1].parse().ok()?, &c[2])
    }));
  }
  dates.extend(ISO.captures_iter(text).filter_map(|c| {
    ymd(&c[1], c[2].parse().ok()?, &c[3])
  }));
  dates.extend(MONTH_FIRST.captures_iter(text).filter_map(|c| {
    ymd(&c[3], month_number(&c[1])?, &c[2])
  }));
  dates.extend(DAY_FIRST.captures_iter(text).filter_map(|c| {
    ymd(&c[3], month_number(&c[2])?, &c[1])
  }));

  dates
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// A citation to the document that anchors one side of a gap.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DocumentRef {
  pub path:        String,
  pub fingerprint: Fingerprint,
}

impl DocumentRef {
  pub fn of(doc: &Document) -> Self {
    Self { path: doc.path.clone(), fingerprint: doc.fingerprint.clone() }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SilenceInterval {
  pub start:    NaiveDate,
  pub end:      NaiveDate,
  pub gap_days: i64,
  /// Smallest `(path, fingerprint)` among documents dated on `start`.
  pub before:   DocumentRef,
  /// Smallest `(path, fingerprint)` among documents dated on `end`.
  pub after:    DocumentRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimelineSummary {
  pub earliest:       Option<NaiveDate>,
  pub latest:         Option<NaiveDate>,
  pub span_days:      i64,
  pub distinct_dates: usize,
  /// Every in-range date mention, duplicates included.
  pub mentions:       usize,
  pub by_year:        BTreeMap<i32, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineAudit {
  /// Longest gap first; equal gaps by start date.
  pub intervals: Vec<SilenceInterval>,
  pub summary:   TimelineSummary,
}

// ─── Auditor ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct TimelineAuditor {
  config: TimelineConfig,
}

impl TimelineAuditor {
  pub fn new(config: TimelineConfig) -> Self { Self { config } }

  fn in_range(&self, date: NaiveDate) -> bool {
    (self.config.min_year..=self.config.max_year).contains(&date.year())
  }

  /// Audit the dates mentioned across `documents`.
  pub fn audit<'a>(&self, documents: impl IntoIterator<Item = &'a Document>) -> TimelineAudit {
    self.audit_points(documents.into_iter().flat_map(|doc| {
      let cite = DocumentRef::of(doc);
      parse_dates(&doc.text)
        .into_iter()
        .map(move |date| (date, cite.clone()))
    }))
  }

  /// Audit pre-extracted `(date, document)` points. Out-of-range dates are
  /// discarded; a date seen in several documents collapses to one point cited
  /// by the smallest `(path, fingerprint)`.
  pub fn audit_points(
    &self,
    points: impl IntoIterator<Item = (NaiveDate, DocumentRef)>,
  ) -> TimelineAudit {
    let mut timeline: BTreeMap<NaiveDate, DocumentRef> = BTreeMap::new();
    let mut summary = TimelineSummary::default();

    for (date, cite) in points {
      if !self.in_range(date) {
        continue;
      }
      summary.mentions += 1;
      *summary.by_year.entry(date.year()).or_insert(0) += 1;
      match timeline.entry(date) {
        Entry::Vacant(slot) => {
          slot.insert(cite);
        }
        Entry::Occupied(mut slot) if cite < *slot.get() => {
          slot.insert(cite);
        }
        Entry::Occupied(_) => {}
      }
    }

    summary.distinct_dates = timeline.len();
    summary.earliest = timeline.keys().next().copied();
    summary.latest = timeline.keys().next_back().copied();
    if let (Some(first), Some(last)) = (summary.earliest, summary.latest) {
      summary.span_days = (last - first).num_days();
    }

    let points: Vec<(&NaiveDate, &DocumentRef)> = timeline.iter().collect();
    let mut intervals: Vec<SilenceInterval> = points
      .windows(2)
      .filter_map(|pair| {
        let [(start, before), (end, after)] = pair else {
          return None;
        };
        let gap_days = (**end - **start).num_days();
        (gap_days > self.config.gap_threshold_days).then(|| SilenceInterval {
          start: **start,
          end: **end,
          gap_days,
          before: (*before).clone(),
          after: (*after).clone(),
        })
      })
      .collect();

    intervals.sort_by(|a, b| {
      b.gap_days
        .cmp(&a.gap_days)
        .then_with(|| a.start.cmp(&b.start))
    });

    tracing::debug!(
      distinct_dates = summary.distinct_dates,
      intervals = intervals.len(),
      "timeline audit finished"
    );
    TimelineAudit { intervals, summary }
  }
}
