//! Entity recognition adapters.
//!
//! Recognition quality is not this crate's concern: a recogniser only has to
//! turn text into `(name, kind)` mentions. Mentions are deduplicated by
//! identity within one call, first spelling wins.

use std::{collections::HashSet, sync::LazyLock};

use dossier_core::entity::{EntityKind, EntityMention};
use regex::Regex;

pub trait EntityRecognizer: Send + Sync {
  fn recognize(&self, text: &str) -> Vec<EntityMention>;
}

fn dedup_by_identity(mentions: impl IntoIterator<Item = EntityMention>) -> Vec<EntityMention> {
  let mut seen = HashSet::new();
  mentions
    .into_iter()
    .filter(|m| seen.insert(m.identity()))
    .collect()
}

// ─── Capitalised names ───────────────────────────────────────────────────────

static CAPITALIZED_RUN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)+\b").expect("valid name pattern")
});

/// Common capitalised phrases that are places or institutions, not people.
const NOT_PEOPLE: &[&str] = &[
  "united states",
  "new york",
  "los angeles",
  "san francisco",
  "united kingdom",
  "supreme court",
  "district court",
  "federal bureau",
  "department of",
  "state of",
  "city of",
  "county of",
];

/// Heuristic PERSON recogniser: runs of two to four capitalised words, each
/// two to fifteen characters long.
#[derive(Debug, Clone, Default)]
pub struct CapitalizedNameRecognizer;

impl CapitalizedNameRecognizer {
  fn is_likely_name(candidate: &str) -> bool {
    let words: Vec<&str> = candidate.split_whitespace().collect();
    if !(2..=4).contains(&words.len()) {
      return false;
    }
    if !words.iter().all(|w| (2..=15).contains(&w.chars().count())) {
      return false;
    }
    let normalized = words.join(" ").to_lowercase();
    !NOT_PEOPLE.contains(&normalized.as_str())
  }
}

impl EntityRecognizer for CapitalizedNameRecognizer {
  fn recognize(&self, text: &str) -> Vec<EntityMention> {
    dedup_by_identity(
      CAPITALIZED_RUN
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|c| Self::is_likely_name(c))
        .map(|c| EntityMention::new(c, EntityKind::Person)),
    )
  }
}

// ─── Fixed gazetteer ─────────────────────────────────────────────────────────

/// Reports each known name that appears in the text as whole words,
/// ignoring case. Useful when names come from an external NER step or a
/// hand-built watch list.
#[derive(Debug, Clone, Default)]
pub struct StaticRecognizer {
  known: Vec<EntityMention>,
}

impl StaticRecognizer {
  pub fn new(known: impl IntoIterator<Item = EntityMention>) -> Self {
    Self { known: known.into_iter().collect() }
  }

  pub fn with(mut self, name: impl Into<String>, kind: EntityKind) -> Self {
    self.known.push(EntityMention::new(name, kind));
    self
  }
}

impl EntityRecognizer for StaticRecognizer {
  fn recognize(&self, text: &str) -> Vec<EntityMention> {
    let haystack = text.to_lowercase();
    dedup_by_identity(
      self
        .known
        .iter()
        .filter(|m| contains_word(&haystack, &m.name.to_lowercase()))
        .cloned(),
    )
  }
}

/// `needle` occurs in `haystack` with no letter or digit directly on
/// either side.
fn contains_word(haystack: &str, needle: &str) -> bool {
  if needle.is_empty() {
    return false;
  }
  haystack.match_indices(needle).any(|(at, found)| {
    let before = haystack[..at].chars().next_back();
    let after = haystack[at + found.len()..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn names(mentions: &[EntityMention]) -> Vec<&str> {
    mentions.iter().map(|m| m.name.as_str()).collect()
  }

  #[test]
  fn capitalized_runs_become_people() {
    let found = CapitalizedNameRecognizer
      .recognize("Met with John Smith and Mary Ann Jones in New York. John Smith left.");
    assert_eq!(names(&found), ["John Smith", "Mary Ann Jones"]);
    assert!(found.iter().all(|m| m.kind == EntityKind::Person));
  }

  #[test]
  fn rejects_long_runs_and_short_words() {
    assert!(
      CapitalizedNameRecognizer
        .recognize("Alpha Beta Gamma Delta Epsilon")
        .is_empty()
    );
    assert!(CapitalizedNameRecognizer.recognize("Jo A").is_empty());
    assert!(
      CapitalizedNameRecognizer
        .recognize("Bartholomewsworthy Smith")
        .is_empty()
    );
  }

  #[test]
  fn static_recognizer_matches_case_insensitively() {
    let r = StaticRecognizer::default()
      .with("Acme Holdings", EntityKind::Organization)
      .with("Jane Roe", EntityKind::Person)
      .with("ACME HOLDINGS", EntityKind::Organization);
    let found = r.recognize("payment from acme holdings to an unnamed party");
    assert_eq!(names(&found), ["Acme Holdings"]);
  }

  #[test]
  fn static_recognizer_matches_whole_words_only() {
    let r = StaticRecognizer::default()
      .with("Al", EntityKind::Person)
      .with("Acme", EntityKind::Organization);
    assert!(r.recognize("Also paid to Acmeco and Balder").is_empty());

    let found = r.recognize("Wire from Al (via ACME), then Al again.");
    assert_eq!(names(&found), ["Al", "Acme"]);
  }
}
