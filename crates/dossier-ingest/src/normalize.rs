//! Text normalisation applied once at ingestion.

use unicode_normalization::UnicodeNormalization;

/// Drop control characters, apply Unicode NFKC, and collapse every
/// whitespace run to a single space with no leading or trailing space.
///
/// Idempotent: `normalize_text(&normalize_text(s)) == normalize_text(s)`.
/// Control characters go before composition so their removal can never leave
/// an uncomposed sequence behind.
pub fn normalize_text(raw: &str) -> String {
  let stripped: String = raw
    .chars()
    .filter(|c| !c.is_control() || c.is_whitespace())
    .collect();

  stripped
    .nfkc()
    .collect::<String>()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn collapses_whitespace_and_trims() {
    assert_eq!(normalize_text("  a\t\tb\n\n c  "), "a b c");
  }

  #[test]
  fn strips_control_characters() {
    assert_eq!(normalize_text("a\u{0007}b\u{0000}c"), "abc");
  }

  #[test]
  fn applies_compatibility_forms() {
    // Ligature, full-width digits, no-break space.
    assert_eq!(normalize_text("\u{FB01}le \u{FF11}\u{FF12}\u{00A0}x"), "file 12 x");
    // Decomposed e + acute composes.
    assert_eq!(normalize_text("Jose\u{0301}"), "Jos\u{00E9}");
  }

  #[test]
  fn is_idempotent() {
    for s in [
      "  Flight\u{00A0}log\r\n 03/10/2005 \u{FB01}  ",
      "e\u{0007}\u{0301} \u{2028}\u{0301}x",
      "",
      "already clean",
    ] {
      let once = normalize_text(s);
      assert_eq!(normalize_text(&once), once, "input {s:?}");
    }
  }
}
