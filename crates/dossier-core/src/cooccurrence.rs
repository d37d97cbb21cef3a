//! Co-occurrence edges: an unordered entity pair observed in one document.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::Fingerprint;

/// One `(pair, document)` association. The pair is always stored in
/// canonical order (`entity_a < entity_b`), so the same pair in the same
/// document can only ever be recorded once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CooccurrenceEdge {
  pub entity_a:    Uuid,
  pub entity_b:    Uuid,
  pub fingerprint: Fingerprint,
}

impl CooccurrenceEdge {
  /// Build an edge with the pair in canonical order. Returns `None` for a
  /// self-pair.
  pub fn new(x: Uuid, y: Uuid, fingerprint: Fingerprint) -> Option<Self> {
    let (entity_a, entity_b) = canonical_pair(x, y)?;
    Some(Self { entity_a, entity_b, fingerprint })
  }
}

/// Order a pair so the smaller id comes first; `None` when `x == y`.
pub fn canonical_pair(x: Uuid, y: Uuid) -> Option<(Uuid, Uuid)> {
  match x.cmp(&y) {
    std::cmp::Ordering::Less => Some((x, y)),
    std::cmp::Ordering::Greater => Some((y, x)),
    std::cmp::Ordering::Equal => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn canonical_pair_is_symmetric() {
    let x = Uuid::new_v4();
    let y = Uuid::new_v4();
    assert_eq!(canonical_pair(x, y), canonical_pair(y, x));
  }

  #[test]
  fn self_pair_is_rejected() {
    let x = Uuid::new_v4();
    assert!(canonical_pair(x, x).is_none());
    assert!(CooccurrenceEdge::new(x, x, Fingerprint::from_digest([1; 32])).is_none());
  }
}
