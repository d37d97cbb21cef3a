//! Bridge Detector: entities that connect many things but touch few.

use std::cmp::Ordering;

use dossier_core::config::BridgeConfig;
use serde::Serialize;
use uuid::Uuid;

use crate::{centrality::normalized_betweenness, graph::CooccurrenceGraph};

/// An entity selected as a "hidden handler".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bridge {
  pub entity_id:  Uuid,
  pub name:       String,
  /// Normalised betweenness in `[0, 1]`.
  pub centrality: f64,
  pub degree:     usize,
}

#[derive(Debug, Clone, Default)]
pub struct BridgeDetector {
  config: BridgeConfig,
}

impl BridgeDetector {
  pub fn new(config: BridgeConfig) -> Self { Self { config } }

  /// Every node whose centrality exceeds the minimum and whose degree stays
  /// below the maximum, highest centrality first, then highest degree, then
  /// name.
  pub fn detect(&self, graph: &CooccurrenceGraph) -> Vec<Bridge> {
    let centrality = normalized_betweenness(graph);

    let mut bridges: Vec<Bridge> = centrality
      .into_iter()
      .enumerate()
      .filter_map(|(idx, c)| {
        let degree = graph.degree(idx);
        (c > self.config.min_centrality && degree < self.config.max_degree).then(|| {
          let node = graph.node(idx);
          Bridge {
            entity_id: node.entity_id,
            name: node.name.clone(),
            centrality: c,
            degree,
          }
        })
      })
      .collect();

    bridges.sort_by(|a, b| {
      b.centrality
        .partial_cmp(&a.centrality)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.degree.cmp(&a.degree))
        .then_with(|| a.name.cmp(&b.name))
    });

    tracing::debug!(
      nodes = graph.node_count(),
      edges = graph.edge_count(),
      bridges = bridges.len(),
      "bridge detection finished"
    );
    bridges
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn named_graph(names: &[&str], edges: &[(usize, usize)]) -> (CooccurrenceGraph, Vec<Uuid>) {
    let mut g = CooccurrenceGraph::default();
    let ids: Vec<Uuid> = names
      .iter()
      .map(|name| {
        let id = Uuid::new_v4();
        g.add_node(id, (*name).to_owned());
        id
      })
      .collect();
    for &(a, b) in edges {
      g.add_cooccurrence(ids[a], ids[b]);
    }
    (g, ids)
  }

  #[test]
  fn star_center_is_a_bridge() {
    let (g, ids) = named_graph(
      &["Center", "A", "B", "C", "D"],
      &[(0, 1), (0, 2), (0, 3), (0, 4)],
    );
    let bridges = BridgeDetector::default().detect(&g);

    assert_eq!(bridges.len(), 1);
    assert_eq!(bridges[0].entity_id, ids[0]);
    assert_eq!(bridges[0].degree, 4);
    assert!((bridges[0].centrality - 1.0).abs() < 1e-9);
  }

  #[test]
  fn hubs_at_the_degree_limit_are_excluded() {
    let (g, _) = named_graph(
      &["Hub", "A", "B", "C", "D", "E"],
      &[(0, 1), (0, 2), (0, 3), (0, 4), (0, 5)],
    );
    assert!(BridgeDetector::default().detect(&g).is_empty());

    let lenient = BridgeDetector::new(BridgeConfig { max_degree: 6, ..BridgeConfig::default() });
    assert_eq!(lenient.detect(&g).len(), 1);
  }

  #[test]
  fn ties_fall_back_to_degree_then_name() {
    // Two disjoint paths of three: both middles score 0.1.
    let (g, _) = named_graph(
      &["x1", "Zulu", "x2", "y1", "Alpha", "y2"],
      &[(0, 1), (1, 2), (3, 4), (4, 5)],
    );
    let detector = BridgeDetector::new(BridgeConfig { min_centrality: 0.05, ..BridgeConfig::default() });
    let bridges = detector.detect(&g);
    let names: Vec<_> = bridges.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, ["Alpha", "Zulu"]);
  }

  #[test]
  fn empty_and_disconnected_graphs_have_no_bridges() {
    assert!(BridgeDetector::default().detect(&CooccurrenceGraph::default()).is_empty());
    let (g, _) = named_graph(&["A", "B", "C", "D"], &[]);
    assert!(BridgeDetector::default().detect(&g).is_empty());
  }
}
