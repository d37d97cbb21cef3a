//! Brandes betweenness centrality on the unweighted co-occurrence graph.
//!
//! Edge weights measure co-occurrence strength, not distance, so shortest
//! paths are found by breadth-first search and every edge counts as one hop.

use std::collections::VecDeque;

use crate::graph::CooccurrenceGraph;

/// Raw undirected betweenness per node index: for every node `v`, the sum
/// over unordered pairs `{s, t}` with `s != v != t` of the fraction of
/// shortest `s`-`t` paths that pass through `v`.
///
/// Runs in `O(V * E)`.
pub fn betweenness(graph: &CooccurrenceGraph) -> Vec<f64> {
  let n = graph.node_count();
  let mut centrality = vec![0.0; n];

  let mut stack = Vec::with_capacity(n);
  let mut queue = VecDeque::with_capacity(n);
  let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
  let mut sigma = vec![0.0_f64; n];
  let mut dist = vec![-1_i64; n];
  let mut delta = vec![0.0_f64; n];

  for s in 0..n {
    stack.clear();
    queue.clear();
    preds.iter_mut().for_each(Vec::clear);
    sigma.fill(0.0);
    dist.fill(-1);
    delta.fill(0.0);

    sigma[s] = 1.0;
    dist[s] = 0;
    queue.push_back(s);

    // Single-source shortest paths, counting paths per node.
    while let Some(v) = queue.pop_front() {
      stack.push(v);
      for w in graph.neighbors(v) {
        if dist[w] < 0 {
          dist[w] = dist[v] + 1;
          queue.push_back(w);
        }
        if dist[w] == dist[v] + 1 {
          sigma[w] += sigma[v];
          preds[w].push(v);
        }
      }
    }

    // Dependency accumulation in order of non-increasing distance.
    while let Some(w) = stack.pop() {
      for &v in &preds[w] {
        delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
      }
      if w != s {
        centrality[w] += delta[w];
      }
    }
  }

  // Each unordered pair was visited from both ends.
  centrality.iter_mut().for_each(|c| *c /= 2.0);
  centrality
}

/// Betweenness scaled by `2 / ((n - 1)(n - 2))` into `[0, 1]`. Graphs with
/// fewer than three nodes have no intermediaries, so every score is 0.
pub fn normalized_betweenness(graph: &CooccurrenceGraph) -> Vec<f64> {
  let n = graph.node_count();
  if n < 3 {
    return vec![0.0; n];
  }
  let scale = 2.0 / ((n - 1) as f64 * (n - 2) as f64);
  betweenness(graph)
    .into_iter()
    .map(|c| c * scale)
    .collect()
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  fn graph(n: usize, edges: &[(usize, usize)]) -> CooccurrenceGraph {
    let mut g = CooccurrenceGraph::default();
    let ids: Vec<Uuid> = (0..n)
      .map(|i| {
        let id = Uuid::new_v4();
        g.add_node(id, format!("n{i}"));
        id
      })
      .collect();
    for &(a, b) in edges {
      g.add_cooccurrence(ids[a], ids[b]);
    }
    g
  }

  fn close(a: f64, b: f64) -> bool { (a - b).abs() < 1e-9 }

  #[test]
  fn star_center_carries_every_path() {
    let g = graph(5, &[(0, 1), (0, 2), (0, 3), (0, 4)]);
    let raw = betweenness(&g);
    assert!(close(raw[0], 6.0));
    assert!(raw[1..].iter().all(|&c| close(c, 0.0)));

    let norm = normalized_betweenness(&g);
    assert!(close(norm[0], 1.0));
  }

  #[test]
  fn path_graph_middle_nodes() {
    // 0 - 1 - 2 - 3
    let g = graph(4, &[(0, 1), (1, 2), (2, 3)]);
    let raw = betweenness(&g);
    assert!(close(raw[0], 0.0));
    assert!(close(raw[1], 2.0));
    assert!(close(raw[2], 2.0));
    assert!(close(raw[3], 0.0));
  }

  #[test]
  fn parallel_shortest_paths_split_credit() {
    // 0 - 1 - 3 and 0 - 2 - 3: two equal routes from 0 to 3.
    let g = graph(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
    let raw = betweenness(&g);
    for c in raw {
      assert!(close(c, 0.5));
    }
  }

  #[test]
  fn edge_weights_do_not_change_hop_counts() {
    let mut g = graph(3, &[(0, 1), (1, 2)]);
    let a = g.node(0).entity_id;
    let b = g.node(1).entity_id;
    for _ in 0..10 {
      g.add_cooccurrence(a, b);
    }
    assert!(close(betweenness(&g)[1], 1.0));
  }

  #[test]
  fn tiny_and_disconnected_graphs_score_zero() {
    assert!(normalized_betweenness(&graph(0, &[])).is_empty());
    assert_eq!(normalized_betweenness(&graph(2, &[(0, 1)])), vec![0.0, 0.0]);
    assert!(
      normalized_betweenness(&graph(4, &[]))
        .iter()
        .all(|&c| c == 0.0)
    );
  }
}
