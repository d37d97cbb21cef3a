//! The undirected, weighted entity co-occurrence graph.
//!
//! Nodes are held in a dense `0..n` index so the centrality pass can work on
//! plain vectors. Node order is fixed at construction (entities sorted by
//! name, then id), which keeps every downstream result deterministic.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use dossier_core::{cooccurrence::CooccurrenceEdge, entity::Entity};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
  pub entity_id: Uuid,
  pub name:      String,
}

#[derive(Debug, Clone, Default)]
pub struct CooccurrenceGraph {
  nodes:     Vec<Node>,
  index:     HashMap<Uuid, usize>,
  /// `adjacency[u][v]` = number of distinct documents shared by `u` and `v`.
  /// Always symmetric; never contains `u` in `adjacency[u]`.
  adjacency: Vec<BTreeMap<usize, u64>>,
}

impl CooccurrenceGraph {
  /// A graph whose nodes are `entities` (isolated ones included) and no
  /// edges yet.
  pub fn with_entities<'a>(entities: impl IntoIterator<Item = &'a Entity>) -> Self {
    let mut sorted: Vec<&Entity> = entities.into_iter().collect();
    sorted.sort_by(|a, b| {
      a.name
        .cmp(&b.name)
        .then_with(|| a.entity_id.cmp(&b.entity_id))
    });

    let mut graph = Self::default();
    for entity in sorted {
      graph.add_node(entity.entity_id, entity.name.clone());
    }
    graph
  }

  /// Build from the store's entity and co-occurrence tables. Each row is one
  /// (pair, document), so a pair's weight is its distinct-document count.
  pub fn from_store_rows(entities: &[Entity], edges: &[CooccurrenceEdge]) -> Self {
    let mut graph = Self::with_entities(entities);
    for edge in edges {
      if !graph.add_cooccurrence(edge.entity_a, edge.entity_b) {
        tracing::warn!(
          entity_a = %edge.entity_a,
          entity_b = %edge.entity_b,
          fingerprint = %edge.fingerprint,
          "skipping co-occurrence row with an unknown or repeated endpoint"
        );
      }
    }
    graph
  }

  /// Build from per-document entity sets. Repeated mentions inside one
  /// document count once.
  pub fn from_document_sets<D>(entities: &[Entity], documents: D) -> Self
  where
    D: IntoIterator,
    D::Item: IntoIterator<Item = Uuid>,
  {
    let mut graph = Self::with_entities(entities);
    for doc in documents {
      let present: Vec<Uuid> = doc.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
      for (i, &a) in present.iter().enumerate() {
        for &b in &present[i + 1..] {
          graph.add_cooccurrence(a, b);
        }
      }
    }
    graph
  }

  /// Insert a node, returning its index. Re-adding an id is a no-op.
  pub fn add_node(&mut self, entity_id: Uuid, name: String) -> usize {
    if let Some(&idx) = self.index.get(&entity_id) {
      return idx;
    }
    let idx = self.nodes.len();
    self.nodes.push(Node { entity_id, name });
    self.index.insert(entity_id, idx);
    self.adjacency.push(BTreeMap::new());
    idx
  }

  /// Add one to the weight of `{a, b}`. Returns `false` (and changes
  /// nothing) for a self-pair or an id with no node.
  pub fn add_cooccurrence(&mut self, a: Uuid, b: Uuid) -> bool {
    let (Some(&u), Some(&v)) = (self.index.get(&a), self.index.get(&b)) else {
      return false;
    };
    if u == v {
      return false;
    }
    *self.adjacency[u].entry(v).or_insert(0) += 1;
    *self.adjacency[v].entry(u).or_insert(0) += 1;
    true
  }

  pub fn node_count(&self) -> usize { self.nodes.len() }

  pub fn edge_count(&self) -> usize {
    self.adjacency.iter().map(BTreeMap::len).sum::<usize>() / 2
  }

  pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

  pub fn node(&self, idx: usize) -> &Node { &self.nodes[idx] }

  pub fn nodes(&self) -> &[Node] { &self.nodes }

  pub fn index_of(&self, entity_id: Uuid) -> Option<usize> {
    self.index.get(&entity_id).copied()
  }

  /// Neighbour indices of `idx`, ascending.
  pub fn neighbors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
    self.adjacency[idx].keys().copied()
  }

  pub fn degree(&self, idx: usize) -> usize { self.adjacency[idx].len() }

  /// Shared-document count between two entities; 0 when unrelated, unknown,
  /// or identical.
  pub fn weight(&self, a: Uuid, b: Uuid) -> u64 {
    match (self.index_of(a), self.index_of(b)) {
      (Some(u), Some(v)) => self.adjacency[u].get(&v).copied().unwrap_or(0),
      _ => 0,
    }
  }
}
