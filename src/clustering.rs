// 🧩 Cluster Extractor - threshold the graph, then connected components
//
// Clustering is transitive: A–B and B–C above threshold put A and C in one
// component even when score(A, C) is below it. Isolated nodes come out as
// singleton components.

use crate::graph::ResolutionGraph;
use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStats {
    pub edges_kept: usize,
    pub edges_removed: usize,
    pub components: usize,
}

/// Connected components after deleting every edge with weight < `threshold`.
///
/// Each component lists record indices in ascending (register) order;
/// components are ordered by their first record.
pub fn extract_components(graph: &ResolutionGraph, threshold: f64) -> (Vec<Vec<usize>>, ClusterStats) {
    let records: Vec<usize> = graph.records().collect();
    let slot: BTreeMap<usize, usize> = records.iter().enumerate().map(|(s, &r)| (r, s)).collect();

    let mut sets = UnionFind::<usize>::new(records.len());
    let mut stats = ClusterStats::default();

    for edge in graph.edges() {
        if edge.weight < threshold {
            stats.edges_removed += 1;
            continue;
        }
        stats.edges_kept += 1;
        sets.union(slot[&edge.a], slot[&edge.b]);
    }

    // BTreeMap over records ascending → members sorted, roots keyed by first member
    let mut by_root: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (&record, &s) in &slot {
        by_root.entry(sets.find(s)).or_default().push(record);
    }

    let mut components: Vec<Vec<usize>> = by_root.into_values().collect();
    components.sort_by_key(|c| c[0]);

    stats.components = components.len();
    (components, stats)
}

// ============================================================================
// TESTS
// ============================================================================
