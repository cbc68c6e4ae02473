// 🕸️ Graph Builder - one node per candidate record, edges only inside a tenant group
//
// Records live in a flat arena (the input slice); nodes carry the arena index,
// never a reference. Scoring fans out over tenant groups on rayon and the
// per-group edge sets are concatenated in group order, so the graph is
// identical whatever the thread count.

use crate::entities::RawParcelRecord;
use crate::error::ResolveError;
use crate::grouping::TenantGroup;
use crate::pipeline::CancelFlag;
use crate::similarity::SimilarityScorer;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

// ============================================================================
// SIMILARITY EDGE
// ============================================================================

/// Unordered pair of records (arena indices, `a < b`) with its weight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityEdge {
    pub a: usize,
    pub b: usize,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub pairs_scored: usize,
    pub pairs_missing_geometry: usize,
}

/// Edges of one tenant group
#[derive(Debug, Default)]
struct GroupEdges {
    edges: Vec<SimilarityEdge>,
    skipped: usize,
}

// ============================================================================
// RESOLUTION GRAPH
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ResolutionGraph {
    graph: UnGraph<usize, f64>,
    node_of: HashMap<usize, NodeIndex>,
}

impl ResolutionGraph {
    /// Empty graph with one node per record index, in the given order
    pub fn with_nodes(records: impl IntoIterator<Item = usize>) -> Self {
        let mut graph = ResolutionGraph::default();
        for record in records {
            if !graph.node_of.contains_key(&record) {
                let node = graph.graph.add_node(record);
                graph.node_of.insert(record, node);
            }
        }
        graph
    }

    /// Add an edge between two existing nodes
    ///
    /// Returns false (and adds nothing) when either record is not a node.
    pub fn add_edge(&mut self, edge: SimilarityEdge) -> bool {
        match (self.node_of.get(&edge.a), self.node_of.get(&edge.b)) {
            (Some(&a), Some(&b)) => {
                self.graph.add_edge(a, b, edge.weight);
                true
            }
            _ => false,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Record indices of all nodes, in insertion order
    pub fn records(&self) -> impl Iterator<Item = usize> + '_ {
        self.graph.node_indices().map(move |n| self.graph[n])
    }

    pub fn contains(&self, record: usize) -> bool {
        self.node_of.contains_key(&record)
    }

    pub fn edges(&self) -> impl Iterator<Item = SimilarityEdge> + '_ {
        self.graph.edge_references().map(|e| {
            let (x, y) = (self.graph[e.source()], self.graph[e.target()]);
            SimilarityEdge {
                a: x.min(y),
                b: x.max(y),
                weight: *e.weight(),
            }
        })
    }

    /// Adjacency of one record: (neighbor record index, weight)
    pub fn neighbors(&self, record: usize) -> Vec<(usize, f64)> {
        let Some(&node) = self.node_of.get(&record) else {
            return Vec::new();
        };
        self.graph
            .edges(node)
            .map(|e| {
                let other = if e.source() == node { e.target() } else { e.source() };
                (self.graph[other], *e.weight())
            })
            .collect()
    }

    /// Weight of the direct edge between two records, if any
    pub fn weight(&self, a: usize, b: usize) -> Option<f64> {
        let (&x, &y) = (self.node_of.get(&a)?, self.node_of.get(&b)?);
        self.graph.find_edge(x, y).map(|e| self.graph[e])
    }
}

// ============================================================================
// GRAPH BUILDER
// ============================================================================

pub struct GraphBuilder<'a> {
    scorer: &'a SimilarityScorer,
    cancel: &'a CancelFlag,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(scorer: &'a SimilarityScorer, cancel: &'a CancelFlag) -> Self {
        GraphBuilder { scorer, cancel }
    }

    /// Score every pair within every group and assemble the graph.
    ///
    /// Runs on the current rayon pool; callers pick the pool with `install`.
    pub fn build(
        &self,
        records: &[RawParcelRecord],
        groups: &[TenantGroup],
    ) -> Result<(ResolutionGraph, GraphStats), ResolveError> {
        let per_group: Vec<Option<GroupEdges>> = groups
            .par_iter()
            .map(|group| {
                if self.cancel.is_cancelled() {
                    return None;
                }
                Some(self.score_group(records, group))
            })
            .collect();

        let groups_done = per_group.iter().filter(|g| g.is_some()).count();
        if groups_done < groups.len() {
            return Err(ResolveError::Cancelled {
                groups_done,
                groups_total: groups.len(),
            });
        }

        // barrier: every group has been scored before the graph is assembled
        let mut graph =
            ResolutionGraph::with_nodes(groups.iter().flat_map(|g| g.members.iter().copied()));
        let mut stats = GraphStats {
            nodes: graph.node_count(),
            ..Default::default()
        };

        for group_edges in per_group.into_iter().flatten() {
            stats.pairs_missing_geometry += group_edges.skipped;
            for edge in group_edges.edges {
                stats.pairs_scored += 1;
                graph.add_edge(edge);
            }
        }

        debug!(
            nodes = stats.nodes,
            edges = graph.edge_count(),
            skipped = stats.pairs_missing_geometry,
            "resolution graph assembled"
        );

        Ok((graph, stats))
    }

    fn score_group(&self, records: &[RawParcelRecord], group: &TenantGroup) -> GroupEdges {
        let mut out = GroupEdges::default();
        let members = &group.members;

        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                let (a, b) = (members[i], members[j]);
                match self.scorer.score(&records[a], &records[b]) {
                    Some(weight) => out.edges.push(SimilarityEdge {
                        a: a.min(b),
                        b: a.max(b),
                        weight,
                    }),
                    None => out.skipped += 1,
                }
            }
        }

        out
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolutionConfig;
    use crate::entities::{ParcelKind, RecordId, ShopDetails};
    use crate::geo::{CoordinateSystem, GeoPoint};
    use crate::grouping::group_candidates;

    fn scorer() -> SimilarityScorer {
        SimilarityScorer::new(
            &ResolutionConfig::default().with_coordinate_system(CoordinateSystem::Projected),
        )
    }

    fn record(id: &str, name: &str, x: Option<f64>, kind: ParcelKind) -> RawParcelRecord {
        RawParcelRecord::new(
            RecordId::new(id),
            Some(name.to_string()),
            x.map(|x| GeoPoint::new(0.0, x)),
            None,
            None,
            kind,
        )
    }

    fn shop() -> ParcelKind {
        ParcelKind::Shop(ShopDetails {
            standard_type: Some("FORNER".to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_edges_only_within_groups() {
        let records = vec![
            record("1", "Rossi", Some(0.0), ParcelKind::House),
            record("2", "Bon", Some(0.0), shop()),
            record("3", "Rossi", Some(10.0), shop()),
            record("4", "Bon", Some(10.0), ParcelKind::Other),
            record("5", "Rossi", Some(20.0), ParcelKind::Other),
        ];
        let (groups, _) = group_candidates(&records);
        let scorer = scorer();
        let cancel = CancelFlag::new();

        let (graph, stats) = GraphBuilder::new(&scorer, &cancel).build(&records, &groups).unwrap();

        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge_count(), 3 + 1);
        assert_eq!(stats.pairs_scored, 4);
        for edge in graph.edges() {
            assert_eq!(records[edge.a].normalized_name(), records[edge.b].normalized_name());
        }
        assert!(graph.weight(0, 1).is_none());
        assert!(graph.weight(0, 2).is_some());
        assert_eq!(graph.weight(0, 2), graph.weight(2, 0));
    }

    #[test]
    fn test_missing_geometry_skips_edge_but_keeps_node() {
        let records = vec![
            record("1", "Rossi", Some(0.0), ParcelKind::House),
            record("2", "Rossi", None, shop()),
            record("3", "Rossi", Some(10.0), shop()),
        ];
        let (groups, _) = group_candidates(&records);
        let scorer = scorer();
        let cancel = CancelFlag::new();

        let (graph, stats) = GraphBuilder::new(&scorer, &cancel).build(&records, &groups).unwrap();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(stats.pairs_missing_geometry, 2);
        assert!(graph.contains(1));
        assert!(graph.neighbors(1).is_empty());
        assert_eq!(graph.neighbors(0).len(), 1);
    }

    #[test]
    fn test_cancelled_before_start() {
        let records = vec![
            record("1", "Rossi", Some(0.0), ParcelKind::House),
            record("2", "Rossi", Some(0.0), shop()),
        ];
        let (groups, _) = group_candidates(&records);
        let scorer = scorer();
        let cancel = CancelFlag::new();
        cancel.cancel();

        let err = GraphBuilder::new(&scorer, &cancel).build(&records, &groups).unwrap_err();
        assert!(matches!(err, ResolveError::Cancelled { groups_done: 0, groups_total: 1 }));
    }

    #[test]
    fn test_same_graph_on_any_pool_size() {
        let records: Vec<RawParcelRecord> = (0..40)
            .map(|i| {
                let kind = if i % 3 == 0 { shop() } else { ParcelKind::Other };
                record(&i.to_string(), &format!("t{}", i % 7), Some(i as f64 * 37.0), kind)
            })
            .collect();
        let (groups, _) = group_candidates(&records);
        let scorer = scorer();
        let cancel = CancelFlag::new();

        let build_on = |threads: usize| {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build().unwrap();
            let (graph, _) = pool
                .install(|| GraphBuilder::new(&scorer, &cancel).build(&records, &groups))
                .unwrap();
            graph.edges().collect::<Vec<_>>()
        };

        assert_eq!(build_on(1), build_on(4));
    }

    #[test]
    fn test_add_edge_rejects_unknown_records() {
        let mut graph = ResolutionGraph::with_nodes([0, 1]);
        assert!(graph.add_edge(SimilarityEdge { a: 0, b: 1, weight: 0.7 }));
        assert!(!graph.add_edge(SimilarityEdge { a: 0, b: 9, weight: 0.7 }));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.neighbors(1), vec![(0, 0.7)]);
    }
}
