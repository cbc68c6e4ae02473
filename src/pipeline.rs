// 🏭 Resolution Pipeline - grouper → scorer/graph → clusters → profiles
//
// Single batch pass over in-memory records. Only pairwise scoring fans out
// (per tenant group, rayon); component extraction runs once on the fully
// assembled graph.

use crate::clustering::{extract_components, ClusterStats};
use crate::config::ResolutionConfig;
use crate::entities::{MerchantProfile, RawParcelRecord};
use crate::error::ResolveError;
use crate::graph::{GraphBuilder, GraphStats, ResolutionGraph};
use crate::grouping::{group_candidates, GroupingStats, TenantGroup};
use crate::merge::{merge_components, MergeStats};
use crate::similarity::SimilarityScorer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

// ============================================================================
// CANCELLATION
// ============================================================================

/// Coarse "abort remaining groups" signal, shareable across threads
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ============================================================================
// RUN REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub threshold: f64,
    pub input_records: usize,
    pub grouping: GroupingStats,
    pub graph: GraphStats,
    pub clusters: ClusterStats,
    pub merge: MergeStats,
}

impl RunReport {
    pub fn profiles(&self) -> usize {
        self.merge.profiles
    }

    pub fn log_summary(&self) {
        info!(
            input = self.input_records,
            without_name = self.grouping.records_without_name,
            singleton_names = self.grouping.singleton_names,
            groups_without_shop = self.grouping.groups_without_shop,
            groups_kept = self.grouping.groups_kept,
            "candidate grouping done"
        );
        info!(
            nodes = self.graph.nodes,
            pairs_scored = self.graph.pairs_scored,
            pairs_missing_geometry = self.graph.pairs_missing_geometry,
            edges_kept = self.clusters.edges_kept,
            components = self.clusters.components,
            threshold = self.threshold,
            "clustering done"
        );
        info!(
            profiles = self.merge.profiles,
            dropped_without_shop = self.merge.components_without_shop,
            surrogate_homes = self.merge.surrogate_homes,
            "profile merge done"
        );
        if self.merge.surrogate_homes > 0 {
            warn!(
                count = self.merge.surrogate_homes,
                "profiles without a HOUSE record use a surrogate home location"
            );
        }
    }
}

// ============================================================================
// RESOLUTION (pipeline output)
// ============================================================================

#[derive(Debug, Clone)]
pub struct Resolution {
    pub groups: Vec<TenantGroup>,
    pub graph: ResolutionGraph,
    pub components: Vec<Vec<usize>>,
    pub profiles: Vec<MerchantProfile>,
    pub report: RunReport,
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct ResolutionPipeline {
    config: ResolutionConfig,
    scorer: SimilarityScorer,
}

impl ResolutionPipeline {
    /// Validate the config and prepare the scorer
    pub fn new(config: ResolutionConfig) -> Result<Self, ResolveError> {
        config.validate()?;
        let scorer = SimilarityScorer::new(&config);
        Ok(ResolutionPipeline { config, scorer })
    }

    pub fn config(&self) -> &ResolutionConfig {
        &self.config
    }

    pub fn scorer(&self) -> &SimilarityScorer {
        &self.scorer
    }

    pub fn run(&self, records: &[RawParcelRecord]) -> Result<Resolution, ResolveError> {
        self.run_with_cancel(records, &CancelFlag::new())
    }

    pub fn run_with_cancel(
        &self,
        records: &[RawParcelRecord],
        cancel: &CancelFlag,
    ) -> Result<Resolution, ResolveError> {
        let started_at = Utc::now();

        // 1. Candidate grouping
        let (groups, grouping) = group_candidates(records);

        // 2-3. Pairwise scoring + graph assembly (parallel over groups)
        let builder = GraphBuilder::new(&self.scorer, cancel);
        let (graph, graph_stats) = match self.config.worker_threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| ResolveError::ThreadPool { message: e.to_string() })?;
                pool.install(|| builder.build(records, &groups))?
            }
            None => builder.build(records, &groups)?,
        };

        // 4. Threshold + connected components
        let (components, clusters) = extract_components(&graph, self.config.threshold);

        // 5. Profile merge
        let (profiles, merge) = merge_components(records, &components);

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            threshold: self.config.threshold,
            input_records: records.len(),
            grouping,
            graph: graph_stats,
            clusters,
            merge,
        };

        Ok(Resolution {
            groups,
            graph,
            components,
            profiles,
            report,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
