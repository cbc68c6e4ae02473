// 👥 Candidate Grouper - records sharing a normalized tenant name
//
// Filters, in order:
// 1. no usable name              → record dropped (nothing to corroborate)
// 2. name appears only once      → group dropped
// 3. no recognized shop in group → group dropped before any scoring

use crate::entities::RawParcelRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Records of one tenant, as indices into the input slice (register order)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantGroup {
    pub name: String,
    pub members: Vec<usize>,
}

impl TenantGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingStats {
    pub records_without_name: usize,
    pub singleton_names: usize,
    pub groups_without_shop: usize,
    pub groups_kept: usize,
}

/// Group candidate records by normalized tenant name.
///
/// Groups come out in order of first appearance, members in register order,
/// so the result is identical across runs on the same input.
pub fn group_candidates(records: &[RawParcelRecord]) -> (Vec<TenantGroup>, GroupingStats) {
    let mut stats = GroupingStats::default();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<TenantGroup> = Vec::new();

    for (i, record) in records.iter().enumerate() {
        let Some(name) = record.normalized_name() else {
            stats.records_without_name += 1;
            continue;
        };

        match index.get(name) {
            Some(&g) => groups[g].members.push(i),
            None => {
                index.insert(name, groups.len());
                groups.push(TenantGroup {
                    name: name.to_string(),
                    members: vec![i],
                });
            }
        }
    }

    let kept: Vec<TenantGroup> = groups
        .into_iter()
        .filter(|group| {
            if group.len() < 2 {
                stats.singleton_names += 1;
                return false;
            }
            if !group.members.iter().any(|&i| records[i].is_recognized_shop()) {
                debug!(tenant = %group.name, size = group.len(), "dropping tenant group without a shop");
                stats.groups_without_shop += 1;
                return false;
            }
            true
        })
        .collect();

    stats.groups_kept = kept.len();
    (kept, stats)
}

// ============================================================================
// TESTS
// ============================================================================
