// 🔍 Similarity Scorer - pairwise evidence that two records are one person
// Multiplicative heuristic: distance decay × locality penalties × type rule
//
//   score = 1 / (1 + d / scale)
//         × parish_mismatch_factor     (both known, differ)
//         × sestiere_mismatch_factor   (both known, differ)
//   then the parcel-type rule, applied last:
//         HOUSE/HOUSE → 0              (one household per tenant)
//         SHOP/SHOP   → ×0.8 or ×0.5   (type / category mismatch)
//         otherwise   → unchanged

use crate::config::ResolutionConfig;
use crate::entities::{ParcelKind, RawParcelRecord, ShopDetails};
use crate::geo::CoordinateSystem;
use serde::{Deserialize, Serialize};

// ============================================================================
// TYPE RULE
// ============================================================================

/// Which parcel-type interaction fired for a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRule {
    /// Both HOUSE: forced disconnection
    SeparateHouseholds,

    /// Both SHOP, same standardized type
    SameShopType,

    /// Both SHOP, types differ, categories match
    ShopTypeMismatch,

    /// Both SHOP, types and categories differ
    ShopTypeAndCategoryMismatch,

    /// Mixed or OTHER-involving pair
    NoModifier,
}

// ============================================================================
// PAIR SCORE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairScore {
    pub distance_m: f64,
    pub distance_factor: f64,
    pub parish_mismatch: bool,
    pub sestiere_mismatch: bool,
    pub type_rule: TypeRule,

    /// Final edge weight (≥ 0)
    pub weight: f64,
}

// ============================================================================
// SIMILARITY SCORER
// ============================================================================

#[derive(Debug, Clone)]
pub struct SimilarityScorer {
    distance_scale_m: f64,
    parish_mismatch_factor: f64,
    sestiere_mismatch_factor: f64,
    shop_type_mismatch_factor: f64,
    shop_type_and_category_mismatch_factor: f64,
    separate_households: bool,
    coordinate_system: CoordinateSystem,
}

impl SimilarityScorer {
    pub fn new(config: &ResolutionConfig) -> Self {
        SimilarityScorer {
            distance_scale_m: config.distance_scale_m,
            parish_mismatch_factor: config.parish_mismatch_factor,
            sestiere_mismatch_factor: config.sestiere_mismatch_factor,
            shop_type_mismatch_factor: config.shop_type_mismatch_factor,
            shop_type_and_category_mismatch_factor: config.shop_type_and_category_mismatch_factor,
            separate_households: config.separate_households,
            coordinate_system: config.coordinate_system,
        }
    }

    /// Edge weight, or None when either record has no geometry
    pub fn score(&self, a: &RawParcelRecord, b: &RawParcelRecord) -> Option<f64> {
        self.evaluate(a, b).map(|s| s.weight)
    }

    /// Full breakdown of the pair score, or None when either record has no geometry
    pub fn evaluate(&self, a: &RawParcelRecord, b: &RawParcelRecord) -> Option<PairScore> {
        // Fixed argument order keeps score(a, b) == score(b, a) bit-for-bit
        let (a, b) = if a.id() <= b.id() { (a, b) } else { (b, a) };

        let distance_m = self.coordinate_system.distance_m(a.location()?, b.location()?);
        let distance_factor = 1.0 / (1.0 + distance_m / self.distance_scale_m);
        let mut weight = distance_factor;

        let parish_mismatch = known_and_differ(a.parish(), b.parish());
        if parish_mismatch {
            weight *= self.parish_mismatch_factor;
        }

        let sestiere_mismatch = known_and_differ(a.sestiere(), b.sestiere());
        if sestiere_mismatch {
            weight *= self.sestiere_mismatch_factor;
        }

        let type_rule = self.type_rule(a.kind(), b.kind());
        match type_rule {
            TypeRule::SeparateHouseholds => weight = 0.0,
            TypeRule::ShopTypeMismatch => weight *= self.shop_type_mismatch_factor,
            TypeRule::ShopTypeAndCategoryMismatch => {
                weight *= self.shop_type_and_category_mismatch_factor
            }
            TypeRule::SameShopType | TypeRule::NoModifier => {}
        }

        Some(PairScore {
            distance_m,
            distance_factor,
            parish_mismatch,
            sestiere_mismatch,
            type_rule,
            weight,
        })
    }

    fn type_rule(&self, a: &ParcelKind, b: &ParcelKind) -> TypeRule {
        match (a, b) {
            (ParcelKind::House, ParcelKind::House) if self.separate_households => {
                TypeRule::SeparateHouseholds
            }
            (ParcelKind::Shop(a), ParcelKind::Shop(b)) => shop_rule(a, b),
            _ => TypeRule::NoModifier,
        }
    }
}

fn shop_rule(a: &ShopDetails, b: &ShopDetails) -> TypeRule {
    if a.standard_type() == b.standard_type() {
        TypeRule::SameShopType
    } else if a.category == b.category {
        TypeRule::ShopTypeMismatch
    } else {
        TypeRule::ShopTypeAndCategoryMismatch
    }
}

/// Unknown locality is not evidence either way
fn known_and_differ(a: Option<&str>, b: Option<&str>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a != b)
}

// ============================================================================
// TESTS
// ============================================================================
