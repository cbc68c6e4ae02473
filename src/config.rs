// ⚙️ Resolution Config - every tunable constant of the engine, as data
//
// Loaded from JSON (missing keys fall back to the defaults below), then
// validated once before the pipeline touches any record.

use crate::error::ConfigError;
use crate::geo::CoordinateSystem;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Distance (m) at which the distance decay halves the score
pub const DEFAULT_DISTANCE_SCALE_M: f64 = 500.0;
pub const DEFAULT_PARISH_MISMATCH_FACTOR: f64 = 0.8;
pub const DEFAULT_SESTIERE_MISMATCH_FACTOR: f64 = 0.5;
/// Shop types differ, categories match
pub const DEFAULT_SHOP_TYPE_MISMATCH_FACTOR: f64 = 0.8;
/// Shop types and categories both differ
pub const DEFAULT_SHOP_TYPE_AND_CATEGORY_MISMATCH_FACTOR: f64 = 0.5;
/// Edges with weight below this are removed before clustering
pub const DEFAULT_THRESHOLD: f64 = 0.5;

// ============================================================================
// RESOLUTION CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Distance normalization: score *= 1 / (1 + d / distance_scale_m)
    pub distance_scale_m: f64,

    /// Multiplier when both parishes are known and differ
    pub parish_mismatch_factor: f64,

    /// Multiplier when both sestieri are known and differ
    pub sestiere_mismatch_factor: f64,

    /// SHOP/SHOP: standardized types differ, categories match
    pub shop_type_mismatch_factor: f64,

    /// SHOP/SHOP: standardized types and categories both differ
    pub shop_type_and_category_mismatch_factor: f64,

    /// Minimum edge weight kept by the cluster extractor
    pub threshold: f64,

    /// Force HOUSE/HOUSE pairs to weight 0 (one household per tenant)
    pub separate_households: bool,

    /// How record coordinates are interpreted
    pub coordinate_system: CoordinateSystem,

    /// Worker threads for pairwise scoring (None = rayon default)
    pub worker_threads: Option<usize>,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        ResolutionConfig {
            distance_scale_m: DEFAULT_DISTANCE_SCALE_M,
            parish_mismatch_factor: DEFAULT_PARISH_MISMATCH_FACTOR,
            sestiere_mismatch_factor: DEFAULT_SESTIERE_MISMATCH_FACTOR,
            shop_type_mismatch_factor: DEFAULT_SHOP_TYPE_MISMATCH_FACTOR,
            shop_type_and_category_mismatch_factor: DEFAULT_SHOP_TYPE_AND_CATEGORY_MISMATCH_FACTOR,
            threshold: DEFAULT_THRESHOLD,
            separate_households: true,
            coordinate_system: CoordinateSystem::Geographic,
            worker_threads: None,
        }
    }
}

impl ResolutionConfig {
    /// Load config from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: ResolutionConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        Ok(config)
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_coordinate_system(mut self, coordinate_system: CoordinateSystem) -> Self {
        self.coordinate_system = coordinate_system;
        self
    }

    /// Check every value is inside its domain
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.distance_scale_m.is_finite() || self.distance_scale_m <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "distance_scale_m",
                reason: format!("must be a positive finite number, got {}", self.distance_scale_m),
            });
        }

        let factors = [
            ("parish_mismatch_factor", self.parish_mismatch_factor),
            ("sestiere_mismatch_factor", self.sestiere_mismatch_factor),
            ("shop_type_mismatch_factor", self.shop_type_mismatch_factor),
            (
                "shop_type_and_category_mismatch_factor",
                self.shop_type_and_category_mismatch_factor,
            ),
        ];
        for (field, value) in factors {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be within [0, 1], got {}", value),
                });
            }
        }

        // threshold may exceed 1.0 (forces all singletons) but must be a real number
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "threshold",
                reason: format!("must be a non-negative finite number, got {}", self.threshold),
            });
        }

        if self.worker_threads == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "worker_threads",
                reason: "must be at least 1 when set".to_string(),
            });
        }

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
