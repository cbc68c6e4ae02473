// ⚠️ Error types - ingestion, configuration and engine failures
//
// Non-resolvable input (no name, no duplicate, no shop, no geometry) is NOT an
// error: those records are skipped and counted in the RunReport. Only
// structurally invalid input and invalid configuration surface here.

use thiserror::Error;

// ============================================================================
// SCHEMA ERRORS (fail fast at ingestion)
// ============================================================================

/// Structural violation found while turning register rows into records.
///
/// `row` is the 1-based data row (header excluded).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("row {row}: malformed register row: {message}")]
    MalformedRow { row: usize, message: String },

    #[error("row {row}: missing record identifier")]
    MissingIdentifier { row: usize },

    #[error("duplicate record identifier '{id}'")]
    DuplicateIdentifier { id: String },

    #[error("row {row}: field '{field}' is not a finite number: '{value}'")]
    InvalidCoordinate {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("row {row}: geometry has only one of lat/lng")]
    PartialGeometry { row: usize },

    #[error("row {row}: coordinate ({lat}, {lng}) is outside the geographic range")]
    CoordinateOutOfRange { row: usize, lat: f64, lng: f64 },
}

// ============================================================================
// CONFIG ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

// ============================================================================
// ENGINE ERRORS
// ============================================================================

/// Top-level error returned by the resolution pipeline.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("schema violation: {0}")]
    Schema(#[from] SchemaError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("resolution cancelled after {groups_done} of {groups_total} tenant groups")]
    Cancelled {
        groups_done: usize,
        groups_total: usize,
    },

    #[error("failed to build worker pool: {message}")]
    ThreadPool { message: String },
}
