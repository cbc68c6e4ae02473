// Catastici Merchants - Core Library
// Resolves duplicate-name parcel records of the 1740 Venetian land register
// into canonical merchant profiles. Used by the CLI and by the tests.

pub mod error;
pub mod config;
pub mod geo;
pub mod entities;
pub mod ingest;
pub mod grouping;    // Stage 1: Candidate Grouper
pub mod similarity;  // Stage 2: Similarity Scorer
pub mod graph;       // Stage 3: Graph Builder
pub mod clustering;  // Stage 4: Cluster Extractor
pub mod merge;       // Stage 5: Profile Merger
pub mod pipeline;
pub mod export;

// Re-export commonly used types
pub use error::{ConfigError, ResolveError, SchemaError};
pub use config::ResolutionConfig;
pub use geo::{CoordinateSystem, GeoPoint};
pub use entities::{
    normalize_tenant_name, HomeSource, MerchantProfile, ParcelKind, RawParcelRecord, RecordId,
    ShopDetails, ShopEntry,
};
pub use ingest::{ingest_rows, load_csv, ParcelRow};
pub use grouping::{group_candidates, GroupingStats, TenantGroup};
pub use similarity::{PairScore, SimilarityScorer, TypeRule};
pub use graph::{GraphBuilder, GraphStats, ResolutionGraph, SimilarityEdge};
pub use clustering::{extract_components, ClusterStats};
pub use merge::{merge_component, merge_components, MergeStats};
pub use pipeline::{CancelFlag, Resolution, ResolutionPipeline, RunReport};
pub use export::{
    read_columnar, write_columnar, write_csv, MerchantColumns, MerchantRow, COLUMNAR_FILE_NAME,
    CSV_FILE_NAME,
};
