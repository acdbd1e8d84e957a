// Transit Catalog - Core Library
// Normalizes Kepler / K2 / TESS catalogs into one record list and filters it.
// Exposes all modules for use in CLI, API server, and tests

pub mod error;
pub mod parser;
pub mod schema;         // Per-mission column tables
pub mod disposition;
pub mod record;
pub mod data_quality;   // Required-field gate + per-source stats
pub mod fetch;
pub mod catalog;        // Aggregation, snapshot, store/reload
pub mod filter;
pub mod config;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use error::CatalogError;
pub use parser::{detect_source, parse_rows, FieldMap, SourceType};
pub use schema::{
    parse_number, ColumnTable, MappedRecord, NameField, SchemaRegistry,
    KEPLER_TABLE, K2_TABLE, TESS_TABLE,
};
pub use disposition::Disposition;
pub use record::CanonicalRecord;
pub use data_quality::{missing_fields, validate_record, RejectionCounts, RequiredField, SourceStats};
pub use fetch::{CatalogFetcher, DefaultFetcher, SourceLocation, StaticFetcher};
pub use catalog::{
    aggregate, ingest_source, load_catalog,
    CatalogLoader, CatalogSnapshot, CatalogSource, CatalogStore, ReloadHandle,
};
pub use filter::{filter_catalog, parse_bound, Bounds, DatasetSelector, FilterQuery, FilterSpec};
pub use config::CatalogConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
