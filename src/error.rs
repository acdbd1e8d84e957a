// 🧯 Error Types - Source-scoped failures
// Fetch and parse failures are recovered at the source boundary by the aggregator.

use thiserror::Error;

use crate::parser::SourceType;

/// Errors raised while fetching or parsing catalog sources, or reading settings.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not fetch {source_type} catalog from '{location}': {reason}")]
    SourceFetch {
        source_type: SourceType,
        location: String,
        reason: String,
    },
    #[error("could not parse {source_type} catalog: {reason}")]
    SourceParse {
        source_type: SourceType,
        reason: String,
    },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("unknown dataset '{0}' (expected all, Kepler, K2 or TESS)")]
    UnknownDataset(String),
}

impl CatalogError {
    /// Source this error is scoped to, if any.
    pub fn source_type(&self) -> Option<SourceType> {
        match self {
            CatalogError::SourceFetch { source_type, .. }
            | CatalogError::SourceParse { source_type, .. } => Some(*source_type),
            CatalogError::Config(_) | CatalogError::UnknownDataset(_) => None,
        }
    }
}
