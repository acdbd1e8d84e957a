// 🌐 Catalog Fetching - Where raw catalog text comes from
// Local files or http(s) endpoints; both read on tokio's blocking pool.

use crate::error::CatalogError;
use crate::parser::SourceType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Catalog bodies above this size are refused
const MAX_BODY_BYTES: u64 = 256 * 1024 * 1024;

// ============================================================================
// LOCATION
// ============================================================================

/// Where one catalog lives. Serialized as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceLocation {
    File(PathBuf),
    Url(String),
}

impl SourceLocation {
    /// `http://` / `https://` → URL, anything else → file path
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            SourceLocation::Url(trimmed.to_string())
        } else {
            SourceLocation::File(PathBuf::from(trimmed))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, SourceLocation::Url(_))
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::File(path) => write!(f, "{}", path.display()),
            SourceLocation::Url(url) => f.write_str(url),
        }
    }
}

impl From<String> for SourceLocation {
    fn from(location: String) -> Self {
        SourceLocation::parse(&location)
    }
}

impl From<&str> for SourceLocation {
    fn from(location: &str) -> Self {
        SourceLocation::parse(location)
    }
}

impl From<SourceLocation> for String {
    fn from(location: SourceLocation) -> Self {
        location.to_string()
    }
}

// ============================================================================
// FETCHERS
// ============================================================================

/// CatalogFetcher - Retrieves raw catalog text for one source
///
/// Implementations block; the aggregator calls them from
/// `tokio::task::spawn_blocking`.
pub trait CatalogFetcher: Send + Sync {
    fn fetch(&self, source_type: SourceType, location: &SourceLocation) -> Result<String, CatalogError>;
}

fn fetch_error(source_type: SourceType, location: &SourceLocation, reason: String) -> CatalogError {
    CatalogError::SourceFetch {
        source_type,
        location: location.to_string(),
        reason,
    }
}

/// Reads files from disk and URLs over HTTP
pub struct DefaultFetcher {
    agent: ureq::Agent,
}

impl DefaultFetcher {
    pub fn new(timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        DefaultFetcher { agent }
    }
}

impl Default for DefaultFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl CatalogFetcher for DefaultFetcher {
    fn fetch(&self, source_type: SourceType, location: &SourceLocation) -> Result<String, CatalogError> {
        match location {
            SourceLocation::File(path) => std::fs::read_to_string(path)
                .map_err(|err| fetch_error(source_type, location, err.to_string())),
            SourceLocation::Url(url) => {
                // Non-2xx statuses surface as errors from call()
                let mut response = self
                    .agent
                    .get(url)
                    .call()
                    .map_err(|err| fetch_error(source_type, location, format!("request failed: {err}")))?;

                response
                    .body_mut()
                    .with_config()
                    .limit(MAX_BODY_BYTES)
                    .read_to_string()
                    .map_err(|err| {
                        fetch_error(source_type, location, format!("failed reading response body: {err}"))
                    })
            }
        }
    }
}

/// Serves catalog text from memory, keyed by location string.
/// Handy for tests and for embedding pre-downloaded catalogs.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    bodies: HashMap<String, Result<String, String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: `location` answers with `body`
    pub fn with_body(mut self, location: impl Into<String>, body: impl Into<String>) -> Self {
        self.bodies.insert(location.into(), Ok(body.into()));
        self
    }

    /// Builder: `location` fails with `reason`
    pub fn with_failure(mut self, location: impl Into<String>, reason: impl Into<String>) -> Self {
        self.bodies.insert(location.into(), Err(reason.into()));
        self
    }
}

impl CatalogFetcher for StaticFetcher {
    fn fetch(&self, source_type: SourceType, location: &SourceLocation) -> Result<String, CatalogError> {
        match self.bodies.get(&location.to_string()) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(reason)) => Err(fetch_error(source_type, location, reason.clone())),
            None => Err(fetch_error(source_type, location, "not found".to_string())),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
