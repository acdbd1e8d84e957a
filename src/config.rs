// ⚙️ Configuration - Which catalogs to load and how to serve them
//
// Resolution: explicit path → TRANSIT_CATALOG_CONFIG → built-in archive URLs.
// TRANSIT_CATALOG_<CODE>_URL then replaces a single source's location.

use crate::catalog::CatalogSource;
use crate::error::CatalogError;
use crate::fetch::SourceLocation;
use crate::parser::{detect_source, SourceType};
use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "TRANSIT_CATALOG_CONFIG";

const ARCHIVE_TAP: &str = "https://exoplanetarchive.ipac.caltech.edu/TAP/sync";

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

/// Env var that overrides one source's location, e.g. `TRANSIT_CATALOG_TESS_URL`
pub fn location_env_var(source: SourceType) -> String {
    format!("TRANSIT_CATALOG_{}_URL", source.code())
}

/// NASA Exoplanet Archive TAP query for a mission's table, as CSV
pub fn archive_url(source: SourceType) -> String {
    let table = match source {
        SourceType::Kepler => "cumulative",
        SourceType::K2 => "k2pandc",
        SourceType::Tess => "toi",
    };
    format!("{ARCHIVE_TAP}?query=select+*+from+{table}&format=csv")
}

/// A `sources` entry as written in the file; `source` may be left out
/// when the location makes it obvious (e.g. `data/koi.csv`).
#[derive(Debug, Deserialize)]
struct SourceEntry {
    #[serde(default)]
    source: Option<SourceType>,
    location: String,
}

impl SourceEntry {
    fn into_source(self) -> Result<CatalogSource, CatalogError> {
        let source = match self.source {
            Some(source) => source,
            None => detect_source(&self.location)?,
        };
        Ok(CatalogSource::new(source, self.location))
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    sources: Vec<SourceEntry>,
    #[serde(default = "default_bind_addr")]
    bind_addr: String,
    #[serde(default = "default_http_timeout_secs")]
    http_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogConfig {
    pub sources: Vec<CatalogSource>,
    pub bind_addr: String,
    pub http_timeout_secs: u64,
}

impl Default for CatalogConfig {
    /// The three archive tables, in Kepler, K2, TESS order
    fn default() -> Self {
        CatalogConfig {
            sources: SourceType::ALL
                .iter()
                .map(|&source| CatalogSource::new(source, archive_url(source)))
                .collect(),
            bind_addr: default_bind_addr(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl CatalogConfig {
    /// Parse and validate a JSON config document
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: ConfigFile = serde_json::from_str(json)
            .map_err(|err| CatalogError::Config(format!("invalid config JSON: {err}")))?;

        let sources = file
            .sources
            .into_iter()
            .map(SourceEntry::into_source)
            .collect::<Result<Vec<_>, _>>()?;

        let config = CatalogConfig {
            sources,
            bind_addr: file.bind_addr,
            http_timeout_secs: file.http_timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        CatalogConfig::from_json(&content)
            .with_context(|| format!("Failed to load config file: {:?}", path.as_ref()))
    }

    /// Explicit path, else `TRANSIT_CATALOG_CONFIG`, else defaults; then env overrides.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));

        let mut config = match path {
            Some(path) => {
                info!("Loading catalog config from {}", path.display());
                CatalogConfig::from_file(&path)?
            }
            None => CatalogConfig::default(),
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Replace source locations from `lookup(TRANSIT_CATALOG_<CODE>_URL)`.
    /// Sources not in the list are left alone.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for entry in &mut self.sources {
            let var = location_env_var(entry.source);
            if let Some(location) = lookup(&var).filter(|value| !value.trim().is_empty()) {
                info!("{} location overridden by {}", entry.source, var);
                entry.location = SourceLocation::parse(&location);
            }
        }
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.sources.is_empty() {
            return Err(CatalogError::Config("no catalog sources configured".to_string()));
        }

        let mut seen = HashSet::new();
        for entry in &self.sources {
            if !seen.insert(entry.source) {
                return Err(CatalogError::Config(format!(
                    "source {} is configured more than once",
                    entry.source
                )));
            }
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config_covers_every_mission() {
        let config = CatalogConfig::default();

        let order: Vec<SourceType> = config.sources.iter().map(|s| s.source).collect();
        assert_eq!(order, vec![SourceType::Kepler, SourceType::K2, SourceType::Tess]);
        assert!(config.sources.iter().all(|s| s.location.is_remote()));
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.http_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_archive_url_tables() {
        assert!(archive_url(SourceType::Kepler).contains("from+cumulative"));
        assert!(archive_url(SourceType::K2).contains("from+k2pandc"));
        assert!(archive_url(SourceType::Tess).contains("from+toi&format=csv"));
    }

    #[test]
    fn test_from_json_with_inferred_sources() {
        let config = CatalogConfig::from_json(
            r#"{
                "sources": [
                    {"location": "data/koi_cumulative.csv"},
                    {"source": "K2", "location": "data/planets.csv"},
                    {"location": "https://example.org/toi.csv"}
                ],
                "http_timeout_secs": 5
            }"#,
        )
        .unwrap();

        assert_eq!(config.sources[0].source, SourceType::Kepler);
        assert_eq!(config.sources[1].source, SourceType::K2);
        assert_eq!(config.sources[2].source, SourceType::Tess);
        assert!(config.sources[2].location.is_remote());
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.http_timeout_secs, 5);
    }

    #[test]
    fn test_undetectable_source_is_config_error() {
        let err = CatalogConfig::from_json(r#"{"sources": [{"location": "data/planets.csv"}]}"#).unwrap_err();
        assert!(matches!(err, CatalogError::Config(_)));
    }

    #[test]
    fn test_duplicate_and_empty_sources_rejected() {
        let dup = CatalogConfig::from_json(
            r#"{"sources": [{"source": "TESS", "location": "a.csv"}, {"source": "TESS", "location": "b.csv"}]}"#,
        );
        assert!(dup.unwrap_err().to_string().contains("more than once"));

        let empty = CatalogConfig::from_json(r#"{"sources": []}"#);
        assert!(empty.unwrap_err().to_string().contains("no catalog sources"));
    }

    #[test]
    fn test_env_style_overrides() {
        let mut config = CatalogConfig::default();
        let vars: HashMap<String, String> = [
            ("TRANSIT_CATALOG_TESS_URL".to_string(), "/tmp/toi.csv".to_string()),
            ("TRANSIT_CATALOG_K2_URL".to_string(), "  ".to_string()),
        ]
        .into_iter()
        .collect();

        config.apply_overrides(|name| vars.get(name).cloned());

        assert_eq!(config.sources[2].location, SourceLocation::parse("/tmp/toi.csv"));
        assert!(config.sources[1].location.is_remote());
        assert_eq!(location_env_var(SourceType::Kepler), "TRANSIT_CATALOG_KEPLER_URL");
    }

    #[test]
    fn test_from_file_and_resolve_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"sources": [{{"source": "Kepler", "location": "koi.csv"}}], "bind_addr": "127.0.0.1:8080"}}"#
        )
        .unwrap();

        let config = CatalogConfig::from_file(file.path()).unwrap();
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.bind_addr, "127.0.0.1:8080");

        let resolved = CatalogConfig::resolve(Some(file.path())).unwrap();
        assert_eq!(resolved.sources[0].source, SourceType::Kepler);
    }

    #[test]
    fn test_from_file_missing_reports_path() {
        let err = CatalogConfig::from_file("/no/such/catalog-config.json").unwrap_err();
        assert!(format!("{err:#}").contains("catalog-config.json"));
    }
}
