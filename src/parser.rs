// 🏗️ Row Parser - Catalog text → field maps
// One parser for every mission: the column vocabulary lives in schema.rs

use crate::error::CatalogError;
use csv::{ReaderBuilder, Trim};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CORE TYPES
// ============================================================================

/// SourceType - Which survey catalog a row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceType {
    /// Kepler cumulative KOI table (long-baseline survey)
    Kepler,
    /// K2 planets and candidates (extended mission)
    K2,
    /// TESS objects of interest (wide-field survey)
    #[serde(rename = "TESS")]
    Tess,
}

impl SourceType {
    /// Every known source, in default processing order
    pub const ALL: [SourceType; 3] = [SourceType::Kepler, SourceType::K2, SourceType::Tess];

    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            SourceType::Kepler => "Kepler",
            SourceType::K2 => "K2",
            SourceType::Tess => "TESS",
        }
    }

    /// Short code, used for environment variable names
    pub fn code(&self) -> &'static str {
        match self {
            SourceType::Kepler => "KEPLER",
            SourceType::K2 => "K2",
            SourceType::Tess => "TESS",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SourceType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceType::ALL
            .into_iter()
            .find(|source| source.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CatalogError::Config(format!("unknown catalog source: {s}")))
    }
}

/// One data row: native column name → cell text (trimmed)
pub type FieldMap = BTreeMap<String, String>;

// ============================================================================
// ROW PARSING
// ============================================================================

/// Comment lines start with `#` once leading whitespace is ignored.
fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Parse raw catalog text into one field map per data row, in source order.
///
/// Comment and blank lines outside quoted cells are dropped first; the first remaining line is the
/// header. Short rows simply lack the trailing columns and long rows lose their
/// extra cells. Rows are never rejected here, that is the validator's job.
pub fn parse_rows(source_type: SourceType, text: &str) -> Result<Vec<FieldMap>, CatalogError> {
    // Lines inside a quoted multi-line cell are cell content, never comments
    let mut kept = Vec::new();
    let mut in_quotes = false;
    for line in text.lines() {
        if !in_quotes && is_skippable(line) {
            continue;
        }
        kept.push(line);
        if line.matches('"').count() % 2 == 1 {
            in_quotes = !in_quotes;
        }
    }
    let body = kept.join("\n");

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|err| CatalogError::SourceParse {
            source_type,
            reason: format!("failed reading header row: {err}"),
        })?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(CatalogError::SourceParse {
            source_type,
            reason: "no header row found".to_string(),
        });
    }

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                debug!("{source_type}: skipping unreadable data row {}: {err}", idx + 1);
                continue;
            }
        };

        let mut fields = FieldMap::new();
        for (header, value) in headers.iter().zip(record.iter()) {
            fields
                .entry(header.clone())
                .or_insert_with(|| value.to_string());
        }
        rows.push(fields);
    }

    Ok(rows)
}

// ============================================================================
// SOURCE DETECTION
// ============================================================================

/// The part of a location that names the catalog: the table of an archive
/// TAP query (`...from+k2pandc...`), else the last path segment.
fn catalog_name(location: &str) -> String {
    let lower = location.trim().to_lowercase().replace("%20", "+");

    if let Some((_, query)) = lower.split_once('?') {
        let mut words = query.split(|c: char| !c.is_ascii_alphanumeric() && c != '_');
        while let Some(word) = words.next() {
            if word == "from" {
                if let Some(table) = words.find(|w| !w.is_empty()) {
                    return table.to_string();
                }
            }
        }
    }

    let path = lower.split(['?', '#']).next().unwrap_or("");
    path.trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .to_string()
}

/// Keyword match on whole tokens; `k2` and `kepler` also match as a prefix
/// (`k2pandc`, `keplerstellar`).
fn has_token(tokens: &[&str], keyword: &str, prefix: bool) -> bool {
    tokens
        .iter()
        .any(|token| *token == keyword || (prefix && token.starts_with(keyword)))
}

/// Detect source type from a file name or URL
///
/// Only the catalog's own name is inspected, never its directories.
///
/// # Examples:
/// ```
/// use transit_catalog::{detect_source, SourceType};
/// assert_eq!(detect_source("data/toi_2024.csv").unwrap(), SourceType::Tess);
/// assert_eq!(detect_source("k2pandc.csv").unwrap(), SourceType::K2);
/// assert_eq!(detect_source("/home/antoine/cumulative_koi.csv").unwrap(), SourceType::Kepler);
/// ```
pub fn detect_source(location: &str) -> Result<SourceType, CatalogError> {
    let name = catalog_name(location);
    let tokens: Vec<&str> = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    if has_token(&tokens, "tess", false) || has_token(&tokens, "toi", false) {
        return Ok(SourceType::Tess);
    }

    if has_token(&tokens, "k2", true) {
        return Ok(SourceType::K2);
    }

    if has_token(&tokens, "kepler", true)
        || has_token(&tokens, "koi", false)
        || has_token(&tokens, "cumulative", false)
    {
        return Ok(SourceType::Kepler);
    }

    Err(CatalogError::Config(format!(
        "could not detect catalog source from location: {location}"
    )))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_type_names() {
        assert_eq!(SourceType::Kepler.name(), "Kepler");
        assert_eq!(SourceType::K2.name(), "K2");
        assert_eq!(SourceType::Tess.name(), "TESS");
        assert_eq!(SourceType::Tess.to_string(), "TESS");
    }

    #[test]
    fn test_source_type_from_str_case_insensitive() {
        assert_eq!("kepler".parse::<SourceType>().unwrap(), SourceType::Kepler);
        assert_eq!(" k2 ".parse::<SourceType>().unwrap(), SourceType::K2);
        assert_eq!("Tess".parse::<SourceType>().unwrap(), SourceType::Tess);
        assert!("gaia".parse::<SourceType>().is_err());
    }

    #[test]
    fn test_source_type_serde_names() {
        let json = serde_json::to_string(&SourceType::ALL).unwrap();
        assert_eq!(json, r#"["Kepler","K2","TESS"]"#);
    }

    #[test]
    fn test_parse_rows_drops_comments_and_blank_lines() {
        let text = concat!(
            "# This file was produced by the archive\n",
            "#   COLUMN koi_period: Orbital Period [days]\n",
            "\n",
            "kepid,koi_period,koi_prad\n",
            "   \n",
            "10797460,9.488,2.26\n",
            "    # indented comment\n",
            "10811496,19.899,14.6\n",
        );

        let rows = parse_rows(SourceType::Kepler, text).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["kepid"], "10797460");
        assert_eq!(rows[0]["koi_period"], "9.488");
        assert_eq!(rows[1]["koi_prad"], "14.6");
    }

    #[test]
    fn test_parse_rows_tolerates_ragged_rows() {
        let text = "pl_name,pl_orbper,pl_rade,pl_eqt\n\
                    K2-18 b,32.9\n\
                    K2-72 e,24.2,0.86,290,extra\n";

        let rows = parse_rows(SourceType::K2, text).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["pl_orbper"], "32.9");
        assert!(rows[0].get("pl_rade").is_none());
        assert!(rows[0].get("pl_eqt").is_none());
        assert_eq!(rows[1]["pl_eqt"], "290");
        assert_eq!(rows[1].len(), 4);
    }

    #[test]
    fn test_parse_rows_trims_cells_and_keeps_quoted_commas() {
        let text = "pl_name , hostname\n\"Kepler-62 f\",\"Kepler-62, A\"\n  K2-3 d  , K2-3 \n";

        let rows = parse_rows(SourceType::K2, text).unwrap();

        assert_eq!(rows[0]["pl_name"], "Kepler-62 f");
        assert_eq!(rows[0]["hostname"], "Kepler-62, A");
        assert_eq!(rows[1]["pl_name"], "K2-3 d");
        assert_eq!(rows[1]["hostname"], "K2-3");
    }

    #[test]
    fn test_parse_rows_keeps_comment_like_lines_inside_quotes() {
        let text = concat!(
            "# archive banner\n",
            "toi,comment,pl_orbper\n",
            "700.04,\"first line\n",
            "\n",
            "# not a comment\n",
            "last line\",37.4\n",
            "# trailing comment\n",
            "1452.01,\"say \"\"hi\"\"\",11.1\n",
        );

        let rows = parse_rows(SourceType::Tess, text).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["comment"], "first line\n\n# not a comment\nlast line");
        assert_eq!(rows[0]["pl_orbper"], "37.4");
        assert_eq!(rows[1]["comment"], "say \"hi\"");
        assert_eq!(rows[1]["pl_orbper"], "11.1");
    }

    #[test]
    fn test_parse_rows_header_only() {
        let rows = parse_rows(SourceType::Tess, "toi,tid,pl_orbper\n").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_parse_rows_without_header_is_error() {
        let result = parse_rows(SourceType::Tess, "# only comments\n\n");
        assert!(matches!(
            result,
            Err(CatalogError::SourceParse { source_type: SourceType::Tess, .. })
        ));
    }

    #[test]
    fn test_detect_source() {
        assert_eq!(detect_source("tess_toi.csv").unwrap(), SourceType::Tess);
        assert_eq!(detect_source("K2_candidates.csv").unwrap(), SourceType::K2);
        assert_eq!(detect_source("kepler_koi.csv").unwrap(), SourceType::Kepler);
        assert_eq!(
            detect_source("https://host/TAP/sync?query=select+*+from+cumulative").unwrap(),
            SourceType::Kepler
        );
        assert!(detect_source("gaia_dr3.csv").is_err());
    }

    #[test]
    fn test_detect_source_ignores_directories() {
        assert_eq!(
            detect_source("/home/antoine/data/koi_cumulative.csv").unwrap(),
            SourceType::Kepler
        );
        assert_eq!(detect_source("/srv/tess_mirror/k2pandc.csv").unwrap(), SourceType::K2);
        assert_eq!(detect_source("/data/k2/toi.csv").unwrap(), SourceType::Tess);
        assert_eq!(detect_source("C:\\k2\\Kepler_KOI.csv").unwrap(), SourceType::Kepler);
        assert!(detect_source("/home/toi/k2/planets.csv").is_err());
    }

    #[test]
    fn test_detect_source_on_token_boundaries() {
        // "toi" inside another word is not a TESS marker
        assert!(detect_source("tortoise.csv").is_err());
        assert_eq!(detect_source("koi-table.csv").unwrap(), SourceType::Kepler);
        assert_eq!(
            detect_source("https://exoplanetarchive.ipac.caltech.edu/TAP/sync?query=select+*+from+toi&format=csv")
                .unwrap(),
            SourceType::Tess
        );
        assert_eq!(
            detect_source("https://host/tess/sync?query=select%20*%20from%20k2pandc").unwrap(),
            SourceType::K2
        );
    }
}
