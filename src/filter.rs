// 🔎 Filter Engine - Dataset + range predicates over the catalog
//
// Pure selection: the catalog is borrowed, never modified, and the result keeps
// the catalog's order. Every active predicate must pass (strict AND).

use crate::error::CatalogError;
use crate::parser::SourceType;
use crate::record::CanonicalRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// DATASET SELECTOR
// ============================================================================

/// `all` or one specific mission. Serialized as `"all"` / `"Kepler"` / ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DatasetSelector {
    #[default]
    All,
    Only(SourceType),
}

impl DatasetSelector {
    pub fn matches(&self, source: SourceType) -> bool {
        match self {
            DatasetSelector::All => true,
            DatasetSelector::Only(wanted) => *wanted == source,
        }
    }
}

impl FromStr for DatasetSelector {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(DatasetSelector::All);
        }
        trimmed
            .parse::<SourceType>()
            .map(DatasetSelector::Only)
            .map_err(|_| CatalogError::UnknownDataset(trimmed.to_string()))
    }
}

impl TryFrom<String> for DatasetSelector {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DatasetSelector> for String {
    fn from(selector: DatasetSelector) -> Self {
        selector.to_string()
    }
}

impl fmt::Display for DatasetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetSelector::All => f.write_str("all"),
            DatasetSelector::Only(source) => f.write_str(source.name()),
        }
    }
}

// ============================================================================
// BOUNDS
// ============================================================================

/// Parse one user-typed bound. Blank, garbage and non-finite input all mean
/// "no bound"; they never turn into 0.
pub fn parse_bound(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Inclusive `[min, max]`; a missing side is unconstrained
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Bounds {
    /// Non-finite bounds are dropped
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Bounds {
            min: min.filter(|v| v.is_finite()),
            max: max.filter(|v| v.is_finite()),
        }
    }

    pub fn unbounded() -> Self {
        Bounds::default()
    }

    pub fn at_least(min: f64) -> Self {
        Bounds::new(Some(min), None)
    }

    pub fn at_most(max: f64) -> Self {
        Bounds::new(None, Some(max))
    }

    pub fn between(min: f64, max: f64) -> Self {
        Bounds::new(Some(min), Some(max))
    }

    /// From raw text inputs, see [`parse_bound`]
    pub fn parse(min: &str, max: &str) -> Self {
        Bounds::new(parse_bound(min), parse_bound(max))
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, value: f64) -> bool {
        let above_min = match self.min {
            Some(min) => value >= min,
            None => true,
        };
        let below_max = match self.max {
            Some(max) => value <= max,
            None => true,
        };
        above_min && below_max
    }
}

// ============================================================================
// FILTER SPEC
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub dataset: DatasetSelector,
    #[serde(default)]
    pub radius: Bounds,
    #[serde(default)]
    pub period: Bounds,
    #[serde(default)]
    pub equilibrium_temp: Bounds,
}

impl FilterSpec {
    /// Matches everything
    pub fn all() -> Self {
        FilterSpec::default()
    }

    pub fn with_dataset(mut self, dataset: DatasetSelector) -> Self {
        self.dataset = dataset;
        self
    }

    pub fn with_radius(mut self, bounds: Bounds) -> Self {
        self.radius = bounds;
        self
    }

    pub fn with_period(mut self, bounds: Bounds) -> Self {
        self.period = bounds;
        self
    }

    pub fn with_equilibrium_temp(mut self, bounds: Bounds) -> Self {
        self.equilibrium_temp = bounds;
        self
    }

    /// True when the spec cannot exclude anything
    pub fn is_identity(&self) -> bool {
        self.dataset == DatasetSelector::All
            && self.radius.is_unbounded()
            && self.period.is_unbounded()
            && self.equilibrium_temp.is_unbounded()
    }

    pub fn matches(&self, record: &CanonicalRecord) -> bool {
        self.dataset.matches(record.source)
            && self.radius.contains(record.radius)
            && self.period.contains(record.period)
            && self.equilibrium_temp.contains(record.equilibrium_temp)
    }
}

/// Select the records matching `spec`, in catalog order.
pub fn filter_catalog<'a>(records: &'a [CanonicalRecord], spec: &FilterSpec) -> Vec<&'a CanonicalRecord> {
    records.iter().filter(|record| spec.matches(record)).collect()
}

// ============================================================================
// RAW QUERY (form / query-string input)
// ============================================================================

/// Filter inputs as typed by a user: every bound is free text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FilterQuery {
    pub dataset: Option<String>,
    pub min_radius: Option<String>,
    pub max_radius: Option<String>,
    pub min_period: Option<String>,
    pub max_period: Option<String>,
    pub min_temp: Option<String>,
    pub max_temp: Option<String>,
}

impl FilterQuery {
    /// Bounds never fail (bad text = no bound); only an unknown dataset does.
    pub fn to_spec(&self) -> Result<FilterSpec, CatalogError> {
        let text = |value: &Option<String>| value.as_deref().unwrap_or("").to_string();

        let dataset = match &self.dataset {
            Some(name) => name.parse()?,
            None => DatasetSelector::All,
        };

        Ok(FilterSpec {
            dataset,
            radius: Bounds::parse(&text(&self.min_radius), &text(&self.max_radius)),
            period: Bounds::parse(&text(&self.min_period), &text(&self.max_period)),
            equilibrium_temp: Bounds::parse(&text(&self.min_temp), &text(&self.max_temp)),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
