// ✅ Record Validator - Data quality gate between mapping and the catalog
//
// A row that lacks a finite period, radius or equilibrium temperature never
// reaches the catalog. That is a data-quality filter, not a fault: nothing is
// reported per row, only counted.

use crate::disposition::Disposition;
use crate::parser::SourceType;
use crate::record::CanonicalRecord;
use crate::schema::MappedRecord;
use serde::{Deserialize, Serialize};

// ============================================================================
// VALIDATION
// ============================================================================

/// Required numeric fields a mapped record may be missing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    Period,
    Radius,
    EquilibriumTemp,
}

/// Fields of `mapped` that did not parse to a finite number
pub fn missing_fields(mapped: &MappedRecord) -> Vec<RequiredField> {
    let mut missing = Vec::new();
    if !mapped.period.is_finite() {
        missing.push(RequiredField::Period);
    }
    if !mapped.radius.is_finite() {
        missing.push(RequiredField::Radius);
    }
    if !mapped.equilibrium_temp.is_finite() {
        missing.push(RequiredField::EquilibriumTemp);
    }
    missing
}

/// Promote a mapped record to a canonical one, or drop it.
///
/// The returned record has `id == 0`; ids belong to the aggregator.
pub fn validate_record(mapped: MappedRecord) -> Option<CanonicalRecord> {
    if !missing_fields(&mapped).is_empty() {
        return None;
    }

    Some(CanonicalRecord {
        id: 0,
        disposition: Disposition::normalize(mapped.raw_disposition.as_deref()),
        name: mapped.name,
        source: mapped.source,
        radius: mapped.radius,
        period: mapped.period,
        equilibrium_temp: mapped.equilibrium_temp,
        raw: mapped.raw,
    })
}

// ============================================================================
// PER-SOURCE STATS
// ============================================================================

/// How many rows were missing each required field (a row can count twice)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionCounts {
    pub period: usize,
    pub radius: usize,
    pub equilibrium_temp: usize,
}

impl RejectionCounts {
    pub fn record(&mut self, missing: &[RequiredField]) {
        for field in missing {
            match field {
                RequiredField::Period => self.period += 1,
                RequiredField::Radius => self.radius += 1,
                RequiredField::EquilibriumTemp => self.equilibrium_temp += 1,
            }
        }
    }
}

/// Diagnostics for one source in one aggregation run.
/// Invariant: `rows_read == accepted + rejected`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceStats {
    pub source: SourceType,
    pub rows_read: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub missing: RejectionCounts,
    /// Set when the source failed to fetch or parse
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceStats {
    pub fn new(source: SourceType) -> Self {
        SourceStats {
            source,
            rows_read: 0,
            accepted: 0,
            rejected: 0,
            missing: RejectionCounts::default(),
            error: None,
        }
    }

    pub fn failed(source: SourceType, message: impl Into<String>) -> Self {
        SourceStats {
            error: Some(message.into()),
            ..SourceStats::new(source)
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.rows_read == 0 {
            return 0.0;
        }
        self.accepted as f64 / self.rows_read as f64
    }

    pub fn summary(&self) -> String {
        match &self.error {
            Some(error) => format!("{}: FAILED ({})", self.source, error),
            None => format!(
                "{}: {} rows, {} accepted, {} rejected ({:.1}% kept)",
                self.source,
                self.rows_read,
                self.accepted,
                self.rejected,
                self.acceptance_rate() * 100.0
            ),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
