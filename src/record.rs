// 🪐 Canonical Record - One object, whichever mission reported it

use crate::disposition::Disposition;
use crate::parser::{FieldMap, SourceType};
use serde::{Deserialize, Serialize};

/// CanonicalRecord - The unified, source-independent shape
///
/// `radius`, `period` and `equilibrium_temp` are always finite: the validator
/// refuses to build a record otherwise. `raw` keeps the native row for
/// inspection only and is never consulted again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Dense 1-based id, assigned per aggregation run (0 until assigned)
    pub id: u32,
    pub name: String,
    pub source: SourceType,
    /// Planet radius [Earth radii]
    pub radius: f64,
    /// Orbital period [days]
    pub period: f64,
    /// Equilibrium temperature [K]
    pub equilibrium_temp: f64,
    pub disposition: Disposition,
    #[serde(default, skip_serializing_if = "FieldMap::is_empty")]
    pub raw: FieldMap,
}

impl CanonicalRecord {
    pub fn is_confirmed(&self) -> bool {
        self.disposition == Disposition::Confirmed
    }
}
