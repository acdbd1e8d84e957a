// 📐 Shape Layer - Per-mission column tables
// Each catalog speaks its own column vocabulary; the tables below translate it
// into one record shape. Adding a mission = adding a table, not a branch.

use crate::parser::{FieldMap, SourceType};
use std::collections::HashMap;

// ============================================================================
// COLUMN TABLES
// ============================================================================

/// One candidate column for the display name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameField {
    /// Use the cell as-is
    Column(&'static str),
    /// Use the cell with a fixed prefix (e.g. `"TOI-"` + `toi`)
    Prefixed {
        prefix: &'static str,
        column: &'static str,
    },
}

impl NameField {
    fn resolve(&self, row: &FieldMap) -> Option<String> {
        let (prefix, column) = match self {
            NameField::Column(column) => ("", *column),
            NameField::Prefixed { prefix, column } => (*prefix, *column),
        };
        non_empty(row, column).map(|value| format!("{prefix}{value}"))
    }
}

/// Native column names for one source, in precedence order where several
/// columns may carry the same fact.
#[derive(Debug, Clone)]
pub struct ColumnTable {
    pub source: SourceType,
    pub period: &'static str,
    pub radius: &'static str,
    pub equilibrium_temp: &'static str,
    pub disposition: &'static [&'static str],
    pub name: &'static [NameField],
    /// Used when no name column resolves; never empty
    pub placeholder: &'static str,
}

pub const KEPLER_TABLE: ColumnTable = ColumnTable {
    source: SourceType::Kepler,
    period: "koi_period",
    radius: "koi_prad",
    equilibrium_temp: "koi_teq",
    disposition: &["koi_disposition"],
    name: &[
        NameField::Column("kepler_name"),
        NameField::Column("kepoi_name"),
        NameField::Prefixed {
            prefix: "Kepler-",
            column: "kepid",
        },
    ],
    placeholder: "Kepler-Object",
};

pub const K2_TABLE: ColumnTable = ColumnTable {
    source: SourceType::K2,
    period: "pl_orbper",
    radius: "pl_rade",
    equilibrium_temp: "pl_eqt",
    disposition: &["disposition", "k2c_disp"],
    name: &[NameField::Column("pl_name"), NameField::Column("hostname")],
    placeholder: "K2-Object",
};

pub const TESS_TABLE: ColumnTable = ColumnTable {
    source: SourceType::Tess,
    period: "pl_orbper",
    radius: "pl_rade",
    equilibrium_temp: "pl_eqt",
    disposition: &["tfopwg_disp", "disposition"],
    name: &[
        NameField::Prefixed {
            prefix: "TOI-",
            column: "toi",
        },
        NameField::Prefixed {
            prefix: "TIC ",
            column: "tid",
        },
        NameField::Column("pl_name"),
        NameField::Column("hostname"),
    ],
    placeholder: "TESS-Object",
};

// ============================================================================
// MAPPED RECORD
// ============================================================================

/// A row translated into the unified shape, not yet validated.
/// Numeric fields that were absent or unparsable are NaN.
#[derive(Debug, Clone)]
pub struct MappedRecord {
    pub source: SourceType,
    pub name: String,
    pub period: f64,
    pub radius: f64,
    pub equilibrium_temp: f64,
    pub raw_disposition: Option<String>,
    pub raw: FieldMap,
}

fn non_empty<'a>(row: &'a FieldMap, column: &str) -> Option<&'a str> {
    row.get(column)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

/// Locale-independent decimal parsing; anything unparsable becomes NaN.
pub fn parse_number(value: Option<&str>) -> f64 {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

// ============================================================================
// SCHEMA REGISTRY
// ============================================================================

/// SchemaRegistry - Column tables keyed by source
pub struct SchemaRegistry {
    tables: HashMap<SourceType, ColumnTable>,
}

impl SchemaRegistry {
    /// Registry with the three mission tables
    pub fn new() -> Self {
        Self::empty()
            .with_table(KEPLER_TABLE)
            .with_table(K2_TABLE)
            .with_table(TESS_TABLE)
    }

    /// Registry with no tables; every row is unmappable
    pub fn empty() -> Self {
        SchemaRegistry {
            tables: HashMap::new(),
        }
    }

    /// Builder: register (or replace) the table for `table.source`
    pub fn with_table(mut self, table: ColumnTable) -> Self {
        self.tables.insert(table.source, table);
        self
    }

    pub fn table(&self, source: SourceType) -> Option<&ColumnTable> {
        self.tables.get(&source)
    }

    /// Translate one row. `None` means the source has no table.
    pub fn map_row(&self, source: SourceType, row: FieldMap) -> Option<MappedRecord> {
        let table = self.table(source)?;

        let name = table
            .name
            .iter()
            .find_map(|field| field.resolve(&row))
            .unwrap_or_else(|| table.placeholder.to_string());

        let raw_disposition = table
            .disposition
            .iter()
            .find_map(|column| non_empty(&row, column))
            .map(str::to_string);

        Some(MappedRecord {
            source,
            name,
            period: parse_number(row.get(table.period).map(String::as_str)),
            radius: parse_number(row.get(table.radius).map(String::as_str)),
            equilibrium_temp: parse_number(row.get(table.equilibrium_temp).map(String::as_str)),
            raw_disposition,
            raw: row,
        })
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
