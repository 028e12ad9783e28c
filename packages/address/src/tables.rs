//! Reference tables for directionals, states, street suffixes and
//! secondary unit designators.
//!
//! The default tables live in TOML files under `tables/` and are embedded
//! at compile time via [`include_str!`]. Callers can override any subset
//! of them with their own TOML document; omitted tables keep the defaults.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use serde::Deserialize;
use us_address_models::{ReferenceTables, UnitDesignator};

use crate::AddressError;

// ── Compile-time embedded TOML files ────────────────────────────────

const TABLE_TOMLS: &[(&str, &str)] = &[
    ("directionals", include_str!("../tables/directionals.toml")),
    ("states", include_str!("../tables/states.toml")),
    ("suffixes", include_str!("../tables/suffixes.toml")),
    ("units", include_str!("../tables/units.toml")),
];

static DEFAULT_TABLES: LazyLock<ReferenceTables> = LazyLock::new(|| {
    let mut tables = ReferenceTables::default();
    for (name, toml_str) in TABLE_TOMLS {
        let file: TablesFile = toml::de::from_str(toml_str)
            .unwrap_or_else(|e| panic!("Failed to parse reference table '{name}': {e}"));
        file.apply_to(&mut tables);
    }
    tables
});

/// A partial set of reference tables as written in TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TablesFile {
    directionals: Option<BTreeMap<String, String>>,
    states: Option<BTreeMap<String, String>>,
    suffixes: Option<BTreeMap<String, String>>,
    ranged_units: Option<Vec<UnitDesignator>>,
    rangeless_units: Option<Vec<UnitDesignator>>,
}

impl TablesFile {
    /// Replaces every table present in this file. Keys and abbreviations
    /// are uppercased since matching runs on uppercased input; unit
    /// patterns are left alone and matched case-insensitively.
    fn apply_to(self, tables: &mut ReferenceTables) {
        if let Some(map) = self.directionals {
            tables.directionals = uppercase_map(map);
        }
        if let Some(map) = self.states {
            tables.states = uppercase_map(map);
        }
        if let Some(map) = self.suffixes {
            tables.suffixes = uppercase_map(map);
        }
        if let Some(units) = self.ranged_units {
            tables.ranged_units = uppercase_units(units);
        }
        if let Some(units) = self.rangeless_units {
            tables.rangeless_units = uppercase_units(units);
        }
    }
}

fn uppercase_map(map: BTreeMap<String, String>) -> BTreeMap<String, String> {
    map.into_iter()
        .map(|(k, v)| (k.trim().to_uppercase(), v.trim().to_uppercase()))
        .collect()
}

fn uppercase_units(units: Vec<UnitDesignator>) -> Vec<UnitDesignator> {
    units
        .into_iter()
        .map(|u| UnitDesignator {
            pattern: u.pattern.trim().to_string(),
            abbreviation: u.abbreviation.trim().to_uppercase(),
        })
        .collect()
}

/// Returns the packaged default reference tables.
///
/// # Panics
///
/// Panics if any embedded TOML table is malformed (this is a compile-time
/// guarantee since the tables are embedded).
#[must_use]
pub fn default_tables() -> &'static ReferenceTables {
    &DEFAULT_TABLES
}

/// Builds reference tables from a TOML document, starting from the
/// defaults and replacing every table the document defines.
///
/// # Errors
///
/// Returns an error if the document is not valid TOML or contains
/// unknown keys.
pub fn tables_from_toml(toml_str: &str) -> Result<ReferenceTables, AddressError> {
    let file: TablesFile = toml::de::from_str(toml_str)?;
    let mut tables = default_tables().clone();
    file.apply_to(&mut tables);
    Ok(tables)
}

/// Reads a TOML table override file from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_tables(path: impl AsRef<Path>) -> Result<ReferenceTables, AddressError> {
    let path = path.as_ref();
    log::debug!("Loading reference tables from {}", path.display());
    let toml_str = std::fs::read_to_string(path)?;
    tables_from_toml(&toml_str)
}
