#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for the US postal address parser.
//!
//! This crate contains only data types and simple conversions: the logical
//! address fields, the parsed record, and the reference table shapes. It has
//! no heavyweight dependencies (no regex, no I/O).

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// A logical field of a parsed address.
///
/// The lowercase string form doubles as the prefix of every grammar capture
/// identifier bound to the field (`street_2`, `secondaryunit_1`, ...).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum AddressField {
    /// House number (`1005`, `123 1/2`, `N645W23001`).
    Number,
    /// Directional preceding the street name.
    Predirectional,
    /// Street name proper.
    Street,
    /// Street suffix (`ST`, `HWY`).
    Suffix,
    /// Directional following the street name.
    Postdirectional,
    /// Secondary unit designator (`APT`, `STE`, `#`).
    SecondaryUnit,
    /// Secondary unit number.
    SecondaryNumber,
    /// City or military post office.
    City,
    /// Two-letter state code.
    State,
    /// Five-digit ZIP, optionally with a four-digit extension.
    Zip,
    /// The whole delivery line, excluding city, state and ZIP.
    StreetLine,
}

impl AddressField {
    /// Fields joined, in this order, to synthesize a street line.
    pub const STREET_LINE_PARTS: &[Self] = &[
        Self::Number,
        Self::Predirectional,
        Self::Street,
        Self::Suffix,
        Self::Postdirectional,
        Self::SecondaryUnit,
        Self::SecondaryNumber,
    ];

    /// Decomposes a grammar capture identifier into its logical field.
    ///
    /// The identifier is the field's lowercase name followed by `_` and a
    /// disambiguating suffix. Identifiers whose prefix is not a known field
    /// yield `None`.
    #[must_use]
    pub fn from_capture_id(id: &str) -> Option<Self> {
        let (prefix, _) = id.split_once('_').unwrap_or((id, ""));
        Self::from_str(prefix).ok()
    }

    /// Returns every logical field in declaration order.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }
}

/// The normalized value of one logical field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressComponent {
    /// Canonical text.
    pub value: String,
    /// Half-open byte range in the original input this value came from.
    pub span: Range<usize>,
}

impl AddressComponent {
    /// Creates a component from its canonical text and source range.
    #[must_use]
    pub fn new(value: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            value: value.into(),
            span,
        }
    }
}

impl AsRef<str> for AddressComponent {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

/// A successfully parsed US postal address.
///
/// Absent fields are `None`. `street_line` is always present: it is either
/// captured verbatim (PO box and military addresses) or synthesized from
/// the componentized fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressParseResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<AddressComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predirectional: Option<AddressComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<AddressComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<AddressComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postdirectional: Option<AddressComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_unit: Option<AddressComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_number: Option<AddressComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<AddressComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<AddressComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<AddressComponent>,
    pub street_line: AddressComponent,
}

impl AddressParseResult {
    /// Returns the component bound to `field`, if present.
    #[must_use]
    pub const fn get(&self, field: AddressField) -> Option<&AddressComponent> {
        match field {
            AddressField::Number => self.number.as_ref(),
            AddressField::Predirectional => self.predirectional.as_ref(),
            AddressField::Street => self.street.as_ref(),
            AddressField::Suffix => self.suffix.as_ref(),
            AddressField::Postdirectional => self.postdirectional.as_ref(),
            AddressField::SecondaryUnit => self.secondary_unit.as_ref(),
            AddressField::SecondaryNumber => self.secondary_number.as_ref(),
            AddressField::City => self.city.as_ref(),
            AddressField::State => self.state.as_ref(),
            AddressField::Zip => self.zip.as_ref(),
            AddressField::StreetLine => Some(&self.street_line),
        }
    }

    /// Returns the canonical text bound to `field`, if present.
    #[must_use]
    pub fn value(&self, field: AddressField) -> Option<&str> {
        self.get(field).map(|c| c.value.as_str())
    }

    /// Iterates over the populated fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (AddressField, &AddressComponent)> {
        AddressField::all().filter_map(|field| self.get(field).map(|c| (field, c)))
    }

    /// Renders the address as `STREET LINE; CITY, ST  ZIP`.
    ///
    /// Missing locality parts are dropped along with their separators.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AddressParseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.street_line.value)?;

        let city = self.value(AddressField::City);
        let state = self.value(AddressField::State);
        let zip = self.value(AddressField::Zip);

        if city.is_none() && state.is_none() && zip.is_none() {
            return Ok(());
        }

        f.write_str("; ")?;
        if let Some(city) = city {
            f.write_str(city)?;
            if state.is_some() {
                f.write_str(", ")?;
            }
        }
        if let Some(state) = state {
            f.write_str(state)?;
        }
        if let Some(zip) = zip {
            if city.is_some() || state.is_some() {
                f.write_str("  ")?;
            }
            f.write_str(zip)?;
        }

        Ok(())
    }
}

/// A secondary unit designator: a recognition pattern and the canonical
/// USPS abbreviation it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDesignator {
    /// Regex fragment recognizing every accepted spelling (`SU?I?TE`).
    pub pattern: String,
    /// Canonical abbreviation (`STE`).
    pub abbreviation: String,
}

/// The reference tables the grammar and normalizer are built from.
///
/// Map keys are uppercase recognized forms; values are canonical
/// abbreviations. Unit designators are ordered: the first matching pattern
/// wins during normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceTables {
    /// Full directional word to abbreviation (`NORTHEAST` → `NE`).
    #[serde(default)]
    pub directionals: BTreeMap<String, String>,
    /// Full state or territory name to USPS code (`NEW YORK` → `NY`).
    #[serde(default)]
    pub states: BTreeMap<String, String>,
    /// Any street suffix spelling to its standard abbreviation.
    #[serde(default)]
    pub suffixes: BTreeMap<String, String>,
    /// Designators that require a unit number (`APT 3`).
    #[serde(default)]
    pub ranged_units: Vec<UnitDesignator>,
    /// Designators that stand alone (`PH`, `REAR`).
    #[serde(default)]
    pub rangeless_units: Vec<UnitDesignator>,
}

impl ReferenceTables {
    /// The combined unit table: ranged designators, then rangeless ones.
    pub fn all_units(&self) -> impl Iterator<Item = &UnitDesignator> {
        self.ranged_units.iter().chain(&self.rangeless_units)
    }
}
