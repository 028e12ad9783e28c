//! Field normalization.
//!
//! Raw captures are cleaned the same way for every field (punctuation
//! stripped, whitespace collapsed) and then canonicalized per field:
//!
//! - directionals, suffixes and states through their reference tables
//! - secondary unit designators through the unit patterns, first match wins
//! - house numbers lose internal whitespace unless they hold a fraction
//!
//! Values with no table entry pass through unchanged, so normalizing an
//! already-canonical value is a no-op.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use us_address_models::{AddressComponent, AddressField, ReferenceTables};

use crate::AddressError;
use crate::resolve::RawCapture;

/// Characters that never belong in a normalized value: anything but
/// letters, digits, whitespace, `/`, `-`, `#` and `&`.
static PUNCTUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{Alphabetic}\p{Nd}\s/#&-]+").expect("valid regex"));

/// Regex to collapse runs of whitespace into a single space.
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Designator synthesized for a secondary number attached to the house
/// number (`403D` → `APT D`).
pub const ATTACHED_UNIT: &str = "APT";

/// Strips stray punctuation and collapses whitespace.
#[must_use]
pub fn clean(raw: &str) -> String {
    let no_punct = PUNCTUATION_RE.replace_all(raw.trim(), "");
    WHITESPACE_RE.replace_all(no_punct.trim(), " ").into_owned()
}

/// Table-driven canonicalization for each logical field.
#[derive(Debug, Clone)]
pub struct Normalizer {
    directionals: BTreeMap<String, String>,
    states: BTreeMap<String, String>,
    suffixes: BTreeMap<String, String>,
    /// Anchored unit patterns, ranged then rangeless, in table order.
    units: Vec<(Regex, String)>,
}

impl Normalizer {
    /// Compiles the unit designator patterns and copies the lookup tables.
    ///
    /// # Errors
    ///
    /// Returns an error if a unit designator pattern is not a valid regex.
    pub fn new(tables: &ReferenceTables) -> Result<Self, AddressError> {
        let units = tables
            .all_units()
            .map(|unit| {
                let regex = RegexBuilder::new(&format!("^(?:{})$", unit.pattern))
                    .case_insensitive(true)
                    .build()?;
                Ok((regex, unit.abbreviation.clone()))
            })
            .collect::<Result<Vec<_>, AddressError>>()?;

        Ok(Self {
            directionals: tables.directionals.clone(),
            states: tables.states.clone(),
            suffixes: tables.suffixes.clone(),
            units,
        })
    }

    /// Returns the canonical abbreviation for a unit designator, if any
    /// pattern recognizes it.
    #[must_use]
    pub fn canonical_unit(&self, designator: &str) -> Option<&str> {
        self.units
            .iter()
            .find(|(regex, _)| regex.is_match(designator))
            .map(|(_, abbreviation)| abbreviation.as_str())
    }

    /// Normalizes one raw value for `field`.
    #[must_use]
    pub fn normalize(&self, field: AddressField, raw: &str) -> String {
        let value = clean(raw).to_uppercase();

        match field {
            AddressField::Predirectional | AddressField::Postdirectional => {
                lookup(&self.directionals, value)
            }
            AddressField::Suffix => lookup(&self.suffixes, value),
            AddressField::State => lookup(&self.states, value),
            AddressField::SecondaryUnit => match self.canonical_unit(&value) {
                Some(abbreviation) => abbreviation.to_string(),
                None => value,
            },
            AddressField::Number if !value.contains('/') => value.split_whitespace().collect(),
            _ => value,
        }
    }

    /// Normalizes every raw capture and applies attached-unit inference.
    ///
    /// Fields that are empty after cleaning are dropped.
    #[must_use]
    pub fn normalize_all(
        &self,
        captures: &[RawCapture<'_>],
    ) -> BTreeMap<AddressField, AddressComponent> {
        let mut fields: BTreeMap<AddressField, AddressComponent> = captures
            .iter()
            .filter_map(|capture| {
                let value = self.normalize(capture.field, capture.text);
                (!value.is_empty())
                    .then(|| (capture.field, AddressComponent::new(value, capture.span.clone())))
            })
            .collect();

        infer_attached_unit(&mut fields);
        fields
    }
}

fn lookup(table: &BTreeMap<String, String>, value: String) -> String {
    match table.get(&value) {
        Some(canonical) => canonical.clone(),
        None => value,
    }
}

/// A secondary number without a designator (`403D`) is an apartment.
///
/// The synthesized designator has an empty span at the start of the
/// secondary number since it has no source text of its own.
pub fn infer_attached_unit(fields: &mut BTreeMap<AddressField, AddressComponent>) {
    if fields.contains_key(&AddressField::SecondaryUnit) {
        return;
    }
    let Some(number) = fields.get(&AddressField::SecondaryNumber) else {
        return;
    };
    let at = number.span.start;
    fields.insert(
        AddressField::SecondaryUnit,
        AddressComponent::new(ATTACHED_UNIT, at..at),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::default_tables;

    fn normalizer() -> Normalizer {
        Normalizer::new(default_tables()).unwrap()
    }

    #[test]
    fn strips_punctuation() {
        assert_eq!(clean(" N. GRAVENSTEIN, "), "N GRAVENSTEIN");
        assert_eq!(clean("P.O. BOX 4857"), "PO BOX 4857");
        assert_eq!(clean("PSC BOX 453, "), "PSC BOX 453");
    }

    #[test]
    fn keeps_allowed_symbols() {
        assert_eq!(clean("123 1/2"), "123 1/2");
        assert_eq!(clean("#4-B"), "#4-B");
        assert_eq!(clean("A&M"), "A&M");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(clean("SALT  LAKE \t CITY"), "SALT LAKE CITY");
    }

    #[test]
    fn abbreviates_directionals() {
        let n = normalizer();
        assert_eq!(n.normalize(AddressField::Predirectional, "NORTH"), "N");
        assert_eq!(n.normalize(AddressField::Postdirectional, "S.W."), "SW");
        assert_eq!(n.normalize(AddressField::Postdirectional, "NW"), "NW");
    }

    #[test]
    fn abbreviates_suffixes() {
        let n = normalizer();
        assert_eq!(n.normalize(AddressField::Suffix, "HIGHWAY"), "HWY");
        assert_eq!(n.normalize(AddressField::Suffix, "Avenue"), "AVE");
        assert_eq!(n.normalize(AddressField::Suffix, "ST."), "ST");
    }

    #[test]
    fn abbreviates_states() {
        let n = normalizer();
        assert_eq!(n.normalize(AddressField::State, "NEW YORK"), "NY");
        assert_eq!(n.normalize(AddressField::State, "ca"), "CA");
        assert_eq!(n.normalize(AddressField::State, "ZZ"), "ZZ");
    }

    #[test]
    fn canonicalizes_unit_designators() {
        let n = normalizer();
        assert_eq!(n.normalize(AddressField::SecondaryUnit, "SUITE"), "STE");
        assert_eq!(n.normalize(AddressField::SecondaryUnit, "APARTMENT"), "APT");
        assert_eq!(n.normalize(AddressField::SecondaryUnit, "PENTHOUSE"), "PH");
        assert_eq!(n.normalize(AddressField::SecondaryUnit, "#"), "#");
        assert_eq!(n.canonical_unit("GARAGE"), None);
    }

    #[test]
    fn compacts_grid_numbers() {
        let n = normalizer();
        assert_eq!(n.normalize(AddressField::Number, "N645 W23001"), "N645W23001");
        assert_eq!(n.normalize(AddressField::Number, "123 1/2"), "123 1/2");
        assert_eq!(n.normalize(AddressField::Number, "123-465"), "123-465");
    }

    #[test]
    fn leaves_other_fields_cleaned_only() {
        let n = normalizer();
        assert_eq!(n.normalize(AddressField::City, "SALT LAKE CITY,"), "SALT LAKE CITY");
        assert_eq!(n.normalize(AddressField::Zip, "95472-1234"), "95472-1234");
    }

    #[test]
    fn normalization_is_idempotent() {
        let n = normalizer();
        let cases = [
            (AddressField::Predirectional, "NORTHEAST"),
            (AddressField::Suffix, "BOULEVARD"),
            (AddressField::Suffix, "PKWY"),
            (AddressField::State, "WEST VIRGINIA"),
            (AddressField::SecondaryUnit, "BUILDING"),
            (AddressField::Number, "N 645 W 23001"),
            (AddressField::StreetLine, "P.O. BOX 12"),
        ];
        for (field, raw) in cases {
            let once = n.normalize(field, raw);
            assert_eq!(n.normalize(field, &once), once, "{field} {raw}");
        }
    }

    #[test]
    fn infers_apartment_for_attached_numbers() {
        let mut fields = BTreeMap::from([(
            AddressField::SecondaryNumber,
            AddressComponent::new("D", 3..4),
        )]);
        infer_attached_unit(&mut fields);
        assert_eq!(
            fields[&AddressField::SecondaryUnit],
            AddressComponent::new("APT", 3..3)
        );
    }

    #[test]
    fn keeps_captured_unit_designator() {
        let mut fields = BTreeMap::from([
            (AddressField::SecondaryUnit, AddressComponent::new("STE", 10..15)),
            (AddressField::SecondaryNumber, AddressComponent::new("200", 16..19)),
        ]);
        infer_attached_unit(&mut fields);
        assert_eq!(fields[&AddressField::SecondaryUnit].value, "STE");
    }

    #[test]
    fn drops_fields_empty_after_cleaning() {
        let n = normalizer();
        let captures = [
            RawCapture {
                field: AddressField::SecondaryUnit,
                text: ".,",
                span: 0..2,
                overlaps_previous: false,
            },
            RawCapture {
                field: AddressField::SecondaryNumber,
                text: "4",
                span: 3..4,
                overlaps_previous: false,
            },
        ];
        let fields = n.normalize_all(&captures);
        assert_eq!(fields[&AddressField::SecondaryUnit].value, "APT");
        assert_eq!(fields[&AddressField::SecondaryNumber].value, "4");
    }
}
