//! Composite address grammar.
//!
//! Builds one anchored regex out of priority-ordered alternatives and the
//! reference tables. The `regex` crate resolves alternations leftmost-first,
//! so the order in which alternatives are written here is the order in
//! which they are tried.
//!
//! Capture names must be unique within a regex, but one logical field is
//! captured at several points (three different ways to capture a street,
//! for example). Every capture point is therefore named `<field>_<n>`,
//! where `<field>` is the lowercase [`AddressField`] name.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use us_address_models::{AddressField, ReferenceTables, UnitDesignator};

use crate::AddressError;

/// Compiled size budget for the composite regex. The suffix alternation
/// appears several times and overflows the crate default.
const GRAMMAR_SIZE_LIMIT: usize = 64 * (1 << 20);

/// ZIP code with optional ZIP+4 extension.
const ZIP_PATTERN: &str = r"\d{5}(?:-\d{4})?";

/// Inserts a period after every letter of an abbreviation (`NE` → `N\.E\.`).
static DOTTED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\w)").expect("valid regex"));

/// Hands out unique capture group names and remembers the field each one
/// is bound to.
#[derive(Debug, Default)]
struct CaptureRegistry {
    counters: BTreeMap<AddressField, usize>,
}

impl CaptureRegistry {
    /// Wraps `pattern` in a named group bound to `field`.
    fn capture(&mut self, field: AddressField, pattern: &str) -> String {
        let n = self.counters.entry(field).or_insert(0);
        *n += 1;
        format!("(?P<{}_{n}>{pattern})", field.as_ref())
    }
}

/// Joins escaped literals into a non-capturing alternation, longest first.
fn literal_alternation<'a>(literals: impl IntoIterator<Item = &'a str>) -> String {
    let mut literals: Vec<&str> = literals.into_iter().collect();
    literals.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    literals.dedup();
    let escaped: Vec<String> = literals.into_iter().map(regex::escape).collect();
    format!("(?:{})", escaped.join("|"))
}

/// Joins unit designator patterns in table order. The designators are
/// user-editable, so they match case-insensitively.
fn unit_alternation(units: &[UnitDesignator]) -> String {
    let patterns: Vec<String> = units.iter().map(|u| format!("(?:{})", u.pattern)).collect();
    format!("(?i:{})", patterns.join("|"))
}

/// Table-derived alternations shared by several sub-grammars.
struct Vocabulary {
    directional: String,
    suffix: String,
    state: String,
    ranged_unit: String,
    rangeless_unit: String,
}

impl Vocabulary {
    fn new(tables: &ReferenceTables) -> Self {
        // `N.W.` cannot be followed by `\b`, so the form without the final
        // period (`N.W`) is listed too; the period is left as separator.
        let dotted: Vec<String> = tables
            .directionals
            .values()
            .map(|abbr| DOTTED_RE.replace_all(abbr, "$1.").into_owned())
            .flat_map(|full| {
                let open = full.trim_end_matches('.').to_string();
                [full, open]
            })
            .collect();
        let directional = literal_alternation(
            tables
                .directionals
                .keys()
                .chain(tables.directionals.values())
                .chain(&dotted)
                .map(String::as_str),
        );

        let suffix = literal_alternation(
            tables
                .suffixes
                .keys()
                .chain(tables.suffixes.values())
                .map(String::as_str),
        );

        let state = format!(
            r"\b{}\b",
            literal_alternation(
                tables
                    .states
                    .keys()
                    .chain(tables.states.values())
                    .map(String::as_str),
            )
        );

        Self {
            directional,
            suffix,
            state,
            ranged_unit: unit_alternation(&tables.ranged_units),
            rangeless_unit: unit_alternation(&tables.rangeless_units),
        }
    }
}

/// House number alternatives, most specific first:
///
/// 1. Unit-attached (`403D`, `12-3`): the trailing letter, or the digit
///    after a hyphen, is the secondary number.
/// 2. Fractional (`123 1/2`).
/// 3. Plain, with an optional internal hyphen (Queens-style `123-465`).
/// 4. Grid-style (`N645 W23001`), as used in Wisconsin and Illinois.
fn number_pattern(reg: &mut CaptureRegistry) -> String {
    let attached = format!(
        r"{}(?:-{}|{})\b",
        reg.capture(AddressField::Number, r"\d+"),
        reg.capture(AddressField::SecondaryNumber, "[0-9]"),
        reg.capture(AddressField::SecondaryNumber, "[A-Z]"),
    );
    let fractional = reg.capture(AddressField::Number, r"\d+[- ]?\d+/\d+");
    let plain = reg.capture(AddressField::Number, r"\d+-?\d*");
    let grid = reg.capture(AddressField::Number, r"[NSWE] ?\d+ ?[NSWE] ?\d+");

    format!("(?:{attached}|{fractional}|{plain}|{grid})")
}

/// Street name alternatives.
///
/// The directional-plus-suffix special case ("SOUTH STREET") must come
/// first or the directional would be read as a predirectional. The grid
/// case (`1700 S`) comes before the general case, and within the general
/// case a street with a suffix is preferred over a bare name.
fn street_pattern(reg: &mut CaptureRegistry, vocab: &Vocabulary) -> String {
    let dir = &vocab.directional;
    let suffix = &vocab.suffix;

    let named_after_direction = format!(
        r"{}\W+{}\b",
        reg.capture(AddressField::Street, dir),
        reg.capture(AddressField::Suffix, suffix),
    );

    let predirectional = format!(
        r"(?:{}\W+)?",
        reg.capture(AddressField::Predirectional, dir)
    );

    let grid = format!(
        r"{}[^\w,]*{}\b",
        reg.capture(AddressField::Street, r"[^,]*\d"),
        reg.capture(AddressField::Postdirectional, dir),
    );

    let with_suffix = format!(
        r"{}[^\w,]+{}\b(?:[^\w,]+{}\b)?",
        reg.capture(AddressField::Street, r"[^,]+"),
        reg.capture(AddressField::Suffix, suffix),
        reg.capture(AddressField::Postdirectional, dir),
    );

    let general = format!(
        r"{}(?:[^\w,]+{}\b)?(?:[^\w,]+{}\b)?",
        reg.capture(AddressField::Street, r"[^,]+?"),
        reg.capture(AddressField::Suffix, suffix),
        reg.capture(AddressField::Postdirectional, dir),
    );

    format!("(?:{named_after_direction}|{predirectional}(?:{grid}|{with_suffix}|{general}))")
}

/// Secondary unit: a ranged designator or `#` followed by a unit number,
/// or a rangeless designator on its own.
///
/// A ranged designator must not run straight into a letter (`LOTUS` is not
/// `LOT US`), so the number either follows a separator or starts with a
/// digit, underscore or hyphen.
fn secondary_unit_pattern(reg: &mut CaptureRegistry, vocab: &Vocabulary) -> String {
    let ranged = format!(
        r"{}(?:\W+{}|{})",
        reg.capture(AddressField::SecondaryUnit, &vocab.ranged_unit),
        reg.capture(AddressField::SecondaryNumber, r"[\w-]+"),
        reg.capture(AddressField::SecondaryNumber, r"[\d_-][\w-]*"),
    );
    let hash = format!(
        r"{}\W*{}",
        reg.capture(AddressField::SecondaryUnit, "#"),
        reg.capture(AddressField::SecondaryNumber, r"[\w-]+"),
    );
    let rangeless = format!(
        r"{}\b",
        reg.capture(AddressField::SecondaryUnit, &vocab.rangeless_unit)
    );

    format!("(?:{ranged}|{hash}|{rangeless})")
}

/// City, state and ZIP; each part is optional.
fn place_pattern(reg: &mut CaptureRegistry, vocab: &Vocabulary) -> String {
    format!(
        r"(?:{}\W+{}\W*)?{}?",
        reg.capture(AddressField::City, r"[^\d,]+?"),
        reg.capture(AddressField::State, &vocab.state),
        reg.capture(AddressField::Zip, ZIP_PATTERN),
    )
}

/// Assembles the whole-address regex source.
///
/// Three top-level shapes are tried in order: military (APO/FPO/DPO), PO
/// box, then the general number-street-unit-place shape.
fn address_pattern(tables: &ReferenceTables) -> String {
    let vocab = Vocabulary::new(tables);
    let mut reg = CaptureRegistry::default();

    let military = format!(
        r"[^\w#]*{}\W+{}\W+{}\W+{}\W*",
        reg.capture(AddressField::StreetLine, r".*?\w"),
        reg.capture(AddressField::City, "[ADF]PO"),
        reg.capture(AddressField::State, "A[AEP]"),
        reg.capture(AddressField::Zip, ZIP_PATTERN),
    );

    let po_box_line = reg.capture(AddressField::StreetLine, "(?:P[. ]?O[. ]? )?BOX [0-9]+");
    let po_box = format!(r"\W*{po_box_line}\W+{}\W*", place_pattern(&mut reg, &vocab));

    let number = number_pattern(&mut reg);
    let street = street_pattern(&mut reg, &vocab);
    let unit = secondary_unit_pattern(&mut reg, &vocab);
    let place = place_pattern(&mut reg, &vocab);
    let general = format!(r"[^\w#]*{number}\W*{street}\W+(?:{unit}\W+)?{place}\W*");

    format!("^(?:{military}|{po_box}|{general})$")
}

/// The compiled composite grammar.
///
/// Immutable once built; safe to share across threads.
#[derive(Debug, Clone)]
pub struct Grammar {
    regex: Regex,
    /// Logical field for each capture group index (`None` for group 0).
    fields: Vec<Option<AddressField>>,
}

impl Grammar {
    /// Builds the grammar from the given reference tables.
    ///
    /// # Errors
    ///
    /// Returns an error if a table entry produces an invalid regex (for
    /// example a malformed unit designator pattern) or the grammar exceeds
    /// the compiled size limit.
    pub fn build(tables: &ReferenceTables) -> Result<Self, AddressError> {
        let source = address_pattern(tables);
        let regex = RegexBuilder::new(&source)
            .size_limit(GRAMMAR_SIZE_LIMIT)
            .build()?;

        let fields: Vec<Option<AddressField>> = regex
            .capture_names()
            .map(|name| name.and_then(AddressField::from_capture_id))
            .collect();

        log::debug!(
            "Built address grammar: {} bytes of source, {} capture groups",
            source.len(),
            fields.len() - 1,
        );

        Ok(Self { regex, fields })
    }

    /// The compiled regex.
    #[must_use]
    pub const fn regex(&self) -> &Regex {
        &self.regex
    }

    /// The logical field bound to capture group `index`, if any.
    #[must_use]
    pub fn field_of(&self, index: usize) -> Option<AddressField> {
        self.fields.get(index).copied().flatten()
    }

    /// Every named capture identifier with the field it decomposes to.
    pub fn capture_ids(&self) -> impl Iterator<Item = (&str, Option<AddressField>)> {
        self.regex
            .capture_names()
            .flatten()
            .map(|name| (name, AddressField::from_capture_id(name)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::tables::default_tables;

    fn grammar() -> Grammar {
        Grammar::build(default_tables()).unwrap()
    }

    #[test]
    fn every_capture_maps_to_a_field() {
        for (id, field) in grammar().capture_ids() {
            assert!(field.is_some(), "Capture {id} has no logical field");
        }
    }

    #[test]
    fn every_field_has_a_capture() {
        let grammar = grammar();
        let captured: BTreeSet<AddressField> =
            grammar.capture_ids().filter_map(|(_, f)| f).collect();
        for field in AddressField::all() {
            assert!(captured.contains(&field), "Field {field} is never captured");
        }
    }

    #[test]
    fn capture_ids_are_unique() {
        let grammar = grammar();
        let mut seen = BTreeSet::new();
        for (id, _) in grammar.capture_ids() {
            assert!(seen.insert(id), "Duplicate capture id: {id}");
        }
    }

    #[test]
    fn group_fields_follow_capture_names() {
        let grammar = grammar();
        assert_eq!(grammar.field_of(0), None);
        for (index, name) in grammar.regex().capture_names().enumerate().skip(1) {
            assert_eq!(
                grammar.field_of(index),
                name.and_then(AddressField::from_capture_id)
            );
        }
    }

    #[test]
    fn dots_directional_abbreviations() {
        assert_eq!(DOTTED_RE.replace_all("NE", "$1."), "N.E.");
        let vocab = Vocabulary::new(default_tables());
        assert!(vocab.directional.contains(r"N\.E\."));
        assert!(vocab.directional.contains("NORTHEAST"));
    }

    #[test]
    fn lists_dotted_directionals_without_final_period() {
        let vocab = Vocabulary::new(default_tables());
        let re = Regex::new(&format!(r"^{}\b", vocab.directional)).unwrap();
        assert_eq!(re.find("N.W., X").map(|m| m.as_str()), Some("N.W"));
        assert_eq!(re.find("S.E").map(|m| m.as_str()), Some("S.E"));
    }

    #[test]
    fn attached_unit_excludes_hyphen() {
        let grammar = grammar();
        let caps = grammar
            .regex()
            .captures("403-D MAIN ST, SPRINGFIELD, IL 62701")
            .unwrap();
        assert_eq!(caps.name("secondarynumber_1").map(|m| m.as_str()), None);
        assert_eq!(caps.name("secondarynumber_2").map(|m| m.as_str()), None);

        let caps = grammar
            .regex()
            .captures("403-5 MAIN ST, SPRINGFIELD, IL 62701")
            .unwrap();
        assert_eq!(caps.name("secondarynumber_1").map(|m| m.as_str()), Some("5"));
    }

    #[test]
    fn escapes_state_names() {
        let mut tables = default_tables().clone();
        tables.states.insert("ST. CROIX".to_string(), "VI".to_string());
        let vocab = Vocabulary::new(&tables);
        assert!(vocab.state.contains(r"ST\. CROIX"));
    }

    #[test]
    fn orders_literals_longest_first() {
        assert_eq!(
            literal_alternation(["ST", "STREET", "STR", "ST"]),
            "(?:STREET|STR|ST)"
        );
    }

    #[test]
    fn anchors_the_whole_input() {
        let grammar = grammar();
        assert!(grammar.regex().is_match("1 MAIN ST, SPRINGFIELD, IL 62701"));
        assert!(!grammar.regex().is_match("SEE 1 MAIN ST, SPRINGFIELD, IL 62701 ?!X"));
    }

    #[test]
    fn rejects_invalid_unit_patterns() {
        let mut tables = default_tables().clone();
        tables.ranged_units.push(UnitDesignator {
            pattern: "(UNCLOSED".to_string(),
            abbreviation: "X".to_string(),
        });
        assert!(matches!(
            Grammar::build(&tables),
            Err(AddressError::Grammar(_))
        ));
    }
}
