//! End-to-end parse scenarios for validating a parser.
//!
//! Scenarios live in `scenarios.toml` and are embedded at compile time so
//! that a parser built from custom reference tables can be checked against
//! the same expectations as the defaults.

use serde::Deserialize;
use us_address_models::AddressField;

use crate::{AddressError, AddressParser};

const SCENARIOS_TOML: &str = include_str!("../scenarios.toml");

/// Parsed scenario file.
#[derive(Debug, Deserialize)]
struct ScenarioFile {
    scenarios: Vec<Scenario>,
}

/// A single input and its expected fields.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Free-form address line.
    pub address: String,
    /// Expected canonical value per field; `None` means the input must not
    /// parse.
    #[serde(default)]
    pub expected: Option<ExpectedFields>,
}

/// Expected field values. Unlisted fields must be absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectedFields {
    pub number: Option<String>,
    pub predirectional: Option<String>,
    pub street: Option<String>,
    pub suffix: Option<String>,
    pub postdirectional: Option<String>,
    pub secondary_unit: Option<String>,
    pub secondary_number: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub street_line: Option<String>,
}

impl ExpectedFields {
    /// The expected value for `field`.
    #[must_use]
    pub fn get(&self, field: AddressField) -> Option<&str> {
        let value = match field {
            AddressField::Number => &self.number,
            AddressField::Predirectional => &self.predirectional,
            AddressField::Street => &self.street,
            AddressField::Suffix => &self.suffix,
            AddressField::Postdirectional => &self.postdirectional,
            AddressField::SecondaryUnit => &self.secondary_unit,
            AddressField::SecondaryNumber => &self.secondary_number,
            AddressField::City => &self.city,
            AddressField::State => &self.state,
            AddressField::Zip => &self.zip,
            AddressField::StreetLine => &self.street_line,
        };
        value.as_deref()
    }
}

/// Result of a single scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// The address that was parsed.
    pub address: String,
    /// One line per field that did not match expectations.
    pub mismatches: Vec<String>,
}

impl ScenarioResult {
    /// Returns `true` if every expectation held.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Summary of a scenario run.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    /// Individual scenario results.
    pub results: Vec<ScenarioResult>,
    /// Number of scenarios that passed.
    pub passed: usize,
    /// Total number of scenarios.
    pub total: usize,
}

impl ScenarioReport {
    /// Returns `true` if every scenario passed.
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.passed == self.total
    }
}

/// Returns the embedded scenarios.
///
/// # Errors
///
/// Returns an error if `scenarios.toml` cannot be parsed.
pub fn scenarios() -> Result<Vec<Scenario>, AddressError> {
    let file: ScenarioFile = toml::de::from_str(SCENARIOS_TOML)?;
    Ok(file.scenarios)
}

/// Runs every embedded scenario against `parser`.
///
/// # Errors
///
/// Returns an error if `scenarios.toml` cannot be parsed.
pub fn run_scenarios(parser: &AddressParser) -> Result<ScenarioReport, AddressError> {
    let results: Vec<ScenarioResult> = scenarios()?
        .iter()
        .map(|scenario| run_single(parser, scenario))
        .collect();

    let passed = results.iter().filter(|r| r.passed()).count();
    let total = results.len();

    log::info!("Address scenarios: {passed}/{total} passed");

    Ok(ScenarioReport {
        results,
        passed,
        total,
    })
}

/// Parses one scenario address and compares every field.
#[must_use]
pub fn run_single(parser: &AddressParser, scenario: &Scenario) -> ScenarioResult {
    let parsed = parser.parse(&scenario.address);
    let mut mismatches = Vec::new();

    match (&scenario.expected, parsed) {
        (None, None) => {}
        (None, Some(result)) => {
            mismatches.push(format!("expected no parse, got {result}"));
        }
        (Some(_), None) => mismatches.push("expected a parse, got none".to_string()),
        (Some(expected), Some(result)) => {
            for field in AddressField::all() {
                let want = expected.get(field);
                let got = result.value(field);
                if want != got {
                    mismatches.push(format!("{field}: expected {want:?}, got {got:?}"));
                }
            }
        }
    }

    for mismatch in &mismatches {
        log::warn!("Scenario {:?}: {mismatch}", scenario.address);
    }

    ScenarioResult {
        address: scenario.address.clone(),
        mismatches,
    }
}
