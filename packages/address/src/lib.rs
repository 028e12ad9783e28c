#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Grammar-driven parser for free-form, single-line US postal addresses.
//!
//! # Architecture
//!
//! - **Grammar**: one anchored regex is assembled from priority-ordered
//!   alternatives (military, PO box, general) and the reference tables.
//! - **Matching**: the trimmed, uppercased input is matched against the
//!   grammar and every participating capture is mapped back to a byte range
//!   of the caller's original string.
//! - **Resolution**: captures collapse to at most one per logical field,
//!   first alternative wins.
//! - **Normalization**: each field is cleaned and canonicalized through the
//!   reference tables (`HIGHWAY` → `HWY`, `NEW YORK` → `NY`).
//! - **Assembly**: the street line is derived from its parts unless the
//!   grammar captured it verbatim.
//!
//! # Usage
//!
//! ```rust
//! let parsed = us_address::parse("1005 N Gravenstein Highway Sebastopol, CA 95472").unwrap();
//! assert_eq!(parsed.street_line.value, "1005 N GRAVENSTEIN HWY");
//! assert_eq!(parsed.render(), "1005 N GRAVENSTEIN HWY; SEBASTOPOL, CA  95472");
//! ```

pub mod assemble;
pub mod grammar;
pub mod matcher;
pub mod normalize;
pub mod resolve;
pub mod tables;
pub mod verify;

use std::sync::LazyLock;

pub use us_address_models::{
    AddressComponent, AddressField, AddressParseResult, ReferenceTables, UnitDesignator,
};

use grammar::Grammar;
use matcher::PreparedInput;
use normalize::Normalizer;

/// Errors from building a parser or loading reference tables.
///
/// Parsing itself never fails with an error; an unrecognized address is
/// reported as `None`.
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    /// A table entry produced an invalid regex.
    #[error("Grammar error: {0}")]
    Grammar(#[from] regex::Error),

    /// Reference table TOML could not be parsed.
    #[error("Reference table error: {0}")]
    Tables(#[from] toml::de::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

static SHARED_PARSER: LazyLock<AddressParser> = LazyLock::new(|| {
    AddressParser::new(tables::default_tables()).expect("default tables build a valid grammar")
});

/// A compiled address grammar plus the tables used to normalize its
/// captures.
///
/// Building is relatively expensive; parsing only reads, so one parser can
/// be shared freely across threads.
#[derive(Debug, Clone)]
pub struct AddressParser {
    grammar: Grammar,
    normalizer: Normalizer,
}

impl AddressParser {
    /// Builds a parser from the given reference tables.
    ///
    /// # Errors
    ///
    /// Returns an error if a unit designator pattern is not a valid regex
    /// or the assembled grammar exceeds the compiled size limit.
    pub fn new(tables: &ReferenceTables) -> Result<Self, AddressError> {
        Ok(Self {
            grammar: Grammar::build(tables)?,
            normalizer: Normalizer::new(tables)?,
        })
    }

    /// Returns the process-wide parser built from the default tables.
    ///
    /// # Panics
    ///
    /// Panics if the embedded default tables do not produce a valid
    /// grammar.
    #[must_use]
    pub fn shared() -> &'static Self {
        &SHARED_PARSER
    }

    /// The compiled grammar.
    #[must_use]
    pub const fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Parses a single-line address.
    ///
    /// Returns `None` for empty input or when no grammar alternative
    /// consumes the whole trimmed line.
    #[must_use]
    pub fn parse(&self, address: &str) -> Option<AddressParseResult> {
        let input = PreparedInput::new(address);
        if input.is_empty() {
            return None;
        }

        let sub_matches = matcher::run(&self.grammar, &input)?;
        let captures = resolve::resolve(sub_matches);
        let fields = self.normalizer.normalize_all(&captures);
        assemble::assemble(fields)
    }
}

/// Parses `address` with the shared default parser.
#[must_use]
pub fn parse(address: &str) -> Option<AddressParseResult> {
    AddressParser::shared().parse(address)
}

/// Renders a parsed address as `STREET LINE; CITY, ST  ZIP`.
#[must_use]
pub fn render(result: &AddressParseResult) -> String {
    result.render()
}
