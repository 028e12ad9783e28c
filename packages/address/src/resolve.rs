//! Collapses grammar sub-matches into at most one raw capture per
//! logical field.

use std::collections::BTreeSet;
use std::ops::Range;

use us_address_models::AddressField;

use crate::matcher::SubMatch;

/// The raw text bound to one logical field for a single parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCapture<'a> {
    /// Logical field.
    pub field: AddressField,
    /// Matched text, uppercased and not yet normalized.
    pub text: &'a str,
    /// Byte range within the original input.
    pub span: Range<usize>,
    /// Set when this capture starts inside an earlier-starting one.
    pub overlaps_previous: bool,
}

/// Reduces sub-matches to one capture per logical field.
///
/// Sub-matches arrive in grammar priority order; the first non-empty one
/// for each field wins. The result is ordered by start offset, longer spans
/// first on ties, and overlapping neighbours are flagged. Each capture
/// borrows its own slice of the prepared input and normalization allocates
/// fresh strings, so overlaps never alias.
#[must_use]
pub fn resolve<'a>(sub_matches: impl IntoIterator<Item = SubMatch<'a>>) -> Vec<RawCapture<'a>> {
    let mut seen = BTreeSet::new();
    let mut captures: Vec<RawCapture<'a>> = sub_matches
        .into_iter()
        .filter(|m| !m.text.is_empty())
        .filter(|m| seen.insert(m.field))
        .map(|m| RawCapture {
            field: m.field,
            text: m.text,
            span: m.span,
            overlaps_previous: false,
        })
        .collect();

    captures.sort_by(|a, b| {
        a.span
            .start
            .cmp(&b.span.start)
            .then_with(|| b.span.len().cmp(&a.span.len()))
    });

    let mut covered_to = 0;
    for capture in &mut captures {
        if capture.span.start < covered_to {
            capture.overlaps_previous = true;
            log::trace!(
                "Capture for {} at {:?} overlaps an earlier field",
                capture.field,
                capture.span
            );
        }
        covered_to = covered_to.max(capture.span.end);
    }

    captures
}
