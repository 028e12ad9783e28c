//! Runs the composite grammar against a prepared input line.

use std::ops::Range;

use us_address_models::AddressField;

use crate::grammar::Grammar;

/// A trimmed, uppercased copy of the caller's input that remembers where
/// each of its bytes came from in the original string.
#[derive(Debug, Clone)]
pub struct PreparedInput {
    text: String,
    /// Source character range in the original input for every byte of
    /// `text`. Uppercasing may change byte lengths (`ﬀ` → `FF`).
    origins: Vec<Range<usize>>,
}

impl PreparedInput {
    /// Trims surrounding whitespace and uppercases `original`.
    #[must_use]
    pub fn new(original: &str) -> Self {
        let leading = original.len() - original.trim_start().len();
        let trimmed = original.trim();

        let mut text = String::with_capacity(trimmed.len());
        let mut origins = Vec::with_capacity(trimmed.len());

        for (offset, c) in trimmed.char_indices() {
            let start = leading + offset;
            let source = start..start + c.len_utf8();
            for upper in c.to_uppercase() {
                text.push(upper);
                origins.extend(std::iter::repeat_n(source.clone(), upper.len_utf8()));
            }
        }

        Self { text, origins }
    }

    /// The uppercased text the grammar runs against.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns `true` if nothing but whitespace was supplied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Maps a byte range of the prepared text back onto the original input.
    #[must_use]
    pub fn original_span(&self, local: &Range<usize>) -> Range<usize> {
        if local.start >= local.end {
            let at = self
                .origins
                .get(local.start)
                .map_or_else(|| self.origins.last().map_or(0, |r| r.end), |r| r.start);
            return at..at;
        }
        self.origins[local.start].start..self.origins[local.end - 1].end
    }
}

/// One capture group that took part in the match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubMatch<'a> {
    /// Grammar capture identifier (`street_2`).
    pub id: &'a str,
    /// Logical field the identifier decomposes to.
    pub field: AddressField,
    /// Matched text within the prepared input.
    pub text: &'a str,
    /// Byte range within the prepared input.
    pub local: Range<usize>,
    /// Byte range within the original input.
    pub span: Range<usize>,
}

/// Matches `input` against `grammar`.
///
/// Returns `None` when no top-level alternative consumes the whole input.
/// On success, sub-matches are returned in capture group order, which is
/// the grammar's priority order. Groups that did not participate and
/// internal groups without a logical field are skipped.
#[must_use]
pub fn run<'a>(grammar: &'a Grammar, input: &'a PreparedInput) -> Option<Vec<SubMatch<'a>>> {
    let regex = grammar.regex();
    let Some(caps) = regex.captures(input.as_str()) else {
        log::trace!("No grammar alternative matched {:?}", input.as_str());
        return None;
    };

    let sub_matches: Vec<SubMatch<'a>> = regex
        .capture_names()
        .enumerate()
        .filter_map(|(index, name)| {
            let id = name?;
            let field = grammar.field_of(index)?;
            let m = caps.get(index)?;
            Some(SubMatch {
                id,
                field,
                text: m.as_str(),
                local: m.range(),
                span: input.original_span(&m.range()),
            })
        })
        .collect();

    log::trace!(
        "Matched {:?} with {} sub-matches: {:?}",
        input.as_str(),
        sub_matches.len(),
        sub_matches.iter().map(|m| m.id).collect::<Vec<_>>(),
    );

    Some(sub_matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::default_tables;

    #[test]
    fn trims_and_uppercases() {
        let input = PreparedInput::new("  12 Main St  ");
        assert_eq!(input.as_str(), "12 MAIN ST");
        assert_eq!(input.original_span(&(3..7)), 5..9);
    }

    #[test]
    fn maps_expanding_characters() {
        // The three-byte "ﬀ" ligature uppercases to the two bytes "FF".
        let input = PreparedInput::new("1 O\u{fb00} Rd");
        assert_eq!(input.as_str(), "1 OFF RD");
        assert_eq!(input.original_span(&(2..5)), 2..6);
        assert_eq!(input.original_span(&(6..8)), 7..9);
    }

    #[test]
    fn maps_empty_ranges() {
        let input = PreparedInput::new(" ab");
        assert_eq!(input.original_span(&(1..1)), 2..2);
        assert_eq!(input.original_span(&(2..2)), 3..3);
    }

    #[test]
    fn whitespace_only_input_is_empty() {
        assert!(PreparedInput::new(" \t\n ").is_empty());
        assert!(PreparedInput::new("").is_empty());
    }

    #[test]
    fn reports_no_match() {
        let grammar = Grammar::build(default_tables()).unwrap();
        let input = PreparedInput::new("not an address");
        assert!(run(&grammar, &input).is_none());
    }

    #[test]
    fn returns_sub_matches_with_original_offsets() {
        let grammar = Grammar::build(default_tables()).unwrap();
        let input = PreparedInput::new("  1005 N Gravenstein Highway Sebastopol, CA 95472");
        let sub_matches = run(&grammar, &input).unwrap();

        let street = sub_matches
            .iter()
            .find(|m| m.field == AddressField::Street)
            .unwrap();
        assert_eq!(street.text, "GRAVENSTEIN");
        assert_eq!(street.span, 9..20);

        let zip = sub_matches
            .iter()
            .find(|m| m.field == AddressField::Zip)
            .unwrap();
        assert_eq!(zip.text, "95472");
    }
}
