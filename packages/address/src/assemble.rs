//! Builds the final [`AddressParseResult`] from normalized fields.

use std::collections::BTreeMap;

use us_address_models::{AddressComponent, AddressField, AddressParseResult};

/// Derives a street line from its constituent components.
///
/// Present parts are joined with single spaces in
/// [`AddressField::STREET_LINE_PARTS`] order. The span covers every
/// constituent. Returns `None` if no part is present.
#[must_use]
pub fn derive_street_line<'a>(
    parts: impl IntoIterator<Item = &'a AddressComponent>,
) -> Option<AddressComponent> {
    let parts: Vec<&AddressComponent> = parts.into_iter().collect();
    if parts.is_empty() {
        return None;
    }

    let value = parts
        .iter()
        .flat_map(|c| c.value.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ");
    let start = parts.iter().map(|c| c.span.start).min().unwrap_or(0);
    let end = parts.iter().map(|c| c.span.end).max().unwrap_or(start);

    Some(AddressComponent::new(value, start..end))
}

/// Packages normalized fields into a result.
///
/// A verbatim street line (PO box and military shapes) is kept as
/// captured; otherwise one is derived from the componentized fields.
/// Returns `None` if no street line can be produced.
#[must_use]
pub fn assemble(
    mut fields: BTreeMap<AddressField, AddressComponent>,
) -> Option<AddressParseResult> {
    let street_line = match fields.remove(&AddressField::StreetLine) {
        Some(line) => line,
        None => derive_street_line(
            AddressField::STREET_LINE_PARTS
                .iter()
                .filter_map(|field| fields.get(field)),
        )?,
    };

    Some(AddressParseResult {
        number: fields.remove(&AddressField::Number),
        predirectional: fields.remove(&AddressField::Predirectional),
        street: fields.remove(&AddressField::Street),
        suffix: fields.remove(&AddressField::Suffix),
        postdirectional: fields.remove(&AddressField::Postdirectional),
        secondary_unit: fields.remove(&AddressField::SecondaryUnit),
        secondary_number: fields.remove(&AddressField::SecondaryNumber),
        city: fields.remove(&AddressField::City),
        state: fields.remove(&AddressField::State),
        zip: fields.remove(&AddressField::Zip),
        street_line,
    })
}
