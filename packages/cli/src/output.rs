//! Output formatting for parsed and unparsed lines.

use std::io::{self, BufRead};

use clap::ValueEnum;
use serde::Serialize;
use us_address_models::AddressParseResult;

/// How each input line is written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `STREET LINE; CITY, ST  ZIP`, or `UNPARSED: <input>`.
    Text,
    /// One JSON object per line.
    Json,
}

/// A single JSON output record.
#[derive(Debug, Serialize)]
struct ParseRecord<'a> {
    input: &'a str,
    parsed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    rendered: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a AddressParseResult>,
}

/// Formats the outcome of parsing `input`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_line(
    input: &str,
    result: Option<&AddressParseResult>,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(result.map_or_else(
            || format!("UNPARSED: {}", input.trim()),
            AddressParseResult::render,
        )),
        OutputFormat::Json => serde_json::to_string(&ParseRecord {
            input,
            parsed: result.is_some(),
            rendered: result.map(AddressParseResult::render),
            result,
        }),
    }
}

/// Running totals for a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub parsed: usize,
    pub unparsed: usize,
}

impl Summary {
    /// Counts one outcome.
    pub const fn record(&mut self, parsed: bool) {
        if parsed {
            self.parsed += 1;
        } else {
            self.unparsed += 1;
        }
    }

    /// Total lines seen.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.parsed + self.unparsed
    }
}

/// Reads one address per line, skipping blank lines.
///
/// # Errors
///
/// Returns an error if reading fails or a line is not valid UTF-8.
pub fn read_addresses(reader: impl BufRead) -> io::Result<Vec<String>> {
    let mut addresses = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            addresses.push(line);
        }
    }
    Ok(addresses)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_renders_parsed_addresses() {
        let input = "PSC BOX 453, APO AE 99969";
        let result = us_address::parse(input);
        let line = format_line(input, result.as_ref(), OutputFormat::Text).unwrap();
        assert_eq!(line, "PSC BOX 453; APO, AE  99969");
    }

    #[test]
    fn text_marks_unparsed_lines() {
        let line = format_line(" hello world ", None, OutputFormat::Text).unwrap();
        assert_eq!(line, "UNPARSED: hello world");
    }

    #[test]
    fn json_includes_fields_and_spans() {
        let input = "842 E 1700 S, Salt Lake City, UT 84105";
        let result = us_address::parse(input);
        let line = format_line(input, result.as_ref(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(value["parsed"], true);
        assert_eq!(value["result"]["street"]["value"], "1700");
        assert_eq!(value["result"]["postdirectional"]["value"], "S");
        assert_eq!(value["rendered"], "842 E 1700 S; SALT LAKE CITY, UT  84105");
    }

    #[test]
    fn json_unparsed_has_no_result() {
        let line = format_line("hello", None, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["parsed"], false);
        assert!(value.get("result").is_none());
    }

    #[test]
    fn summary_counts_outcomes() {
        let mut summary = Summary::default();
        summary.record(true);
        summary.record(false);
        summary.record(true);
        assert_eq!(summary.parsed, 2);
        assert_eq!(summary.unparsed, 1);
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn reads_non_blank_lines() {
        let input = "123 Main St, Springfield, IL 62701\n\n   \nPO BOX 1, Reno, NV 89501\n";
        let addresses = read_addresses(input.as_bytes()).unwrap();
        assert_eq!(addresses.len(), 2);
        assert_eq!(addresses[1], "PO BOX 1, Reno, NV 89501");
    }
}
