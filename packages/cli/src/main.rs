#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the US postal address parser.
//!
//! Addresses come from positional arguments, a file (`--input`), or stdin,
//! one per line. Each is written to stdout as rendered text or JSON.
//!
//! Uses `indicatif-log-bridge` (via [`logging::init_logger`]) to route
//! `log` output through `indicatif::MultiProgress` so that log lines and
//! the batch progress bar never fight for the terminal.

mod logging;
mod output;
mod progress;

use std::borrow::Cow;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use us_address::{AddressError, AddressParser, tables::load_tables, verify::run_scenarios};

use output::{OutputFormat, Summary, format_line, read_addresses};
use progress::BatchProgress;

#[derive(Parser)]
#[command(
    name = "us_address",
    about = "Parse free-form US postal addresses",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    parse: ParseArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the built-in address scenarios against the parser
    Verify {
        /// TOML file overriding the packaged reference tables
        #[arg(long)]
        tables: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ParseArgs {
    /// Addresses to parse. Reads stdin when neither these nor `--input`
    /// are given.
    addresses: Vec<String>,

    /// File with one address per line (`-` for stdin)
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// TOML file overriding the packaged reference tables
    #[arg(long)]
    tables: Option<PathBuf>,

    /// Exit with an error if any address does not parse
    #[arg(long)]
    fail_on_unparsed: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = logging::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Verify { tables }) => verify(tables.as_deref()),
        None => parse(&cli.parse, &multi),
    }
}

/// Returns the shared default parser, or builds one from `tables`.
fn build_parser(tables: Option<&Path>) -> Result<Cow<'static, AddressParser>, AddressError> {
    let Some(path) = tables else {
        return Ok(Cow::Borrowed(AddressParser::shared()));
    };
    let tables = load_tables(path)?;
    Ok(Cow::Owned(AddressParser::new(&tables)?))
}

fn parse(
    args: &ParseArgs,
    multi: &indicatif::MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let parser = build_parser(args.tables.as_deref())?;

    let mut addresses = args.addresses.clone();
    let from_file = match &args.input {
        Some(path) if path.as_os_str() == "-" => read_addresses(io::stdin().lock())?,
        Some(path) => {
            log::info!("Reading addresses from {}", path.display());
            read_addresses(BufReader::new(std::fs::File::open(path)?))?
        }
        None if addresses.is_empty() => read_addresses(io::stdin().lock())?,
        None => Vec::new(),
    };

    let progress = if from_file.is_empty() {
        BatchProgress::hidden()
    } else {
        BatchProgress::lines_bar(multi, "Parsing", from_file.len() as u64)
    };
    addresses.extend(from_file);

    let start = Instant::now();
    let mut summary = Summary::default();

    for address in &addresses {
        let result = parser.parse(address);
        summary.record(result.is_some());
        if result.is_none() {
            log::debug!("Unparsed: {address:?}");
        }

        let line = format_line(address, result.as_ref(), args.format)?;
        multi.suspend(|| println!("{line}"));
        progress.inc(1);
    }

    progress.finish(format!("{} parsed, {} unparsed", summary.parsed, summary.unparsed));
    log::info!(
        "Parsed {}/{} addresses ({} unparsed) in {:.2}s",
        summary.parsed,
        summary.total(),
        summary.unparsed,
        start.elapsed().as_secs_f64(),
    );

    if args.fail_on_unparsed && summary.unparsed > 0 {
        return Err(format!("{} address(es) did not parse", summary.unparsed).into());
    }

    Ok(())
}

fn verify(tables: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let parser = build_parser(tables)?;
    let report = run_scenarios(&parser)?;

    for result in report.results.iter().filter(|r| !r.passed()) {
        println!("FAIL {:?}", result.address);
        for mismatch in &result.mismatches {
            println!("  {mismatch}");
        }
    }
    println!("{}/{} scenarios passed", report.passed, report.total);

    if !report.all_passed() {
        return Err(format!("{} scenario(s) failed", report.total - report.passed).into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags_and_positionals() {
        let cli = Cli::try_parse_from([
            "us_address",
            "--format",
            "json",
            "--fail-on-unparsed",
            "123 Main St, Springfield, IL 62701",
        ])
        .unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.parse.format, OutputFormat::Json);
        assert!(cli.parse.fail_on_unparsed);
        assert_eq!(cli.parse.addresses.len(), 1);
    }

    #[test]
    fn parses_verify_subcommand() {
        let cli = Cli::try_parse_from(["us_address", "verify", "--tables", "t.toml"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Verify { tables: Some(ref path) }) if path == Path::new("t.toml")
        ));
    }

    #[test]
    fn default_parser_is_shared() {
        let parser = build_parser(None).unwrap();
        assert!(matches!(parser, Cow::Borrowed(_)));
    }

    #[test]
    fn missing_tables_file_is_an_error() {
        let err = build_parser(Some(Path::new("/nonexistent/tables.toml"))).unwrap_err();
        assert!(matches!(err, AddressError::Io(_)));
    }
}
