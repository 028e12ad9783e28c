//! Logger setup shared by every subcommand.

use indicatif::MultiProgress;

/// Initializes `pretty_env_logger` (filtered by `RUST_LOG`) wrapped by
/// `indicatif-log-bridge`.
///
/// Returns the [`MultiProgress`] that progress bars must be added to so
/// that log output and bars never fight for the terminal.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    // Build the pretty-env-logger logger manually so we can wrap it.
    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // Ignore error if logger was already set (e.g., in tests)

    log::set_max_level(level);

    multi
}
