//! `indicatif`-backed progress bar for batch parsing.
//!
//! Bars are added to the [`MultiProgress`] returned by
//! [`crate::logging::init_logger`] so that log lines are suspended while
//! the bar redraws.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Progress over a known number of input lines.
pub struct BatchProgress {
    bar: ProgressBar,
}

impl BatchProgress {
    /// Creates a bar for `total` lines. Total is known up front so this
    /// starts as a bar immediately.
    #[must_use]
    pub fn lines_bar(multi: &MultiProgress, message: &str, total: u64) -> Self {
        let bar = multi.add(ProgressBar::new(total));
        bar.set_style(
            ProgressStyle::with_template(
                "{msg} {wide_bar:.cyan/dim} {pos}/{len} {percent}% [{eta}]",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
        );
        bar.set_message(message.to_string());

        Self { bar }
    }

    /// A bar that never draws, for inputs given on the command line.
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Advances the bar by `delta` lines.
    pub fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    /// Finishes the bar, leaving `msg` in place of the message.
    pub fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}
