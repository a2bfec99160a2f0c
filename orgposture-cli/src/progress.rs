//! Terminal progress output for collection runs.

use indicatif::{ProgressBar, ProgressStyle};
use orgposture_core::ProgressReporter;
use std::time::Duration;

const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Spinner while phases start, bar while repository settings are fetched.
pub(crate) struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    pub(crate) fn new() -> Self {
        Self::with_bar(ProgressBar::new_spinner())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        bar.set_style(spinner_style());
        Self { bar }
    }

    /// Remove the progress line once the report is ready.
    pub(crate) fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for TerminalProgress {
    fn status(&self, message: &str) {
        self.bar.set_message(message.to_string());
        self.bar.enable_steady_tick(TICK_INTERVAL);
    }

    fn progress(&self, current: u64, total: u64, message: &str) {
        if self.bar.length() != Some(total) {
            self.bar.set_style(bar_style());
            self.bar.set_length(total);
        }
        self.bar.set_position(current);
        self.bar.set_message(message.to_string());
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("█▓▒░  "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_switches_to_a_sized_bar() {
        let progress = TerminalProgress::with_bar(ProgressBar::hidden());
        progress.status("Enumerating repositories");
        assert_eq!(progress.bar.message(), "Enumerating repositories");
        assert_eq!(progress.bar.length(), None);

        progress.progress(1, 3, "acme/api");
        assert_eq!(progress.bar.length(), Some(3));
        assert_eq!(progress.bar.position(), 1);
        assert_eq!(progress.bar.message(), "acme/api");

        progress.finish();
        assert!(progress.bar.is_finished());
    }
}
