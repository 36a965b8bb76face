use indicatif::{ProgressBar, ProgressStyle};

use crate::grid::ParameterPair;

/// Console progress for a sweep: an indicatif bar when enabled, plus a
/// `tracing` line every `log_every` completions.
pub struct ProgressMonitor {
    bar: ProgressBar,
    total: usize,
    log_every: usize,
    enabled: bool,
}

impl ProgressMonitor {
    pub fn new(total: usize, log_every: usize, enabled: bool) -> Self {
        if !enabled {
            return Self {
                bar: ProgressBar::hidden(),
                total,
                log_every,
                enabled: false,
            };
        }

        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} trials ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░  ");
        bar.set_style(style);
        bar.set_message("starting");

        Self {
            bar,
            total,
            log_every,
            enabled: true,
        }
    }

    /// Record one terminal pair. `done` is the number of terminal pairs so
    /// far, including this one.
    pub fn on_trial(&self, pair: ParameterPair, success: bool, done: usize) {
        if self.enabled {
            let icon = if success { "✓" } else { "✗" };
            self.bar.set_message(format!("{icon} {pair}"));
            self.bar.set_position(done as u64);
        }

        if self.log_every > 0 && done % self.log_every == 0 {
            tracing::info!(
                "Progress: {}/{} completed ({:.1}%)",
                done,
                self.total,
                done as f64 / self.total.max(1) as f64 * 100.0
            );
        }
    }

    pub fn finish(&self, cancelled: bool) {
        if !self.enabled {
            return;
        }
        let msg = if cancelled {
            "cancelled"
        } else {
            "all trials completed"
        };
        self.bar.finish_with_message(msg);
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        if self.enabled && !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
