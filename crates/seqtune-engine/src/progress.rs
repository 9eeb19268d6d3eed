//! Progress accounting for long sweeps.
//!
//! Reports fire on iteration count and on wall-time cadence. Multi-line
//! emissions hold the console lock so concurrent workers never interleave
//! their output with a progress block.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::info;

/// Tracks one sweep's counters and emits rate-limited progress lines.
pub struct ProgressTracker {
    console: Arc<Mutex<()>>,
    started: Instant,
    report_every_iters: u64,
    flush_interval: Duration,
    last_flush: Instant,
    quiet: bool,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(
        console: Arc<Mutex<()>>,
        report_every_iters: u64,
        flush_interval: Duration,
        quiet: bool,
    ) -> Self {
        let now = Instant::now();
        Self {
            console,
            started: now,
            report_every_iters,
            flush_interval,
            last_flush: now,
            quiet,
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Emit a progress block if the iteration count crossed the cadence.
    pub fn maybe_report(
        &mut self,
        loop_counter: u64,
        processed: u64,
        skipped: u64,
        total: u64,
        avg_per_sequence_ms: f64,
    ) {
        if self.quiet || self.report_every_iters == 0 || loop_counter % self.report_every_iters != 0
        {
            return;
        }
        let remaining = total.saturating_sub(loop_counter);
        let eta_ms = avg_per_sequence_ms * remaining as f64;
        let _console = self.console.lock();
        info!(
            target: "seqtune.progress",
            processed,
            skipped,
            total,
            elapsed_s = self.started.elapsed().as_secs(),
            eta_s = (eta_ms / 1000.0) as u64,
            "sweep progress"
        );
    }

    /// Whether the wall-time digest cadence has elapsed; resets the clock
    /// when it has.
    pub fn digest_due(&mut self) -> bool {
        if self.last_flush.elapsed() >= self.flush_interval {
            self.last_flush = Instant::now();
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn console(&self) -> Arc<Mutex<()>> {
        Arc::clone(&self.console)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_cadence_resets_after_firing() {
        let mut tracker = ProgressTracker::new(
            Arc::new(Mutex::new(())),
            20_000,
            Duration::from_millis(0),
            false,
        );
        assert!(tracker.digest_due());
        // Zero interval: immediately due again.
        assert!(tracker.digest_due());

        let mut slow = ProgressTracker::new(
            Arc::new(Mutex::new(())),
            20_000,
            Duration::from_secs(3600),
            false,
        );
        assert!(!slow.digest_due());
    }
}
