use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use log::info;

/// Reports processed/total progress with an ETA derived from the rolling
/// average time per unit, logged at `info` level roughly once per unit of
/// work (callers decide the cadence by calling `tick`).
pub struct ProgressReporter {
    label: &'static str,
    total: usize,
    processed: AtomicUsize,
    started_at: Instant,
}

impl ProgressReporter {
    #[must_use]
    pub fn new(label: &'static str, total: usize) -> Self {
        Self {
            label,
            total,
            processed: AtomicUsize::new(0),
            started_at: Instant::now(),
        }
    }

    /// Records one more unit of work done and logs a progress line.
    pub fn tick(&self) {
        let processed = self.processed.fetch_add(1, Ordering::SeqCst) + 1;
        let elapsed = self.started_at.elapsed().as_secs_f64();
        let avg_per_unit = elapsed / processed as f64;
        let remaining = self.total.saturating_sub(processed);
        let eta_secs = avg_per_unit * remaining as f64;

        info!(
            "{}: {}/{} ({:.1}s elapsed, ETA {:.1}s)",
            self.label, processed, self.total, elapsed, eta_secs
        );
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tick_never_panics_on_a_zero_total() {
        let reporter = ProgressReporter::new("test", 0);
        reporter.tick();
    }
}
