//! Outcome of a log-and-continue pass over many targets

use serde::Serialize;

/// Counts reported by periodic sweeps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub targets: usize,
    pub failures: usize,
}

impl SweepSummary {
    pub fn record(&mut self, ok: bool) {
        self.targets += 1;
        if !ok {
            self.failures += 1;
        }
    }

    pub fn succeeded(&self) -> usize {
        self.targets - self.failures
    }
}
