use serde::{Deserialize, Serialize};

/// Running counters for one project. Counters only ever grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub processed: u32,
    pub failed: u32,
    pub warnings: u32,
}

impl ProcessingStats {
    pub fn record_processed(&mut self) {
        self.processed += 1;
    }

    pub fn record_failed(&mut self) {
        self.failed += 1;
    }

    pub fn record_warning(&mut self) {
        self.warnings += 1;
    }

    /// Adds another set of counters onto this one.
    pub fn absorb(&mut self, other: &ProcessingStats) {
        self.processed += other.processed;
        self.failed += other.failed;
        self.warnings += other.warnings;
    }

    pub fn total(&self) -> u32 {
        self.processed + self.failed
    }
}

impl std::fmt::Display for ProcessingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "processed: {}, failed: {}, warnings: {}",
            self.processed, self.failed, self.warnings
        )
    }
}
