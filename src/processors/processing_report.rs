use crate::config::MergeStrategy;
use indicatif::HumanBytes;
use std::time::Duration;

/// Counters and phase timings for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingReport {
    pub workers: usize,
    pub merge_strategy: MergeStrategy,
    pub chunks: u64,
    pub bytes: u64,
    pub records: u64,
    pub skipped: u64,
    pub stations: usize,
    pub map_phase: Duration,
    pub reduce_phase: Duration,
    pub total: Duration,
}

impl ProcessingReport {
    /// Bytes per second over the whole run.
    pub fn throughput(&self) -> f64 {
        let secs = self.total.as_secs_f64();
        if secs > 0.0 {
            self.bytes as f64 / secs
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Processing Report ===\n");
        summary.push_str(&format!(
            "Workers: {} ({} merge)\n",
            self.workers, self.merge_strategy
        ));
        summary.push_str(&format!("Chunks: {}\n", self.chunks));
        summary.push_str(&format!("Bytes: {}\n", HumanBytes(self.bytes)));
        summary.push_str(&format!("Records: {}\n", self.records));
        if self.skipped > 0 {
            let total = self.records + self.skipped;
            summary.push_str(&format!(
                "Skipped Records: {} ({:.3}%)\n",
                self.skipped,
                100.0 * self.skipped as f64 / total as f64
            ));
        }
        summary.push_str(&format!("Stations: {}\n", self.stations));
        summary.push_str(&format!("\n{:<16} {:.2?}\n", "Map Phase:", self.map_phase));
        summary.push_str(&format!("{:<16} {:.2?}\n", "Reduce Phase:", self.reduce_phase));
        summary.push_str(&format!("{:<16} {:.2?}\n", "Total:", self.total));
        summary.push_str(&format!(
            "{:<16} {}/s\n",
            "Throughput:",
            HumanBytes(self.throughput() as u64)
        ));

        summary
    }
}
