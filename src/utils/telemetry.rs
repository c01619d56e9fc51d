use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic counters published by the pipeline.
///
/// The reader is the only writer of `bytes_read` and `chunks`; workers add
/// to `records` and `skipped` once per chunk. Readers take a `snapshot`.
#[derive(Debug)]
pub struct Telemetry {
    started: Instant,
    bytes_read: AtomicU64,
    chunks: AtomicU64,
    records: AtomicU64,
    skipped: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TelemetrySnapshot {
    pub bytes_read: u64,
    pub chunks: u64,
    pub records: u64,
    pub skipped: u64,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            bytes_read: AtomicU64::new(0),
            chunks: AtomicU64::new(0),
            records: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
        }
    }

    pub fn record_chunk_read(&self, bytes: usize) {
        self.bytes_read.fetch_add(bytes as u64, Ordering::Relaxed);
        self.chunks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chunk_processed(&self, records: u64, skipped: u64) {
        self.records.fetch_add(records, Ordering::Relaxed);
        if skipped > 0 {
            self.skipped.fetch_add(skipped, Ordering::Relaxed);
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            chunks: self.chunks.load(Ordering::Relaxed),
            records: self.records.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            elapsed: self.elapsed(),
        }
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySnapshot {
    /// Bytes per second since the run started.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.bytes_read as f64 / secs
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_counters_accumulate_across_threads() {
        let telemetry = Arc::new(Telemetry::new());

        std::thread::scope(|s| {
            for _ in 0..4 {
                let telemetry = Arc::clone(&telemetry);
                s.spawn(move || {
                    for _ in 0..1000 {
                        telemetry.record_chunk_processed(2, 1);
                    }
                });
            }
        });
        telemetry.record_chunk_read(128);

        let snapshot = telemetry.snapshot();
        assert_eq!(snapshot.records, 8000);
        assert_eq!(snapshot.skipped, 4000);
        assert_eq!(snapshot.bytes_read, 128);
        assert_eq!(snapshot.chunks, 1);
    }

    #[test]
    fn test_snapshot_serializes_elapsed_millis() {
        let snapshot = TelemetrySnapshot {
            bytes_read: 10,
            chunks: 1,
            records: 2,
            skipped: 0,
            elapsed: Duration::from_millis(1500),
        };
        let json = serde_json::to_value(snapshot).unwrap();
        assert_eq!(json["elapsed_ms"], 1500);
        assert_eq!(json["bytes_read"], 10);
    }
}
