use crate::models::{Aggregate, Chunk, PartialResult};
use crate::readers::record_parser::{lines, parse_record, parse_record_checked};
use crate::utils::constants::MAX_LOGGED_MALFORMED;
use tracing::{debug, warn};

/// Records and skipped lines seen in a single chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkStats {
    pub records: u64,
    pub skipped: u64,
}

/// Per-worker aggregation state. Owned by exactly one thread for its whole
/// lifetime and handed over once, via [`LocalAggregator::finish`].
pub struct LocalAggregator {
    partial: PartialResult,
    strict: bool,
}

impl LocalAggregator {
    pub fn new(worker: usize) -> Self {
        Self {
            partial: PartialResult::new(worker),
            strict: false,
        }
    }

    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[inline]
    fn fold(&mut self, station: &[u8], tenths: i32) {
        match self.partial.stations.get_mut(station) {
            Some(agg) => agg.update(tenths),
            None => {
                self.partial
                    .stations
                    .insert(station.to_vec(), Aggregate::new(tenths));
            }
        }
    }

    /// Fold every line of a chunk into this worker's map.
    pub fn consume(&mut self, chunk: &Chunk) -> ChunkStats {
        let stats = self.consume_bytes(chunk.as_bytes());
        self.partial.chunks += 1;
        stats
    }

    pub fn consume_bytes(&mut self, data: &[u8]) -> ChunkStats {
        let mut stats = ChunkStats::default();

        for line in lines(data) {
            if self.strict {
                match parse_record_checked(line) {
                    Ok(record) => {
                        self.fold(record.station, record.tenths);
                        stats.records += 1;
                    }
                    Err(e) => {
                        if self.partial.skipped + stats.skipped < MAX_LOGGED_MALFORMED {
                            warn!(worker = self.partial.worker, "skipping record: {}", e);
                        }
                        stats.skipped += 1;
                    }
                }
            } else {
                match parse_record(line) {
                    Some(record) => {
                        self.fold(record.station, record.tenths);
                        stats.records += 1;
                    }
                    None => stats.skipped += 1,
                }
            }
        }

        self.partial.records += stats.records;
        self.partial.skipped += stats.skipped;
        stats
    }

    pub fn finish(self) -> PartialResult {
        debug!(
            worker = self.partial.worker,
            chunks = self.partial.chunks,
            records = self.partial.records,
            stations = self.partial.stations.len(),
            "worker finished"
        );
        self.partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_sighting_and_updates() {
        let mut aggregator = LocalAggregator::new(0);
        let stats = aggregator.consume_bytes(b"A;10.0\nB;-5.5\nA;20.0\n");
        assert_eq!(stats, ChunkStats { records: 3, skipped: 0 });

        let partial = aggregator.finish();
        assert_eq!(
            partial.stations[b"A".as_slice()],
            Aggregate { min: 100, max: 200, sum: 300, count: 2 }
        );
        assert_eq!(
            partial.stations[b"B".as_slice()],
            Aggregate { min: -55, max: -55, sum: -55, count: 1 }
        );
    }

    #[test]
    fn test_accumulates_across_chunks() {
        let mut aggregator = LocalAggregator::new(3);
        aggregator.consume(&Chunk::new(0, b"A;1.0\n".to_vec()));
        aggregator.consume(&Chunk::new(1, b"A;3.0\nB;2.0".to_vec()));

        let partial = aggregator.finish();
        assert_eq!(partial.worker, 3);
        assert_eq!(partial.chunks, 2);
        assert_eq!(partial.records, 3);
        assert_eq!(partial.stations[b"A".as_slice()].count, 2);
        assert_eq!(partial.stations[b"A".as_slice()].sum, 40);
    }

    #[test]
    fn test_trusting_mode_skips_lines_without_separator() {
        let mut aggregator = LocalAggregator::new(0);
        let stats = aggregator.consume_bytes(b"A;1.0\ngarbage\n");
        assert_eq!(stats, ChunkStats { records: 1, skipped: 1 });
    }

    #[test]
    fn test_strict_mode_counts_malformed_records() {
        let mut aggregator = LocalAggregator::new(0).with_strict_validation(true);
        let stats = aggregator.consume_bytes(b"A;1.0\nA;1.25\n;2.0\nB\nB;-0.5\n");
        assert_eq!(stats, ChunkStats { records: 2, skipped: 3 });

        let partial = aggregator.finish();
        assert_eq!(partial.skipped, 3);
        assert_eq!(partial.stations.len(), 2);
    }

    #[test]
    fn test_empty_chunk() {
        let mut aggregator = LocalAggregator::new(0);
        let stats = aggregator.consume(&Chunk::new(0, Vec::new()));
        assert_eq!(stats, ChunkStats::default());
        assert!(aggregator.finish().stations.is_empty());
    }
}
