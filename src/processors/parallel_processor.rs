use crate::config::{resolve_queue_depth, MergeStrategy, PipelineConfig};
use crate::error::{ProcessingError, Result};
use crate::models::{Chunk, GlobalResult, PartialResult};
use crate::processors::cancel::{CancelOnPanic, CancelToken};
use crate::processors::{LocalAggregator, MergeReducer, ProcessingReport};
use crate::readers::ChunkReader;
use crate::utils::constants::DEFAULT_CHUNK_SIZE;
use crate::utils::telemetry::Telemetry;
use crossbeam::channel::{self, Receiver, Sender};
use crossbeam::select;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::thread::ScopedJoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Runs the reader, the worker pool and the reducer for one input.
///
/// A single reader thread cuts the source into newline-aligned chunks and
/// pushes them through a bounded queue; a fixed rayon pool pulls chunks, each
/// worker folding them into a private map; the maps are then merged.
pub struct ParallelProcessor {
    max_workers: usize,
    chunk_size: usize,
    queue_depth: usize,
    merge_strategy: MergeStrategy,
    strict_validation: bool,
    telemetry: Arc<Telemetry>,
    cancel: CancelToken,
}

/// Bytes and chunk count handed to the workers.
#[derive(Debug, Clone, Copy, Default)]
struct ReadStats {
    chunks: u64,
    bytes: u64,
}

enum WorkerOutput {
    Partials(Vec<PartialResult>),
    Merged(GlobalResult, Duration),
}

impl ParallelProcessor {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            chunk_size: DEFAULT_CHUNK_SIZE,
            queue_depth: 0,
            merge_strategy: MergeStrategy::Barrier,
            strict_validation: false,
            telemetry: Arc::new(Telemetry::new()),
            cancel: CancelToken::new(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.workers)
            .with_chunk_size(config.chunk_size)
            .with_queue_depth(config.queue_depth)
            .with_merge_strategy(config.merge_strategy)
            .with_strict_validation(config.strict)
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// `0` sizes the queue from the worker count.
    pub fn with_queue_depth(mut self, queue_depth: usize) -> Self {
        self.queue_depth = queue_depth;
        self
    }

    pub fn with_merge_strategy(mut self, merge_strategy: MergeStrategy) -> Self {
        self.merge_strategy = merge_strategy;
        self
    }

    pub fn with_strict_validation(mut self, strict_validation: bool) -> Self {
        self.strict_validation = strict_validation;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<Telemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn telemetry(&self) -> Arc<Telemetry> {
        Arc::clone(&self.telemetry)
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn queue_depth(&self) -> usize {
        resolve_queue_depth(self.queue_depth, self.max_workers)
    }

    pub fn process_file(&self, path: &Path) -> Result<(GlobalResult, ProcessingReport)> {
        let file = File::open(path)?;
        self.process(file)
    }

    /// Aggregate every record of `source`.
    ///
    /// Returns `Cancelled` if the cancel token fires before the input is
    /// exhausted, and the first read error if the source fails.
    pub fn process<R: Read + Send>(&self, source: R) -> Result<(GlobalResult, ProcessingReport)> {
        let started = Instant::now();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .thread_name(|i| format!("brc-worker-{}", i))
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        info!(
            workers = self.max_workers,
            chunk_size = self.chunk_size,
            queue_depth = self.queue_depth(),
            strategy = %self.merge_strategy,
            strict = self.strict_validation,
            "starting pipeline"
        );

        // Internal abort, fired on reader failure or a panicking thread.
        let abort = CancelToken::new();
        let (chunk_tx, chunk_rx) = channel::bounded::<Chunk>(self.queue_depth());

        let (output, read_stats, map_phase) = std::thread::scope(|scope| -> Result<_> {
            let abort_ref = &abort;
            let reader = std::thread::Builder::new()
                .name("brc-reader".to_string())
                .spawn_scoped(scope, move || {
                    let _guard = CancelOnPanic(abort_ref);
                    let result = self.read_chunks(source, chunk_tx, abort_ref);
                    if result.is_err() {
                        abort_ref.cancel();
                    }
                    result
                })?;

            let (output, map_phase) = match self.merge_strategy {
                MergeStrategy::Barrier => {
                    let partials =
                        pool.broadcast(|ctx| self.run_worker(ctx.index(), &chunk_rx, &abort));
                    (WorkerOutput::Partials(partials), started.elapsed())
                }
                MergeStrategy::Streaming => {
                    let (partial_tx, partial_rx) = channel::bounded(self.max_workers);
                    let reducer = scope.spawn(move || MergeReducer::merge_stream(partial_rx));

                    pool.broadcast(|ctx| {
                        let partial = self.run_worker(ctx.index(), &chunk_rx, &abort);
                        // Fails only if the reducer panicked; that surfaces on join.
                        let _ = partial_tx.send(partial);
                    });
                    drop(partial_tx);
                    let map_phase = started.elapsed();

                    let global = join_scoped(reducer);
                    (WorkerOutput::Merged(global, started.elapsed() - map_phase), map_phase)
                }
            };

            let read_stats = join_scoped(reader)?;
            Ok((output, read_stats, map_phase))
        })?;

        if self.cancel.is_cancelled() {
            info!("pipeline cancelled");
            return Err(ProcessingError::Cancelled);
        }

        let (global, reduce_phase) = match output {
            WorkerOutput::Partials(partials) => {
                let reduce_started = Instant::now();
                let global = MergeReducer::merge_all(partials);
                (global, reduce_started.elapsed())
            }
            WorkerOutput::Merged(global, reduce_phase) => (global, reduce_phase),
        };

        let report = ProcessingReport {
            workers: self.max_workers,
            merge_strategy: self.merge_strategy,
            chunks: read_stats.chunks,
            bytes: read_stats.bytes,
            records: global.records,
            skipped: global.skipped,
            stations: global.len(),
            map_phase,
            reduce_phase,
            total: started.elapsed(),
        };

        info!(
            records = report.records,
            skipped = report.skipped,
            stations = report.stations,
            elapsed = ?report.total,
            "pipeline finished"
        );

        Ok((global, report))
    }

    /// Reader loop. Blocks while the queue is full; stops early on abort or cancel.
    fn read_chunks<R: Read>(
        &self,
        source: R,
        chunks: Sender<Chunk>,
        abort: &CancelToken,
    ) -> Result<ReadStats> {
        let mut stats = ReadStats::default();

        for chunk in ChunkReader::with_block_size(source, self.chunk_size) {
            if abort.is_cancelled() || self.cancel.is_cancelled() {
                break;
            }

            let chunk = chunk?;
            let len = chunk.len();

            let delivered = select! {
                send(chunks, chunk) -> res => res.is_ok(),
                recv(abort.receiver()) -> _ => false,
                recv(self.cancel.receiver()) -> _ => false,
            };
            if !delivered {
                break;
            }

            self.telemetry.record_chunk_read(len);
            stats.chunks += 1;
            stats.bytes += len as u64;
        }

        debug!(chunks = stats.chunks, bytes = stats.bytes, "reader finished");
        Ok(stats)
    }

    fn run_worker(&self, index: usize, chunks: &Receiver<Chunk>, abort: &CancelToken) -> PartialResult {
        let _guard = CancelOnPanic(abort);
        let mut aggregator =
            LocalAggregator::new(index).with_strict_validation(self.strict_validation);

        for chunk in chunks.iter() {
            if abort.is_cancelled() || self.cancel.is_cancelled() {
                continue;
            }
            #[cfg(test)]
            if crate::readers::lines(chunk.as_bytes()).any(|line| line == tests::FAILING_LINE) {
                panic!("worker {} hit a failing line", index);
            }
            let stats = aggregator.consume(&chunk);
            self.telemetry
                .record_chunk_processed(stats.records, stats.skipped);
        }

        aggregator.finish()
    }
}

impl Default for ParallelProcessor {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

fn join_scoped<T>(handle: ScopedJoinHandle<'_, T>) -> T {
    match handle.join() {
        Ok(value) => value,
        Err(payload) => std::panic::resume_unwind(payload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writers::ReportWriter;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    const SCENARIO: &[u8] = b"A;10.0\nB;-5.5\nA;20.0\n";

    /// A line that makes the worker consuming it panic.
    pub(super) const FAILING_LINE: &[u8] = b"!fail";

    fn input_with_failing_line(rows: usize) -> Vec<u8> {
        let mut input = Vec::new();
        for i in 0..rows {
            if i == rows / 2 {
                input.extend_from_slice(FAILING_LINE);
                input.push(b'\n');
            }
            input.extend_from_slice(b"Oslo;1.0\n");
        }
        input
    }

    fn run(processor: &ParallelProcessor, input: &[u8]) -> (GlobalResult, ProcessingReport) {
        processor.process(Cursor::new(input.to_vec())).unwrap()
    }

    #[test]
    fn test_scenario() {
        let (global, report) = run(&ParallelProcessor::new(2), SCENARIO);

        assert_eq!(
            ReportWriter::new().render(&global),
            "{A=10.0/15.0/20.0, B=-5.5/-5.5/-5.5}"
        );
        assert_eq!(report.records, 3);
        assert_eq!(report.stations, 2);
        assert_eq!(report.bytes, SCENARIO.len() as u64);
    }

    #[test]
    fn test_streaming_matches_barrier() {
        let barrier = run(&ParallelProcessor::new(3).with_chunk_size(7), SCENARIO).0;
        let streaming = run(
            &ParallelProcessor::new(3)
                .with_chunk_size(7)
                .with_merge_strategy(MergeStrategy::Streaming),
            SCENARIO,
        )
        .0;
        assert_eq!(barrier, streaming);
    }

    #[test]
    fn test_empty_input() {
        let (global, report) = run(&ParallelProcessor::new(4), b"");
        assert!(global.is_empty());
        assert_eq!(report.chunks, 0);
        assert_eq!(ReportWriter::new().render(&global), "{}");
    }

    #[test]
    fn test_telemetry_counts() {
        let processor = ParallelProcessor::new(2).with_chunk_size(8);
        run(&processor, SCENARIO);

        let snapshot = processor.telemetry().snapshot();
        assert_eq!(snapshot.bytes_read, SCENARIO.len() as u64);
        assert_eq!(snapshot.records, 3);
    }

    #[test]
    fn test_cancelled_before_start() {
        let processor = ParallelProcessor::new(2);
        processor.cancel_token().cancel();

        let result = processor.process(Cursor::new(SCENARIO.to_vec()));
        assert!(matches!(result, Err(ProcessingError::Cancelled)));
    }

    #[test]
    fn test_from_config() {
        let config = PipelineConfig {
            chunk_size: 5,
            workers: 2,
            queue_depth: 1,
            merge_strategy: MergeStrategy::Streaming,
            strict: true,
        };
        let processor = ParallelProcessor::from_config(&config);
        let (global, report) = run(&processor, b"A;1.0\nbad line\nA;3.0\n");

        assert_eq!(report.merge_strategy, MergeStrategy::Streaming);
        assert_eq!(report.workers, 2);
        assert_eq!(global.skipped, 1);
        assert_eq!(global.get("A").unwrap().count, 2);
    }

    #[test]
    fn test_queue_depth_defaults_per_worker() {
        assert_eq!(ParallelProcessor::new(3).queue_depth(), 6);
        assert_eq!(ParallelProcessor::new(3).with_queue_depth(1).queue_depth(), 1);
    }

    fn assert_worker_panic_unwinds(strategy: MergeStrategy) {
        let processor = ParallelProcessor::new(2)
            .with_chunk_size(10)
            .with_queue_depth(1)
            .with_merge_strategy(strategy);
        let input = input_with_failing_line(5_000);

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            processor.process(Cursor::new(input))
        }));
        assert!(outcome.is_err(), "{} merge swallowed a worker panic", strategy);

        // Nothing is left wedged; the same processor runs again.
        let (global, _) = run(&processor, SCENARIO);
        assert_eq!(global.len(), 2);
    }

    #[test]
    fn test_worker_panic_unwinds_barrier() {
        assert_worker_panic_unwinds(MergeStrategy::Barrier);
    }

    #[test]
    fn test_worker_panic_unwinds_streaming() {
        assert_worker_panic_unwinds(MergeStrategy::Streaming);
    }
}
