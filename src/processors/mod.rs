pub mod cancel;
pub mod local_aggregator;
pub mod merge_reducer;
pub mod parallel_processor;
pub mod processing_report;

pub use cancel::{CancelOnPanic, CancelToken};
pub use local_aggregator::{ChunkStats, LocalAggregator};
pub use merge_reducer::MergeReducer;
pub use parallel_processor::ParallelProcessor;
pub use processing_report::ProcessingReport;
