use crate::error::Result;
use crate::utils::constants::{
    DEFAULT_CHUNK_SIZE, ENV_PREFIX, MAX_WORKERS, QUEUE_DEPTH_PER_WORKER,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

/// How per-worker results are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Wait for every worker, then merge on one thread.
    #[default]
    Barrier,
    /// Merge each worker's result on a reducer thread as soon as it arrives.
    Streaming,
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeStrategy::Barrier => write!(f, "barrier"),
            MergeStrategy::Streaming => write!(f, "streaming"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PipelineConfig {
    /// Read block size in bytes.
    #[validate(range(min = 1))]
    pub chunk_size: usize,

    #[validate(range(min = 1, max = 1024))]
    pub workers: usize,

    /// Chunks buffered between reader and workers. `0` picks a depth from the worker count.
    pub queue_depth: usize,

    pub merge_strategy: MergeStrategy,

    /// Skip and count malformed records instead of trusting the input format.
    pub strict: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            workers: num_cpus::get().min(MAX_WORKERS),
            queue_depth: 0,
            merge_strategy: MergeStrategy::Barrier,
            strict: false,
        }
    }
}

impl PipelineConfig {
    /// Layer defaults, an optional config file and `BRC_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&PipelineConfig::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: PipelineConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn effective_queue_depth(&self) -> usize {
        resolve_queue_depth(self.queue_depth, self.workers)
    }
}

/// Queue depth actually used for a configured depth; `0` means
/// [`QUEUE_DEPTH_PER_WORKER`] chunks per worker.
pub fn resolve_queue_depth(queue_depth: usize, workers: usize) -> usize {
    if queue_depth == 0 {
        workers.max(1) * QUEUE_DEPTH_PER_WORKER
    } else {
        queue_depth
    }
}
