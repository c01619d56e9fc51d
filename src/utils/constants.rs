/// Default read block size in bytes (4 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Upper bound on configured workers
pub const MAX_WORKERS: usize = 1024;

/// Chunks queued per worker when no queue depth is configured
pub const QUEUE_DEPTH_PER_WORKER: usize = 2;

/// Interval between telemetry samples
pub const TELEMETRY_INTERVAL_MS: u64 = 1000;

/// Malformed lines logged individually before only counting
pub const MAX_LOGGED_MALFORMED: u64 = 10;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "BRC";

/// Path meaning stdin for input or stdout for output
pub const STDIO_PATH: &str = "-";
