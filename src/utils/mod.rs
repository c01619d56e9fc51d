pub mod constants;
pub mod filename;
pub mod logging;
pub mod monitor;
pub mod progress;
pub mod telemetry;

pub use constants::*;
pub use filename::generate_default_result_filename;
pub use logging::init_logging;
pub use monitor::{spawn_renderer, TelemetryMonitor};
pub use progress::ProgressReporter;
pub use telemetry::{Telemetry, TelemetrySnapshot};
