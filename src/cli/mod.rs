pub mod args;
pub mod commands;

pub use args::{Cli, Commands, PipelineArgs};
pub use commands::{resolve_config, run};
