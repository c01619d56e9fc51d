use crate::config::MergeStrategy;
use crate::writers::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "brc-processor")]
#[command(about = "Per-station min/mean/max over large `station;value` measurement files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

/// Pipeline tuning shared by every subcommand. Unset flags fall back to the
/// config file, then `BRC_*` environment variables, then built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    #[arg(long, help = "Configuration file (toml, yaml, json)")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Read block size in bytes [default: 4194304]")]
    pub chunk_size: Option<usize>,

    #[arg(short, long, help = "Worker threads [default: available parallelism]")]
    pub workers: Option<usize>,

    #[arg(long, help = "Chunks buffered between reader and workers [default: 2 per worker]")]
    pub queue_depth: Option<usize>,

    #[arg(long, value_enum, help = "How per-worker results are merged [default: barrier]")]
    pub merge: Option<MergeStrategy>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Aggregate a measurements file and write the sorted report
    Process {
        #[arg(short, long, help = "Input measurements file, or '-' for stdin")]
        input: PathBuf,

        #[arg(
            short,
            long,
            help = "Output file, or '-' for stdout [default: result-{YYYYmmddHHMMSS}.txt]"
        )]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        #[arg(long, help = "Skip and count malformed records instead of trusting the input")]
        strict: bool,

        #[arg(long, help = "Show a live progress bar")]
        progress: bool,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Scan a measurements file in strict mode and report malformed records
    Validate {
        #[arg(short, long, help = "Input measurements file, or '-' for stdin")]
        input: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_process() {
        let cli = Cli::try_parse_from([
            "brc-processor",
            "process",
            "-i",
            "measurements.txt",
            "--chunk-size",
            "1024",
            "--merge",
            "streaming",
            "--format",
            "json",
        ])
        .unwrap();

        match cli.command {
            Commands::Process {
                input,
                output,
                format,
                pipeline,
                ..
            } => {
                assert_eq!(input, PathBuf::from("measurements.txt"));
                assert!(output.is_none());
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(pipeline.chunk_size, Some(1024));
                assert_eq!(pipeline.merge, Some(MergeStrategy::Streaming));
                assert!(pipeline.workers.is_none());
            }
            _ => panic!("expected process command"),
        }
    }

    #[test]
    fn test_parse_validate_with_global_flags() {
        let cli = Cli::try_parse_from([
            "brc-processor",
            "validate",
            "--input",
            "-",
            "--verbose",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Validate { .. }));
    }
}
