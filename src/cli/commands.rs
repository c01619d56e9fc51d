use crate::cli::args::{Cli, Commands, PipelineArgs};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::GlobalResult;
use crate::processors::{CancelToken, ParallelProcessor, ProcessingReport};
use crate::utils::constants::{STDIO_PATH, TELEMETRY_INTERVAL_MS};
use crate::utils::{
    generate_default_result_filename, init_logging, spawn_renderer, ProgressReporter, Telemetry,
    TelemetryMonitor,
};
use crate::writers::ReportWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::warn;
use validator::Validate;

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Process {
            input,
            output,
            format,
            strict,
            progress,
            pipeline,
        } => {
            let mut config = resolve_config(&pipeline)?;
            config.strict |= strict;

            let output = output.unwrap_or_else(generate_default_result_filename);
            let to_stdout = output == Path::new(STDIO_PATH);
            // Keep stdout clean when the report itself goes there.
            let say = |message: &str| {
                if to_stdout {
                    eprintln!("{}", message);
                } else {
                    println!("{}", message);
                }
            };

            say("Processing measurements...");
            say(&format!("Input file: {}", input.display()));
            say(&format!(
                "Workers: {}, Chunk size: {}, Queue depth: {}, Merge: {}",
                config.workers,
                config.chunk_size,
                config.effective_queue_depth(),
                config.merge_strategy
            ));

            let (global, report) = run_pipeline(&config, &input, progress).await?;

            let save_started = Instant::now();
            let writer = ReportWriter::new().with_format(format);
            if to_stdout {
                writer.write_to(&global, std::io::stdout().lock())?;
            } else {
                if let Some(parent) = output.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                writer.write_file(&global, &output)?;
                say(&format!("Results saved to {}", output.display()));
            }
            let save_phase = save_started.elapsed();

            say(&format!("\n{}", report.summary()));
            say(&format!("{:<16} {:.2?}", "Saving Results:", save_phase));
        }

        Commands::Validate { input, pipeline } => {
            let mut config = resolve_config(&pipeline)?;
            config.strict = true;

            println!("Validating measurements...");
            println!("Input file: {}", input.display());

            let (_global, report) = run_pipeline(&config, &input, false).await?;
            println!("\n{}", report.summary());

            if report.skipped == 0 {
                println!("✅ All {} records passed validation checks", report.records);
            } else {
                println!(
                    "⚠️  Found {} malformed records out of {}",
                    report.skipped,
                    report.records + report.skipped
                );
            }
        }
    }

    Ok(())
}

/// Layer command-line overrides on top of file and environment configuration.
pub fn resolve_config(args: &PipelineArgs) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::load(args.config.as_deref())?;

    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(queue_depth) = args.queue_depth {
        config.queue_depth = queue_depth;
    }
    if let Some(merge) = args.merge {
        config.merge_strategy = merge;
    }

    config.validate()?;
    Ok(config)
}

/// Run the blocking pipeline off the async runtime, with optional live
/// progress and Ctrl-C cancellation.
async fn run_pipeline(
    config: &PipelineConfig,
    input: &Path,
    show_progress: bool,
) -> Result<(GlobalResult, ProcessingReport)> {
    let telemetry = Arc::new(Telemetry::new());
    let cancel = CancelToken::new();
    let processor = ParallelProcessor::from_config(config)
        .with_telemetry(Arc::clone(&telemetry))
        .with_cancel_token(cancel.clone());

    let from_stdin = input == Path::new(STDIO_PATH);

    let display = if show_progress {
        let reporter = if from_stdin {
            ProgressReporter::new_spinner("Aggregating...", false)
        } else {
            let total = std::fs::metadata(input)?.len();
            ProgressReporter::new_bytes(total, "Aggregating...", false)
        };
        let (tx, rx) = mpsc::channel(8);
        let monitor = TelemetryMonitor::spawn(
            Arc::clone(&telemetry),
            Duration::from_millis(TELEMETRY_INTERVAL_MS),
            tx,
        );
        Some((monitor, spawn_renderer(rx, reporter)))
    } else {
        None
    };

    let input: PathBuf = input.to_path_buf();
    let mut task = tokio::task::spawn_blocking(move || {
        if from_stdin {
            processor.process(std::io::stdin())
        } else {
            processor.process_file(&input)
        }
    });

    let result = tokio::select! {
        joined = &mut task => joined?,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupt received, cancelling");
            cancel.cancel();
            task.await?
        }
    };

    if let Some((monitor, renderer)) = display {
        monitor.stop().await?;
        let reporter = renderer.await?;
        match &result {
            Ok((_, report)) => {
                reporter.finish_with_message(&format!("Aggregated {} records", report.records))
            }
            Err(_) => reporter.finish(),
        }
    }

    result
}
