// Lap evaluation - command-line entry point

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use lap_metrics::config::Config;
use lap_metrics::report::{CsvOutput, JsonOutput, LogOutput, ReportHandler, RunReport};
use lap_metrics::streams::{load_poses, load_recording, StreamLayout};
use lap_metrics::{EvaluationError, PerformanceReport, ReferenceLap, RunEvaluator};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    let layout = config.stream_layout();
    info!("Loading reference lap from {}", config.reference.display());
    let reference = Arc::new(ReferenceLap::build(load_poses(&config.reference, &layout)?)?);

    if config.run.is_empty() {
        warn!("No runs to evaluate! Use --run DIR");
    }

    // Each run is evaluated on its own blocking task; the reference is shared read-only
    let evaluator = RunEvaluator::new(config.evaluator_config());
    let mut tasks = Vec::with_capacity(config.run.len());
    for dir in &config.run {
        let dir = dir.clone();
        let reference = Arc::clone(&reference);
        let evaluator = evaluator.clone();
        let layout = layout.clone();
        tasks.push(tokio::task::spawn_blocking(move || {
            let result = evaluate_dir(&dir, &reference, &evaluator, &layout);
            (dir, result)
        }));
    }

    let mut handlers: Vec<Box<dyn ReportHandler>> = vec![Box::new(LogOutput)];
    handlers.push(Box::new(JsonOutput::new(config.write_json.clone())));
    if let Some(path) = &config.write_csv {
        info!("Writing CSV results to {}", path.display());
        handlers.push(Box::new(CsvOutput::new(path)?));
    }

    let mut failed = 0usize;
    for task in tasks {
        let (dir, result) = task.await?;
        match result {
            Ok(report) => {
                let run = RunReport::new(run_name(&dir), report);
                for handler in handlers.iter_mut() {
                    if let Err(e) = handler.handle_report(&run) {
                        error!("Failed to write report for {}: {}", run.run, e);
                    }
                }
            }
            Err(e) => {
                failed += 1;
                error!("Skipping run {}: {}", dir.display(), e);
            }
        }
    }

    for handler in handlers.iter_mut() {
        handler.finish()?;
    }

    info!(
        "Evaluated {} run(s), {} failed",
        config.run.len() - failed,
        failed
    );
    Ok(())
}

fn evaluate_dir(
    dir: &Path,
    reference: &ReferenceLap,
    evaluator: &RunEvaluator,
    layout: &StreamLayout,
) -> Result<PerformanceReport, EvaluationError> {
    let recording = load_recording(dir, layout)?;
    evaluator.evaluate(reference, &recording.poses, &recording.clock)
}

fn run_name(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}

/// Initialize logging subsystem
fn init_logging(verbose: bool) {
    use tracing_subscriber::fmt::format::FmtSpan;

    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_span_events(if verbose {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        });

    if verbose {
        subscriber
            .with_max_level(tracing::Level::DEBUG)
            .init();
        info!("Verbose logging enabled (DEBUG level)");
    } else {
        subscriber
            .with_max_level(tracing::Level::INFO)
            .init();
    }
}
