use std::path::PathBuf;

use clap::Parser;

use crate::constants::{DEFAULT_CLOCK_FILE, DEFAULT_POSE_FILE};
use crate::evaluator::{EvaluatorConfig, LapTiming};
use crate::streams::StreamLayout;

/// Lap performance evaluation of recorded driving runs
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Extracted recording directory of the reference (perfect) lap.
    #[arg(long, value_name = "DIR")]
    pub reference: PathBuf,

    /// Extracted recording directory of a run to evaluate. May be repeated.
    #[arg(long, value_name = "DIR")]
    pub run: Vec<PathBuf>,

    /// Name of the pose table inside each recording directory.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_POSE_FILE)]
    pub pose_file: String,

    /// Name of the clock table inside each recording directory.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_CLOCK_FILE)]
    pub clock_file: String,

    /// Write all reports as JSON to a file instead of stdout.
    #[arg(long, value_name = "FILE")]
    pub write_json: Option<PathBuf>,

    /// Append one CSV row per run to a file.
    #[arg(long, value_name = "FILE")]
    pub write_csv: Option<PathBuf>,

    /// Pose sample whose clock time ends the lap.
    #[arg(long, value_enum, default_value_t = LapTiming::ScanEnd)]
    pub lap_timing: LapTiming,

    /// Verbose logging (DEBUG level)
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,
}

impl Config {
    pub fn stream_layout(&self) -> StreamLayout {
        StreamLayout {
            pose_file: self.pose_file.clone(),
            clock_file: self.clock_file.clone(),
        }
    }

    pub fn evaluator_config(&self) -> EvaluatorConfig {
        EvaluatorConfig {
            lap_timing: self.lap_timing,
        }
    }
}
