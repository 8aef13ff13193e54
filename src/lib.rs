//! Lap performance evaluation
//!
//! Compares a recorded driving run against a reference lap of the same
//! circuit and reports distance, lap time, average speed, circuit
//! completion and path deviation.
//!
//! ```no_run
//! use lap_metrics::{evaluate_run, ReferenceLap};
//! use lap_metrics::streams::{load_poses, load_recording, StreamLayout};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), lap_metrics::EvaluationError> {
//! let layout = StreamLayout::default();
//! let reference = ReferenceLap::build(load_poses(Path::new("perfect_lap"), &layout)?)?;
//! let run = load_recording(Path::new("run_01"), &layout)?;
//! let report = evaluate_run(&reference, &run.poses, &run.clock)?;
//! println!("{:.1}% completed", report.percentage_completed);
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod error;
pub mod geometry;
pub mod samples;
pub mod path;
pub mod reference;
pub mod deviation;
pub mod evaluator;
pub mod report;
pub mod streams;
pub mod config;

#[cfg(test)]
mod test_util;

pub use error::EvaluationError;
pub use evaluator::{evaluate_run, EvaluatorConfig, LapTiming, RunEvaluator};
pub use reference::ReferenceLap;
pub use report::PerformanceReport;
pub use samples::{ClockSample, LapClosure, PoseSample};
