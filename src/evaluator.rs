// Run evaluator - turns a recorded run into a performance report
//
// Steps: total distance driven, lap-closure scan, timing and speed for the
// first closed lap, deviation from the reference path, and how much of the
// circuit was covered.

use tracing::{debug, info, warn};

use crate::constants::RUN_MIN_PROGRESS_SECS;
use crate::deviation::score_deviation;
use crate::error::Result;
use crate::geometry::{is_finish_line, nearest_checkpoint};
use crate::path::circuit_distance;
use crate::reference::ReferenceLap;
use crate::report::PerformanceReport;
use crate::samples::{positions, require_clock, require_poses, ClockSample, LapClosure, PoseSample};

/// Which pose index anchors the end of the lap when reading the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LapTiming {
    /// Last sample of the closure scan, i.e. the end of the recording.
    /// Reports the duration of the whole run even if it drove several laps.
    #[default]
    ScanEnd,
    /// Sample at which the first lap closed
    FirstClosure,
}

/// Evaluation settings
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluatorConfig {
    pub lap_timing: LapTiming,
}

/// Outcome of scanning a run for finish-line crossings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LapScan {
    /// First sample that closed a lap
    pub first_closure_index: Option<usize>,
    /// Index the scan stopped at (always the last sample)
    pub scan_end_index: usize,
    /// Physically distinct finish-line crossings
    pub laps: u32,
}

impl LapScan {
    pub fn closure(&self) -> Option<LapClosure> {
        self.first_closure_index.map(LapClosure::at)
    }
}

/// Scan a run for finish-line crossings
///
/// A sample is a candidate once more than [`RUN_MIN_PROGRESS_SECS`] have
/// elapsed since the first sample and it lies within the finish radius of
/// the start. Consecutive candidates belong to the same crossing and are
/// counted once.
pub fn scan_laps(poses: &[PoseSample]) -> LapScan {
    let mut scan = LapScan {
        first_closure_index: None,
        scan_end_index: poses.len().saturating_sub(1),
        laps: 0,
    };
    let Some(start) = poses.first() else {
        return scan;
    };

    let mut previous_candidate: Option<usize> = None;
    for (i, sample) in poses.iter().enumerate().skip(1) {
        let elapsed = sample.timestamp - start.timestamp;
        if elapsed <= RUN_MIN_PROGRESS_SECS || !is_finish_line(&sample.position, &start.position) {
            continue;
        }
        if scan.first_closure_index.is_none() {
            scan.first_closure_index = Some(i);
        }
        if previous_candidate != Some(i - 1) {
            scan.laps += 1;
        }
        previous_candidate = Some(i);
    }
    scan
}

/// Clock sample matching the same fraction of the recording as `pose_index`
pub fn aligned_clock_index(clock_len: usize, pose_index: usize, pose_len: usize) -> usize {
    if clock_len == 0 || pose_len == 0 {
        return 0;
    }
    ((clock_len * pose_index) / pose_len).min(clock_len - 1)
}

/// Share of the circuit covered, in percent
///
/// The first and last run samples are aligned to the reference lap by a
/// full nearest-neighbor search; every completed lap adds another 100.
pub fn completion_percentage(reference: &ReferenceLap, poses: &[PoseSample], laps: u32) -> f64 {
    let lap = reference.lap_checkpoints();
    let (Some(first), Some(last)) = (poses.first(), poses.last()) else {
        return laps as f64 * 100.0;
    };

    let first_index = nearest_checkpoint(&first.position, positions(lap));
    let last_index = nearest_checkpoint(&last.position, positions(lap));
    match (first_index, last_index) {
        (Some((first_index, _)), Some((last_index, _))) => {
            debug!(first_index, last_index, laps, "Run aligned to reference");
            let progress = last_index as f64 - first_index as f64;
            (progress / lap.len() as f64) * 100.0 + laps as f64 * 100.0
        }
        _ => {
            warn!("Run endpoints could not be aligned to the reference lap");
            laps as f64 * 100.0
        }
    }
}

/// Evaluates recorded runs against a shared reference lap
#[derive(Debug, Clone, Default)]
pub struct RunEvaluator {
    config: EvaluatorConfig,
}

impl RunEvaluator {
    pub fn new(config: EvaluatorConfig) -> Self {
        RunEvaluator { config }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Evaluate one recorded run
    ///
    /// # Arguments
    /// * `reference` - Reference lap of the same circuit
    /// * `poses` - Pose stream of the run, in capture order
    /// * `clock` - Simulation clock stream of the run, in capture order
    ///
    /// # Returns
    /// A report whose timing, speed and deviation fields are empty when the
    /// run never closed a lap
    ///
    /// # Errors
    /// `EmptyTrajectory` / `EmptyClock` for empty streams
    pub fn evaluate(
        &self,
        reference: &ReferenceLap,
        poses: &[PoseSample],
        clock: &[ClockSample],
    ) -> Result<PerformanceReport> {
        require_poses(poses, "recorded")?;
        let start_clock = *require_clock(clock)?;

        let last = LapClosure::at(poses.len() - 1);
        let mut report = PerformanceReport::new(circuit_distance(poses, Some(last)));

        let scan = scan_laps(poses);
        report.laps = scan.laps;

        if let Some(closure) = scan.closure() {
            let anchor_index = match self.config.lap_timing {
                LapTiming::ScanEnd => scan.scan_end_index,
                LapTiming::FirstClosure => closure.index,
            };
            let end_clock = clock[aligned_clock_index(clock.len(), anchor_index, poses.len())];
            let lap_seconds = end_clock.seconds - start_clock.seconds;
            let circuit_diameter = circuit_distance(poses, Some(closure));

            report.lap_seconds = Some(lap_seconds);
            report.circuit_diameter = Some(circuit_diameter);
            if lap_seconds > 0.0 {
                report.average_speed = Some(circuit_diameter / lap_seconds);
            } else {
                warn!(lap_seconds, "Clock did not advance over the lap, average speed omitted");
            }

            let deviation = score_deviation(reference, poses, closure);
            report.position_deviation_mae = deviation.mae;
            report.position_deviation_total_err = Some(deviation.total_err);

            debug!(
                first_closure = closure.index,
                scan_end = scan.scan_end_index,
                anchor_index,
                laps = scan.laps,
                "Lap closed"
            );
        } else {
            info!("Lap not completed");
        }

        report.percentage_completed = completion_percentage(reference, poses, scan.laps);
        Ok(report)
    }
}

/// Evaluate a run with the default settings
pub fn evaluate_run(
    reference: &ReferenceLap,
    poses: &[PoseSample],
    clock: &[ClockSample],
) -> Result<PerformanceReport> {
    RunEvaluator::default().evaluate(reference, poses, clock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvaluationError;
    use crate::test_util::{circle_track, clock_stream, partial_arc};

    const EPSILON: f64 = 1e-6;

    fn reference() -> ReferenceLap {
        ReferenceLap::build(circle_track(200, 50.0, 0.25)).unwrap()
    }

    /// Run stamped from `t0` with `dt` spacing
    fn restamp(poses: Vec<PoseSample>, t0: f64, dt: f64) -> Vec<PoseSample> {
        poses
            .into_iter()
            .enumerate()
            .map(|(i, s)| PoseSample { timestamp: t0 + i as f64 * dt, ..s })
            .collect()
    }

    /// `laps` consecutive laps of the reference circle
    fn multi_lap(laps: usize, dt: f64) -> Vec<PoseSample> {
        let lap = circle_track(200, 50.0, dt);
        let mut poses = vec![lap[0]];
        for _ in 0..laps {
            poses.extend(lap.iter().skip(1).copied());
        }
        restamp(poses, 0.0, dt)
    }

    #[test]
    fn test_identical_lap_end_to_end() {
        let reference = reference();
        // 200 samples over 50 s
        let run = circle_track(200, 50.0, 50.0 / 199.0);
        let clock = clock_stream(200, 1000.0, 50.0);

        let report = evaluate_run(&reference, &run, &clock).unwrap();

        let diameter = reference.circuit_diameter();
        assert!((report.completed_distance - diameter).abs() < EPSILON);
        assert!((report.circuit_diameter.unwrap() - diameter).abs() < EPSILON);
        assert!((report.lap_seconds.unwrap() - 50.0).abs() < EPSILON);
        assert!((report.average_speed.unwrap() - diameter / 50.0).abs() < EPSILON);
        assert!((report.percentage_completed - 100.0).abs() < EPSILON);
        assert_eq!(report.laps, 1);
        // No excess over the 1000^0 floor per checkpoint
        let total = report.position_deviation_total_err.unwrap();
        assert!((total - 200.0).abs() < EPSILON);
        assert!((report.position_deviation_mae.unwrap() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_run_that_never_returns() {
        let reference = reference();
        // Very long run that stops short of the start
        let run = partial_arc(150, 50.0, 0.5, 10.0);
        let clock = clock_stream(100, 0.0, 1490.0);

        let report = evaluate_run(&reference, &run, &clock).unwrap();

        assert!(report.lap_seconds.is_none());
        assert!(report.circuit_diameter.is_none());
        assert!(report.average_speed.is_none());
        assert!(report.position_deviation_mae.is_none());
        assert!(report.position_deviation_total_err.is_none());
        assert_eq!(report.laps, 0);
        assert!(!report.lap_completed());

        let half = std::f64::consts::PI * 50.0;
        assert!((report.completed_distance - half).abs() < 0.1);
        // Roughly half the circuit covered
        assert!((report.percentage_completed - 50.0).abs() < 1.0);
    }

    #[test]
    fn test_guard_blocks_early_closure() {
        // A full lap driven in under 10 seconds is not recognised
        let run = circle_track(200, 50.0, 0.04);
        let scan = scan_laps(&run);
        assert_eq!(scan.first_closure_index, None);
        assert_eq!(scan.laps, 0);
        assert_eq!(scan.scan_end_index, 199);
    }

    #[test]
    fn test_consecutive_samples_in_radius_count_once() {
        // Slow approach: five samples inside the finish radius at the end
        let mut run = circle_track(200, 50.0, 0.25);
        let end = run[199];
        for k in 1..5 {
            run.push(PoseSample::new(end.timestamp + k as f64 * 0.25, 50.0, 0.1 * k as f64));
        }
        let scan = scan_laps(&run);
        assert_eq!(scan.first_closure_index, Some(199));
        assert_eq!(scan.laps, 1);
        assert_eq!(scan.scan_end_index, 203);
    }

    #[test]
    fn test_separate_crossings_each_count() {
        let run = multi_lap(3, 0.25);
        let scan = scan_laps(&run);
        assert_eq!(scan.first_closure_index, Some(199));
        assert_eq!(scan.laps, 3);
    }

    #[test]
    fn test_multi_lap_report() {
        let reference = reference();
        let run = multi_lap(2, 0.25);
        let clock = clock_stream(run.len(), 0.0, (run.len() - 1) as f64 * 0.25);

        let report = evaluate_run(&reference, &run, &clock).unwrap();
        assert_eq!(report.laps, 2);
        assert!((report.percentage_completed - 200.0).abs() < EPSILON);
        // Diameter only covers the first lap
        assert!((report.circuit_diameter.unwrap() - reference.circuit_diameter()).abs() < EPSILON);
        assert!((report.completed_distance - 2.0 * reference.circuit_diameter()).abs() < 1e-6);
    }

    #[test]
    fn test_lap_timing_anchor() {
        let reference = reference();
        let run = multi_lap(2, 0.25);
        // One clock tick per pose sample, 0.25 s apart
        let clock: Vec<ClockSample> = run.iter().map(|s| ClockSample::new(s.timestamp)).collect();

        let scan_end = evaluate_run(&reference, &run, &clock).unwrap();
        let first_closure = RunEvaluator::new(EvaluatorConfig {
            lap_timing: LapTiming::FirstClosure,
        })
        .evaluate(&reference, &run, &clock)
        .unwrap();

        // Whole recording: 398 intervals
        assert!((scan_end.lap_seconds.unwrap() - 398.0 * 0.25).abs() < EPSILON);
        // First lap only: 199 intervals
        assert!((first_closure.lap_seconds.unwrap() - 199.0 * 0.25).abs() < EPSILON);
        assert_eq!(scan_end.circuit_diameter, first_closure.circuit_diameter);
    }

    #[test]
    fn test_frozen_clock_omits_speed() {
        let reference = reference();
        let run = circle_track(200, 50.0, 0.25);
        let clock = vec![ClockSample::new(5.0); 10];

        let report = evaluate_run(&reference, &run, &clock).unwrap();
        assert_eq!(report.lap_seconds, Some(0.0));
        assert!(report.average_speed.is_none());
        assert!(report.circuit_diameter.is_some());
    }

    #[test]
    fn test_empty_streams_rejected() {
        let reference = reference();
        let run = circle_track(200, 50.0, 0.25);
        let clock = clock_stream(10, 0.0, 50.0);

        assert!(matches!(
            evaluate_run(&reference, &[], &clock),
            Err(EvaluationError::EmptyTrajectory("recorded"))
        ));
        assert!(matches!(
            evaluate_run(&reference, &run, &[]),
            Err(EvaluationError::EmptyClock)
        ));
    }

    #[test]
    fn test_single_sample_run() {
        let reference = reference();
        let run = vec![PoseSample::new(0.0, 50.0, 0.0)];
        let report = evaluate_run(&reference, &run, &[ClockSample::new(0.0)]).unwrap();
        assert_eq!(report.completed_distance, 0.0);
        assert_eq!(report.percentage_completed, 0.0);
        assert!(!report.lap_completed());
    }

    #[test]
    fn test_aligned_clock_index() {
        assert_eq!(aligned_clock_index(200, 199, 200), 199);
        assert_eq!(aligned_clock_index(100, 199, 200), 99);
        assert_eq!(aligned_clock_index(10, 0, 200), 0);
        assert_eq!(aligned_clock_index(1, 199, 200), 0);
        assert_eq!(aligned_clock_index(0, 5, 10), 0);
    }

    #[test]
    fn test_run_starting_mid_lap() {
        let reference = reference();
        // Starts a quarter of the way round, ends at three quarters
        let lap = reference.lap_checkpoints();
        let run = restamp(lap[50..=149].to_vec(), 0.0, 0.1);
        let pct = completion_percentage(&reference, &run, 0);
        assert!((pct - 99.0 / 199.0 * 100.0).abs() < EPSILON);
    }
}
