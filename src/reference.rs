// Reference lap - the "perfect" lap every run is compared against

use tracing::{debug, info};

use crate::constants::REFERENCE_MIN_PROGRESS_SAMPLES;
use crate::error::{EvaluationError, Result};
use crate::geometry::is_finish_line;
use crate::path::circuit_distance;
use crate::samples::{require_poses, LapClosure, PoseSample};

/// First complete lap found in a reference recording
///
/// Immutable once built; share it between evaluations behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ReferenceLap {
    checkpoints: Vec<PoseSample>,
    closure: LapClosure,
    circuit_diameter: f64,
}

impl ReferenceLap {
    /// Build a reference lap from the pose stream of a reference recording
    ///
    /// The first [`REFERENCE_MIN_PROGRESS_SAMPLES`] samples after the start
    /// are skipped so the start pose cannot close the lap on itself. The
    /// first later sample back inside the finish radius closes the lap.
    ///
    /// # Errors
    /// * `EmptyTrajectory` for an empty stream
    /// * `NoReferenceClosure` if the recording never returns to its start
    pub fn build(trajectory: Vec<PoseSample>) -> Result<Self> {
        let start = *require_poses(&trajectory, "reference")?;

        let closure = trajectory
            .iter()
            .enumerate()
            .skip(REFERENCE_MIN_PROGRESS_SAMPLES + 1)
            .find(|(_, sample)| is_finish_line(&sample.position, &start.position))
            .map(|(i, _)| LapClosure::at(i))
            .ok_or(EvaluationError::NoReferenceClosure {
                samples: trajectory.len(),
            })?;

        let circuit_diameter = circuit_distance(&trajectory, Some(closure));
        debug!(
            closure = closure.index,
            samples = trajectory.len(),
            "Reference lap closure found"
        );
        info!(
            "Reference lap: {:.2} m over {} checkpoints",
            circuit_diameter, closure.index
        );

        Ok(ReferenceLap {
            checkpoints: trajectory,
            closure,
            circuit_diameter,
        })
    }

    /// Every checkpoint of the reference recording
    pub fn checkpoints(&self) -> &[PoseSample] {
        &self.checkpoints
    }

    /// One loop of the circuit, from the start up to the closure sample
    ///
    /// The closure sample itself is excluded: it lies back on the start, so
    /// wrapping past the last element continues at index 0.
    pub fn lap_checkpoints(&self) -> &[PoseSample] {
        &self.checkpoints[..self.closure.index]
    }

    pub fn closure(&self) -> LapClosure {
        self.closure
    }

    /// Arc length of the lap in meters
    pub fn circuit_diameter(&self) -> f64 {
        self.circuit_diameter
    }
}
