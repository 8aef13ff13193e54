// Pose and clock samples consumed by the evaluator
//
// Both streams come from an external extraction step and are assumed to be
// ordered by capture time.

use crate::error::{EvaluationError, Result};
use crate::geometry::Position;

/// One odometry sample of the vehicle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSample {
    /// Log time in seconds, monotonic within a recording
    pub timestamp: f64,
    /// Position on the circuit plane
    pub position: Position,
}

impl PoseSample {
    pub fn new(timestamp: f64, x: f64, y: f64) -> Self {
        PoseSample {
            timestamp,
            position: Position::new(x, y),
        }
    }

    /// Exact coordinate equality, timestamps ignored
    pub fn same_position(&self, other: &PoseSample) -> bool {
        self.position == other.position
    }
}

/// One simulation clock sample, in wall-clock seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockSample {
    pub seconds: f64,
}

impl ClockSample {
    pub fn new(seconds: f64) -> Self {
        ClockSample { seconds }
    }
}

/// Position in a trajectory at which a lap is judged complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LapClosure {
    pub index: usize,
}

impl LapClosure {
    pub fn at(index: usize) -> Self {
        LapClosure { index }
    }
}

/// Fail fast on an empty pose stream
///
/// `which` names the stream in the error ("reference", "recorded").
pub fn require_poses<'a>(poses: &'a [PoseSample], which: &'static str) -> Result<&'a PoseSample> {
    poses.first().ok_or(EvaluationError::EmptyTrajectory(which))
}

/// Fail fast on an empty clock stream
pub fn require_clock(clock: &[ClockSample]) -> Result<&ClockSample> {
    clock.first().ok_or(EvaluationError::EmptyClock)
}

/// Iterate the positions of a trajectory
pub fn positions(poses: &[PoseSample]) -> impl Iterator<Item = &Position> + '_ {
    poses.iter().map(|p| &p.position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_poses() {
        let poses = vec![PoseSample::new(1.0, 2.0, 3.0)];
        assert_eq!(require_poses(&poses, "recorded").unwrap().timestamp, 1.0);

        let err = require_poses(&[], "reference").unwrap_err();
        assert!(matches!(err, EvaluationError::EmptyTrajectory("reference")));
    }

    #[test]
    fn test_require_clock() {
        assert!(matches!(require_clock(&[]), Err(EvaluationError::EmptyClock)));
        assert_eq!(require_clock(&[ClockSample::new(4.5)]).unwrap().seconds, 4.5);
    }

    #[test]
    fn test_same_position_ignores_timestamp() {
        let a = PoseSample::new(0.0, 1.0, 2.0);
        let b = PoseSample::new(99.0, 1.0, 2.0);
        let c = PoseSample::new(0.0, 1.0, 2.000001);
        assert!(a.same_position(&b));
        assert!(!a.same_position(&c));
    }
}
