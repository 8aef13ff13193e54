// Geometry module - planar distances and finish-line proximity
//
// Positions are odometry coordinates on the circuit plane, in meters.
// Altitude is never part of the evaluation.

use nalgebra as na;

use crate::constants::FINISH_LINE_RADIUS_M;

/// A position on the circuit plane (x, y) in meters
pub type Position = na::Point2<f64>;

/// Returns straight-line (Euclidean) distance in meters between two positions
///
/// NaN coordinates propagate to a NaN distance.
///
/// # Example
/// ```
/// use lap_metrics::geometry::{distance, Position};
/// let d = distance(&Position::new(0.0, 0.0), &Position::new(3.0, 4.0));
/// assert_eq!(d, 5.0);
/// ```
#[inline]
pub fn distance(a: &Position, b: &Position) -> f64 {
    na::distance(a, b)
}

/// True when `point` lies within the finish radius of `start`
///
/// The radius is the fixed [`FINISH_LINE_RADIUS_M`]; the boundary counts
/// as inside.
#[inline]
pub fn is_finish_line(point: &Position, start: &Position) -> bool {
    distance(point, start) <= FINISH_LINE_RADIUS_M
}

/// Full nearest-neighbor scan over `checkpoints`
///
/// # Returns
/// `(index, distance)` of the closest checkpoint. Ties keep the earliest
/// index and NaN distances never match. `None` when nothing matched.
pub fn nearest_checkpoint<'a, I>(position: &Position, checkpoints: I) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = &'a Position>,
{
    let mut best: Option<(usize, f64)> = None;
    for (i, checkpoint) in checkpoints.into_iter().enumerate() {
        let dist = distance(position, checkpoint);
        match best {
            Some((_, best_dist)) if dist < best_dist => best = Some((i, dist)),
            None if !dist.is_nan() => best = Some((i, dist)),
            _ => {}
        }
    }
    best
}
