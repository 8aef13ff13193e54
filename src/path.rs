// Path accumulator - arc length along an ordered trajectory

use crate::geometry::distance;
use crate::samples::{LapClosure, PoseSample};

/// Cumulative distance driven along `checkpoints`
///
/// Sums the distance between each consecutive pair, in recorded order,
/// up to and including the checkpoint at `stop_at`. `None` or an index past
/// the end sums the whole sequence. The stop checkpoint is identified by
/// its index only.
///
/// # Returns
/// Arc length in meters (0 for fewer than two checkpoints)
pub fn circuit_distance(checkpoints: &[PoseSample], stop_at: Option<LapClosure>) -> f64 {
    let end = match stop_at {
        Some(closure) if closure.index < checkpoints.len() => closure.index + 1,
        _ => checkpoints.len(),
    };

    checkpoints[..end]
        .windows(2)
        .map(|pair| distance(&pair[0].position, &pair[1].position))
        .sum()
}
