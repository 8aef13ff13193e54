// Deviation scorer - how closely a run tracked the reference path
//
// Each recorded checkpoint is matched to its nearest reference checkpoint.
// Only the first one is searched against the whole lap; later ones search a
// short window around the previous match, which keeps the alignment moving
// forward along the lap. A vehicle that strays far enough for its true
// nearest point to leave the window loses track; that is accepted.

use tracing::{debug, warn};

use crate::constants::{
    DEVIATION_PENALTY_BASE, DEVIATION_SENTINEL_M, DEVIATION_WINDOW_AHEAD, DEVIATION_WINDOW_BEHIND,
};
use crate::geometry::distance;
use crate::reference::ReferenceLap;
use crate::samples::{LapClosure, PoseSample};

/// Aggregate deviation of a run from the reference lap
#[derive(Debug, Clone, PartialEq)]
pub struct DeviationScore {
    /// Mean penalty; `None` when no checkpoint matched
    pub mae: Option<f64>,
    /// Sum of penalties
    pub total_err: f64,
    /// Checkpoints that contributed a penalty
    pub matched: usize,
    /// Checkpoints with no reference point under the sentinel distance
    pub skipped: usize,
}

/// Search the whole lap for the checkpoint nearest to `checkpoint`
///
/// When `checkpoint` sits exactly on `stop_on`, the scan ends after the
/// reference element being examined.
///
/// # Returns
/// `(reference_index, distance)` or `None` if nothing is closer than the
/// sentinel distance
pub fn full_match(
    lap: &[PoseSample],
    checkpoint: &PoseSample,
    stop_on: Option<&PoseSample>,
) -> Option<(usize, f64)> {
    let stop_early = stop_on.is_some_and(|closure| checkpoint.same_position(closure));
    let mut best: Option<(usize, f64)> = None;
    let mut min_dist = DEVIATION_SENTINEL_M;

    for (i, reference) in lap.iter().enumerate() {
        let dist = distance(&checkpoint.position, &reference.position);
        if dist < min_dist {
            min_dist = dist;
            best = Some((i, dist));
        }
        if stop_early {
            break;
        }
    }
    best
}

/// Search reference indices `previous - 10 ..= previous + 9`, wrapping
/// around both ends of the lap
///
/// # Returns
/// `(reference_index, distance)` with the index normalised into the lap,
/// or `None` if nothing is closer than the sentinel distance
pub fn windowed_match(
    lap: &[PoseSample],
    checkpoint: &PoseSample,
    previous: usize,
) -> Option<(usize, f64)> {
    if lap.is_empty() {
        return None;
    }
    let len = lap.len() as i64;
    let mut best: Option<(usize, f64)> = None;
    let mut min_dist = DEVIATION_SENTINEL_M;

    for offset in -DEVIATION_WINDOW_BEHIND..DEVIATION_WINDOW_AHEAD {
        let index = (previous as i64 + offset).rem_euclid(len) as usize;
        let dist = distance(&checkpoint.position, &lap[index].position);
        if dist < min_dist {
            min_dist = dist;
            best = Some((index, dist));
        }
    }
    best
}

/// Score how closely `trajectory` followed the reference lap
///
/// Every matched distance `d` contributes `1000^d`, so small deviations
/// stay cheap while large ones dominate. The reference is only read.
///
/// # Arguments
/// * `reference` - Reference lap to align against
/// * `trajectory` - The full recorded run
/// * `closure` - Lap closure detected in `trajectory`
pub fn score_deviation(
    reference: &ReferenceLap,
    trajectory: &[PoseSample],
    closure: LapClosure,
) -> DeviationScore {
    let lap = reference.lap_checkpoints();
    let closure_checkpoint = trajectory.get(closure.index);

    let mut previous_match: Option<usize> = None;
    let mut penalties: Vec<f64> = Vec::with_capacity(trajectory.len());
    let mut skipped = 0;

    for checkpoint in trajectory {
        let found = match previous_match {
            None => full_match(lap, checkpoint, closure_checkpoint),
            Some(previous) => windowed_match(lap, checkpoint, previous),
        };

        match found {
            Some((index, dist)) => {
                previous_match = Some(index);
                penalties.push(DEVIATION_PENALTY_BASE.powf(dist));
            }
            None => {
                skipped += 1;
                previous_match = Some(match previous_match {
                    Some(previous) if !lap.is_empty() => (previous + 1) % lap.len(),
                    _ => 0,
                });
            }
        }
    }

    let total_err: f64 = penalties.iter().sum();
    let mae = if penalties.is_empty() {
        warn!(
            "No checkpoint within {} m of the reference path, deviation mean undefined",
            DEVIATION_SENTINEL_M
        );
        None
    } else {
        Some(total_err / penalties.len() as f64)
    };
    debug!(
        matched = penalties.len(),
        skipped, total_err, "Deviation scored"
    );

    DeviationScore {
        mae,
        total_err,
        matched: penalties.len(),
        skipped,
    }
}
