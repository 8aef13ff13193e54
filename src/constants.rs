// Shared constants for lap evaluation

/// Radius around the start pose inside which a lap counts as closed (m).
pub const FINISH_LINE_RADIUS_M: f64 = 1.0;

/// Reference samples skipped before looking for the lap closure.
/// A closure is only accepted at an index strictly greater than this.
pub const REFERENCE_MIN_PROGRESS_SAMPLES: usize = 100;

/// Seconds a run must be under way before a closure can be detected.
pub const RUN_MIN_PROGRESS_SECS: f64 = 10.0;

/// Reference indices searched before the previous match (inclusive).
pub const DEVIATION_WINDOW_BEHIND: i64 = 10;

/// Reference indices searched after the previous match (exclusive).
pub const DEVIATION_WINDOW_AHEAD: i64 = 10;

/// Distances at or above this are treated as "no match" (m).
pub const DEVIATION_SENTINEL_M: f64 = 100.0;

/// Base of the exponential penalty applied to each matched distance.
pub const DEVIATION_PENALTY_BASE: f64 = 1000.0;

// --- Extracted stream layout ---

/// Pose table written by the log extractor.
pub const DEFAULT_POSE_FILE: &str = "F1ROS-odom.csv";

/// Simulation clock table written by the log extractor.
pub const DEFAULT_CLOCK_FILE: &str = "clock.csv";

pub const POSE_SECS_COLUMN: &str = "header.stamp.secs";
pub const POSE_NSECS_COLUMN: &str = "header.stamp.nsecs";
pub const POSE_X_COLUMN: &str = "pose.pose.position.x";
pub const POSE_Y_COLUMN: &str = "pose.pose.position.y";
pub const CLOCK_SECS_COLUMN: &str = "clock.secs";
pub const CLOCK_NSECS_COLUMN: &str = "clock.nsecs";
