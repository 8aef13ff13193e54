//! Error types for lap evaluation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading streams or evaluating a lap.
///
/// A run that never closes a lap is not an error; it produces a report
/// with the completion-dependent fields left empty.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// A pose stream with zero samples was supplied
    #[error("{0} trajectory is empty")]
    EmptyTrajectory(&'static str),
    /// A clock stream with zero samples was supplied
    #[error("clock stream is empty")]
    EmptyClock,
    /// The reference recording never returns to its start pose
    #[error(
        "reference recording does not contain a full lap ({samples} samples, no return to start after the minimum-progress guard)"
    )]
    NoReferenceClosure { samples: usize },
    /// A tabular stream could not be parsed
    #[error("{}:{line}: {message}", path.display())]
    Stream {
        path: PathBuf,
        line: usize,
        message: String,
    },
    /// A stream file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, EvaluationError>;
