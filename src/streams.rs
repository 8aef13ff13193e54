// Stream loader - reads pose and clock tables produced by the log extractor
//
// Each recording directory holds one CSV table per stream. Columns are found
// by header name, so extra columns written by the extractor are ignored.
// Files are only read here; removing them is left to the extractor.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::constants::{
    CLOCK_NSECS_COLUMN, CLOCK_SECS_COLUMN, DEFAULT_CLOCK_FILE, DEFAULT_POSE_FILE,
    POSE_NSECS_COLUMN, POSE_SECS_COLUMN, POSE_X_COLUMN, POSE_Y_COLUMN,
};
use crate::error::{EvaluationError, Result};
use crate::samples::{ClockSample, PoseSample};

/// File names of the streams inside a recording directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamLayout {
    pub pose_file: String,
    pub clock_file: String,
}

impl Default for StreamLayout {
    fn default() -> Self {
        StreamLayout {
            pose_file: DEFAULT_POSE_FILE.to_string(),
            clock_file: DEFAULT_CLOCK_FILE.to_string(),
        }
    }
}

/// Both streams of one recording
#[derive(Debug, Clone)]
pub struct Recording {
    pub poses: Vec<PoseSample>,
    pub clock: Vec<ClockSample>,
}

/// Header-indexed view over a CSV table
struct Table<R> {
    path: PathBuf,
    lines: std::iter::Enumerate<std::io::Lines<BufReader<R>>>,
    header: Vec<String>,
}

impl<R: Read> Table<R> {
    fn open(reader: R, path: &Path) -> Result<Self> {
        let mut lines = BufReader::new(reader).lines().enumerate();
        let header = loop {
            match lines.next() {
                Some((_, line)) => {
                    let line = line.map_err(|source| io_error(path, source))?;
                    if !line.trim().is_empty() {
                        break split_row(&line);
                    }
                }
                None => return Err(stream_error(path, 1, "missing header row")),
            }
        };
        Ok(Table {
            path: path.to_path_buf(),
            lines,
            header,
        })
    }

    fn column(&self, name: &str) -> Result<usize> {
        self.optional_column(name)
            .ok_or_else(|| stream_error(&self.path, 1, format!("missing column '{}'", name)))
    }

    fn optional_column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Next non-blank row with its 1-based line number
    fn next_row(&mut self) -> Result<Option<(usize, Vec<String>)>> {
        for (index, line) in self.lines.by_ref() {
            let line = line.map_err(|source| io_error(&self.path, source))?;
            if line.trim().is_empty() {
                continue;
            }
            return Ok(Some((index + 1, split_row(&line))));
        }
        Ok(None)
    }

    fn field(&self, row: &[String], line: usize, column: usize) -> Result<f64> {
        let raw = row.get(column).ok_or_else(|| {
            stream_error(
                &self.path,
                line,
                format!("expected {} fields, found {}", self.header.len(), row.len()),
            )
        })?;
        raw.trim().parse::<f64>().map_err(|_| {
            stream_error(
                &self.path,
                line,
                format!("invalid number '{}' in column '{}'", raw, self.header[column]),
            )
        })
    }

    /// Seconds column plus an optional nanoseconds column
    fn seconds(&self, row: &[String], line: usize, secs: usize, nsecs: Option<usize>) -> Result<f64> {
        let mut seconds = self.field(row, line, secs)?;
        if let Some(nsecs) = nsecs {
            seconds += self.field(row, line, nsecs)? * 1e-9;
        }
        Ok(seconds)
    }
}

fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.trim_end_matches('\r').chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn stream_error(path: &Path, line: usize, message: impl Into<String>) -> EvaluationError {
    EvaluationError::Stream {
        path: path.to_path_buf(),
        line,
        message: message.into(),
    }
}

fn io_error(path: &Path, source: std::io::Error) -> EvaluationError {
    EvaluationError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Parse a pose table
///
/// `path` is only used in error messages.
pub fn read_pose_csv<R: Read>(reader: R, path: &Path) -> Result<Vec<PoseSample>> {
    let mut table = Table::open(reader, path)?;
    let secs = table.column(POSE_SECS_COLUMN)?;
    let nsecs = table.optional_column(POSE_NSECS_COLUMN);
    let x = table.column(POSE_X_COLUMN)?;
    let y = table.column(POSE_Y_COLUMN)?;

    let mut poses = Vec::new();
    while let Some((line, row)) = table.next_row()? {
        poses.push(PoseSample::new(
            table.seconds(&row, line, secs, nsecs)?,
            table.field(&row, line, x)?,
            table.field(&row, line, y)?,
        ));
    }
    Ok(poses)
}

/// Parse a clock table
pub fn read_clock_csv<R: Read>(reader: R, path: &Path) -> Result<Vec<ClockSample>> {
    let mut table = Table::open(reader, path)?;
    let secs = table.column(CLOCK_SECS_COLUMN)?;
    let nsecs = table.optional_column(CLOCK_NSECS_COLUMN);

    let mut clock = Vec::new();
    while let Some((line, row)) = table.next_row()? {
        clock.push(ClockSample::new(table.seconds(&row, line, secs, nsecs)?));
    }
    Ok(clock)
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| io_error(path, source))
}

/// Load the pose stream of a recording directory
pub fn load_poses(dir: &Path, layout: &StreamLayout) -> Result<Vec<PoseSample>> {
    let path = dir.join(&layout.pose_file);
    let poses = read_pose_csv(open(&path)?, &path)?;
    debug!("Loaded {} pose samples from {}", poses.len(), path.display());
    Ok(poses)
}

/// Load both streams of a recording directory
pub fn load_recording(dir: &Path, layout: &StreamLayout) -> Result<Recording> {
    let poses = load_poses(dir, layout)?;
    let path = dir.join(&layout.clock_file);
    let clock = read_clock_csv(open(&path)?, &path)?;
    debug!("Loaded {} clock samples from {}", clock.len(), path.display());
    Ok(Recording { poses, clock })
}
