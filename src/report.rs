use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

/// Performance metrics of one recorded run
///
/// Fields wrapped in `Option` are only present when the run closed a lap
/// and are left out of serialized output otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    /// Distance driven over the whole run (m)
    pub completed_distance: f64,
    /// Elapsed clock seconds for the lap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lap_seconds: Option<f64>,
    /// Distance driven up to the lap closure (m)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_diameter: Option<f64>,
    /// `circuit_diameter / lap_seconds` (m/s)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_speed: Option<f64>,
    /// Circuit covered, 100 per completed lap plus partial progress
    pub percentage_completed: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_deviation_mae: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_deviation_total_err: Option<f64>,
    /// Distinct finish-line crossings
    pub laps: u32,
}

impl PerformanceReport {
    /// Report with only the distance known
    pub fn new(completed_distance: f64) -> Self {
        PerformanceReport {
            completed_distance,
            lap_seconds: None,
            circuit_diameter: None,
            average_speed: None,
            percentage_completed: 0.0,
            position_deviation_mae: None,
            position_deviation_total_err: None,
            laps: 0,
        }
    }

    pub fn lap_completed(&self) -> bool {
        self.lap_seconds.is_some()
    }
}

/// A report tagged with the run it came from
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run: String,
    /// RFC 3339 time the evaluation finished
    pub evaluated_at: String,
    #[serde(flatten)]
    pub report: PerformanceReport,
}

impl RunReport {
    pub fn new(run: impl Into<String>, report: PerformanceReport) -> Self {
        RunReport {
            run: run.into(),
            evaluated_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            report,
        }
    }
}

/// Trait for report output handlers
pub trait ReportHandler: Send {
    /// Handle the report of one evaluated run
    fn handle_report(&mut self, report: &RunReport) -> io::Result<()>;

    /// Called once after the last report
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Summary line per run in the log
pub struct LogOutput;

impl ReportHandler for LogOutput {
    fn handle_report(&mut self, run: &RunReport) -> io::Result<()> {
        let r = &run.report;
        match (r.lap_seconds, r.average_speed) {
            (Some(secs), Some(speed)) => info!(
                "{}: lap {:.2} s, {:.2} m at {:.2} m/s, {:.1}% completed, {} lap(s)",
                run.run,
                secs,
                r.circuit_diameter.unwrap_or_default(),
                speed,
                r.percentage_completed,
                r.laps
            ),
            (Some(secs), None) => info!(
                "{}: lap {:.2} s, {:.1}% completed, {} lap(s)",
                run.run, secs, r.percentage_completed, r.laps
            ),
            _ => info!(
                "{}: lap not completed, {:.2} m driven, {:.1}% completed",
                run.run, r.completed_distance, r.percentage_completed
            ),
        }
        Ok(())
    }
}

/// JSON array of all reports, written on `finish`
pub struct JsonOutput {
    path: Option<PathBuf>,
    reports: Vec<RunReport>,
}

impl JsonOutput {
    /// Write to `path`, or stdout when `None`
    pub fn new(path: Option<PathBuf>) -> Self {
        JsonOutput {
            path,
            reports: Vec::new(),
        }
    }

    pub fn format_json(reports: &[RunReport]) -> serde_json::Result<String> {
        serde_json::to_string_pretty(reports)
    }
}

impl ReportHandler for JsonOutput {
    fn handle_report(&mut self, report: &RunReport) -> io::Result<()> {
        self.reports.push(report.clone());
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        let json = Self::format_json(&self.reports)?;
        match &self.path {
            Some(path) => {
                // Write-then-rename so readers never see a partial file
                let tmp = path.with_extension("json.tmp");
                std::fs::write(&tmp, json + "\n")?;
                std::fs::rename(&tmp, path)
            }
            None => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{}", json)
            }
        }
    }
}

const CSV_HEADER: &str = "run,evaluated_at,completed_distance,lap_seconds,circuit_diameter,average_speed,percentage_completed,position_deviation_mae,position_deviation_total_err,laps";

/// CSV format output, one row per run, appended
pub struct CsvOutput {
    writer: BufWriter<File>,
}

impl CsvOutput {
    /// Open `path` for appending, writing the header if the file is new or empty
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let is_empty = file.metadata()?.len() == 0;
        let mut writer = BufWriter::new(file);
        if is_empty {
            writeln!(writer, "{}", CSV_HEADER)?;
        }
        Ok(CsvOutput { writer })
    }

    fn format_row(run: &RunReport) -> String {
        fn cell(value: Option<f64>) -> String {
            value.map(|v| format!("{:.6}", v)).unwrap_or_default()
        }
        let r = &run.report;
        format!(
            "{},{},{:.6},{},{},{},{:.6},{},{},{}",
            escape_csv(&run.run),
            run.evaluated_at,
            r.completed_distance,
            cell(r.lap_seconds),
            cell(r.circuit_diameter),
            cell(r.average_speed),
            r.percentage_completed,
            cell(r.position_deviation_mae),
            cell(r.position_deviation_total_err),
            r.laps
        )
    }
}

impl ReportHandler for CsvOutput {
    fn handle_report(&mut self, report: &RunReport) -> io::Result<()> {
        writeln!(self.writer, "{}", Self::format_row(report))
    }

    fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
