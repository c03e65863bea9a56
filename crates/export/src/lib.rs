//! Export helpers for CSV and JSON artifacts.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Create a writer for the target path, handling stdout (`-`) by convention.
pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    Ok(Box::new(BufWriter::new(file)))
}

pub mod report {
    use std::io::Write;
    use std::path::Path;

    use serde::{Deserialize, Serialize};
    use serde_json::to_writer_pretty;

    use super::{ExportError, writer_for_path};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ModuleReport {
        pub id: String,
        pub kind: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub technology: Option<String>,
        pub dry_mass_kg: f64,
        pub reference_power_w: f64,
        pub initial_propellant_kg: f64,
        pub lowest_propellant_kg: f64,
        pub recurring_cost: f64,
        pub non_recurring_cost: f64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct SpacecraftReport {
        pub id: String,
        pub kind: String,
        pub group: String,
        pub dry_mass_kg: f64,
        pub propellant_kg: f64,
        pub wet_mass_kg: f64,
        pub recurring_cost: f64,
        pub non_recurring_cost: f64,
        pub modules: Vec<ModuleReport>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct Totals {
        pub dry_mass_kg: f64,
        pub propellant_kg: f64,
        pub wet_mass_kg: f64,
        pub recurring_cost: f64,
        pub non_recurring_cost: f64,
        pub operational_cost: f64,
    }

    /// Outcome of the last convergence run.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Convergence {
        pub converged: bool,
        pub iterations: usize,
        pub unsettled_modules: Vec<String>,
        /// Outcome of each convergence pass, in run order.
        #[serde(default)]
        pub passes: Vec<bool>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct FleetReport {
        pub fleet: String,
        pub architecture: String,
        pub convergence: Convergence,
        pub program_duration_days: f64,
        pub spacecraft: Vec<SpacecraftReport>,
        pub totals: Totals,
    }

    pub fn write_json(writer: &mut dyn Write, report: &FleetReport) -> Result<(), ExportError> {
        to_writer_pretty(&mut *writer, report)?;
        writeln!(writer)?;
        Ok(())
    }

    /// Write the report as pretty JSON to `path` (`-` for stdout).
    pub fn write_json_file(path: &Path, report: &FleetReport) -> Result<(), ExportError> {
        let mut writer = writer_for_path(path)?;
        write_json(writer.as_mut(), report)?;
        writer.flush()?;
        Ok(())
    }
}

pub mod timeline {
    use std::io::Write;
    use std::path::Path;

    use serde::{Deserialize, Serialize};

    use super::{ExportError, writer_for_path};

    /// CSV row of the phase timeline.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct TimelineRow {
        pub phase: String,
        pub kind: String,
        pub spacecraft: String,
        pub module: String,
        pub start_utc: String,
        pub end_utc: String,
        pub duration_days: f64,
        pub delta_v_m_s: f64,
        pub propellant_used_kg: f64,
        pub propellant_left_kg: Option<f64>,
    }

    pub fn write_timeline<W: Write>(writer: W, rows: &[TimelineRow]) -> Result<(), ExportError> {
        let mut csv = csv::Writer::from_writer(writer);
        for row in rows {
            csv.serialize(row)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Write the timeline CSV to `path` (`-` for stdout).
    pub fn write_timeline_file(path: &Path, rows: &[TimelineRow]) -> Result<(), ExportError> {
        let writer = writer_for_path(path)?;
        write_timeline(writer, rows)
    }
}
