//! Writing simulation exports to disk.
//!
//! Files are written to a temp file in the target directory, synced and
//! renamed into place, so a reader never sees a half-written export.

use crate::format::DisplayZone;
use crate::report::{to_csv, to_json};
use crate::{Error, Result, SimulationResult};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Prefix shared by CSV and JSON export file names
pub const FILE_PREFIX: &str = "simulation_diabetes";

/// Export file format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    /// Render the export payload for a result
    pub fn render(&self, result: &SimulationResult, zone: DisplayZone) -> Result<String> {
        match self {
            ExportFormat::Csv => Ok(to_csv(result, zone)),
            ExportFormat::Json => Ok(to_json(result, zone)?),
        }
    }
}

/// `simulation_diabetes_<DD-MM-YYYY>.<ext>`
pub fn file_name(result: &SimulationResult, format: ExportFormat, zone: DisplayZone) -> String {
    format!(
        "{}_{}.{}",
        FILE_PREFIX,
        zone.file_date(&result.timestamp),
        format.extension()
    )
}

/// Write an export into `dir`, returning the path of the written file.
///
/// An existing export with the same name (same day) is replaced.
pub fn write_export(
    result: &SimulationResult,
    format: ExportFormat,
    dir: &Path,
    zone: DisplayZone,
) -> Result<PathBuf> {
    let contents = format.render(result, zone)?;
    let path = dir.join(file_name(result, format, zone));
    write_atomic(&path, contents.as_bytes())?;

    tracing::info!("Exported {:?} simulation to {:?}", format, path);
    Ok(path)
}

/// Write bytes to `path` through a synced temp file in the same directory
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "export path missing parent")
    })?;
    std::fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(contents)?;
    temp.flush()?;
    temp.as_file().sync_all()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::estimate_at;
    use crate::SimulationInput;
    use chrono::{TimeZone, Utc};

    fn sample() -> SimulationResult {
        let ts = Utc.with_ymd_and_hms(2025, 11, 2, 18, 45, 0).unwrap();
        estimate_at(SimulationInput::new(30.0, 15.0, 6.0), ts)
    }

    #[test]
    fn test_file_names() {
        let result = sample();
        let zone = DisplayZone::utc();
        assert_eq!(
            file_name(&result, ExportFormat::Csv, zone),
            "simulation_diabetes_02-11-2025.csv"
        );
        assert_eq!(
            file_name(&result, ExportFormat::Json, zone),
            "simulation_diabetes_02-11-2025.json"
        );
    }

    #[test]
    fn test_write_csv_export() {
        let temp_dir = tempfile::tempdir().unwrap();
        let out_dir = temp_dir.path().join("exports");
        let result = sample();

        let path = write_export(&result, ExportFormat::Csv, &out_dir, DisplayZone::utc()).unwrap();
        assert_eq!(path, out_dir.join("simulation_diabetes_02-11-2025.csv"));

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, to_csv(&result, DisplayZone::utc()));
    }

    #[test]
    fn test_write_json_export_replaces_same_day() {
        let temp_dir = tempfile::tempdir().unwrap();
        let zone = DisplayZone::utc();

        let first = sample();
        write_export(&first, ExportFormat::Json, temp_dir.path(), zone).unwrap();

        let ts = Utc.with_ymd_and_hms(2025, 11, 2, 20, 0, 0).unwrap();
        let second = estimate_at(SimulationInput::new(90.0, 0.0, 7.5), ts);
        let path = write_export(&second, ExportFormat::Json, temp_dir.path(), zone).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["time"], "20:00");
        assert_eq!(value["results"]["estimatedGlucose"], second.glucose);

        // Only the one file remains, no temp leftovers
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }
}
