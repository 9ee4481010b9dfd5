//! Caller-owned holder of the current simulation.
//!
//! Only the latest result is kept; a new simulation replaces it. Exports
//! before the first simulation do nothing.

use crate::estimator::estimate_at;
use crate::export::{write_export, ExportFormat};
use crate::format::DisplayZone;
use crate::{Result, SimulationInput, SimulationResult};
use chrono::Utc;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct Simulator {
    last: Option<SimulationResult>,
}

impl Simulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the estimator and make its result the current one
    pub fn simulate(&mut self, input: SimulationInput) -> &SimulationResult {
        self.last.insert(estimate_at(input, Utc::now()))
    }

    pub fn last(&self) -> Option<&SimulationResult> {
        self.last.as_ref()
    }

    /// Export the current result into `dir`.
    ///
    /// Returns `Ok(None)` without touching the filesystem when nothing has
    /// been simulated yet.
    pub fn export(
        &self,
        format: ExportFormat,
        dir: &Path,
        zone: DisplayZone,
    ) -> Result<Option<PathBuf>> {
        match &self.last {
            Some(result) => write_export(result, format, dir, zone).map(Some),
            None => {
                tracing::debug!("No simulation yet, skipping {:?} export", format);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_without_result_is_noop() {
        let temp_dir = tempfile::tempdir().unwrap();
        let out_dir = temp_dir.path().join("exports");
        let simulator = Simulator::new();

        let written = simulator
            .export(ExportFormat::Csv, &out_dir, DisplayZone::utc())
            .unwrap();
        assert!(written.is_none());
        assert!(!out_dir.exists());
    }

    #[test]
    fn test_new_simulation_replaces_last() {
        let mut simulator = Simulator::new();
        assert!(simulator.last().is_none());

        let first = simulator.simulate(SimulationInput::new(50.0, 0.0, 7.5)).glucose;
        assert_eq!(first, 150);

        simulator.simulate(SimulationInput::new(0.0, 0.0, 7.5));
        let last = simulator.last().unwrap();
        assert_eq!(last.glucose, 90);
        assert_eq!(last.inputs, SimulationInput::new(0.0, 0.0, 7.5));
    }

    #[test]
    fn test_export_after_simulation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut simulator = Simulator::new();
        simulator.simulate(SimulationInput::new(20.0, 10.0, 9.0));

        let path = simulator
            .export(ExportFormat::Json, temp_dir.path(), DisplayZone::utc())
            .unwrap()
            .unwrap();
        assert!(path.exists());
        assert_eq!(path.extension().unwrap(), "json");
    }
}
