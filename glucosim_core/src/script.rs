//! The downloadable offline analysis script.
//!
//! Static resource text; nothing from a simulation flows into it. It reads
//! exported CSVs by the labels in [`crate::report::CSV_HEADERS`].

use crate::export::write_atomic;
use crate::Result;
use std::path::{Path, PathBuf};

pub const FILE_NAME: &str = "analyze_simulations.py";

pub const ANALYSIS_SCRIPT: &str = include_str!("../assets/analyze_simulations.py");

/// Write the script into `dir` and return its path
pub fn write_script(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(FILE_NAME);
    write_atomic(&path, ANALYSIS_SCRIPT.as_bytes())?;
    tracing::info!("Wrote analysis script to {:?}", path);
    Ok(path)
}
