#![forbid(unsafe_code)]

//! Core domain model and logic for the glucosim educational simulator.
//!
//! This crate provides:
//! - Domain types (simulation inputs, results, glucose bands)
//! - The glucose estimator
//! - Reporting (CSV, JSON, recommendations) and file exports
//! - The offline analysis script resource and a native batch analyzer
//! - Configuration and logging setup

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod format;
pub mod estimator;
pub mod report;
pub mod export;
pub mod session;
pub mod script;
pub mod analysis;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use format::DisplayZone;
pub use estimator::{estimate, estimate_at};
pub use report::{recommendations, to_csv, to_json};
pub use export::{write_export, ExportFormat};
pub use session::Simulator;
