//! Core domain types for the glucose simulator.
//!
//! This module defines:
//! - Simulation inputs (carbohydrates, walking, sleep)
//! - The immutable result of one estimate
//! - Glucose bands used for display

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Input Types
// ============================================================================

/// The three user-adjustable inputs of a simulation.
///
/// Values are expected to be non-negative; the estimator itself does not
/// check them.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SimulationInput {
    pub carbs_grams: f64,
    pub walk_minutes: f64,
    pub sleep_hours: f64,
}

impl SimulationInput {
    pub fn new(carbs_grams: f64, walk_minutes: f64, sleep_hours: f64) -> Self {
        Self {
            carbs_grams,
            walk_minutes,
            sleep_hours,
        }
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Outcome of one estimator call.
///
/// Effects are stored the way they are displayed: carbohydrate and walking
/// effects as whole mg/dL, the sleep effect to one decimal place.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SimulationResult {
    pub timestamp: DateTime<Utc>,
    pub inputs: SimulationInput,
    /// Clamped to [70, 200]
    pub glucose: i64,
    pub carbs_effect: i64,
    /// Never above 30
    pub walk_effect: i64,
    pub sleep_effect: f64,
    pub sleep_note: String,
    /// Clamped glucose before rounding, used for band classification
    pub glucose_exact: f64,
}

impl SimulationResult {
    pub fn band(&self) -> GlucoseBand {
        GlucoseBand::classify(self.glucose_exact)
    }

    /// Signed carbohydrate effect as shown in exports, e.g. `+60`
    pub fn carbs_effect_text(&self) -> String {
        format!("+{}", self.carbs_effect)
    }

    /// Signed walking effect as shown in exports, e.g. `-24`
    pub fn walk_effect_text(&self) -> String {
        format!("-{}", self.walk_effect)
    }
}

// ============================================================================
// Glucose Bands
// ============================================================================

/// Coarse classification of an estimated glucose value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlucoseBand {
    /// Above 140 mg/dL
    High,
    /// Below 80 mg/dL
    Low,
    InRange,
}

impl GlucoseBand {
    pub const HIGH_THRESHOLD: f64 = 140.0;
    pub const LOW_THRESHOLD: f64 = 80.0;

    pub fn classify(glucose: f64) -> Self {
        if glucose > Self::HIGH_THRESHOLD {
            GlucoseBand::High
        } else if glucose < Self::LOW_THRESHOLD {
            GlucoseBand::Low
        } else {
            GlucoseBand::InRange
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GlucoseBand::High => "high",
            GlucoseBand::Low => "low",
            GlucoseBand::InRange => "in range",
        }
    }

    /// Hex colour used by the HTML report
    pub fn colour(&self) -> &'static str {
        match self {
            GlucoseBand::High => "#e74c3c",
            GlucoseBand::Low => "#f39c12",
            GlucoseBand::InRange => "#2ecc71",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        assert_eq!(GlucoseBand::classify(140.0), GlucoseBand::InRange);
        assert_eq!(GlucoseBand::classify(140.4), GlucoseBand::High);
        assert_eq!(GlucoseBand::classify(80.0), GlucoseBand::InRange);
        assert_eq!(GlucoseBand::classify(79.9), GlucoseBand::Low);
    }
}
