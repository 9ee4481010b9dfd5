//! Glucose estimator.
//!
//! A fixed linear model, evaluated in this order:
//! - Baseline of 90 mg/dL
//! - Carbohydrates raise glucose by 1.2 mg/dL per gram
//! - Walking lowers it by 0.8 mg/dL per minute, at most 30
//! - Sleep outside the 7-8h band shifts it (short sleep up, long sleep down)
//!
//! The final value is clamped to [70, 200] before it is rounded.

use crate::format::{format_tenth, round_half_up, round_to_tenth};
use crate::{SimulationInput, SimulationResult};
use chrono::{DateTime, Utc};

pub const BASELINE_GLUCOSE: f64 = 90.0;
pub const MIN_GLUCOSE: f64 = 70.0;
pub const MAX_GLUCOSE: f64 = 200.0;

const CARBS_FACTOR: f64 = 1.2;
const WALK_FACTOR: f64 = 0.8;
const MAX_WALK_EFFECT: f64 = 30.0;

const OPTIMAL_SLEEP_MIN: f64 = 7.0;
const OPTIMAL_SLEEP_MAX: f64 = 8.0;
const SHORT_SLEEP_FACTOR: f64 = 2.5;
const LONG_SLEEP_FACTOR: f64 = -0.7;
const MAX_LONG_SLEEP_EFFECT: f64 = -5.0;

/// Estimate glucose for the given inputs, stamped with the current time.
pub fn estimate(carbs_grams: f64, walk_minutes: f64, sleep_hours: f64) -> SimulationResult {
    estimate_at(
        SimulationInput::new(carbs_grams, walk_minutes, sleep_hours),
        Utc::now(),
    )
}

/// Estimate glucose with an explicit timestamp.
pub fn estimate_at(input: SimulationInput, timestamp: DateTime<Utc>) -> SimulationResult {
    let carbs_raw = input.carbs_grams * CARBS_FACTOR;
    let walk_raw = (input.walk_minutes * WALK_FACTOR).min(MAX_WALK_EFFECT);
    let (sleep_raw, sleep_note) = sleep_adjustment(input.sleep_hours);

    let glucose_raw = BASELINE_GLUCOSE + carbs_raw - walk_raw + sleep_raw;
    let glucose_exact = glucose_raw.max(MIN_GLUCOSE).min(MAX_GLUCOSE);

    let result = SimulationResult {
        timestamp,
        inputs: input,
        glucose: round_half_up(glucose_exact) as i64,
        carbs_effect: round_half_up(carbs_raw) as i64,
        walk_effect: round_half_up(walk_raw) as i64,
        sleep_effect: round_to_tenth(sleep_raw),
        sleep_note,
        glucose_exact,
    };

    tracing::debug!(
        "Estimated {} mg/dL from {:?} (carbs +{}, walk -{}, sleep {})",
        result.glucose,
        input,
        result.carbs_effect,
        result.walk_effect,
        result.sleep_effect
    );

    result
}

/// Sleep contribution and the note describing which branch applied
fn sleep_adjustment(sleep_hours: f64) -> (f64, String) {
    if sleep_hours < OPTIMAL_SLEEP_MIN {
        let effect = (OPTIMAL_SLEEP_MIN - sleep_hours) * SHORT_SLEEP_FACTOR;
        (effect, format!("+{} by <7h sleep", format_tenth(effect)))
    } else if sleep_hours > OPTIMAL_SLEEP_MAX {
        let effect = ((sleep_hours - OPTIMAL_SLEEP_MAX) * LONG_SLEEP_FACTOR)
            .max(MAX_LONG_SLEEP_EFFECT);
        (effect, format!("{} by >8h sleep", format_tenth(effect)))
    } else {
        (0.0, "0 for optimal sleep".to_string())
    }
}
