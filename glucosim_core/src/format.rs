//! Number and date rendering shared by the reporter, exports and analysis.
//!
//! Rounding follows the conventions the simulator's figures were defined
//! with: whole numbers round half-up, one-decimal values round half away
//! from zero, and plain numbers print in their shortest form (`50`, `7.5`).

use chrono::{DateTime, FixedOffset, Local, Offset, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serializer;

/// Day/month/year as written in exports
pub const DATE_FORMAT: &str = "%d/%m/%Y";
/// 24-hour clock, minutes precision
pub const TIME_FORMAT: &str = "%H:%M";
/// Date component of export file names
pub const FILE_DATE_FORMAT: &str = "%d-%m-%Y";

/// Round to the nearest integer, ties towards positive infinity.
pub fn round_half_up(value: f64) -> f64 {
    if value - value.floor() == 0.5 {
        value.ceil()
    } else {
        value.round()
    }
}

/// Round to one decimal place, ties away from zero.
///
/// The exact binary value is rounded once, so `-0.35` (stored as
/// `-0.34999999999999997`) becomes `-0.3` while the exact tie `1.25`
/// becomes `1.3`. Scaling by ten first would round twice.
pub fn round_to_tenth(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|exact| exact.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|rounded| rounded.to_f64())
        .unwrap_or(value)
}

/// Render with exactly one decimal place, e.g. `5.0`, `-1.4`.
pub fn format_tenth(value: f64) -> String {
    format!("{:.1}", round_to_tenth(value))
}

/// Shortest textual form of a number: `50`, `7.5`, `0`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // Avoid "-0"
        return "0".to_string();
    }
    value.to_string()
}

/// Serialize a float as a JSON integer when it has no fractional part.
pub fn serialize_number<S>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Time zone used when printing timestamps
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DisplayZone {
    /// The machine's local time zone
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl DisplayZone {
    pub fn utc() -> Self {
        DisplayZone::Fixed(Utc.fix())
    }

    /// Build a fixed zone from an offset east of UTC in minutes.
    ///
    /// Returns `None` when the offset is a day or more.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(DisplayZone::Fixed)
    }

    pub fn format(&self, ts: &DateTime<Utc>, fmt: &str) -> String {
        match self {
            DisplayZone::Local => ts.with_timezone(&Local).format(fmt).to_string(),
            DisplayZone::Fixed(offset) => ts.with_timezone(offset).format(fmt).to_string(),
        }
    }

    pub fn date(&self, ts: &DateTime<Utc>) -> String {
        self.format(ts, DATE_FORMAT)
    }

    pub fn time(&self, ts: &DateTime<Utc>) -> String {
        self.format(ts, TIME_FORMAT)
    }

    pub fn file_date(&self, ts: &DateTime<Utc>) -> String {
        self.format(ts, FILE_DATE_FORMAT)
    }
}
