//! Rendering of a simulation result as CSV, JSON and advice.
//!
//! All functions here are total: they never fail for a well-formed
//! `SimulationResult`, apart from JSON serialization errors bubbling up
//! from `serde_json`.

use crate::format::{format_number, serialize_number, DisplayZone};
use crate::SimulationResult;
use serde::Serialize;

/// Column labels of the CSV export.
///
/// The offline analysis script reads files by these exact labels.
pub const CSV_HEADERS: [&str; 9] = [
    "Date",
    "Time",
    "Carbs (g)",
    "Walk (min)",
    "Sleep (h)",
    "Glucose (mg/dL)",
    "Carbs Effect",
    "Walk Effect",
    "Sleep Effect",
];

pub const REPORT_TYPE: &str = "Type 2 Diabetes Educational Simulation";

pub const DISCLAIMER: &str =
    "This simulation is educational. Always consult your doctor for personalized management.";

// Advice, in the order it is emitted
pub const ADVICE_HIGH_GLUCOSE: &str = "⚠️ High glucose: reduce carbohydrates at your next meal";
pub const ADVICE_HIGH_WALK_MORE: &str =
    "💡 Increase walking time to 30-40 minutes to improve control";
pub const ADVICE_LOW_GLUCOSE: &str = "⚠️ Low glucose: make sure you eat enough carbohydrates";
pub const ADVICE_LOW_WALK_LESS: &str = "💡 Reduce walking time if it is very intense";
pub const ADVICE_BALANCED: &str = "✅ Excellent balance! Keep up these habits";
pub const ADVICE_SHORT_SLEEP: &str =
    "💤 Prioritize sleeping 7-8 hours to improve insulin sensitivity";
pub const ADVICE_LONG_SLEEP: &str =
    "💤 Excessive sleep can affect metabolism. 7-8 hours is ideal";
pub const ADVICE_WALK: &str =
    "🚶‍♂️ Try to walk at least 30 minutes a day for better glycemic control";

/// A single CSV cell
#[derive(Clone, Debug, PartialEq)]
enum CsvField {
    Number(f64),
    Text(String),
}

impl CsvField {
    fn render(&self) -> String {
        match self {
            CsvField::Number(value) => format_number(*value),
            CsvField::Text(text) => format!("\"{}\"", text.replace('"', "\"\"")),
        }
    }
}

fn render_record(fields: &[CsvField]) -> String {
    fields
        .iter()
        .map(CsvField::render)
        .collect::<Vec<_>>()
        .join(",")
}

/// Render the CSV export: a header line and one data row.
///
/// Text cells are always quoted, numeric cells never are. Lines are joined
/// with `\n` and there is no trailing newline.
pub fn to_csv(result: &SimulationResult, zone: DisplayZone) -> String {
    let header: Vec<CsvField> = CSV_HEADERS
        .iter()
        .map(|label| CsvField::Text((*label).to_string()))
        .collect();

    let row = vec![
        CsvField::Text(zone.date(&result.timestamp)),
        CsvField::Text(zone.time(&result.timestamp)),
        CsvField::Number(result.inputs.carbs_grams),
        CsvField::Number(result.inputs.walk_minutes),
        CsvField::Number(result.inputs.sleep_hours),
        CsvField::Number(result.glucose as f64),
        CsvField::Text(result.carbs_effect_text()),
        CsvField::Text(result.walk_effect_text()),
        CsvField::Text(result.sleep_note.clone()),
    ];

    format!("{}\n{}", render_record(&header), render_record(&row))
}

/// JSON export document
#[derive(Debug, Serialize)]
pub struct JsonReport {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub date: String,
    pub time: String,
    pub parameters: JsonParameters,
    pub results: JsonResults,
    pub recommendations: Vec<&'static str>,
    pub notes: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonParameters {
    #[serde(serialize_with = "serialize_number")]
    pub carb_grams: f64,
    #[serde(serialize_with = "serialize_number")]
    pub walk_minutes: f64,
    #[serde(serialize_with = "serialize_number")]
    pub sleep_hours: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonResults {
    pub estimated_glucose: i64,
    pub carbs_effect_text: String,
    pub walk_effect_text: String,
    pub sleep_effect_text: String,
}

impl JsonReport {
    pub fn new(result: &SimulationResult, zone: DisplayZone) -> Self {
        JsonReport {
            kind: REPORT_TYPE,
            date: zone.date(&result.timestamp),
            time: zone.time(&result.timestamp),
            parameters: JsonParameters {
                carb_grams: result.inputs.carbs_grams,
                walk_minutes: result.inputs.walk_minutes,
                sleep_hours: result.inputs.sleep_hours,
            },
            results: JsonResults {
                estimated_glucose: result.glucose,
                carbs_effect_text: format!("{} mg/dL", result.carbs_effect_text()),
                walk_effect_text: format!("{} mg/dL", result.walk_effect_text()),
                sleep_effect_text: result.sleep_note.clone(),
            },
            recommendations: recommendations(result),
            notes: DISCLAIMER,
        }
    }
}

/// Render the JSON export with 2-space indentation.
pub fn to_json(result: &SimulationResult, zone: DisplayZone) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport::new(result, zone))
}

/// Advice for a result.
///
/// Depends only on the rounded glucose, sleep hours and walking minutes.
pub fn recommendations(result: &SimulationResult) -> Vec<&'static str> {
    advice_for(
        result.glucose,
        result.inputs.sleep_hours,
        result.inputs.walk_minutes,
    )
}

fn advice_for(glucose: i64, sleep_hours: f64, walk_minutes: f64) -> Vec<&'static str> {
    let mut advice = Vec::new();

    if glucose > 140 {
        advice.push(ADVICE_HIGH_GLUCOSE);
        advice.push(ADVICE_HIGH_WALK_MORE);
    } else if glucose < 80 {
        advice.push(ADVICE_LOW_GLUCOSE);
        advice.push(ADVICE_LOW_WALK_LESS);
    } else {
        advice.push(ADVICE_BALANCED);
    }

    if sleep_hours < 7.0 {
        advice.push(ADVICE_SHORT_SLEEP);
    } else if sleep_hours > 8.0 {
        advice.push(ADVICE_LONG_SLEEP);
    }

    if walk_minutes < 30.0 {
        advice.push(ADVICE_WALK);
    }

    advice
}
