//! Batch analysis of exported simulation CSVs.
//!
//! Reads every export in a folder, averages the inputs and glucose, and
//! renders a standalone HTML report. Files are matched by the CSV export
//! column labels, so hand-edited files work as long as the labels stay.

use crate::export::write_atomic;
use crate::format::{format_tenth, DisplayZone};
use crate::{Error, GlucoseBand, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Date and time columns combined, as written by the export
const RECORDED_AT_FORMAT: &str = "%d/%m/%Y %H:%M";

pub const ADVICE_HIGH: &str = "🔴 High glucose: consider 45-50g of carbohydrates per meal and 30-40 minutes of daily walking.";
pub const ADVICE_LOW: &str = "🟡 Low glucose: eat at least 40g of carbohydrates per meal and ease off very long walks.";
pub const ADVICE_GOOD: &str = "🟢 Good control: keep these habits. Sleeping 7-8 hours can improve control further.";
pub const ADVICE_SLEEP: &str = "💤 Insufficient sleep: aim for 7-8 hours. Lack of sleep raises insulin resistance by 25-30%.";
pub const ADVICE_ACTIVITY: &str = "🚶‍♂️ Low activity: walking 30 minutes a day can lower glucose by 15-20%.";
pub const ADVICE_NEXT_STEP: &str = "📊 Next step: export simulations from different times of day to see complete patterns.";

/// CSV row format for reading exported simulations
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Carbs (g)")]
    carbs_grams: f64,
    #[serde(rename = "Walk (min)")]
    walk_minutes: f64,
    #[serde(rename = "Sleep (h)")]
    sleep_hours: f64,
    #[serde(rename = "Glucose (mg/dL)")]
    glucose: f64,
}

/// One simulation read back from an export
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationRecord {
    pub date: String,
    pub time: String,
    pub carbs_grams: f64,
    pub walk_minutes: f64,
    pub sleep_hours: f64,
    pub glucose: f64,
    pub source_file: String,
    /// `None` when the date/time columns do not parse
    pub recorded_at: Option<NaiveDateTime>,
}

impl SimulationRecord {
    fn from_row(row: CsvRow, source_file: &str) -> Self {
        let recorded_at = NaiveDateTime::parse_from_str(
            &format!("{} {}", row.date.trim(), row.time.trim()),
            RECORDED_AT_FORMAT,
        )
        .ok();

        SimulationRecord {
            date: row.date,
            time: row.time,
            carbs_grams: row.carbs_grams,
            walk_minutes: row.walk_minutes,
            sleep_hours: row.sleep_hours,
            glucose: row.glucose,
            source_file: source_file.to_string(),
            recorded_at,
        }
    }
}

/// Load every `*.csv` in `dir`, in file name order.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_simulations(dir: &Path) -> Result<Vec<SimulationRecord>> {
    if !dir.is_dir() {
        return Err(Error::Analysis(format!(
            "Path does not exist or is not a directory: {}",
            dir.display()
        )));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(Error::Analysis(format!(
            "No CSV files found in {}",
            dir.display()
        )));
    }

    let mut records = Vec::new();
    for path in &files {
        match read_file(path) {
            Ok(rows) => {
                tracing::debug!("Loaded {} simulations from {:?}", rows.len(), path);
                records.extend(rows);
            }
            Err(e) => {
                tracing::warn!("Skipping {:?}: {}", path, e);
            }
        }
    }

    if records.is_empty() {
        return Err(Error::Analysis(
            "No valid simulation data could be loaded from any file".into(),
        ));
    }

    tracing::info!(
        "Loaded {} simulations from {} files",
        records.len(),
        files.len()
    );
    Ok(records)
}

fn read_file(path: &Path) -> Result<Vec<SimulationRecord>> {
    let source_file = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize::<CsvRow>() {
        records.push(SimulationRecord::from_row(row?, &source_file));
    }
    Ok(records)
}

/// Overall verdict on the average glucose
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverallStatus {
    High,
    Low,
    Optimal,
}

impl OverallStatus {
    pub fn from_mean(mean_glucose: f64) -> Self {
        match GlucoseBand::classify(mean_glucose) {
            GlucoseBand::High => OverallStatus::High,
            GlucoseBand::Low => OverallStatus::Low,
            GlucoseBand::InRange => OverallStatus::Optimal,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OverallStatus::High => "⚠️ HIGH - needs attention",
            OverallStatus::Low => "⚠️ LOW - risk of hypoglycemia",
            OverallStatus::Optimal => "✅ OPTIMAL - good control",
        }
    }

    pub fn colour(&self) -> &'static str {
        match self {
            OverallStatus::High => GlucoseBand::High.colour(),
            OverallStatus::Low => GlucoseBand::Low.colour(),
            OverallStatus::Optimal => GlucoseBand::InRange.colour(),
        }
    }
}

/// A dated glucose value for the trend table
#[derive(Clone, Debug, PartialEq)]
pub struct TrendPoint {
    pub recorded_at: NaiveDateTime,
    pub glucose: f64,
}

/// Aggregate view over a batch of simulations
#[derive(Clone, Debug)]
pub struct AnalysisSummary {
    pub count: usize,
    pub mean_glucose: f64,
    pub mean_carbs_grams: f64,
    pub mean_walk_minutes: f64,
    pub mean_sleep_hours: f64,
    pub status: OverallStatus,
    pub advice: Vec<&'static str>,
    /// Chronological; records without a parseable timestamp are left out
    pub trend: Vec<TrendPoint>,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Summarize loaded simulations
pub fn summarize(records: &[SimulationRecord]) -> Result<AnalysisSummary> {
    if records.is_empty() {
        return Err(Error::Analysis("No simulations to summarize".into()));
    }

    let mean_glucose = mean(records.iter().map(|r| r.glucose));
    let mean_carbs_grams = mean(records.iter().map(|r| r.carbs_grams));
    let mean_walk_minutes = mean(records.iter().map(|r| r.walk_minutes));
    let mean_sleep_hours = mean(records.iter().map(|r| r.sleep_hours));
    let status = OverallStatus::from_mean(mean_glucose);

    let mut advice = vec![match status {
        OverallStatus::High => ADVICE_HIGH,
        OverallStatus::Low => ADVICE_LOW,
        OverallStatus::Optimal => ADVICE_GOOD,
    }];
    if mean_sleep_hours < 7.0 {
        advice.push(ADVICE_SLEEP);
    }
    if mean_walk_minutes < 30.0 {
        advice.push(ADVICE_ACTIVITY);
    }
    advice.push(ADVICE_NEXT_STEP);

    let mut trend: Vec<TrendPoint> = records
        .iter()
        .filter_map(|r| {
            r.recorded_at.map(|recorded_at| TrendPoint {
                recorded_at,
                glucose: r.glucose,
            })
        })
        .collect();
    trend.sort_by_key(|point| point.recorded_at);

    Ok(AnalysisSummary {
        count: records.len(),
        mean_glucose,
        mean_carbs_grams,
        mean_walk_minutes,
        mean_sleep_hours,
        status,
        advice,
        trend,
    })
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const REPORT_STYLE: &str = r#"
    body { font-family: system-ui, sans-serif; max-width: 1200px; margin: 0 auto; padding: 1rem; color: #2c3742; background: #f9fbfd; }
    header, .card, .panel { background: white; border-radius: 16px; box-shadow: 0 4px 12px rgba(0,0,0,0.08); }
    header { text-align: center; padding: 2rem 0; margin-bottom: 2rem; }
    h1 { color: #2980b9; }
    .stats { display: grid; grid-template-columns: repeat(auto-fit, minmax(250px, 1fr)); gap: 1.5rem; }
    .card { padding: 1.5rem; text-align: center; }
    .value { font-size: 2.5rem; font-weight: bold; margin: 0.5rem 0; }
    .status { padding: 0.8rem; border-radius: 12px; border: 2px solid; font-weight: bold; font-size: 1.3rem; text-align: center; margin: 1.5rem 0; }
    .panel { padding: 1.5rem; margin: 2rem 0; }
    table { width: 100%; border-collapse: collapse; }
    td, th { padding: 0.4rem; border-bottom: 1px solid #eee; text-align: left; }
    .bar { height: 1.2rem; border-radius: 6px; }
    .advice { background: #e8f4fc; border-radius: 16px; padding: 2rem; border-left: 4px solid #3498db; }
    footer { text-align: center; margin-top: 3rem; color: #7f8c8d; border-top: 1px solid #eee; padding: 1.5rem; }
"#;

/// Render the summary as a standalone HTML page
pub fn render_html(
    summary: &AnalysisSummary,
    generated_at: DateTime<Utc>,
    zone: DisplayZone,
) -> String {
    let glucose_colour = summary.status.colour();
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("  <meta charset=\"UTF-8\">\n");
    html.push_str("  <title>Diabetes Simulation Report</title>\n");
    html.push_str(&format!("  <style>{}  </style>\n", REPORT_STYLE));
    html.push_str("</head>\n<body>\n");

    html.push_str(&format!(
        "  <header>\n    <h1>Diabetes Simulation Report</h1>\n    \
         <p>Educational data analysis - generated {}</p>\n  </header>\n",
        escape_html(&zone.format(&generated_at, "%d %B %Y at %H:%M"))
    ));

    html.push_str("  <div class=\"stats\">\n");
    html.push_str(&format!(
        "    <div class=\"card\"><div>Average glucose</div>\
         <div class=\"value\" style=\"color: {};\">{} mg/dL</div>\
         <div>{} simulations analyzed</div></div>\n",
        glucose_colour,
        format_tenth(summary.mean_glucose),
        summary.count
    ));
    for (label, value, unit, note) in [
        ("Carbohydrates", summary.mean_carbs_grams, "g", "Per meal"),
        ("Physical activity", summary.mean_walk_minutes, "min", "Average daily walk"),
        ("Sleep", summary.mean_sleep_hours, "h", "Hours per night"),
    ] {
        html.push_str(&format!(
            "    <div class=\"card\"><div>{}</div><div class=\"value\">{} {}</div><div>{}</div></div>\n",
            label,
            format_tenth(value),
            unit,
            note
        ));
    }
    html.push_str("  </div>\n");

    html.push_str(&format!(
        "  <div class=\"status\" style=\"background: {c}15; border-color: {c};\">Overall status: {}</div>\n",
        summary.status.label(),
        c = summary.status.colour()
    ));

    // Trend
    html.push_str("  <div class=\"panel\">\n    <h2>Glucose Trend Over Time</h2>\n");
    if summary.trend.is_empty() {
        html.push_str("    <p>No dated simulations to plot.</p>\n");
    } else {
        html.push_str("    <table>\n      <tr><th>Date and time</th><th>Glucose (mg/dL)</th><th></th></tr>\n");
        for point in &summary.trend {
            let band = GlucoseBand::classify(point.glucose);
            let width = (point.glucose / crate::estimator::MAX_GLUCOSE * 100.0).clamp(0.0, 100.0);
            html.push_str(&format!(
                "      <tr><td>{}</td><td>{}</td><td><div class=\"bar\" style=\"width: {:.0}%; background: {};\"></div></td></tr>\n",
                point.recorded_at.format(RECORDED_AT_FORMAT),
                crate::format::format_number(point.glucose),
                width,
                band.colour()
            ));
        }
        html.push_str("    </table>\n");
    }
    html.push_str("  </div>\n");

    // Factors
    let factors = [
        ("Carbohydrates", summary.mean_carbs_grams, "grams", "#c2185b"),
        ("Walking minutes", summary.mean_walk_minutes, "minutes", "#1976d2"),
        ("Sleep hours", summary.mean_sleep_hours, "hours", "#2e7d32"),
    ];
    let largest = factors
        .iter()
        .map(|(_, value, _, _)| *value)
        .fold(0.0_f64, f64::max);
    html.push_str("  <div class=\"panel\">\n    <h2>Factors Affecting Glucose</h2>\n    <table>\n");
    for (label, value, unit, colour) in factors {
        let width = if largest > 0.0 { value / largest * 100.0 } else { 0.0 };
        html.push_str(&format!(
            "      <tr><td>{}</td><td>{} {}</td><td><div class=\"bar\" style=\"width: {:.0}%; background: {};\"></div></td></tr>\n",
            label,
            format_tenth(value),
            unit,
            width,
            colour
        ));
    }
    html.push_str("    </table>\n  </div>\n");

    html.push_str("  <div class=\"advice\">\n    <h2>💡 Recommendations</h2>\n    <ul>\n");
    for item in &summary.advice {
        html.push_str(&format!("      <li>{}</li>\n", escape_html(item)));
    }
    html.push_str("    </ul>\n  </div>\n");

    html.push_str(
        "  <footer>\n    <p>Generated automatically by glucosim</p>\n    \
         <p style=\"color: #e74c3c;\">*This report is for educational purposes. \
         Always consult your doctor for personalized management.</p>\n  </footer>\n",
    );
    html.push_str("</body>\n</html>\n");

    html
}

/// `glucose_report_<YYYYMMDD_HHMMSS>.html`
pub fn report_file_name(generated_at: DateTime<Utc>, zone: DisplayZone) -> String {
    format!(
        "glucose_report_{}.html",
        zone.format(&generated_at, "%Y%m%d_%H%M%S")
    )
}

/// Render and write the HTML report into `out_dir`
pub fn write_report(
    summary: &AnalysisSummary,
    out_dir: &Path,
    generated_at: DateTime<Utc>,
    zone: DisplayZone,
) -> Result<PathBuf> {
    let path = out_dir.join(report_file_name(generated_at, zone));
    let html = render_html(summary, generated_at, zone);
    write_atomic(&path, html.as_bytes())?;

    tracing::info!(
        "Wrote report for {} simulations to {:?}",
        summary.count,
        path
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::estimate_at;
    use crate::export::{write_export, ExportFormat};
    use crate::SimulationInput;
    use chrono::TimeZone;
    use std::fs;

    fn export_sample(dir: &Path, day: u32, input: SimulationInput) {
        let ts = Utc.with_ymd_and_hms(2025, 5, day, 8, 30, 0).unwrap();
        let result = estimate_at(input, ts);
        write_export(&result, ExportFormat::Csv, dir, DisplayZone::utc()).unwrap();
    }

    #[test]
    fn test_load_exported_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        export_sample(temp_dir.path(), 2, SimulationInput::new(50.0, 0.0, 7.5));
        export_sample(temp_dir.path(), 1, SimulationInput::new(0.0, 0.0, 7.5));

        let records = load_simulations(temp_dir.path()).unwrap();
        assert_eq!(records.len(), 2);
        // File name order: 01-05 before 02-05
        assert_eq!(records[0].source_file, "simulation_diabetes_01-05-2025.csv");
        assert_eq!(records[0].glucose, 90.0);
        assert_eq!(records[1].glucose, 150.0);
        assert_eq!(
            records[1].recorded_at,
            Some(
                NaiveDateTime::parse_from_str("02/05/2025 08:30", RECORDED_AT_FORMAT).unwrap()
            )
        );
    }

    #[test]
    fn test_bad_file_is_skipped() {
        crate::logging::init_test();
        let temp_dir = tempfile::tempdir().unwrap();
        export_sample(temp_dir.path(), 3, SimulationInput::new(10.0, 40.0, 6.0));
        fs::write(temp_dir.path().join("broken.csv"), "Date,Time\nnot,enough\n").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "ignored").unwrap();

        let records = load_simulations(temp_dir.path()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_missing_dir_and_empty_dir() {
        let temp_dir = tempfile::tempdir().unwrap();

        let missing = load_simulations(&temp_dir.path().join("nope")).unwrap_err();
        assert!(matches!(missing, Error::Analysis(_)));

        let empty = load_simulations(temp_dir.path()).unwrap_err();
        assert!(matches!(empty, Error::Analysis(_)));
    }

    #[test]
    fn test_only_bad_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("a.csv"), "x,y\n1,2\n").unwrap();

        let err = load_simulations(temp_dir.path()).unwrap_err();
        assert!(matches!(err, Error::Analysis(_)));
    }

    #[test]
    fn test_hand_written_rows_with_extra_columns() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(
            temp_dir.path().join("manual.csv"),
            "Date,Time,Carbs (g),Walk (min),Sleep (h),Glucose (mg/dL),Comment\n\
             10/05/2025,19:00,80,10,6,172,dinner\n\
             someday,later,20,40,8,100,undated\n",
        )
        .unwrap();

        let records = load_simulations(temp_dir.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].recorded_at.is_some());
        assert!(records[1].recorded_at.is_none());

        let summary = summarize(&records).unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.trend.len(), 1);
    }

    fn record(day: u32, carbs: f64, walk: f64, sleep: f64, glucose: f64) -> SimulationRecord {
        SimulationRecord {
            date: format!("{:02}/05/2025", day),
            time: "12:00".into(),
            carbs_grams: carbs,
            walk_minutes: walk,
            sleep_hours: sleep,
            glucose,
            source_file: "test.csv".into(),
            recorded_at: NaiveDateTime::parse_from_str(
                &format!("{:02}/05/2025 12:00", day),
                RECORDED_AT_FORMAT,
            )
            .ok(),
        }
    }

    #[test]
    fn test_summary_high() {
        let records = vec![
            record(3, 100.0, 10.0, 6.0, 180.0),
            record(1, 80.0, 20.0, 6.0, 160.0),
        ];
        let summary = summarize(&records).unwrap();

        assert_eq!(summary.count, 2);
        assert_eq!(summary.mean_glucose, 170.0);
        assert_eq!(summary.mean_carbs_grams, 90.0);
        assert_eq!(summary.status, OverallStatus::High);
        assert_eq!(
            summary.advice,
            vec![ADVICE_HIGH, ADVICE_SLEEP, ADVICE_ACTIVITY, ADVICE_NEXT_STEP]
        );
        // Chronological
        assert_eq!(summary.trend[0].glucose, 160.0);
        assert_eq!(summary.trend[1].glucose, 180.0);
    }

    #[test]
    fn test_summary_optimal_and_low() {
        let optimal = summarize(&[record(1, 20.0, 40.0, 7.5, 110.0)]).unwrap();
        assert_eq!(optimal.status, OverallStatus::Optimal);
        assert_eq!(optimal.advice, vec![ADVICE_GOOD, ADVICE_NEXT_STEP]);

        let low = summarize(&[record(1, 0.0, 60.0, 8.0, 70.0)]).unwrap();
        assert_eq!(low.status, OverallStatus::Low);
        assert_eq!(low.advice[0], ADVICE_LOW);
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize(&[]).is_err());
    }

    #[test]
    fn test_render_and_write_report() {
        let temp_dir = tempfile::tempdir().unwrap();
        let summary = summarize(&[record(1, 20.0, 40.0, 7.5, 110.0)]).unwrap();
        let generated_at = Utc.with_ymd_and_hms(2025, 5, 4, 10, 15, 30).unwrap();

        let path = write_report(&summary, temp_dir.path(), generated_at, DisplayZone::utc()).unwrap();
        assert_eq!(
            path.file_name().unwrap(),
            "glucose_report_20250504_101530.html"
        );

        let html = fs::read_to_string(&path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("110.0 mg/dL"));
        assert!(html.contains("1 simulations analyzed"));
        assert!(html.contains(OverallStatus::Optimal.label()));
        assert!(html.contains("04 May 2025 at 10:15"));
        assert!(html.contains("01/05/2025 12:00"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"a\" & 'b'</b>"),
            "&lt;b&gt;&quot;a&quot; &amp; &#39;b&#39;&lt;/b&gt;"
        );
    }
}
