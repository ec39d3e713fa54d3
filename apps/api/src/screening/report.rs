//! Report Builder — ranks evaluation records and serializes them to CSV.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::screening::evaluator::EvaluationRecord;

pub const REPORT_FILENAME: &str = "recruitment_report.csv";
pub const REPORT_MIME: &str = "text/csv";

/// Column order of the report and its CSV header.
pub const REPORT_COLUMNS: [&str; 6] = [
    "Name",
    "Match_Score",
    "Summary",
    "Key_Strengths",
    "Missing_Skills",
    "Filename",
];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("nothing to report")]
    Empty,

    #[error("Match_Score for {filename} is not numeric: {value:?}")]
    InvalidScore { filename: String, value: String },

    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV buffer error: {0}")]
    Buffer(String),

    #[error("list cell encoding failed: {0}")]
    ListCell(#[from] serde_json::Error),
}

/// One ranked row, fields in report column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Match_Score")]
    pub match_score: f64,
    #[serde(rename = "Summary")]
    pub summary: String,
    #[serde(rename = "Key_Strengths")]
    pub key_strengths: Vec<String>,
    #[serde(rename = "Missing_Skills")]
    pub missing_skills: Vec<String>,
    #[serde(rename = "Filename")]
    pub filename: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ReportTable {
    rows: Vec<ReportRow>,
}

/// Projects, coerces and sorts. Any unparseable score fails the whole report.
pub fn build_report(records: &[EvaluationRecord]) -> Result<ReportTable, ReportError> {
    if records.is_empty() {
        return Err(ReportError::Empty);
    }

    let mut rows = records
        .iter()
        .map(|record| {
            let match_score = coerce_score(&record.match_score).ok_or_else(|| {
                ReportError::InvalidScore {
                    filename: record.filename.clone(),
                    value: record.match_score.clone(),
                }
            })?;
            Ok(ReportRow {
                name: record.name.clone(),
                match_score,
                summary: record.summary.clone(),
                key_strengths: record.key_strengths.clone(),
                missing_skills: record.missing_skills.clone(),
                filename: record.filename.clone(),
            })
        })
        .collect::<Result<Vec<_>, ReportError>>()?;

    rows.sort_by(rank);
    Ok(ReportTable { rows })
}

/// Score descending, then filename ascending.
fn rank(a: &ReportRow, b: &ReportRow) -> Ordering {
    b.match_score
        .partial_cmp(&a.match_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.filename.cmp(&b.filename))
}

fn coerce_score(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|s| s.is_finite())
}

impl ReportTable {
    #[cfg(test)]
    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<ReportRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// UTF-8 CSV with a header row and no index column. List cells hold a
    /// JSON array of strings so item boundaries survive a round-trip.
    pub fn to_csv(&self) -> Result<Vec<u8>, ReportError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(REPORT_COLUMNS)?;
        for row in &self.rows {
            let score = format_score(row.match_score);
            let strengths = serde_json::to_string(&row.key_strengths)?;
            let missing = serde_json::to_string(&row.missing_skills)?;
            writer.write_record([
                row.name.as_str(),
                score.as_str(),
                row.summary.as_str(),
                strengths.as_str(),
                missing.as_str(),
                row.filename.as_str(),
            ])?;
        }
        writer
            .into_inner()
            .map_err(|e| ReportError::Buffer(e.to_string()))
    }
}

/// `85` rather than `85.0`; fractional scores keep their digits.
fn format_score(score: f64) -> String {
    if score.fract() == 0.0 && score.abs() < 1e15 {
        format!("{}", score as i64)
    } else {
        score.to_string()
    }
}
