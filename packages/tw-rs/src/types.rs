use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TidyError};
use crate::experiments::{ExperimentMetadata, OutlierPolicy};
use crate::stats::{AnovaResult, Descriptives, TTestResult};

/// Tidy output header: participant column
pub const PARTICIPANT_COLUMN: &str = "ParticipantID";
/// Tidy output header: response direction column
pub const DIRECTION_COLUMN: &str = "Direction";
/// Tidy output header: response time column
pub const RESPONSE_TIME_COLUMN: &str = "ResponseTime";

/// Header aliases left behind by older capture scripts, normalized on load
const HEADER_ALIASES: &[(&str, &str)] = &[
    ("Participant_Id", PARTICIPANT_COLUMN),
    ("Contrast_Level", "ContrastLevel"),
    ("Button_Pressed", DIRECTION_COLUMN),
    ("Response_Time", RESPONSE_TIME_COLUMN),
];

/// Experimental manipulation level for a trial
///
/// Contrast experiments carry a numeric level, hemifield experiments a label.
/// Numeric levels are snapped to their canonical value on parse because the
/// capture layer serializes float32 artifacts (0.899999976158 for 0.9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    Level(f64),
    Label(String),
}

impl Condition {
    /// Parse a raw cell into a condition, snapping float32 noise
    pub fn parse(cell: &str) -> Self {
        match cell.trim().parse::<f64>() {
            Ok(v) => Self::Level(snap_level(v)),
            Err(_) => Self::Label(cell.trim().to_string()),
        }
    }

    /// Stable grouping key (also the serialized cell value)
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Level(v) => write!(f, "{}", v),
            Self::Label(s) => write!(f, "{}", s),
        }
    }
}

/// Snap a parsed level to 4 decimal places when it sits within float32
/// serialization noise of that value; leaves genuine fractions untouched.
pub fn snap_level(v: f64) -> f64 {
    let rounded = (v * 10_000.0).round() / 10_000.0;
    if (v - rounded).abs() < 1e-6 {
        rounded
    } else {
        v
    }
}

/// One trial in tidy form: the unit of analysis
///
/// Outlier exclusion sets `excluded` and clears `response_time` but keeps the
/// condition and direction so excluded trials stay inspectable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TidyTrialRow {
    pub participant_id: String,
    pub condition: Condition,
    pub direction: String,
    pub response_time: Option<f64>,
    pub trial_number: usize,
    pub excluded: bool,
}

/// Ordered tidy trial table for one participant/experiment prefix
///
/// Insertion order is file-glob order then within-file row order; duplicate
/// trials from overlapping files are not deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TidyDataset {
    pub rows: Vec<TidyTrialRow>,
}

impl TidyDataset {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append another dataset, renumbering its trials to continue this one
    pub fn concat(&mut self, other: TidyDataset) {
        let offset = self.rows.len();
        for (i, mut row) in other.rows.into_iter().enumerate() {
            row.trial_number = offset + i;
            self.rows.push(row);
        }
    }

    /// Conditions present, in first-seen order
    pub fn conditions(&self) -> Vec<Condition> {
        let mut seen: Vec<Condition> = Vec::new();
        for row in &self.rows {
            if !seen.contains(&row.condition) {
                seen.push(row.condition.clone());
            }
        }
        seen
    }

    /// Write the tidy CSV artifact: fixed column order, header row, no index
    /// column. Excluded rows serialize an empty response-time field.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P, condition_column: &str) -> Result<()> {
        let mut writer = csv::Writer::from_path(path.as_ref())?;
        writer.write_record([
            PARTICIPANT_COLUMN,
            condition_column,
            DIRECTION_COLUMN,
            RESPONSE_TIME_COLUMN,
        ])?;
        for row in &self.rows {
            let condition = row.condition.key();
            let rt = match row.response_time {
                Some(v) => v.to_string(),
                None => String::new(),
            };
            writer.write_record([
                row.participant_id.as_str(),
                condition.as_str(),
                row.direction.as_str(),
                rt.as_str(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Load a tidy CSV produced by this pipeline (or by the older capture
    /// scripts, whose headers are normalized through the alias table).
    pub fn read_csv<P: AsRef<Path>>(path: P, condition_column: &str) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)?;

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(normalize_header)
            .collect();

        let col = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| TidyError::SchemaMismatch {
                    file: path.display().to_string(),
                    column: name.to_string(),
                })
        };

        let participant_idx = col(PARTICIPANT_COLUMN)?;
        let condition_idx = col(condition_column)?;
        let direction_idx = col(DIRECTION_COLUMN)?;
        let response_idx = col(RESPONSE_TIME_COLUMN)?;

        let mut dataset = Self::new();
        for (trial_number, record) in reader.records().enumerate() {
            let record = record?;
            let cell = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();

            let rt_cell = cell(response_idx);
            let response_time = if rt_cell.is_empty() {
                None
            } else {
                Some(rt_cell.parse::<f64>().map_err(|_| {
                    TidyError::ParseError(format!(
                        "{}: row {}: response time '{}' is not numeric",
                        path.display(),
                        trial_number,
                        rt_cell
                    ))
                })?)
            };

            dataset.rows.push(TidyTrialRow {
                participant_id: cell(participant_idx),
                condition: Condition::parse(&cell(condition_idx)),
                direction: cell(direction_idx),
                response_time,
                trial_number,
                excluded: false,
            });
        }
        Ok(dataset)
    }
}

fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim();
    for (alias, canonical) in HEADER_ALIASES {
        if trimmed == *alias {
            return (*canonical).to_string();
        }
    }
    trimmed.to_string()
}

/// Configuration for one pipeline run
///
/// Replaces the interactive prompts of the original capture scripts; every
/// field is validated before any file is touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRequest {
    /// Directory holding the raw exports and tidy files
    pub data_dir: String,
    /// Participant initials used in file prefixes
    pub participant: String,
    /// Experiment abbreviation (registry key)
    pub experiment: String,
    /// Directory holding calibration exports (defaults to `data_dir`)
    pub calibration_dir: Option<String>,
    /// Overrides the experiment's default exclusion policy
    pub outlier_policy: Option<OutlierPolicy>,
    /// Cleaned-table output path (defaults next to the data)
    pub output: Option<String>,
}

impl PipelineRequest {
    pub fn experiment_metadata(&self) -> Result<&'static ExperimentMetadata> {
        ExperimentMetadata::from_abbrev(&self.experiment)
            .ok_or_else(|| TidyError::UnknownExperiment(self.experiment.clone()))
    }

    pub fn calibration_dir(&self) -> &str {
        self.calibration_dir.as_deref().unwrap_or(&self.data_dir)
    }
}

/// Outcome of converting one raw export
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOutcome {
    Written { output: String, trials: usize },
    SkippedTidy,
    Failed { message: String },
}

/// Summary of one tidy-conversion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TidyRunSummary {
    pub id: String,
    pub participant: String,
    pub experiment: String,
    pub files: BTreeMap<String, FileOutcome>,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
    pub created_at: String,
}

impl TidyRunSummary {
    pub fn new(participant: String, experiment: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            participant,
            experiment,
            files: BTreeMap::new(),
            written: 0,
            skipped: 0,
            failed: 0,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn record(&mut self, input: &Path, outcome: FileOutcome) {
        match &outcome {
            FileOutcome::Written { .. } => self.written += 1,
            FileOutcome::SkippedTidy => self.skipped += 1,
            FileOutcome::Failed { .. } => self.failed += 1,
        }
        self.files.insert(input.display().to_string(), outcome);
    }
}

/// Full analysis result: cleaned-table location plus the report the legacy
/// scripts printed (grouped descriptives, pairwise tests, omnibus test).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: String,
    pub participant: String,
    pub experiment: String,
    pub input_files: Vec<String>,
    pub trials: usize,
    pub excluded: usize,
    pub baseline: f64,
    pub outlier_policy: OutlierPolicy,
    pub descriptives: BTreeMap<String, Descriptives>,
    pub pairwise_tests: Vec<PairwiseTest>,
    pub anova: Option<AnovaResult>,
    pub output_path: String,
    pub created_at: String,
}

/// One pairwise comparison between condition groups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairwiseTest {
    pub group_a: String,
    pub group_b: String,
    #[serde(flatten)]
    pub test: TTestResult,
}

/// Default cleaned-table path for a run: `<data_dir>/<TAG>_<participant>_clean.csv`
pub fn default_output_path(data_dir: &str, experiment: &str, participant: &str) -> PathBuf {
    Path::new(data_dir).join(format!("{}_{}_clean.csv", experiment, participant))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_parse_label() {
        assert_eq!(
            Condition::parse(" Left "),
            Condition::Label("Left".to_string())
        );
    }

    #[test]
    fn test_condition_parse_snaps_float32_noise() {
        assert_eq!(Condition::parse("0.899999976158"), Condition::Level(0.9));
        assert_eq!(Condition::parse("0.600000023842"), Condition::Level(0.6));
        assert_eq!(Condition::parse("0.75"), Condition::Level(0.75));
    }

    #[test]
    fn test_snap_leaves_genuine_fractions() {
        let v = 0.123456789;
        assert!((snap_level(v) - v).abs() < 1e-15);
    }

    #[test]
    fn test_condition_key() {
        assert_eq!(Condition::Level(0.9).key(), "0.9");
        assert_eq!(Condition::Label("Right".to_string()).key(), "Right");
    }

    #[test]
    fn test_concat_renumbers_trials() {
        let row = |n: usize| TidyTrialRow {
            participant_id: "RH".to_string(),
            condition: Condition::Level(0.9),
            direction: "right".to_string(),
            response_time: Some(1.0),
            trial_number: n,
            excluded: false,
        };
        let mut a = TidyDataset {
            rows: vec![row(0), row(1)],
        };
        let b = TidyDataset {
            rows: vec![row(0)],
        };
        a.concat(b);
        assert_eq!(a.rows[2].trial_number, 2);
    }

    #[test]
    fn test_csv_round_trip_preserves_missing_values() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("TW_RH_1.csv");

        let dataset = TidyDataset {
            rows: vec![
                TidyTrialRow {
                    participant_id: "RH".to_string(),
                    condition: Condition::Level(0.9),
                    direction: "right".to_string(),
                    response_time: Some(1.25),
                    trial_number: 0,
                    excluded: false,
                },
                TidyTrialRow {
                    participant_id: "RH".to_string(),
                    condition: Condition::Level(0.6),
                    direction: "left".to_string(),
                    response_time: None,
                    trial_number: 1,
                    excluded: true,
                },
            ],
        };
        dataset.write_csv(&path, "ContrastLevel").unwrap();

        let loaded = TidyDataset::read_csv(&path, "ContrastLevel").unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.rows[0].response_time, Some(1.25));
        assert_eq!(loaded.rows[0].condition, Condition::Level(0.9));
        assert_eq!(loaded.rows[1].response_time, None);
        assert_eq!(loaded.rows[1].direction, "left");
    }

    #[test]
    fn test_read_csv_normalizes_legacy_headers() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("legacy.csv");
        std::fs::write(
            &path,
            "Participant_Id,Contrast_Level,Button_Pressed,Response_Time\nRH,0.9,right,1.5\n",
        )
        .unwrap();

        let loaded = TidyDataset::read_csv(&path, "ContrastLevel").unwrap();
        assert_eq!(loaded.rows[0].participant_id, "RH");
        assert_eq!(loaded.rows[0].response_time, Some(1.5));
    }

    #[test]
    fn test_read_csv_missing_column() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.csv");
        std::fs::write(&path, "ParticipantID,Direction,ResponseTime\nRH,right,1.0\n").unwrap();

        let err = TidyDataset::read_csv(&path, "ContrastLevel").unwrap_err();
        assert!(err.to_string().contains("ContrastLevel"));
    }
}
