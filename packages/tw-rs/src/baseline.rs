use std::path::Path;

use crate::error::{Result, TidyError};
use crate::experiments::{CALIBRATION_COLUMN, RT};
use crate::parser::{is_tidy_file, load_raw_export};
use crate::stats::nanmean;
use crate::types::TidyDataset;

/// Simple reaction-time samples pooled from a participant's calibration files
///
/// The set has no identity beyond the scalar it reduces to: the mean is the
/// non-decision-time estimate subtracted from every response time.
#[derive(Debug, Clone, Default)]
pub struct CalibrationDataset {
    pub values: Vec<f64>,
    pub files: Vec<String>,
}

impl CalibrationDataset {
    /// Pool calibration samples from every `RT_<participant>*` file in `dir`
    ///
    /// Tidy CSV files are read through their single response-time column; raw
    /// wide exports are flattened after metadata-column discard. Fails with
    /// `CalibrationUnavailable` when the glob matches nothing.
    pub fn collect<P: AsRef<Path>>(dir: P, participant: &str) -> Result<Self> {
        let pattern = Path::new(dir.as_ref())
            .join(RT.file_pattern(participant))
            .display()
            .to_string();

        let mut paths: Vec<std::path::PathBuf> = glob::glob(&pattern)
            .map_err(|e| TidyError::InvalidParameter(format!("bad glob '{}': {}", pattern, e)))?
            .filter_map(|entry| entry.ok())
            .filter(|p| p.is_file())
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(TidyError::CalibrationUnavailable(pattern));
        }

        let mut dataset = Self::default();
        for path in paths {
            let values = if is_tidy_file(&path) {
                read_tidy_calibration(&path)?
            } else {
                read_raw_calibration(&path)?
            };
            log::info!(
                "Calibration file {}: {} sample(s)",
                path.display(),
                values.len()
            );
            dataset.values.extend(values);
            dataset.files.push(path.display().to_string());
        }
        Ok(dataset)
    }

    /// Baseline estimate: mean over finite samples, NaN if none
    pub fn mean(&self) -> f64 {
        nanmean(&self.values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn read_tidy_calibration(path: &Path) -> Result<Vec<f64>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

    // Older capture output used the bare pandas column label "0"
    let column = headers
        .iter()
        .position(|h| h == CALIBRATION_COLUMN || h == "0")
        .ok_or_else(|| TidyError::SchemaMismatch {
            file: path.display().to_string(),
            column: CALIBRATION_COLUMN.to_string(),
        })?;

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record?;
        values.push(parse_sample(record.get(column).unwrap_or("")));
    }
    Ok(values)
}

fn read_raw_calibration(path: &Path) -> Result<Vec<f64>> {
    let series = load_raw_export(path, &RT)?;
    Ok(series
        .iter()
        .flat_map(|row| row.cells.iter())
        .map(|cell| parse_sample(cell))
        .collect())
}

fn parse_sample(cell: &str) -> f64 {
    match cell.trim().parse::<f64>() {
        Ok(v) => v,
        Err(_) => {
            log::debug!("Non-numeric calibration cell '{}' treated as missing", cell);
            f64::NAN
        }
    }
}

/// Subtract the baseline from every present response time
///
/// Row count, order, and every other column are untouched. Applying the
/// correction twice shifts the values twice; nothing memoizes the first
/// pass. A NaN baseline propagates NaN into every corrected value.
pub fn apply_baseline(dataset: &mut TidyDataset, baseline: f64) {
    for row in &mut dataset.rows {
        if let Some(rt) = row.response_time {
            row.response_time = Some(rt - baseline);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Condition, TidyTrialRow};
    use std::fs;

    fn dataset(times: &[Option<f64>]) -> TidyDataset {
        TidyDataset {
            rows: times
                .iter()
                .enumerate()
                .map(|(i, rt)| TidyTrialRow {
                    participant_id: "RH".to_string(),
                    condition: Condition::Level(0.9),
                    direction: "right".to_string(),
                    response_time: *rt,
                    trial_number: i,
                    excluded: false,
                })
                .collect(),
        }
    }

    #[test]
    fn test_apply_baseline_shifts_present_values_only() {
        let mut data = dataset(&[Some(1.0), None, Some(0.5)]);
        apply_baseline(&mut data, 0.2);
        assert_eq!(data.rows[0].response_time, Some(0.8));
        assert_eq!(data.rows[1].response_time, None);
        assert_eq!(data.rows[2].response_time, Some(0.3));
        assert_eq!(data.len(), 3);
    }

    #[test]
    fn test_apply_baseline_not_idempotent() {
        let mut data = dataset(&[Some(1.0)]);
        apply_baseline(&mut data, 0.2);
        apply_baseline(&mut data, 0.2);
        let rt = data.rows[0].response_time.unwrap();
        assert!((rt - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_nan_baseline_propagates() {
        let calibration = CalibrationDataset {
            values: vec![f64::NAN, f64::NAN],
            files: vec![],
        };
        assert!(calibration.mean().is_nan());

        let mut data = dataset(&[Some(1.0), Some(2.0)]);
        apply_baseline(&mut data, calibration.mean());
        assert!(data.rows[0].response_time.unwrap().is_nan());
        assert!(data.rows[1].response_time.unwrap().is_nan());
    }

    #[test]
    fn test_collect_from_tidy_and_raw_files() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("RT_RH_1.csv"),
            "ResponseTime\n0.2\n0.3\n",
        )
        .unwrap();
        fs::write(
            tmp.path().join("RT_RH_2.tsv"),
            "index\tn\tRT_mean\tRT_std\tv1\tv2\n0\t2\t0.25\t0.05\t0.1\t0.4\n",
        )
        .unwrap();
        // Different participant, must not match
        fs::write(tmp.path().join("RT_MS_1.csv"), "ResponseTime\n9.0\n").unwrap();

        let calibration = CalibrationDataset::collect(tmp.path(), "RH").unwrap();
        assert_eq!(calibration.len(), 4);
        assert_eq!(calibration.files.len(), 2);
        assert!((calibration.mean() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_collect_legacy_column_label() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("RT_RH_1.csv"), "0\n0.2\n0.4\n").unwrap();

        let calibration = CalibrationDataset::collect(tmp.path(), "RH").unwrap();
        assert!((calibration.mean() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_collect_no_files_is_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let err = CalibrationDataset::collect(tmp.path(), "RH").unwrap_err();
        assert!(matches!(err, TidyError::CalibrationUnavailable(_)));
    }
}
