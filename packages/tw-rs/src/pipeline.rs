use std::path::{Path, PathBuf};

use crate::baseline::{apply_baseline, CalibrationDataset};
use crate::error::{Result, TidyError};
use crate::experiments::{ExperimentMetadata, ExportKind, CALIBRATION_COLUMN};
use crate::outlier::{condition_descriptives, filter_outliers, grouped_times};
use crate::parser::{is_tidy_file, load_raw_export};
use crate::reshape::tidy_up;
use crate::stats::{one_way_anova, welch_t_test};
use crate::types::{
    default_output_path, AnalysisResult, FileOutcome, PairwiseTest, PipelineRequest, TidyDataset,
    TidyRunSummary,
};

/// Files matching `{tag}_{participant}*` under the data directory, sorted
/// for deterministic processing order.
pub fn resolve_input_files(dir: &str, experiment: &ExperimentMetadata, participant: &str) -> Result<Vec<PathBuf>> {
    let pattern = Path::new(dir)
        .join(experiment.file_pattern(participant))
        .display()
        .to_string();

    let mut files: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| TidyError::InvalidParameter(format!("bad glob '{}': {}", pattern, e)))?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("Glob error under '{}': {}", pattern, e);
                None
            }
        })
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(TidyError::NoInputFiles(pattern));
    }
    Ok(files)
}

/// Convert every raw export for the participant/experiment prefix into a
/// tidy CSV next to its source
///
/// Files already in tidy form are skipped; a malformed file is logged,
/// recorded in the summary, and does not abort the rest of the batch.
pub fn run_tidy(request: &PipelineRequest) -> Result<TidyRunSummary> {
    let experiment = request.experiment_metadata()?;
    let files = resolve_input_files(&request.data_dir, experiment, &request.participant)?;

    let mut summary = TidyRunSummary::new(request.participant.clone(), experiment.abbreviation.to_string());

    for file in &files {
        if is_tidy_file(file) {
            log::debug!("Skipping already-tidy file {}", file.display());
            summary.record(file, FileOutcome::SkippedTidy);
            continue;
        }

        match convert_export(file, experiment, &request.participant) {
            Ok((output, trials)) => {
                log::info!("Wrote {} ({} trial(s))", output.display(), trials);
                summary.record(
                    file,
                    FileOutcome::Written {
                        output: output.display().to_string(),
                        trials,
                    },
                );
            }
            Err(e) => {
                log::warn!("Skipping malformed file {}: {}", file.display(), e);
                summary.record(
                    file,
                    FileOutcome::Failed {
                        message: e.to_string(),
                    },
                );
            }
        }
    }

    Ok(summary)
}

fn convert_export(
    file: &Path,
    experiment: &ExperimentMetadata,
    participant: &str,
) -> Result<(PathBuf, usize)> {
    let output = file.with_extension("csv");
    match experiment.export_kind {
        ExportKind::TripleBlock => {
            let series = load_raw_export(file, experiment)?;
            let dataset = tidy_up(&series, participant, experiment)?;
            dataset.write_csv(&output, experiment.condition_column)?;
            Ok((output, dataset.len()))
        }
        ExportKind::FlatSeries => {
            let series = load_raw_export(file, experiment)?;
            let values: Vec<String> = series
                .iter()
                .flat_map(|row| row.cells.iter())
                .map(|cell| cell.trim().to_string())
                .collect();

            let mut writer = csv::Writer::from_path(&output)?;
            writer.write_record([CALIBRATION_COLUMN])?;
            for value in &values {
                writer.write_record([value.as_str()])?;
            }
            writer.flush()?;
            Ok((output, values.len()))
        }
    }
}

/// Run the full analysis for one participant/experiment prefix
///
/// Loads every tidy CSV matching the prefix, concatenates in glob order,
/// subtracts the calibration baseline, excludes outliers, computes the
/// grouped report, and writes the cleaned table. The cleaned CSV is written
/// only after the whole in-memory table is assembled, so a failed run leaves
/// no partial output.
pub fn run_analysis(request: &PipelineRequest) -> Result<(TidyDataset, AnalysisResult)> {
    let experiment = request.experiment_metadata()?;
    let policy = request
        .outlier_policy
        .or(experiment.default_outlier_policy)
        .ok_or_else(|| {
            TidyError::InvalidParameter(format!(
                "experiment {} has no outlier policy; supply one explicitly",
                experiment.abbreviation
            ))
        })?;

    let files = resolve_input_files(&request.data_dir, experiment, &request.participant)?;
    let tidy_files: Vec<&PathBuf> = files.iter().filter(|f| is_tidy_file(f)).collect();

    let mut dataset = TidyDataset::new();
    let mut input_files = Vec::new();
    for file in &tidy_files {
        match TidyDataset::read_csv(file, experiment.condition_column) {
            Ok(part) => {
                log::info!("Loaded {} ({} trial(s))", file.display(), part.len());
                input_files.push(file.display().to_string());
                dataset.concat(part);
            }
            Err(e) => {
                log::warn!("Skipping malformed file {}: {}", file.display(), e);
            }
        }
    }

    if dataset.is_empty() {
        return Err(TidyError::NoInputFiles(format!(
            "{} (no loadable tidy files)",
            Path::new(&request.data_dir)
                .join(experiment.file_pattern(&request.participant))
                .display()
        )));
    }

    // Baseline correction from the calibration file set
    let calibration = CalibrationDataset::collect(request.calibration_dir(), &request.participant)?;
    let baseline = calibration.mean();
    log::info!(
        "Baseline: {:.4}s over {} calibration sample(s) from {} file(s)",
        baseline,
        calibration.len(),
        calibration.files.len()
    );
    apply_baseline(&mut dataset, baseline);

    // Outlier exclusion, single pass
    let report = filter_outliers(&mut dataset, policy, experiment.valid_response)?;
    log::info!(
        "Excluded {} trial(s) with policy {}",
        report.excluded,
        policy
    );

    // Grouped report over the cleaned table
    let descriptives = condition_descriptives(&dataset, experiment.valid_response);
    let groups = grouped_times(&dataset, Some(experiment.valid_response));

    let mut pairwise_tests = Vec::new();
    for i in 0..groups.len() {
        for j in (i + 1)..groups.len() {
            pairwise_tests.push(PairwiseTest {
                group_a: groups[i].0.clone(),
                group_b: groups[j].0.clone(),
                test: welch_t_test(&groups[i].1, &groups[j].1),
            });
        }
    }

    let anova = if groups.len() >= 2 {
        let samples: Vec<Vec<f64>> = groups.iter().map(|(_, v)| v.clone()).collect();
        Some(one_way_anova(&samples))
    } else {
        None
    };

    let output_path = match &request.output {
        Some(path) => PathBuf::from(path),
        None => default_output_path(
            &request.data_dir,
            experiment.abbreviation,
            &request.participant,
        ),
    };
    dataset.write_csv(&output_path, experiment.condition_column)?;
    log::info!("Cleaned table written to {}", output_path.display());

    let result = AnalysisResult {
        id: uuid::Uuid::new_v4().to_string(),
        participant: request.participant.clone(),
        experiment: experiment.abbreviation.to_string(),
        input_files,
        trials: dataset.len(),
        excluded: report.excluded,
        baseline,
        outlier_policy: policy,
        descriptives,
        pairwise_tests,
        anova,
        output_path: output_path.display().to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    Ok((dataset, result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiments::TW;
    use std::fs;

    #[test]
    fn test_resolve_input_files_sorted_and_prefixed() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("TW_RH_2.tsv"), "").unwrap();
        fs::write(tmp.path().join("TW_RH_1.tsv"), "").unwrap();
        fs::write(tmp.path().join("TW_MS_1.tsv"), "").unwrap();
        fs::write(tmp.path().join("HF_RH_1.tsv"), "").unwrap();

        let files = resolve_input_files(tmp.path().to_str().unwrap(), &TW, "RH").unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["TW_RH_1.tsv", "TW_RH_2.tsv"]);
    }

    #[test]
    fn test_resolve_input_files_empty_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let err = resolve_input_files(tmp.path().to_str().unwrap(), &TW, "RH").unwrap_err();
        assert!(matches!(err, TidyError::NoInputFiles(_)));
    }

    #[test]
    fn test_run_tidy_skips_tidy_and_records_failures() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("TW_RH_1.csv"),
            "ParticipantID,ContrastLevel,Direction,ResponseTime\n",
        )
        .unwrap();
        // Wrong schema: metadata columns missing
        fs::write(tmp.path().join("TW_RH_2.tsv"), "foo\tbar\n1\t2\n").unwrap();

        let request = PipelineRequest {
            data_dir: tmp.path().display().to_string(),
            participant: "RH".to_string(),
            experiment: "TW".to_string(),
            calibration_dir: None,
            outlier_policy: None,
            output: None,
        };
        let summary = run_tidy(&request).unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.written, 0);
    }

    #[test]
    fn test_run_analysis_unknown_experiment() {
        let request = PipelineRequest {
            data_dir: "/tmp".to_string(),
            participant: "RH".to_string(),
            experiment: "XX".to_string(),
            calibration_dir: None,
            outlier_policy: None,
            output: None,
        };
        let err = run_analysis(&request).unwrap_err();
        assert!(matches!(err, TidyError::UnknownExperiment(_)));
    }
}
