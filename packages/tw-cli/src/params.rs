use std::path::Path;

use tw_rs::{ExperimentMetadata, OutlierPolicy, PipelineRequest, TidyError};

/// Map an engine error onto the process exit-code taxonomy.
pub fn error_exit_code(err: &TidyError) -> i32 {
    use crate::exit_codes;
    match err {
        TidyError::NoInputFiles(_) => exit_codes::NO_INPUT_FILES,
        TidyError::FileNotFound(_)
        | TidyError::UnsupportedFileType(_)
        | TidyError::SchemaMismatch { .. }
        | TidyError::BlockLengthMismatch { .. }
        | TidyError::UnknownExperiment(_)
        | TidyError::InvalidParameter(_)
        | TidyError::ParseError(_) => exit_codes::INPUT_ERROR,
        TidyError::EmptyConditionGroup(_)
        | TidyError::CalibrationUnavailable(_)
        | TidyError::IoError(_)
        | TidyError::CsvError(_) => exit_codes::EXECUTION_ERROR,
    }
}

/// Validate a data directory path.
pub fn validate_data_dir(dir: &str) -> Result<(), String> {
    if !Path::new(dir).is_dir() {
        return Err(format!("Data directory not found: {}", dir));
    }
    Ok(())
}

/// Normalize participant initials the way file prefixes are written:
/// trimmed and upper-cased.
pub fn normalize_participant(participant: &str) -> Result<String, String> {
    let normalized = participant.trim().to_uppercase();
    if normalized.is_empty() {
        return Err("Participant initials must not be empty".to_string());
    }
    if !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(format!(
            "Participant initials '{}' must be alphanumeric",
            participant
        ));
    }
    Ok(normalized)
}

/// Check an experiment abbreviation against the registry.
pub fn validate_experiment(abbrev: &str) -> Result<&'static ExperimentMetadata, String> {
    ExperimentMetadata::from_abbrev(abbrev).ok_or_else(|| {
        format!(
            "Unknown experiment '{}'. Valid experiments: TW, HF, RT",
            abbrev
        )
    })
}

/// Resolve the outlier policy from the threshold flags, if either was given.
pub fn resolve_policy(
    sd_threshold: Option<f64>,
    mean_factor: Option<f64>,
) -> Result<Option<OutlierPolicy>, String> {
    let policy = match (sd_threshold, mean_factor) {
        (Some(k), None) => {
            if k <= 0.0 {
                return Err(format!("--sd-threshold must be positive, got {}", k));
            }
            Some(OutlierPolicy::MeanPlusStd(k))
        }
        (None, Some(f)) => {
            if f <= 1.0 {
                return Err(format!("--mean-factor must exceed 1, got {}", f));
            }
            Some(OutlierPolicy::MeanTimes(f))
        }
        (None, None) => None,
        (Some(_), Some(_)) => {
            return Err("--sd-threshold and --mean-factor are mutually exclusive".to_string())
        }
    };
    Ok(policy)
}

/// Build a validated pipeline request from command-line inputs.
pub fn build_request(
    data_dir: &str,
    participant: &str,
    experiment: &str,
    calibration_dir: Option<&str>,
    outlier_policy: Option<OutlierPolicy>,
    output: Option<&str>,
) -> Result<PipelineRequest, String> {
    validate_data_dir(data_dir)?;
    if let Some(dir) = calibration_dir {
        validate_data_dir(dir)?;
    }
    let participant = normalize_participant(participant)?;
    let experiment = validate_experiment(experiment)?;

    Ok(PipelineRequest {
        data_dir: data_dir.to_string(),
        participant,
        experiment: experiment.abbreviation.to_string(),
        calibration_dir: calibration_dir.map(str::to_string),
        outlier_policy,
        output: output.map(str::to_string),
    })
}
