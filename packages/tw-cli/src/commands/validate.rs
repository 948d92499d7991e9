use crate::cli::ValidateArgs;
use crate::exit_codes;
use crate::output;
use crate::params;

use serde::Serialize;
use tw_rs::{load_raw_export, tidy_up, ExportKind};

#[derive(Serialize)]
struct ValidationReport {
    file: String,
    experiment: &'static str,
    valid: bool,
    rows: usize,
    trials: usize,
    message: Option<String>,
}

pub fn execute(args: ValidateArgs) -> i32 {
    let experiment = match params::validate_experiment(&args.experiment) {
        Ok(e) => e,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    let report = match load_raw_export(&args.file, experiment) {
        Ok(series) => {
            let trials = match experiment.export_kind {
                ExportKind::TripleBlock => match tidy_up(&series, "XX", experiment) {
                    Ok(dataset) => Ok(dataset.len()),
                    Err(e) => Err(e),
                },
                ExportKind::FlatSeries => {
                    Ok(series.iter().map(|row| row.cells.len()).sum())
                }
            };
            match trials {
                Ok(trials) => ValidationReport {
                    file: args.file.clone(),
                    experiment: experiment.abbreviation,
                    valid: true,
                    rows: series.len(),
                    trials,
                    message: None,
                },
                Err(e) => ValidationReport {
                    file: args.file.clone(),
                    experiment: experiment.abbreviation,
                    valid: false,
                    rows: series.len(),
                    trials: 0,
                    message: Some(e.to_string()),
                },
            }
        }
        Err(e) => ValidationReport {
            file: args.file.clone(),
            experiment: experiment.abbreviation,
            valid: false,
            rows: 0,
            trials: 0,
            message: Some(e.to_string()),
        },
    };

    if args.json {
        match output::to_json(&report, false) {
            Ok(json) => {
                if let Err(e) = output::write_output(&json, None) {
                    eprintln!("Error: {}", e);
                    return exit_codes::EXECUTION_ERROR;
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return exit_codes::EXECUTION_ERROR;
            }
        }
    } else if report.valid {
        println!(
            "{}: valid {} export ({} row(s), {} trial(s))",
            report.file, report.experiment, report.rows, report.trials
        );
    } else {
        println!(
            "{}: INVALID ({})",
            report.file,
            report.message.as_deref().unwrap_or("unknown error")
        );
    }

    if report.valid {
        exit_codes::SUCCESS
    } else {
        exit_codes::INPUT_ERROR
    }
}
