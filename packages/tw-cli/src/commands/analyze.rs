use crate::cli::AnalyzeArgs;
use crate::exit_codes;
use crate::output;
use crate::params;

use tw_rs::{run_analysis, TidyError};

pub fn execute(args: AnalyzeArgs) -> i32 {
    let policy = match params::resolve_policy(args.sd_threshold, args.mean_factor) {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    let request = match params::build_request(
        &args.data_dir,
        &args.participant,
        &args.experiment,
        args.calibration_dir.as_deref(),
        policy,
        args.output.as_deref(),
    ) {
        Ok(r) => r,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    if !args.quiet {
        eprintln!(
            "Analyzing {} data for participant {}...",
            request.experiment, request.participant
        );
        eprintln!("  Data: {}", request.data_dir);
        eprintln!("  Calibration: {}", request.calibration_dir());
        if let Some(policy) = request.outlier_policy {
            eprintln!("  Outlier policy: {}", policy);
        }
    }

    match run_analysis(&request) {
        Ok((_, result)) => {
            let rendered = if args.json {
                match output::to_json(&result, args.compact) {
                    Ok(json) => json,
                    Err(e) => {
                        eprintln!("Error serializing result: {}", e);
                        return exit_codes::EXECUTION_ERROR;
                    }
                }
            } else {
                output::render_report(&result)
            };

            if let Err(e) = output::write_output(&rendered, None) {
                eprintln!("Error: {}", e);
                return exit_codes::EXECUTION_ERROR;
            }
            exit_codes::SUCCESS
        }
        Err(TidyError::NoInputFiles(pattern)) => {
            eprintln!("Error: No tidy data found for {}", pattern);
            exit_codes::NO_INPUT_FILES
        }
        Err(e) => {
            eprintln!("Analysis failed: {}", e);
            params::error_exit_code(&e)
        }
    }
}
