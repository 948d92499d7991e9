use crate::cli::TidyArgs;
use crate::exit_codes;
use crate::output;
use crate::params;

use tw_rs::{run_tidy, TidyError};

pub fn execute(args: TidyArgs) -> i32 {
    let request = match params::build_request(
        &args.data_dir,
        &args.participant,
        &args.experiment,
        None,
        None,
        None,
    ) {
        Ok(r) => r,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    if !args.quiet {
        eprintln!(
            "Tidying {} exports for participant {} in {}...",
            request.experiment, request.participant, request.data_dir
        );
    }

    let summary = match run_tidy(&request) {
        Ok(s) => s,
        Err(TidyError::NoInputFiles(pattern)) => {
            eprintln!("Error: No matching files found for {}", pattern);
            return exit_codes::NO_INPUT_FILES;
        }
        Err(e) => {
            eprintln!("Tidy run failed: {}", e);
            return params::error_exit_code(&e);
        }
    };

    if !args.quiet {
        eprintln!(
            "Tidy complete: {} written, {} skipped, {} failed",
            summary.written, summary.skipped, summary.failed
        );
    }

    if args.json {
        match output::to_json(&summary, args.compact) {
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
    }

    if summary.failed == 0 {
        exit_codes::SUCCESS
    } else if summary.written > 0 {
        exit_codes::PARTIAL_FAILURE
    } else {
        exit_codes::EXECUTION_ERROR
    }
}
