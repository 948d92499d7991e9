use crate::cli::ExperimentsArgs;
use crate::exit_codes;
use crate::output;

use serde::Serialize;
use tw_rs::EXPERIMENT_REGISTRY;

#[derive(Serialize)]
struct ExperimentInfo {
    abbreviation: &'static str,
    name: &'static str,
    kind: String,
    condition_column: &'static str,
    block_length: usize,
    valid_response: &'static str,
    default_outlier_policy: Option<String>,
    documentation: &'static str,
}

pub fn execute(args: ExperimentsArgs) -> i32 {
    let experiments: Vec<ExperimentInfo> = EXPERIMENT_REGISTRY
        .iter()
        .map(|e| ExperimentInfo {
            abbreviation: e.abbreviation,
            name: e.name,
            kind: format!("{:?}", e.export_kind),
            condition_column: e.condition_column,
            block_length: e.block_length,
            valid_response: e.valid_response,
            default_outlier_policy: e.default_outlier_policy.map(|p| p.to_string()),
            documentation: e.documentation,
        })
        .collect();

    if args.json {
        match output::to_json(&experiments, false) {
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
    } else {
        println!("Supported experiments:\n");
        println!(
            "  {:<8} {:<20} {:<12} {:<18} {:<8} {:<12}",
            "Abbrev", "Name", "Kind", "Condition", "Block", "Policy"
        );
        println!("  {}", "-".repeat(80));
        for e in &experiments {
            println!(
                "  {:<8} {:<20} {:<12} {:<18} {:<8} {:<12}",
                e.abbreviation,
                e.name,
                e.kind,
                e.condition_column,
                e.block_length,
                e.default_outlier_policy.as_deref().unwrap_or("-")
            );
        }
        println!();
        println!("File prefixes follow <ABBREV>_<PARTICIPANT>*, e.g. TW_RH_2024.tsv");
    }

    exit_codes::SUCCESS
}
