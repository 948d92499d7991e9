use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "twlab",
    version,
    about = "Travelling-wave psychophysics data pipeline",
    long_about = "Reshape raw travelling-wave experiment exports into tidy trial tables,\n\
                  apply reaction-time baseline correction and outlier exclusion, and\n\
                  report grouped descriptives and significance tests."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert raw exports into tidy per-trial CSV files
    Tidy(TidyArgs),
    /// Baseline-correct, filter, and report over a participant's tidy data
    Analyze(AnalyzeArgs),
    /// List supported experiment types
    Experiments(ExperimentsArgs),
    /// Validate a raw export file against its experiment schema
    Validate(ValidateArgs),
}

#[derive(Args)]
pub struct TidyArgs {
    /// Directory holding the raw exports
    #[arg(long, env = "TWLAB_DATA_DIR")]
    pub data_dir: String,

    /// Participant initials used in file prefixes
    #[arg(long)]
    pub participant: String,

    /// Experiment abbreviation (TW, HF, RT)
    #[arg(long, default_value = "TW")]
    pub experiment: String,

    /// Output the run summary as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Compact JSON output (no indentation)
    #[arg(long, default_value_t = false)]
    pub compact: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Directory holding the tidy data files
    #[arg(long, env = "TWLAB_DATA_DIR")]
    pub data_dir: String,

    /// Participant initials used in file prefixes
    #[arg(long)]
    pub participant: String,

    /// Experiment abbreviation (TW, HF)
    #[arg(long, default_value = "TW")]
    pub experiment: String,

    /// Directory holding RT calibration files (default: the data directory)
    #[arg(long)]
    pub calibration_dir: Option<String>,

    /// Exclude responses above mean + K standard deviations
    #[arg(long, conflicts_with = "mean_factor")]
    pub sd_threshold: Option<f64>,

    /// Exclude responses above mean * FACTOR
    #[arg(long, conflicts_with = "sd_threshold")]
    pub mean_factor: Option<f64>,

    /// Cleaned-table output path (default: next to the data)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Output the analysis report as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Compact JSON output (no indentation)
    #[arg(long, default_value_t = false)]
    pub compact: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct ExperimentsArgs {
    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Raw export file path
    #[arg(long)]
    pub file: String,

    /// Experiment abbreviation (TW, HF, RT)
    #[arg(long, default_value = "TW")]
    pub experiment: String,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
