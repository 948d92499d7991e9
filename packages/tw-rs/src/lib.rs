pub mod types;
pub mod experiments;
pub mod parser;
pub mod reshape;
pub mod baseline;
pub mod outlier;
pub mod stats;
pub mod pipeline;
pub mod error;

pub use types::*;
pub use experiments::{ExperimentMetadata, ExportKind, OutlierPolicy, EXPERIMENT_REGISTRY};
pub use parser::{is_tidy_file, load_raw_export, RawSeries};
pub use reshape::tidy_up;
pub use baseline::{apply_baseline, CalibrationDataset};
pub use outlier::{condition_descriptives, filter_outliers, grouped_times, OutlierReport};
pub use stats::{describe, nanmean, one_way_anova, paired_t_test, student_t_test, welch_t_test};
pub use stats::{AnovaResult, Descriptives, TTestResult};
pub use pipeline::{run_analysis, run_tidy};
pub use error::{Result, TidyError};
