use thiserror::Error;

#[derive(Error, Debug)]
pub enum TidyError {
    #[error("Input file not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Schema mismatch in '{file}': expected column '{column}' not found")]
    SchemaMismatch { file: String, column: String },

    #[error("Block length mismatch in '{file}': expected {expected} cells after metadata, found {found}")]
    BlockLengthMismatch {
        file: String,
        expected: usize,
        found: usize,
    },

    #[error("No valid-response rows for condition '{0}' during outlier filtering")]
    EmptyConditionGroup(String),

    #[error("No calibration files matched pattern: {0}")]
    CalibrationUnavailable(String),

    #[error("No input files matched pattern: {0}")]
    NoInputFiles(String),

    #[error("Failed to parse export data: {0}")]
    ParseError(String),

    #[error("Unknown experiment tag: {0}")]
    UnknownExperiment(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, TidyError>;
