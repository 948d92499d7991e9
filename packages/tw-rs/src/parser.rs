use std::path::Path;

use crate::error::{Result, TidyError};
use crate::experiments::ExperimentMetadata;

/// Flattened value region of one raw export row
///
/// The vendor export aggregates a whole trial block per row: a handful of
/// named metadata columns (row index plus sanity-check mean/std pairs),
/// followed by every per-sub-trial value in a single flattened sequence.
/// Parsing discards the metadata columns by name and keeps the remainder as
/// raw cells; slicing into typed blocks is the reshaper's job.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeries {
    pub file: String,
    pub cells: Vec<String>,
}

/// True when the file is the pipeline's own delimited tidy output and must
/// not be reparsed as a raw export.
pub fn is_tidy_file<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// Cell delimiter for a raw export, by extension
///
/// Spreadsheet formats are rejected outright: exports must be re-saved as
/// delimited text before entering the pipeline.
fn delimiter_for(path: &Path) -> Result<u8> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "tsv" | "txt" => Ok(b'\t'),
        "csv" => Ok(b','),
        "xlsx" | "xls" => Err(TidyError::UnsupportedFileType(format!(
            "{}: spreadsheet exports must be re-saved as delimited text (.tsv/.txt/.csv)",
            path.display()
        ))),
        other => Err(TidyError::UnsupportedFileType(format!(
            "{}: unknown extension '{}', expected .tsv/.txt/.csv",
            path.display(),
            other
        ))),
    }
}

/// Load one raw export file and return the flattened value region per row
///
/// Fails with `SchemaMismatch` if any of the experiment's metadata columns is
/// absent from the header. Reading never mutates the source file.
pub fn load_raw_export<P: AsRef<Path>>(
    path: P,
    experiment: &ExperimentMetadata,
) -> Result<Vec<RawSeries>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(TidyError::FileNotFound(path.display().to_string()));
    }

    let delimiter = delimiter_for(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

    // Positions of the metadata columns to discard; each must exist.
    let mut metadata_positions = Vec::with_capacity(experiment.metadata_columns.len());
    for column in experiment.metadata_columns {
        let position = headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| TidyError::SchemaMismatch {
                file: path.display().to_string(),
                column: (*column).to_string(),
            })?;
        metadata_positions.push(position);
    }

    let mut series = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cells: Vec<String> = record
            .iter()
            .enumerate()
            .filter(|(i, _)| !metadata_positions.contains(i))
            .map(|(_, cell)| cell.trim().to_string())
            .collect();
        series.push(RawSeries {
            file: path.display().to_string(),
            cells,
        });
    }

    log::info!(
        "Loaded raw export {}: {} row(s), {} value cell(s) per row",
        path.display(),
        series.len(),
        series.first().map(|s| s.cells.len()).unwrap_or(0)
    );

    Ok(series)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::experiments::{ExperimentMetadata, ExportKind, TW};
    use std::fs;

    /// Toy triple-block experiment with a short block, for readable fixtures
    pub(crate) const TOY: ExperimentMetadata = ExperimentMetadata {
        abbreviation: "TOY",
        name: "Toy",
        export_kind: ExportKind::TripleBlock,
        condition_column: "ContrastLevel",
        metadata_columns: &["index", "TravelTime_mean", "TravelTime_std"],
        lead_cells: 1,
        block_length: 3,
        valid_response: "right",
        default_outlier_policy: None,
        documentation: "",
    };

    fn write_toy_export(dir: &Path, name: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let header = "index\tTravelTime_mean\tTravelTime_std\tn\tc1\tc2\tc3\td1\td2\td3\tr1\tr2\tr3";
        let row = "0\t1.1\t0.2\t9\t0.9\t0.9\t0.9\t['right']\t['right']\t['left']\t1.0\t1.2\t0.3";
        fs::write(&path, format!("{}\n{}\n", header, row)).unwrap();
        path
    }

    #[test]
    fn test_is_tidy_file() {
        assert!(is_tidy_file("data/TW_RH_1.csv"));
        assert!(is_tidy_file("data/TW_RH_1.CSV"));
        assert!(!is_tidy_file("data/TW_RH_1.tsv"));
        assert!(!is_tidy_file("data/TW_RH_1"));
    }

    #[test]
    fn test_load_discards_metadata_columns() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_toy_export(tmp.path(), "TOY_RH_1.tsv");

        let series = load_raw_export(&path, &TOY).unwrap();
        assert_eq!(series.len(), 1);
        // 13 columns minus 3 metadata = 1 lead + 3 blocks of 3
        assert_eq!(series[0].cells.len(), 10);
        assert_eq!(series[0].cells[0], "9");
        assert_eq!(series[0].cells[1], "0.9");
        assert_eq!(series[0].cells[4], "['right']");
    }

    #[test]
    fn test_load_missing_column_is_schema_mismatch() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("TW_RH_1.tsv");
        fs::write(&path, "index\tfoo\n0\t1\n").unwrap();

        let err = load_raw_export(&path, &TW).unwrap_err();
        match err {
            TidyError::SchemaMismatch { column, .. } => {
                assert_eq!(column, "ContrastLevel_mean");
            }
            other => panic!("expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_raw_export("/nonexistent_dir_12345/TW_RH_1.tsv", &TW).unwrap_err();
        assert!(matches!(err, TidyError::FileNotFound(_)));
    }

    #[test]
    fn test_load_rejects_spreadsheet() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("TW_RH_1.xlsx");
        fs::write(&path, "not really a spreadsheet").unwrap();

        let err = load_raw_export(&path, &TW).unwrap_err();
        assert!(matches!(err, TidyError::UnsupportedFileType(_)));
        assert!(err.to_string().contains("delimited"));
    }
}
