use crate::error::{Result, TidyError};
use crate::experiments::ExperimentMetadata;
use crate::parser::RawSeries;
use crate::types::{Condition, TidyDataset, TidyTrialRow};

/// Strip list/quote decoration left over from the capture serialization
/// (`['right']` -> `right`). Cosmetic only.
pub fn strip_decoration(cell: &str) -> String {
    cell.trim()
        .trim_matches(|c| c == '[' || c == ']' || c == '\'' || c == '"')
        .to_string()
}

/// Reorganize the flattened per-sub-trial series into one row per trial
///
/// Each source row is sliced into three equal contiguous blocks (condition
/// level, direction label, response time), same-named blocks are concatenated
/// across rows in input order, and the three sequences are zipped positionally
/// into trials. The participant id is broadcast to every row.
///
/// Output row count is exactly `block_length * series.len()`.
pub fn tidy_up(
    series: &[RawSeries],
    participant: &str,
    experiment: &ExperimentMetadata,
) -> Result<TidyDataset> {
    let block = experiment.block_length;
    let expected = experiment
        .expected_cells()
        .ok_or_else(|| TidyError::InvalidParameter(format!(
            "experiment {} does not produce trial blocks",
            experiment.abbreviation
        )))?;

    let mut conditions: Vec<&str> = Vec::new();
    let mut directions: Vec<&str> = Vec::new();
    let mut response_times: Vec<&str> = Vec::new();

    for row in series {
        if row.cells.len() != expected {
            return Err(TidyError::BlockLengthMismatch {
                file: row.file.clone(),
                expected,
                found: row.cells.len(),
            });
        }
        let values = &row.cells[experiment.lead_cells..];
        conditions.extend(values[..block].iter().map(String::as_str));
        directions.extend(values[block..2 * block].iter().map(String::as_str));
        response_times.extend(values[2 * block..3 * block].iter().map(String::as_str));
    }

    let mut dataset = TidyDataset::new();
    for (trial_number, ((condition, direction), rt)) in conditions
        .iter()
        .zip(directions.iter())
        .zip(response_times.iter())
        .enumerate()
    {
        dataset.rows.push(TidyTrialRow {
            participant_id: participant.to_string(),
            condition: Condition::parse(condition),
            direction: strip_decoration(direction),
            response_time: parse_response_time(rt, trial_number)?,
            trial_number,
            excluded: false,
        });
    }

    log::debug!(
        "Reshaped {} source row(s) into {} trial(s)",
        series.len(),
        dataset.len()
    );

    Ok(dataset)
}

fn parse_response_time(cell: &str, trial_number: usize) -> Result<Option<f64>> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value = trimmed.parse::<f64>().map_err(|_| {
        TidyError::ParseError(format!(
            "trial {}: response time '{}' is not numeric",
            trial_number, trimmed
        ))
    })?;
    if value.is_finite() {
        Ok(Some(value))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tests::TOY;

    fn toy_series(cells: &[&str]) -> RawSeries {
        RawSeries {
            file: "TOY_RH_1.tsv".to_string(),
            cells: cells.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_reshape_counts_and_positions() {
        let series = vec![toy_series(&[
            "9", "0.9", "0.75", "0.6", "['right']", "['right']", "['left']", "1.0", "1.2", "0.3",
        ])];

        let dataset = tidy_up(&series, "RH", &TOY).unwrap();
        assert_eq!(dataset.len(), TOY.block_length);
        assert_eq!(dataset.rows[0].condition, Condition::Level(0.9));
        assert_eq!(dataset.rows[1].condition, Condition::Level(0.75));
        assert_eq!(dataset.rows[2].condition, Condition::Level(0.6));
        assert_eq!(dataset.rows[0].direction, "right");
        assert_eq!(dataset.rows[2].direction, "left");
        assert_eq!(dataset.rows[0].response_time, Some(1.0));
        assert_eq!(dataset.rows[2].response_time, Some(0.3));
        assert!(dataset.rows.iter().all(|r| r.participant_id == "RH"));
    }

    #[test]
    fn test_reshape_concatenates_blocks_across_rows() {
        let series = vec![
            toy_series(&[
                "9", "0.9", "0.9", "0.9", "['right']", "['right']", "['left']", "1.0", "1.2",
                "0.3",
            ]),
            toy_series(&[
                "9", "0.6", "0.6", "0.6", "['right']", "['right']", "['right']", "1.1", "5.0",
                "1.0",
            ]),
        ];

        let dataset = tidy_up(&series, "RH", &TOY).unwrap();
        assert_eq!(dataset.len(), 6);
        assert_eq!(dataset.rows[3].condition, Condition::Level(0.6));
        assert_eq!(dataset.rows[4].response_time, Some(5.0));
        let trials: Vec<usize> = dataset.rows.iter().map(|r| r.trial_number).collect();
        assert_eq!(trials, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_reshape_short_row_is_block_mismatch() {
        let series = vec![toy_series(&["9", "0.9", "0.9", "['right']", "1.0"])];
        let err = tidy_up(&series, "RH", &TOY).unwrap_err();
        match err {
            TidyError::BlockLengthMismatch { expected, found, .. } => {
                assert_eq!(expected, 10);
                assert_eq!(found, 5);
            }
            other => panic!("expected BlockLengthMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_reshape_nan_response_becomes_missing() {
        let series = vec![toy_series(&[
            "9", "0.9", "0.9", "0.9", "['right']", "['left']", "['right']", "nan", "", "0.8",
        ])];
        let dataset = tidy_up(&series, "RH", &TOY).unwrap();
        assert_eq!(dataset.rows[0].response_time, None);
        assert_eq!(dataset.rows[1].response_time, None);
        assert_eq!(dataset.rows[2].response_time, Some(0.8));
    }

    #[test]
    fn test_strip_decoration() {
        assert_eq!(strip_decoration("['right']"), "right");
        assert_eq!(strip_decoration("\"left\""), "left");
        assert_eq!(strip_decoration("right"), "right");
        assert_eq!(strip_decoration(" ['up'] "), "up");
    }
}
