use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TidyError};
use crate::experiments::OutlierPolicy;
use crate::stats::{describe, Descriptives};
use crate::types::TidyDataset;

/// What one filtering pass did: the statistics it worked from, the threshold
/// applied per condition, and how many trials were excluded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierReport {
    /// Per-condition descriptives over valid-response rows, computed before
    /// any exclusion
    pub descriptives: BTreeMap<String, Descriptives>,
    pub thresholds: BTreeMap<String, f64>,
    pub excluded: usize,
}

/// Group response times by condition key
///
/// With `direction` set, only rows with that direction label contribute;
/// missing (excluded or absent) response times are dropped either way.
pub fn grouped_times(dataset: &TidyDataset, direction: Option<&str>) -> Vec<(String, Vec<f64>)> {
    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
    for row in &dataset.rows {
        if row.excluded {
            continue;
        }
        if let Some(wanted) = direction {
            if row.direction != wanted {
                continue;
            }
        }
        let Some(rt) = row.response_time else {
            continue;
        };
        let key = row.condition.key();
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(rt),
            None => groups.push((key, vec![rt])),
        }
    }
    groups
}

/// Per-condition descriptives over rows matching the valid-response label
pub fn condition_descriptives(
    dataset: &TidyDataset,
    valid_response: &str,
) -> BTreeMap<String, Descriptives> {
    grouped_times(dataset, Some(valid_response))
        .into_iter()
        .map(|(key, values)| (key, describe(&values)))
        .collect()
}

/// Exclude response-time outliers, in a single pass
///
/// Descriptives are computed once per condition from rows whose direction
/// matches `valid_response`, before any exclusion; the threshold check then
/// runs against every row of that condition regardless of direction. A row is
/// excluded only when its response time is strictly greater than the policy
/// threshold. Excluded rows keep their condition and direction; only the
/// response time is cleared. Row count never changes.
///
/// A condition present in the data with no valid-response rows has undefined
/// statistics and fails with `EmptyConditionGroup` before anything is mutated.
pub fn filter_outliers(
    dataset: &mut TidyDataset,
    policy: OutlierPolicy,
    valid_response: &str,
) -> Result<OutlierReport> {
    let descriptives = condition_descriptives(dataset, valid_response);

    // Every condition must have usable statistics before any row is touched.
    for condition in dataset.conditions() {
        let key = condition.key();
        let usable = descriptives.get(&key).map(|d| d.n > 0).unwrap_or(false);
        if !usable {
            return Err(TidyError::EmptyConditionGroup(key));
        }
    }

    let thresholds: BTreeMap<String, f64> = descriptives
        .iter()
        .map(|(key, d)| (key.clone(), policy.threshold(d.mean, d.std)))
        .collect();

    let mut excluded = 0;
    for row in &mut dataset.rows {
        let Some(rt) = row.response_time else {
            continue;
        };
        let threshold = thresholds[&row.condition.key()];
        if rt > threshold {
            row.excluded = true;
            row.response_time = None;
            excluded += 1;
            log::info!(
                "Excluded trial {} (condition {}, direction {}): {} > {:.4}",
                row.trial_number,
                row.condition,
                row.direction,
                rt,
                threshold
            );
        }
    }

    Ok(OutlierReport {
        descriptives,
        thresholds,
        excluded,
    })
}
