//! Experiment registry — one metadata record per supported export type.

use serde::{Deserialize, Serialize};

/// Sub-trials per raw export row for the travelling-wave experiments
pub const DEFAULT_BLOCK_LENGTH: usize = 17;

/// Column written for flattened reaction-time calibration output
pub const CALIBRATION_COLUMN: &str = "ResponseTime";

/// Shape of the flattened value region of a raw export row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    /// One lead cell, then three equal blocks: condition, direction, response time
    TripleBlock,
    /// A flat series of reaction-time samples (calibration exports)
    FlatSeries,
}

/// Outlier exclusion threshold policy
///
/// The legacy analysis scripts hard-coded a different rule per experiment;
/// the registry keeps those as defaults and every pipeline run may override
/// them with an explicit policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierPolicy {
    /// Exclude response times strictly above mean + k * std
    MeanPlusStd(f64),
    /// Exclude response times strictly above mean * factor
    MeanTimes(f64),
}

impl OutlierPolicy {
    /// Exclusion threshold for a condition with the given descriptives
    pub fn threshold(&self, mean: f64, std: f64) -> f64 {
        match self {
            Self::MeanPlusStd(k) => mean + k * std,
            Self::MeanTimes(factor) => mean * factor,
        }
    }
}

impl std::fmt::Display for OutlierPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MeanPlusStd(k) => write!(f, "mean+{}sd", k),
            Self::MeanTimes(factor) => write!(f, "mean*{}", factor),
        }
    }
}

/// Complete experiment metadata
/// Note: Only Serialize is derived since static references can't be deserialized
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentMetadata {
    pub abbreviation: &'static str,
    pub name: &'static str,
    pub export_kind: ExportKind,
    /// Tidy column name for the experimental manipulation
    pub condition_column: &'static str,
    /// Export columns discarded before the flattened value region
    #[serde(skip)]
    pub metadata_columns: &'static [&'static str],
    /// Throwaway cells before the first value block
    pub lead_cells: usize,
    /// Sub-trials per block (0 for flat-series exports)
    pub block_length: usize,
    /// Direction label marking a completed wave
    pub valid_response: &'static str,
    pub default_outlier_policy: Option<OutlierPolicy>,
    pub documentation: &'static str,
}

impl ExperimentMetadata {
    /// Look up experiment by abbreviation (case-sensitive, as used in file prefixes)
    pub fn from_abbrev(abbrev: &str) -> Option<&'static ExperimentMetadata> {
        EXPERIMENT_REGISTRY.iter().find(|e| e.abbreviation == abbrev)
    }

    /// Experiments whose exports reshape into tidy trial tables
    pub fn tidy_experiments() -> impl Iterator<Item = &'static ExperimentMetadata> {
        EXPERIMENT_REGISTRY
            .iter()
            .filter(|e| e.export_kind == ExportKind::TripleBlock)
    }

    /// Glob pattern selecting this experiment's files for one participant
    pub fn file_pattern(&self, participant: &str) -> String {
        format!("{}_{}*", self.abbreviation, participant)
    }

    /// Total cell count expected after metadata columns are discarded
    pub fn expected_cells(&self) -> Option<usize> {
        match self.export_kind {
            ExportKind::TripleBlock => Some(self.lead_cells + 3 * self.block_length),
            ExportKind::FlatSeries => None,
        }
    }
}

// =============================================================================
// EXPERIMENT DEFINITIONS
// =============================================================================

/// Contrast Triggers (TW)
///
/// Binocular rivalry annuli; a contrast increase triggers a dominance wave and
/// the participant presses "right" when it reaches the end point. Condition is
/// the trigger contrast level.
pub const TW: ExperimentMetadata = ExperimentMetadata {
    abbreviation: "TW",
    name: "Contrast Triggers",
    export_kind: ExportKind::TripleBlock,
    condition_column: "ContrastLevel",
    metadata_columns: &[
        "index",
        "ContrastLevel_mean",
        "ContrastLevel_std",
        "TravelTime_mean",
        "TravelTime_std",
    ],
    lead_cells: 1,
    block_length: DEFAULT_BLOCK_LENGTH,
    valid_response: "right",
    default_outlier_policy: Some(OutlierPolicy::MeanPlusStd(2.0)),
    documentation: "Travelling waves triggered by contrast increments; condition is the contrast level.",
};

/// Hemifield (HF)
///
/// Annuli presented in the left or right visual field; condition is the
/// visible hemifield label.
pub const HF: ExperimentMetadata = ExperimentMetadata {
    abbreviation: "HF",
    name: "Hemifield",
    export_kind: ExportKind::TripleBlock,
    condition_column: "VisibleHemifield",
    metadata_columns: &[
        "index",
        "ContrastLevel_mean",
        "ContrastLevel_std",
        "TravelTime_mean",
        "TravelTime_std",
    ],
    lead_cells: 1,
    block_length: DEFAULT_BLOCK_LENGTH,
    valid_response: "right",
    default_outlier_policy: Some(OutlierPolicy::MeanTimes(3.0)),
    documentation: "Travelling waves in the left or right visual field; condition is the hemifield.",
};

/// Reaction Time calibration (RT)
///
/// Simple reaction-time blocks used to estimate non-decision time. Exports a
/// flat series; reduced to a single mean for baseline correction.
pub const RT: ExperimentMetadata = ExperimentMetadata {
    abbreviation: "RT",
    name: "Reaction Time",
    export_kind: ExportKind::FlatSeries,
    condition_column: CALIBRATION_COLUMN,
    metadata_columns: &["index", "n", "RT_mean", "RT_std"],
    lead_cells: 0,
    block_length: 0,
    valid_response: "right",
    default_outlier_policy: None,
    documentation: "Simple reaction-time calibration; exports flatten to one baseline scalar.",
};

/// All supported experiments
pub const EXPERIMENT_REGISTRY: &[ExperimentMetadata] = &[TW, HF, RT];
