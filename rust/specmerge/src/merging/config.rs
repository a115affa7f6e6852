use serde::{
    Deserialize,
    Serialize,
};

use super::policies::{
    IntensityMergeMode,
    MzMergeMode,
};
use super::quality::{
    Ms2QualityScoreModel,
    isolation_window_offsets,
};
use crate::errors::{
    Result,
    SpecMergeError,
};
use crate::models::MzTolerance;
use crate::utils::TupleRange;

/// How far up the hierarchy spectra get merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// One spectrum per run of consecutive fragment scans.
    ConsecutiveScans,
    /// One spectrum per sample.
    SameSample,
    /// One spectrum per feature row.
    #[default]
    AcrossSamples,
}

/// Which threshold neighbours of the anchor scan have to beat
/// to be considered for merging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreThresholdRule {
    /// A fifth of the anchor's position within the cluster.
    AnchorIndex,
    /// A fifth of the anchor's quality score.
    #[default]
    AnchorScore,
}

/// Scores below `threshold_reference / 5` are considerably worse than the anchor.
const SCORE_THRESHOLD_DIVISOR: f64 = 5.0;

impl ScoreThresholdRule {
    pub fn threshold(&self, anchor_index: usize, anchor_score: f64) -> f64 {
        match self {
            Self::AnchorIndex => anchor_index as f64 / SCORE_THRESHOLD_DIVISOR,
            Self::AnchorScore => anchor_score / SCORE_THRESHOLD_DIVISOR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub merge_mode: MergeMode,
    /// Minimum similarity to the anchor, in (0, 1].
    pub cosine_threshold: f64,
    pub mass_accuracy: MzTolerance,
    pub mz_merge_mode: MzMergeMode,
    pub intensity_merge_mode: IntensityMergeMode,
    /// Minimum fraction of contributing scans a peak has to be found in.
    pub relative_signal_count: f64,
    pub isolation_window_offset: f64,
    pub isolation_window_width: f64,
    pub score_threshold_rule: ScoreThresholdRule,
    pub quality_model: Ms2QualityScoreModel,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            merge_mode: MergeMode::default(),
            cosine_threshold: 0.7,
            mass_accuracy: MzTolerance::default(),
            mz_merge_mode: MzMergeMode::default(),
            intensity_merge_mode: IntensityMergeMode::default(),
            relative_signal_count: 0.2,
            isolation_window_offset: 0.0,
            isolation_window_width: 1.0,
            score_threshold_rule: ScoreThresholdRule::default(),
            quality_model: Ms2QualityScoreModel::default(),
        }
    }
}

impl MergeConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.cosine_threshold > 0.0 && self.cosine_threshold <= 1.0) {
            return Err(SpecMergeError::invalid_config(
                "cosine_threshold",
                format!("expected a value in (0, 1], got {}", self.cosine_threshold),
            ));
        }
        if !(0.0..=1.0).contains(&self.relative_signal_count) {
            return Err(SpecMergeError::invalid_config(
                "relative_signal_count",
                format!("expected a value in [0, 1], got {}", self.relative_signal_count),
            ));
        }
        if !self.mass_accuracy.is_valid() {
            return Err(SpecMergeError::invalid_config(
                "mass_accuracy",
                format!(
                    "expected non negative finite values, at least one positive, got {:?}",
                    self.mass_accuracy
                ),
            ));
        }
        if !self.isolation_window_offset.is_finite() {
            return Err(SpecMergeError::invalid_config(
                "isolation_window_offset",
                format!("expected a finite value, got {}", self.isolation_window_offset),
            ));
        }
        if !(self.isolation_window_width.is_finite() && self.isolation_window_width >= 0.0) {
            return Err(SpecMergeError::invalid_config(
                "isolation_window_width",
                format!(
                    "expected a non negative finite value, got {}",
                    self.isolation_window_width
                ),
            ));
        }
        Ok(())
    }

    /// Isolation window relative to the precursor m/z.
    pub fn isolation_window(&self) -> Result<TupleRange<f64>> {
        isolation_window_offsets(self.isolation_window_offset, self.isolation_window_width)
            .ok_or_else(|| {
                SpecMergeError::invalid_config(
                    "isolation_window_width",
                    format!("cannot build a window out of {}", self.isolation_window_width),
                )
            })
    }
}
