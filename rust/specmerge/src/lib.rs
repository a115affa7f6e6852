#![doc = include_str!("../README.md")]

// Declare modules
pub mod errors;
pub mod merging;
pub mod models;
pub mod traits;
pub mod utils;

// Re-export main structures
pub use crate::merging::{
    IntensityMergeMode,
    MergeConfig,
    MergeMode,
    Ms2QualityScoreModel,
    MzMergeMode,
    ScoreThresholdRule,
    SimilarityGate,
    SpectraMerger,
};
pub use crate::models::{
    Feature,
    FeatureRow,
    FragmentScan,
    FragmentScanCluster,
    MergeSummary,
    MergedDataPoint,
    MergedSpectrum,
    Ms1Scan,
    MzTolerance,
    Polarity,
    RawPeak,
};
pub use crate::utils::TupleRange;

// Re-export traits
pub use crate::traits::{
    FeatureLike,
    FeatureRowLike,
    PeakLike,
    QualityScorer,
};

// Re-export errors
pub use crate::errors::SpecMergeError;
