pub mod config;
pub mod merger;
pub mod peak_list_merger;
pub mod policies;
pub mod quality;
pub mod similarity;

pub use config::{
    MergeConfig,
    MergeMode,
    ScoreThresholdRule,
};
pub use merger::SpectraMerger;
pub use peak_list_merger::{
    MERGE_TOLERANCE_FACTOR,
    merge_peak_lists,
};
pub use policies::{
    IntensityMergeMode,
    MzMergeMode,
};
pub use quality::{
    Ms2QualityScoreModel,
    PrecursorIsolation,
    detect_precursor,
};
pub use similarity::{
    SimilarityGate,
    probability_product_unnormalized,
};
