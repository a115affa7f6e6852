pub mod feature_like;
pub mod peak_like;
pub mod quality_scorer;

pub use feature_like::{
    FeatureLike,
    FeatureRowLike,
};
pub use peak_like::PeakLike;
pub use quality_scorer::QualityScorer;
