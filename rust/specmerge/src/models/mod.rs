pub mod feature;
pub mod merged_spectrum;
pub mod peak;
pub mod scan;
pub mod summary;
pub mod tolerance;

pub use feature::{
    Feature,
    FeatureRow,
};
pub use merged_spectrum::MergedSpectrum;
pub use peak::{
    MergedDataPoint,
    RawPeak,
};
pub use scan::{
    FragmentScan,
    FragmentScanCluster,
    Ms1Scan,
    Polarity,
};
pub use summary::MergeSummary;
pub use tolerance::MzTolerance;
