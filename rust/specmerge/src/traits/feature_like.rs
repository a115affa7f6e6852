use crate::models::{
    FragmentScanCluster,
    MzTolerance,
};
use crate::utils::TupleRange;

/// A feature detected in a single sample (raw file).
pub trait FeatureLike {
    fn raw_file(&self) -> &str;
    fn precursor_mz(&self) -> f64;

    /// Groups the fragment scans of this feature into clusters of
    /// consecutive MS/MS scans.
    ///
    /// `isolation_window` is relative to the precursor m/z,
    /// (-1.0, 1.0) meaning +/- 1 Da around it.
    fn clusters_for(
        &self,
        isolation_window: TupleRange<f64>,
        tolerance: &MzTolerance,
    ) -> Vec<FragmentScanCluster>;
}

/// A row of an aligned feature table, one feature per sample.
pub trait FeatureRowLike {
    type Feature: FeatureLike;

    fn features(&self) -> &[Self::Feature];
}
