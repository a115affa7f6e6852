use serde::{
    Deserialize,
    Serialize,
};

use crate::errors::{
    Result,
    SpecMergeError,
};
use crate::merging::policies::{
    IntensityMergeMode,
    MzMergeMode,
};
use crate::traits::PeakLike;

/// A single centroided peak as it comes out of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPeak {
    pub mz: f64,
    pub intensity: f64,
}

impl RawPeak {
    pub fn new(mz: f64, intensity: f64) -> Self {
        Self { mz, intensity }
    }
}

/// Checks that every peak has a finite m/z and a finite, non negative
/// intensity. `scan_id` only goes into the error.
///
/// ```
/// use specmerge::RawPeak;
/// use specmerge::models::peak::validate_peaks;
///
/// assert!(validate_peaks(7, &[RawPeak::new(100.0, 5.0)]).is_ok());
/// assert!(validate_peaks(7, &[RawPeak::new(100.0, -1.0)]).is_err());
/// ```
pub fn validate_peaks(scan_id: u32, peaks: &[RawPeak]) -> Result<()> {
    match peaks
        .iter()
        .position(|p| !(p.mz.is_finite() && p.intensity.is_finite() && p.intensity >= 0.0))
    {
        Some(index) => Err(SpecMergeError::InvalidPeak {
            scan_id,
            index,
            mz: peaks[index].mz,
            intensity: peaks[index].intensity,
        }),
        None => Ok(()),
    }
}

/// A peak of a merged spectrum.
///
/// The m/z and intensity are always derived from `sources` using the
/// merge modes it was built with; there is no way to set them directly.
/// Folding in another peak consumes the value and returns a new one.
/// Only serializable (not deserializable), for the same reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedDataPoint {
    mz: f64,
    intensity: f64,
    sources: Vec<RawPeak>,
}

impl MergedDataPoint {
    /// Builds a merged point out of everything `peak` is made of.
    pub fn new<P: PeakLike>(
        peak: &P,
        mz_mode: MzMergeMode,
        intensity_mode: IntensityMergeMode,
    ) -> Self {
        Self::from_sources(peak.sources().to_vec(), mz_mode, intensity_mode)
    }

    pub fn from_sources(
        sources: Vec<RawPeak>,
        mz_mode: MzMergeMode,
        intensity_mode: IntensityMergeMode,
    ) -> Self {
        let mz = mz_mode.merged_mz(&sources);
        let intensity = intensity_mode.merged_intensity(&sources);
        Self {
            mz,
            intensity,
            sources,
        }
    }

    /// Returns a new point with the sources of `other` appended.
    pub fn merge<P: PeakLike>(
        self,
        other: &P,
        mz_mode: MzMergeMode,
        intensity_mode: IntensityMergeMode,
    ) -> Self {
        let mut sources = self.sources;
        sources.extend_from_slice(other.sources());
        Self::from_sources(sources, mz_mode, intensity_mode)
    }

    pub fn num_sources(&self) -> usize {
        self.sources.len()
    }

    /// Highest intensity among the raw sources.
    pub fn max_source_intensity(&self) -> f64 {
        self.sources
            .iter()
            .map(|p| p.intensity)
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

impl PeakLike for MergedDataPoint {
    fn mz(&self) -> f64 {
        self.mz
    }

    fn intensity(&self) -> f64 {
        self.intensity
    }

    fn sources(&self) -> &[RawPeak] {
        &self.sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MZ_MODE: MzMergeMode = MzMergeMode::WeightedAverage;
    const INT_MODE: IntensityMergeMode = IntensityMergeMode::SumIntensities;

    #[test]
    fn test_singleton_keeps_values() {
        let point = MergedDataPoint::new(&RawPeak::new(150.5, 20.0), MZ_MODE, INT_MODE);
        assert_eq!(point.mz(), 150.5);
        assert_eq!(point.intensity(), 20.0);
        assert_eq!(point.num_sources(), 1);
    }

    #[test]
    fn test_merge_recomputes_from_sources() {
        let point = MergedDataPoint::new(&RawPeak::new(100.0, 1.0), MZ_MODE, INT_MODE)
            .merge(&RawPeak::new(101.0, 3.0), MZ_MODE, INT_MODE);
        assert_eq!(point.num_sources(), 2);
        assert!((point.mz() - 100.75).abs() < 1e-12);
        assert_eq!(point.intensity(), 4.0);
        assert_eq!(point.max_source_intensity(), 3.0);
    }

    #[test]
    fn test_merge_with_merged_point_takes_all_sources() {
        let left = MergedDataPoint::new(&RawPeak::new(100.0, 1.0), MZ_MODE, INT_MODE);
        let right = MergedDataPoint::new(&RawPeak::new(100.001, 1.0), MZ_MODE, INT_MODE)
            .merge(&RawPeak::new(100.002, 1.0), MZ_MODE, INT_MODE);
        let merged = left.merge(&right, MZ_MODE, INT_MODE);
        assert_eq!(merged.num_sources(), 3);
        assert_eq!(merged.sources()[0].mz, 100.0);
        assert!((merged.mz() - 100.001).abs() < 1e-9);
    }

    #[test]
    fn test_validate_peaks_rejects_nan() {
        let peaks = [RawPeak::new(100.0, 1.0), RawPeak::new(f64::NAN, 1.0)];
        let err = validate_peaks(3, &peaks).unwrap_err();
        assert!(matches!(
            err,
            SpecMergeError::InvalidPeak {
                scan_id: 3,
                index: 1,
                ..
            }
        ));
        assert!(validate_peaks(3, &[RawPeak::new(100.0, f64::INFINITY)]).is_err());
        assert!(validate_peaks(3, &[]).is_ok());
    }
}
