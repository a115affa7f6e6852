use std::collections::BTreeSet;

use serde::Serialize;

use super::peak::MergedDataPoint;
use super::scan::{
    FragmentScan,
    Polarity,
};
use crate::merging::policies::{
    IntensityMergeMode,
    MzMergeMode,
};
use crate::traits::PeakLike;
use crate::utils::peak_utils::sort_by_mz;

/// A consensus spectrum built out of one or more fragment scans.
///
/// Keeps track of where its peaks came from (`origins`, `scan_ids`) and of
/// every scan that was looked at but not merged, split by the reason why.
/// The first scan id is always the one of the anchor scan.
///
/// Invariants:
/// - `peaks` are sorted by m/z.
/// - `total_number_of_scans() == scan_ids.len() + removed_scans_by_low_quality
///   + removed_scans_by_low_cosine + removed_scans_by_mismatch`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedSpectrum {
    pub(crate) peaks: Vec<MergedDataPoint>,
    pub(crate) origins: BTreeSet<String>,
    pub(crate) scan_ids: Vec<u32>,
    pub precursor_mz: f64,
    pub polarity: Polarity,
    pub precursor_charge: i32,
    pub best_fragment_scan_score: f64,
    pub removed_scans_by_low_quality: usize,
    pub removed_scans_by_low_cosine: usize,
    pub removed_scans_by_mismatch: usize,
}

impl MergedSpectrum {
    /// A spectrum without peaks, standing for `total` scans that
    /// were all too bad to be used.
    pub fn empty(total: usize) -> Self {
        Self {
            peaks: Vec::new(),
            origins: BTreeSet::new(),
            scan_ids: Vec::new(),
            precursor_mz: 0.0,
            polarity: Polarity::Unknown,
            precursor_charge: 0,
            best_fragment_scan_score: 0.0,
            removed_scans_by_low_quality: total,
            removed_scans_by_low_cosine: 0,
            removed_scans_by_mismatch: 0,
        }
    }

    /// Wraps a single scan, every raw peak becomes its own merged peak.
    pub fn from_scan(
        scan: &FragmentScan,
        mz_mode: MzMergeMode,
        intensity_mode: IntensityMergeMode,
    ) -> Self {
        let mut peaks: Vec<MergedDataPoint> = scan
            .peaks
            .iter()
            .map(|p| MergedDataPoint::new(p, mz_mode, intensity_mode))
            .collect();
        sort_by_mz(&mut peaks);
        Self {
            peaks,
            origins: BTreeSet::from([scan.raw_file.clone()]),
            scan_ids: vec![scan.scan_id],
            precursor_mz: scan.precursor_mz,
            polarity: scan.polarity,
            precursor_charge: scan.precursor_charge,
            best_fragment_scan_score: 0.0,
            removed_scans_by_low_quality: 0,
            removed_scans_by_low_cosine: 0,
            removed_scans_by_mismatch: 0,
        }
    }

    pub fn peaks(&self) -> &[MergedDataPoint] {
        &self.peaks
    }

    pub fn origins(&self) -> &BTreeSet<String> {
        &self.origins
    }

    pub fn scan_ids(&self) -> &[u32] {
        &self.scan_ids
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    /// Scans that actually contributed peaks.
    pub fn num_contributing_scans(&self) -> usize {
        self.scan_ids.len()
    }

    pub fn total_number_of_scans(&self) -> usize {
        self.scan_ids.len()
            + self.removed_scans_by_low_quality
            + self.removed_scans_by_low_cosine
            + self.removed_scans_by_mismatch
    }

    /// Total ion current.
    pub fn tic(&self) -> f64 {
        self.peaks.iter().map(|p| p.intensity()).sum()
    }

    /// Removes peaks found in less than `min_fraction` of the contributing scans.
    ///
    /// A peak seen in 2 out of 10 scans has a fraction of 0.2.
    pub fn filter_by_relative_number_of_scans(self, min_fraction: f64) -> Self {
        let num_scans = self.num_contributing_scans();
        if num_scans == 0 {
            return self;
        }
        let num_scans = num_scans as f64;
        self.retain_peaks(|p| (p.num_sources() as f64 / num_scans) >= min_fraction)
    }

    /// Removes peaks with less than `min_scans` sources.
    pub fn filter_by_number_of_scans(self, min_scans: usize) -> Self {
        self.retain_peaks(|p| p.num_sources() >= min_scans)
    }

    fn retain_peaks(mut self, keep: impl Fn(&MergedDataPoint) -> bool) -> Self {
        self.peaks.retain(|p| keep(p));
        self
    }

    /// Takes over the provenance and counters of `other`, with
    /// `peaks` as the new peak list.
    ///
    /// `peaks` must already be sorted by m/z.
    pub(crate) fn absorb(&mut self, other: &MergedSpectrum, peaks: Vec<MergedDataPoint>) {
        self.peaks = peaks;
        self.origins.extend(other.origins.iter().cloned());
        self.scan_ids.extend_from_slice(&other.scan_ids);
        self.removed_scans_by_low_quality += other.removed_scans_by_low_quality;
        self.removed_scans_by_low_cosine += other.removed_scans_by_low_cosine;
        self.removed_scans_by_mismatch += other.removed_scans_by_mismatch;
    }

    /// Same as [MergedSpectrum::absorb] but for a single raw scan.
    pub(crate) fn absorb_scan(&mut self, scan: &FragmentScan, peaks: Vec<MergedDataPoint>) {
        self.peaks = peaks;
        self.origins.insert(scan.raw_file.clone());
        self.scan_ids.push(scan.scan_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawPeak;

    fn scan(scan_id: u32, peaks: &[(f64, f64)]) -> FragmentScan {
        FragmentScan {
            scan_id,
            raw_file: "sample.mzML".into(),
            rt: 1.0,
            polarity: Polarity::Positive,
            precursor_mz: 400.0,
            precursor_charge: 1,
            peaks: peaks.iter().map(|&(mz, i)| RawPeak::new(mz, i)).collect(),
        }
    }

    #[test]
    fn test_empty_counts_all_as_low_quality() {
        let empty = MergedSpectrum::empty(7);
        assert!(empty.is_empty());
        assert_eq!(empty.total_number_of_scans(), 7);
        assert_eq!(empty.removed_scans_by_low_quality, 7);
    }

    #[test]
    fn test_from_scan_sorts_peaks() {
        let spec = MergedSpectrum::from_scan(
            &scan(3, &[(200.0, 1.0), (100.0, 2.0), (150.0, 3.0)]),
            MzMergeMode::default(),
            IntensityMergeMode::default(),
        );
        let mzs: Vec<f64> = spec.peaks().iter().map(|p| p.mz()).collect();
        assert_eq!(mzs, vec![100.0, 150.0, 200.0]);
        assert_eq!(spec.scan_ids(), &[3]);
        assert_eq!(spec.total_number_of_scans(), 1);
        assert!((spec.tic() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_relative_filter() {
        let mz_mode = MzMergeMode::default();
        let int_mode = IntensityMergeMode::default();
        let rare = MergedDataPoint::from_sources(
            vec![RawPeak::new(100.0, 1.0), RawPeak::new(100.0, 1.0)],
            mz_mode,
            int_mode,
        );
        let common =
            MergedDataPoint::from_sources(vec![RawPeak::new(120.0, 1.0); 9], mz_mode, int_mode);
        let mut spec = MergedSpectrum::empty(0);
        spec.peaks = vec![rare, common];
        spec.scan_ids = (0..10).collect();

        let strict = spec.clone().filter_by_relative_number_of_scans(0.3);
        assert_eq!(strict.peaks().len(), 1);
        assert_eq!(strict.peaks()[0].mz(), 120.0);

        let lenient = spec.clone().filter_by_relative_number_of_scans(0.2);
        assert_eq!(lenient.peaks().len(), 2);

        let absolute = spec.filter_by_number_of_scans(3);
        assert_eq!(absolute.peaks().len(), 1);
    }

    #[test]
    fn test_absorb_keeps_counts_consistent() {
        let mz_mode = MzMergeMode::default();
        let int_mode = IntensityMergeMode::default();
        let mut left = MergedSpectrum::from_scan(&scan(1, &[(100.0, 1.0)]), mz_mode, int_mode);
        left.removed_scans_by_low_quality = 2;
        let mut right = MergedSpectrum::from_scan(&scan(5, &[(110.0, 1.0)]), mz_mode, int_mode);
        right.removed_scans_by_low_cosine = 1;
        right.removed_scans_by_mismatch = 1;

        let expected = left.total_number_of_scans() + right.total_number_of_scans();
        let peaks = left.peaks().to_vec();
        left.absorb(&right, peaks);
        assert_eq!(left.total_number_of_scans(), expected);
        assert_eq!(left.scan_ids(), &[1, 5]);
    }
}
