use serde::{
    Deserialize,
    Serialize,
};

use super::peak::validate_peaks;
use super::scan::{
    FragmentScan,
    FragmentScanCluster,
    Ms1Scan,
};
use super::tolerance::MzTolerance;
use crate::errors::{
    Result,
    SpecMergeError,
};
use crate::traits::{
    FeatureLike,
    FeatureRowLike,
};
use crate::utils::TupleRange;

/// A feature as detected in a single raw file, with every scan
/// that is relevant to merge its fragment spectra.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub raw_file: String,
    pub mz: f64,
    #[serde(default)]
    pub ms1_scans: Vec<Ms1Scan>,
    pub fragment_scans: Vec<FragmentScan>,
}

/// One row of an aligned feature table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub id: u64,
    pub features: Vec<Feature>,
}

impl Feature {
    /// Rejects features with a non positive precursor m/z or with
    /// peaks that cannot be merged (see [validate_peaks]).
    pub fn validate(&self) -> Result<()> {
        if !(self.mz.is_finite() && self.mz > 0.0) {
            return Err(SpecMergeError::InvalidFeature {
                raw_file: self.raw_file.clone(),
                mz: self.mz,
            });
        }
        for scan in &self.ms1_scans {
            validate_peaks(scan.scan_id, &scan.peaks)?;
        }
        for scan in &self.fragment_scans {
            validate_peaks(scan.scan_id, &scan.peaks)?;
        }
        Ok(())
    }

    fn preceding_ms1(&self, scan_id: u32) -> Option<&Ms1Scan> {
        self.ms1_scans
            .iter()
            .filter(|s| s.scan_id < scan_id)
            .max_by_key(|s| s.scan_id)
    }

    fn following_ms1(&self, scan_id: u32) -> Option<&Ms1Scan> {
        self.ms1_scans
            .iter()
            .filter(|s| s.scan_id > scan_id)
            .min_by_key(|s| s.scan_id)
    }
}

impl FeatureLike for Feature {
    fn raw_file(&self) -> &str {
        &self.raw_file
    }

    fn precursor_mz(&self) -> f64 {
        self.mz
    }

    fn clusters_for(
        &self,
        isolation_window: TupleRange<f64>,
        tolerance: &MzTolerance,
    ) -> Vec<FragmentScanCluster> {
        let mut scans: Vec<&FragmentScan> = self.fragment_scans.iter().collect();
        scans.sort_by_key(|s| s.scan_id);

        // Runs of fragment scans between the same two survey scans
        let mut groups: Vec<(Option<u32>, Vec<&FragmentScan>)> = Vec::new();
        for scan in scans {
            let preceding = self.preceding_ms1(scan.scan_id).map(|s| s.scan_id);
            match groups.last_mut() {
                Some((key, members)) if *key == preceding => members.push(scan),
                _ => groups.push((preceding, vec![scan])),
            }
        }

        let precursor_mz = self.precursor_mz();
        let absolute_window = isolation_window.shifted(precursor_mz);
        groups
            .into_iter()
            .filter_map(|(_, members)| {
                let first = members.first()?;
                let last = members.last()?;
                Some(FragmentScanCluster {
                    feature_mz: precursor_mz,
                    raw_file: self.raw_file.clone(),
                    ms1_before: self.preceding_ms1(first.scan_id).cloned(),
                    ms1_after: self.following_ms1(last.scan_id).cloned(),
                    ms2_scans: members.into_iter().cloned().collect(),
                    isolation_window: absolute_window,
                    tolerance: *tolerance,
                })
            })
            .collect()
    }
}

impl FeatureRow {
    pub fn validate(&self) -> Result<()> {
        self.features.iter().try_for_each(Feature::validate)
    }
}

impl FeatureRowLike for FeatureRow {
    type Feature = Feature;

    fn features(&self) -> &[Feature] {
        &self.features
    }
}
