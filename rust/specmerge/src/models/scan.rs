use serde::{
    Deserialize,
    Serialize,
};

use super::peak::RawPeak;
use super::tolerance::MzTolerance;
use crate::utils::TupleRange;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Negative,
    #[default]
    Unknown,
}

/// A centroided MS/MS scan.
///
/// `precursor_charge` of 0 means the charge is not known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentScan {
    pub scan_id: u32,
    pub raw_file: String,
    pub rt: f64,
    #[serde(default)]
    pub polarity: Polarity,
    pub precursor_mz: f64,
    #[serde(default)]
    pub precursor_charge: i32,
    pub peaks: Vec<RawPeak>,
}

/// A centroided survey (MS1) scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ms1Scan {
    pub scan_id: u32,
    pub rt: f64,
    pub peaks: Vec<RawPeak>,
}

/// A run of MS/MS scans fragmenting the same precursor, together with
/// the survey scans around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentScanCluster {
    pub feature_mz: f64,
    pub raw_file: String,
    pub ms1_before: Option<Ms1Scan>,
    pub ms1_after: Option<Ms1Scan>,
    pub ms2_scans: Vec<FragmentScan>,
    /// Absolute m/z range isolated by the quadrupole.
    pub isolation_window: TupleRange<f64>,
    pub tolerance: MzTolerance,
}

impl FragmentScanCluster {
    pub fn len(&self) -> usize {
        self.ms2_scans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ms2_scans.is_empty()
    }
}
