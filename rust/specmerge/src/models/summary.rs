use std::fmt::Display;

use serde::Serialize;

use super::merged_spectrum::MergedSpectrum;

/// Aggregated counters over the merged spectra of many rows.
///
/// Usually used for logging, summaries of different threads
/// can be combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub rows_processed: usize,
    pub rows_without_spectra: usize,
    pub spectra: usize,
    pub peaks: usize,
    pub contributing_scans: usize,
    pub removed_by_low_quality: usize,
    pub removed_by_low_cosine: usize,
    pub removed_by_mismatch: usize,
}

impl MergeSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn combine(mut self, right: &Self) -> Self {
        self.rows_processed += right.rows_processed;
        self.rows_without_spectra += right.rows_without_spectra;
        self.spectra += right.spectra;
        self.peaks += right.peaks;
        self.contributing_scans += right.contributing_scans;
        self.removed_by_low_quality += right.removed_by_low_quality;
        self.removed_by_low_cosine += right.removed_by_low_cosine;
        self.removed_by_mismatch += right.removed_by_mismatch;
        self
    }

    /// Accounts for the output of a single row.
    pub fn fold_row(mut self, spectra: &[MergedSpectrum]) -> Self {
        self.rows_processed += 1;
        if spectra.is_empty() {
            self.rows_without_spectra += 1;
        }
        for spec in spectra {
            self.spectra += 1;
            self.peaks += spec.peaks().len();
            self.contributing_scans += spec.num_contributing_scans();
            self.removed_by_low_quality += spec.removed_scans_by_low_quality;
            self.removed_by_low_cosine += spec.removed_scans_by_low_cosine;
            self.removed_by_mismatch += spec.removed_scans_by_mismatch;
        }
        self
    }

    pub fn total_scans(&self) -> usize {
        self.contributing_scans
            + self.removed_by_low_quality
            + self.removed_by_low_cosine
            + self.removed_by_mismatch
    }
}

impl Display for MergeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Rows processed: {}", self.rows_processed)?;
        writeln!(f, "Rows without merged spectra: {}", self.rows_without_spectra)?;
        writeln!(f, "Merged spectra: {}", self.spectra)?;
        if self.spectra > 0 {
            let avg_peaks = self.peaks as f64 / self.spectra as f64;
            writeln!(f, "Average peaks per spectrum: {:.2}", avg_peaks)?;
        }
        writeln!(f, "Scans seen: {}", self.total_scans())?;
        writeln!(f, "  merged: {}", self.contributing_scans)?;
        writeln!(f, "  removed (low quality): {}", self.removed_by_low_quality)?;
        writeln!(f, "  removed (low cosine): {}", self.removed_by_low_cosine)?;
        writeln!(f, "  removed (precursor mismatch): {}", self.removed_by_mismatch)?;
        Ok(())
    }
}
