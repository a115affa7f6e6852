use serde::{
    Deserialize,
    Serialize,
};
use tracing::debug;

use crate::models::{
    FragmentScanCluster,
    Ms1Scan,
    RawPeak,
};
use crate::traits::QualityScorer;
use crate::utils::TupleRange;
use crate::utils::peak_utils::mz_index_range;

/// Peaks below this fraction of the precursor intensity are not
/// counted as chimeric, they would barely show in the fragment scan.
pub const CHIMERIC_INTENSITY_THRESHOLD: f64 = 0.1;

const ISOTOPE_SPACING: f64 = 1.0015;
const NUM_ISOTOPES: usize = 4;
const ISOTOPE_EXTRA_TOLERANCE: f64 = 0.03;
const MIN_REFERENCE_MASS: f64 = 200.0;

/// Built-in scoring models for fragment scans.
///
/// Both look at the survey scans around the fragment scans and compare
/// the precursor intensity against the intensity of the other ions that
/// were co-isolated with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ms2QualityScoreModel {
    /// `precursor / (chimeric + 0.1 * precursor)`
    #[default]
    LowChimericIntensityRelativeToMs1Intensity,
    /// `precursor^2 / (chimeric + 0.1 * precursor)`, favours intense isolations.
    IntensityAndPurity,
}

/// Precursor and contaminant intensities measured in one survey scan.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PrecursorIsolation {
    pub precursor_intensity: f64,
    pub chimeric_intensity: f64,
}

impl PrecursorIsolation {
    fn interpolate(&self, other: &Self, weight: f64) -> Self {
        Self {
            precursor_intensity: lerp(self.precursor_intensity, other.precursor_intensity, weight),
            chimeric_intensity: lerp(self.chimeric_intensity, other.chimeric_intensity, weight),
        }
    }

    fn chimeric_with_pseudocount(&self) -> f64 {
        self.chimeric_intensity + self.precursor_intensity * CHIMERIC_INTENSITY_THRESHOLD
    }
}

fn lerp(a: f64, b: f64, weight: f64) -> f64 {
    a + (b - a) * weight
}

impl Ms2QualityScoreModel {
    pub fn score_isolation(&self, isolation: &PrecursorIsolation) -> f64 {
        if isolation.precursor_intensity <= 0.0 {
            return 0.0;
        }
        let purity = isolation.precursor_intensity / isolation.chimeric_with_pseudocount();
        match self {
            Self::LowChimericIntensityRelativeToMs1Intensity => purity,
            Self::IntensityAndPurity => isolation.precursor_intensity * purity,
        }
    }
}

impl QualityScorer for Ms2QualityScoreModel {
    fn score(&self, cluster: &FragmentScanCluster) -> Vec<f64> {
        let before = cluster
            .ms1_before
            .as_ref()
            .map(|s| (s.rt, detect_precursor(cluster, s)));
        let after = cluster
            .ms1_after
            .as_ref()
            .map(|s| (s.rt, detect_precursor(cluster, s)));
        debug!(
            "Precursor isolation for {:.4} in {}: before={:?} after={:?}",
            cluster.feature_mz, cluster.raw_file, before, after
        );

        cluster
            .ms2_scans
            .iter()
            .map(|scan| {
                let isolation = match (&before, &after) {
                    (Some((rt_a, a)), Some((rt_b, b))) => {
                        let span = rt_b - rt_a;
                        if span > 0.0 {
                            let weight = ((scan.rt - rt_a) / span).clamp(0.0, 1.0);
                            a.interpolate(b, weight)
                        } else {
                            *a
                        }
                    }
                    (Some((_, a)), None) => *a,
                    (None, Some((_, b))) => *b,
                    (None, None) => PrecursorIsolation::default(),
                };
                self.score_isolation(&isolation)
            })
            .collect()
    }
}

/// Looks for the precursor ion in a survey scan and sums up everything
/// else that falls within the isolation window.
///
/// The precursor is the most intense peak within the mass tolerance
/// (at least the tolerance at m/z 200), retrying with twice the
/// tolerance when nothing is found. Isotope peaks of the precursor and
/// peaks below 10% of its intensity are not counted as contaminants.
pub fn detect_precursor(cluster: &FragmentScanCluster, ms1: &Ms1Scan) -> PrecursorIsolation {
    let mut peaks: Vec<RawPeak> = ms1.peaks.clone();
    peaks.sort_unstable_by(|a, b| a.mz.total_cmp(&b.mz));
    let in_window = &peaks[mz_index_range(&peaks, cluster.isolation_window)];

    let precursor_mz = cluster.feature_mz;
    let base_tolerance = cluster
        .tolerance
        .tolerance_for_mass(precursor_mz.max(MIN_REFERENCE_MASS));

    let mut best: Option<usize> = None;
    for multiplier in [1.0, 2.0] {
        let max_diff = base_tolerance * multiplier;
        best = in_window
            .iter()
            .enumerate()
            .filter(|(_, p)| (p.mz - precursor_mz).abs() <= max_diff && p.intensity > 0.0)
            .fold(None, |acc: Option<(usize, f64)>, (i, p)| match acc {
                Some((_, best_int)) if best_int >= p.intensity => acc,
                _ => Some((i, p.intensity)),
            })
            .map(|(i, _)| i);
        if best.is_some() {
            break;
        }
    }

    let Some(best) = best else {
        return PrecursorIsolation::default();
    };
    let precursor_intensity = in_window[best].intensity;
    let threshold = precursor_intensity * CHIMERIC_INTENSITY_THRESHOLD;
    let charge = cluster
        .ms2_scans
        .first()
        .map(|s| s.precursor_charge.unsigned_abs().max(1))
        .unwrap_or(1) as f64;
    let isotope_tolerance = base_tolerance + ISOTOPE_EXTRA_TOLERANCE;

    let chimeric_intensity = in_window
        .iter()
        .enumerate()
        .filter(|&(i, p)| i != best && p.intensity > threshold)
        .filter(|(_, p)| !is_isotope_peak(precursor_mz, p.mz, charge, isotope_tolerance))
        .map(|(_, p)| p.intensity)
        .sum();

    PrecursorIsolation {
        precursor_intensity,
        chimeric_intensity,
    }
}

fn is_isotope_peak(precursor_mz: f64, mz: f64, charge: f64, tolerance: f64) -> bool {
    for k in 1..=NUM_ISOTOPES {
        let isotope_mz = precursor_mz + (k as f64) * ISOTOPE_SPACING / charge;
        let diff = isotope_mz - mz;
        if diff.abs() <= tolerance {
            return true;
        }
        if diff > 0.5 {
            // further isotopes only get further away
            return false;
        }
    }
    false
}

/// Relative isolation window, centered on the precursor.
pub fn isolation_window_offsets(offset: f64, width: f64) -> Option<TupleRange<f64>> {
    TupleRange::try_new(offset - width, offset + width).ok()
}
