use std::f64::consts::PI;

use crate::models::MzTolerance;
use crate::traits::PeakLike;
use crate::utils::TupleRange;
use crate::utils::peak_utils::mz_index_range;

/// Pairs further apart than this many tolerances (evaluated at m/z 1000)
/// contribute nothing.
const MAX_DIFFERENCE_IN_TOLERANCES: f64 = 5.0;

/// Number of peaks kept per bin when reducing a spectrum for comparison.
pub const REDUCED_PEAKS_PER_BIN: usize = 6;

/// Unnormalized probability product between two m/z sorted peak lists.
///
/// Every pair of peaks (one per list) closer than `5 * tol(1000)` adds
/// the overlap of two gaussians centered on them, scaled by both
/// intensities. Only peaks inside `mz_range` and with intensity of at
/// least `noise_level` are considered as sweep positions.
///
/// Returns 0 if either list has no peak inside `mz_range`.
pub fn probability_product_unnormalized<L: PeakLike, R: PeakLike>(
    left: &[L],
    right: &[R],
    tolerance: &MzTolerance,
    noise_level: f64,
    mz_range: TupleRange<f64>,
) -> f64 {
    let left_range = mz_index_range(left, mz_range);
    let right_range = mz_index_range(right, mz_range);
    if left_range.is_empty() || right_range.is_empty() {
        return 0.0;
    }
    let (mut i, nl) = (left_range.start, left_range.end);
    let (mut j, nr) = (right_range.start, right_range.end);

    let allowed_difference = tolerance.tolerance_for_mass(1000.0) * MAX_DIFFERENCE_IN_TOLERANCES;
    let mut score = 0.0;
    while i < nl && j < nr {
        let lp = &left[i];
        if lp.intensity() < noise_level {
            i += 1;
            continue;
        }
        let rp = &right[j];
        if rp.intensity() < noise_level {
            j += 1;
            continue;
        }

        let difference = lp.mz() - rp.mz();
        if difference.abs() <= allowed_difference {
            let mz_abs = tolerance.tolerance_for_mass(((lp.mz() + rp.mz()) / 2.0).round());
            let variance = mz_abs * mz_abs;
            score += pair_score(lp, rp, variance);
            for lp2 in &left[(i + 1)..nl] {
                if (lp2.mz() - rp.mz()).abs() > allowed_difference {
                    break;
                }
                score += pair_score(lp2, rp, variance);
            }
            for rp2 in &right[(j + 1)..nr] {
                if (lp.mz() - rp2.mz()).abs() > allowed_difference {
                    break;
                }
                score += pair_score(lp, rp2, variance);
            }
            i += 1;
            j += 1;
        } else if difference > 0.0 {
            j += 1;
        } else {
            i += 1;
        }
    }
    score
}

fn pair_score<L: PeakLike, R: PeakLike>(left: &L, right: &R, variance: f64) -> f64 {
    let diff = left.mz() - right.mz();
    left.intensity() * right.intensity() * (-(diff * diff) / (4.0 * variance)).exp()
        / (PI * variance * 4.0)
}

/// Decides whether a candidate spectrum is similar enough to the anchor
/// to be merged into it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityGate {
    pub cosine_threshold: f64,
    pub tolerance: MzTolerance,
}

impl SimilarityGate {
    pub fn new(cosine_threshold: f64, tolerance: MzTolerance) -> Self {
        Self {
            cosine_threshold,
            tolerance,
        }
    }

    /// Normalized probability product between two reduced peak lists.
    ///
    /// NaN when either self similarity is zero.
    pub fn cosine<L: PeakLike, R: PeakLike>(
        &self,
        anchor: &[L],
        candidate: &[R],
        min_intensity: f64,
        mass_range: TupleRange<f64>,
    ) -> f64 {
        let anchor_norm = self.self_similarity(anchor, min_intensity, mass_range);
        self.cosine_with_norm(anchor, anchor_norm, candidate, min_intensity, mass_range)
    }

    pub fn self_similarity<P: PeakLike>(
        &self,
        peaks: &[P],
        min_intensity: f64,
        mass_range: TupleRange<f64>,
    ) -> f64 {
        probability_product_unnormalized(peaks, peaks, &self.tolerance, min_intensity, mass_range)
    }

    /// Same as [SimilarityGate::cosine], reusing a precomputed anchor
    /// self similarity.
    pub fn cosine_with_norm<L: PeakLike, R: PeakLike>(
        &self,
        anchor: &[L],
        anchor_norm: f64,
        candidate: &[R],
        min_intensity: f64,
        mass_range: TupleRange<f64>,
    ) -> f64 {
        let candidate_norm = self.self_similarity(candidate, min_intensity, mass_range);
        let cross = probability_product_unnormalized(
            anchor,
            candidate,
            &self.tolerance,
            min_intensity,
            mass_range,
        );
        let denominator = (candidate_norm * anchor_norm).sqrt();
        if denominator > 0.0 {
            cross / denominator
        } else {
            f64::NAN
        }
    }

    pub fn accepts(&self, cosine: f64) -> bool {
        // NaN compares false
        cosine >= self.cosine_threshold
    }

    pub fn similar<L: PeakLike, R: PeakLike>(
        &self,
        anchor: &[L],
        candidate: &[R],
        min_intensity: f64,
        mass_range: TupleRange<f64>,
    ) -> bool {
        self.accepts(self.cosine(anchor, candidate, min_intensity, mass_range))
    }
}
