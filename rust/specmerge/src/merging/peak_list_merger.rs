use statrs::function::erf::erfc;

use super::policies::{
    IntensityMergeMode,
    MzMergeMode,
};
use crate::models::{
    MergedDataPoint,
    MzTolerance,
};
use crate::traits::PeakLike;
use crate::utils::TupleRange;
use crate::utils::peak_utils::sort_by_mz;

/// Signal peaks should show up in more than one measurement, so the
/// matching window is a lot wider than the instrument accuracy.
pub const MERGE_TOLERANCE_FACTOR: f64 = 4.0;

/// Merges `incoming` peaks into a peak list sorted by m/z.
///
/// Incoming peaks are visited from the most to the least intense one.
/// Each is folded into the accumulator entry that best explains it
/// among the entries strictly closer than `4 * tol` to it, where `tol` is
/// evaluated at the lower of the two masses. A peak exactly `4 * tol(mz)`
/// away from an entry at `mz` is never folded into it, whichever side it
/// lies on. Peaks with no such entry become new entries. The returned
/// list is sorted by m/z.
///
/// The preference between several candidate entries weights their
/// intensity by how far they are from the peak, so a weak entry right on
/// top of the peak can lose against a much stronger one slightly off.
/// The distance is unsigned: entries above and below the peak are ranked
/// alike, where a signed difference would favour the entries below it.
pub fn merge_peak_lists<P: PeakLike>(
    accumulator: Vec<MergedDataPoint>,
    incoming: &[P],
    tolerance: &MzTolerance,
    mz_mode: MzMergeMode,
    intensity_mode: IntensityMergeMode,
) -> Vec<MergedDataPoint> {
    let tolerance = tolerance.scaled(MERGE_TOLERANCE_FACTOR);
    let mut acc = accumulator;

    let mut order: Vec<&P> = incoming.iter().collect();
    order.sort_by(|a, b| b.intensity().total_cmp(&a.intensity()));

    let mut unmatched: Vec<MergedDataPoint> = Vec::new();
    for peak in order {
        let best = tolerance
            .mz_range(peak.mz())
            .and_then(|window| best_entry(&acc, peak.mz(), window, &tolerance));

        match best {
            Some(idx) => {
                // Swap out the entry so it can be consumed by `merge`
                let entry = std::mem::replace(
                    &mut acc[idx],
                    MergedDataPoint::from_sources(Vec::new(), mz_mode, intensity_mode),
                );
                acc[idx] = entry.merge(peak, mz_mode, intensity_mode);
            }
            None => unmatched.push(MergedDataPoint::new(peak, mz_mode, intensity_mode)),
        }
    }

    acc.extend(unmatched);
    sort_by_mz(&mut acc);
    acc
}

/// Index of the entry preferred for a peak at `mz`, ties keep the first one.
fn best_entry(
    acc: &[MergedDataPoint],
    mz: f64,
    window: TupleRange<f64>,
    tolerance: &MzTolerance,
) -> Option<usize> {
    let start = acc.partition_point(|x| x.mz() <= window.start());
    let end = start + acc[start..].partition_point(|x| x.mz() < window.end());
    let dev = tolerance.tolerance_for_mass(mz);

    (start..end)
        // Entries below the peak have a narrower window of their own
        .filter(|&i| (acc[i].mz() - mz).abs() < tolerance.tolerance_for_mass(acc[i].mz()))
        .map(|i| (i, match_preference(&acc[i], mz, dev)))
        .fold(None, |best: Option<(usize, f64)>, (i, score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((i, score)),
        })
        .map(|(i, _)| i)
}

fn match_preference(entry: &MergedDataPoint, mz: f64, dev: f64) -> f64 {
    let diff = (entry.mz() - mz).abs();
    erfc(3.0 * diff) / (dev * std::f64::consts::SQRT_2) * entry.intensity()
}
