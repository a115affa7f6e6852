use std::collections::BTreeMap;
use std::ops::Range;

use super::TupleRange;
use crate::traits::PeakLike;

pub fn sort_by_mz<P: PeakLike>(peaks: &mut [P]) {
    peaks.sort_unstable_by(|a, b| a.mz().total_cmp(&b.mz()));
}

pub fn sort_by_descending_intensity<P: PeakLike>(peaks: &mut [P]) {
    peaks.sort_by(|a, b| b.intensity().total_cmp(&a.intensity()));
}

pub fn is_sorted_by_mz<P: PeakLike>(peaks: &[P]) -> bool {
    peaks.windows(2).all(|w| w[0].mz() <= w[1].mz())
}

/// Finds the index range of the peaks of an m/z sorted slice
/// that fall within the (closed) m/z range.
///
/// O(log n), the slice MUST be sorted by m/z.
///
/// ```
/// use specmerge::RawPeak;
/// use specmerge::utils::TupleRange;
/// use specmerge::utils::peak_utils::mz_index_range;
///
/// let peaks = vec![
///     RawPeak::new(100.0, 1.0),
///     RawPeak::new(150.0, 1.0),
///     RawPeak::new(200.0, 1.0),
/// ];
/// let range = mz_index_range(&peaks, TupleRange::try_new(120.0, 200.0).unwrap());
/// assert_eq!(range, 1..3);
/// ```
pub fn mz_index_range<P: PeakLike>(sorted: &[P], mz_range: TupleRange<f64>) -> Range<usize> {
    let start_idx = sorted.partition_point(|x| x.mz() < mz_range.start());
    let end_idx = start_idx + sorted[start_idx..].partition_point(|x| x.mz() <= mz_range.end());
    start_idx..end_idx
}

/// Index of the most intense peak within the m/z range (first one on ties).
pub fn find_most_intense_within<P: PeakLike>(
    sorted: &[P],
    mz_range: TupleRange<f64>,
) -> Option<usize> {
    let range = mz_index_range(sorted, mz_range);
    let mut best: Option<usize> = None;
    for idx in range {
        match best {
            Some(b) if sorted[b].intensity() >= sorted[idx].intensity() => {}
            _ => best = Some(idx),
        }
    }
    best
}

/// Splits the m/z axis into consecutive bins of the width of `bin_range`
/// (starting at its lower end) and keeps the `per_bin` most intense
/// peaks of every bin. Peaks below the lower end are dropped.
///
/// This is a cheap way to get rid of most noise without having to
/// estimate a noise level. The result is sorted by m/z.
pub fn most_intense_across_mass_range<P: PeakLike + Clone>(
    peaks: &[P],
    bin_range: TupleRange<f64>,
    per_bin: usize,
) -> Vec<P> {
    let offset = bin_range.start();
    let width = bin_range.width();
    if !(width > 0.0) || per_bin == 0 {
        return Vec::new();
    }

    let mut bins: BTreeMap<i64, Vec<P>> = BTreeMap::new();
    for peak in peaks {
        let bin = ((peak.mz() - offset) / width).floor();
        if bin >= 0.0 && bin.is_finite() {
            bins.entry(bin as i64).or_default().push(peak.clone());
        }
    }

    let mut out: Vec<P> = Vec::with_capacity(bins.len() * per_bin);
    for (_bin, mut local) in bins {
        sort_by_descending_intensity(&mut local);
        local.truncate(per_bin);
        out.extend(local);
    }
    sort_by_mz(&mut out);
    out
}
