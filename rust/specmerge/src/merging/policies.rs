use serde::{
    Deserialize,
    Serialize,
};

use crate::models::RawPeak;

/// How the m/z of a merged peak is derived from its sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MzMergeMode {
    /// m/z of the single most intense source.
    MostIntense,
    /// Intensity weighted mean m/z.
    WeightedAverage,
    /// Weighted mean after removing the lowest and highest quarter
    /// (by m/z) of the sources. Needs at least 4 sources, otherwise
    /// behaves like [MzMergeMode::WeightedAverage].
    #[default]
    WeightedAverageCutoffOutliers,
}

/// How the intensity of a merged peak is derived from its sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityMergeMode {
    #[default]
    SumIntensities,
    MaximumIntensity,
    MeanIntensity,
}

const MIN_SOURCES_FOR_OUTLIER_CUTOFF: usize = 4;

impl MzMergeMode {
    pub fn merged_mz(&self, sources: &[RawPeak]) -> f64 {
        match self {
            MzMergeMode::MostIntense => most_intense_mz(sources),
            MzMergeMode::WeightedAverage => weighted_average_mz(sources),
            MzMergeMode::WeightedAverageCutoffOutliers => {
                if sources.len() < MIN_SOURCES_FOR_OUTLIER_CUTOFF {
                    return weighted_average_mz(sources);
                }
                let mut sorted = sources.to_vec();
                sorted.sort_unstable_by(|a, b| {
                    a.mz.total_cmp(&b.mz)
                        .then(a.intensity.total_cmp(&b.intensity))
                });
                let quantile = sorted.len() / 4;
                weighted_average_mz(&sorted[quantile..(sorted.len() - quantile)])
            }
        }
    }
}

impl IntensityMergeMode {
    pub fn merged_intensity(&self, sources: &[RawPeak]) -> f64 {
        match self {
            IntensityMergeMode::SumIntensities => sources.iter().map(|p| p.intensity).sum(),
            IntensityMergeMode::MaximumIntensity => sources
                .iter()
                .map(|p| p.intensity)
                .fold(f64::NEG_INFINITY, f64::max)
                .max(0.0),
            IntensityMergeMode::MeanIntensity => {
                if sources.is_empty() {
                    0.0
                } else {
                    sources.iter().map(|p| p.intensity).sum::<f64>() / sources.len() as f64
                }
            }
        }
    }
}

fn most_intense_mz(sources: &[RawPeak]) -> f64 {
    // Ties go to the lower m/z, so the result does not depend on source order
    sources
        .iter()
        .reduce(|best, p| {
            if p.intensity > best.intensity || (p.intensity == best.intensity && p.mz < best.mz) {
                p
            } else {
                best
            }
        })
        .map_or(f64::NAN, |p| p.mz)
}

fn weighted_average_mz(sources: &[RawPeak]) -> f64 {
    let (weighted_sum, total_intensity) = sources
        .iter()
        .fold((0.0, 0.0), |(m, i), p| (m + p.mz * p.intensity, i + p.intensity));
    if total_intensity > 0.0 {
        weighted_sum / total_intensity
    } else if sources.is_empty() {
        f64::NAN
    } else {
        sources.iter().map(|p| p.mz).sum::<f64>() / sources.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peaks(vals: &[(f64, f64)]) -> Vec<RawPeak> {
        vals.iter().map(|&(mz, i)| RawPeak::new(mz, i)).collect()
    }

    #[test]
    fn test_most_intense() {
        let sources = peaks(&[(100.0, 1.0), (100.002, 10.0), (99.998, 5.0)]);
        assert_eq!(MzMergeMode::MostIntense.merged_mz(&sources), 100.002);
    }

    #[test]
    fn test_most_intense_tie_breaks_on_mz() {
        let a = peaks(&[(100.001, 10.0), (100.0, 10.0)]);
        let b = peaks(&[(100.0, 10.0), (100.001, 10.0)]);
        assert_eq!(MzMergeMode::MostIntense.merged_mz(&a), 100.0);
        assert_eq!(MzMergeMode::MostIntense.merged_mz(&b), 100.0);
    }

    #[test]
    fn test_weighted_average() {
        let sources = peaks(&[(100.0, 1.0), (101.0, 3.0)]);
        let mz = MzMergeMode::WeightedAverage.merged_mz(&sources);
        assert!((mz - 100.75).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_average_zero_intensities() {
        let sources = peaks(&[(100.0, 0.0), (102.0, 0.0)]);
        assert_eq!(MzMergeMode::WeightedAverage.merged_mz(&sources), 101.0);
    }

    #[test]
    fn test_cutoff_outliers_drops_quartiles() {
        // The two extreme values would drag the weighted mean a lot
        let sources = peaks(&[
            (90.0, 100.0),
            (100.0, 1.0),
            (100.2, 1.0),
            (120.0, 100.0),
        ]);
        let mz = MzMergeMode::WeightedAverageCutoffOutliers.merged_mz(&sources);
        assert!((mz - 100.1).abs() < 1e-9);
    }

    #[test]
    fn test_cutoff_outliers_falls_back_with_few_sources() {
        let sources = peaks(&[(90.0, 1.0), (100.0, 1.0), (110.0, 2.0)]);
        assert_eq!(
            MzMergeMode::WeightedAverageCutoffOutliers.merged_mz(&sources),
            MzMergeMode::WeightedAverage.merged_mz(&sources)
        );
    }

    #[test]
    fn test_intensity_modes() {
        let sources = peaks(&[(100.0, 1.0), (100.0, 3.0), (100.0, 8.0)]);
        assert_eq!(IntensityMergeMode::SumIntensities.merged_intensity(&sources), 12.0);
        assert_eq!(IntensityMergeMode::MaximumIntensity.merged_intensity(&sources), 8.0);
        assert_eq!(IntensityMergeMode::MeanIntensity.merged_intensity(&sources), 4.0);
    }

    #[test]
    fn test_modes_deserialize_from_snake_case() {
        let mode: MzMergeMode = serde_json::from_str("\"weighted_average\"").unwrap();
        assert_eq!(mode, MzMergeMode::WeightedAverage);
        let mode: IntensityMergeMode = serde_json::from_str("\"maximum_intensity\"").unwrap();
        assert_eq!(mode, IntensityMergeMode::MaximumIntensity);
    }
}
