//! Hierarchical merging of fragment spectra.
//!
//! # Passes
//!
//! Merging happens in up to three passes, each one folding spectra into an
//! anchor spectrum when they are similar enough to it:
//!
//! 1. **Consecutive scans**: every run of fragment scans between two survey
//!    scans is scored with a [QualityScorer]. The best scan becomes the anchor,
//!    and its neighbours that are not considerably worse get merged into it.
//! 2. **Same sample**: the spectra from pass 1 of a single feature are merged,
//!    anchored on the one built from the best scan.
//! 3. **Across samples**: same as pass 2, over the pass 2 spectra of every
//!    feature in a row.
//!
//! A consistency filter at the end removes peaks that do not show up in
//! enough of the contributing scans.
//!
//! # Bookkeeping
//!
//! Every scan that is looked at ends up either in `scan_ids` or in one of the
//! `removed_scans_by_*` counters of the resulting [MergedSpectrum], so the
//! total number of scans is preserved across passes.

use std::time::Instant;

use rayon::prelude::*;
use tracing::{
    debug,
    info,
    instrument,
    warn,
};

use super::config::{
    MergeConfig,
    MergeMode,
};
use super::peak_list_merger::merge_peak_lists;
use super::quality::Ms2QualityScoreModel;
use super::similarity::{
    REDUCED_PEAKS_PER_BIN,
    SimilarityGate,
};
use crate::errors::Result;
use crate::models::{
    FragmentScan,
    FragmentScanCluster,
    MergedDataPoint,
    MergedSpectrum,
};
use crate::traits::{
    FeatureLike,
    FeatureRowLike,
    PeakLike,
    QualityScorer,
};
use crate::utils::TupleRange;
use crate::utils::peak_utils::{
    find_most_intense_within,
    most_intense_across_mass_range,
};

/// Lowest m/z considered when comparing spectra.
const LOWEST_MASS_TO_CONSIDER: f64 = 50.0;
/// Upper end of the anchor peak binning in the first pass.
const CONSECUTIVE_BIN_UPPER_MASS: f64 = 150.0;
/// Width of the bins used to reduce spectra for comparison.
const REDUCTION_BIN_WIDTH: f64 = 100.0;
/// Peaks closer than this to the precursor are left out of the comparison.
const PRECURSOR_EXCLUSION: f64 = 20.0;
/// Anchor spectra are discarded if a spectrum scores better by this factor.
const QUALITY_RATIO: f64 = 5.0;
const CONSECUTIVE_NOISE_FRACTION: f64 = 0.005;
const ACROSS_NOISE_FRACTION: f64 = 0.01;

/// Runs the merging passes configured in a [MergeConfig].
///
/// The scorer defaults to the model named in the configuration, use
/// [SpectraMerger::with_scorer] to plug in anything else.
#[derive(Debug, Clone)]
pub struct SpectraMerger<S: QualityScorer = Ms2QualityScoreModel> {
    config: MergeConfig,
    scorer: S,
    isolation_window: TupleRange<f64>,
}

impl SpectraMerger<Ms2QualityScoreModel> {
    pub fn new(config: MergeConfig) -> Result<Self> {
        let scorer = config.quality_model;
        Self::with_scorer(config, scorer)
    }
}

impl<S: QualityScorer> SpectraMerger<S> {
    pub fn with_scorer(config: MergeConfig, scorer: S) -> Result<Self> {
        config.validate()?;
        let isolation_window = config.isolation_window()?;
        Ok(Self {
            config,
            scorer,
            isolation_window,
        })
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    fn gate(&self) -> SimilarityGate {
        SimilarityGate::new(self.config.cosine_threshold, self.config.mass_accuracy)
    }

    fn merge_into<P: PeakLike>(
        &self,
        merged: &mut MergedSpectrum,
        incoming: &[P],
    ) -> Vec<MergedDataPoint> {
        merge_peak_lists(
            std::mem::take(&mut merged.peaks),
            incoming,
            &self.config.mass_accuracy,
            self.config.mz_merge_mode,
            self.config.intensity_merge_mode,
        )
    }

    fn from_scan(&self, scan: &FragmentScan) -> MergedSpectrum {
        MergedSpectrum::from_scan(
            scan,
            self.config.mz_merge_mode,
            self.config.intensity_merge_mode,
        )
    }

    fn same_precursor(&self, scan: &FragmentScan, anchor: &MergedSpectrum) -> bool {
        scan.polarity == anchor.polarity
            && scan.precursor_charge == anchor.precursor_charge
            && self
                .config
                .mass_accuracy
                .within_tolerance(scan.precursor_mz, anchor.precursor_mz)
    }

    /// First pass, merges a run of consecutive fragment scans.
    ///
    /// Returns an empty spectrum (accounting for every scan as low quality)
    /// when no scan scores above zero or the best one has at most one peak.
    #[instrument(
        level = "debug",
        skip_all,
        fields(feature_mz = cluster.feature_mz, num_scans = cluster.len())
    )]
    pub fn merge_cluster(&self, cluster: &FragmentScanCluster) -> MergedSpectrum {
        let num_scans = cluster.len();
        if num_scans == 0 {
            return MergedSpectrum::empty(0);
        }

        let scores = self.scorer.score(cluster);
        if scores.len() != num_scans {
            warn!(
                "Quality scorer returned {} scores for {} scans, skipping cluster",
                scores.len(),
                num_scans
            );
            return MergedSpectrum::empty(num_scans);
        }
        let score_at = |i: usize| {
            if scores[i].is_nan() {
                f64::NEG_INFINITY
            } else {
                scores[i]
            }
        };

        let mut best = 0;
        for k in 1..num_scans {
            if score_at(k) > score_at(best) {
                best = k;
            }
        }
        let best_score = score_at(best);
        if best_score <= 0.0 {
            debug!("No fragment scan with a positive quality score");
            return MergedSpectrum::empty(num_scans);
        }

        let anchor = &cluster.ms2_scans[best];
        if anchor.peaks.len() <= 1 {
            debug!("Anchor scan {} has no fragment peaks", anchor.scan_id);
            return MergedSpectrum::empty(num_scans);
        }

        let threshold = self.config.score_threshold_rule.threshold(best, best_score);
        let mut retained = vec![best];
        for offset in 1..num_scans {
            if offset <= best && score_at(best - offset) > threshold {
                retained.push(best - offset);
            }
            if best + offset < num_scans && score_at(best + offset) > threshold {
                retained.push(best + offset);
            }
        }

        let mut merged = self.from_scan(anchor);
        merged.best_fragment_scan_score = best_score;
        merged.removed_scans_by_low_quality = num_scans - retained.len();
        if retained.len() == 1 {
            return merged;
        }

        let feature_mz = cluster.feature_mz;
        let low = LOWEST_MASS_TO_CONSIDER.min(feature_mz - LOWEST_MASS_TO_CONSIDER);
        let windows = (
            TupleRange::try_new(low, CONSECUTIVE_BIN_UPPER_MASS),
            TupleRange::try_new(low, feature_mz),
            TupleRange::try_new(low, feature_mz - PRECURSOR_EXCLUSION),
        );
        let (Ok(anchor_bins), Ok(precursor_range), Ok(cosine_range)) = windows else {
            warn!("Cannot compare spectra for precursor m/z {}", feature_mz);
            return MergedSpectrum::empty(num_scans);
        };

        let anchor_reduced =
            most_intense_across_mass_range(merged.peaks(), anchor_bins, REDUCED_PEAKS_PER_BIN);
        let min_intensity = find_most_intense_within(&anchor_reduced, precursor_range)
            .map(|i| CONSECUTIVE_NOISE_FRACTION * anchor_reduced[i].intensity())
            .unwrap_or(0.0);

        let gate = self.gate();
        let anchor_norm = gate.self_similarity(&anchor_reduced, min_intensity, cosine_range);
        for &idx in &retained[1..] {
            let scan = &cluster.ms2_scans[idx];
            if !self.same_precursor(scan, &merged) {
                warn!(
                    "Scan {} cannot be merged: it seems to belong to a different feature.",
                    scan.scan_id
                );
                merged.removed_scans_by_mismatch += 1;
                continue;
            }

            let candidate =
                most_intense_across_mass_range(&scan.peaks, cosine_range, REDUCED_PEAKS_PER_BIN);
            let cosine = gate.cosine_with_norm(
                &anchor_reduced,
                anchor_norm,
                &candidate,
                min_intensity,
                cosine_range,
            );
            if gate.accepts(cosine) {
                let peaks = self.merge_into(&mut merged, &scan.peaks);
                merged.absorb_scan(scan, peaks);
            } else {
                debug!("Scan {} rejected with cosine {:.3}", scan.scan_id, cosine);
                merged.removed_scans_by_low_cosine += 1;
            }
        }
        merged
    }

    /// Merges already merged spectra into one (second and third pass).
    ///
    /// The anchor is the spectrum with the best fragment scan score, spectra
    /// scoring worse by more than a factor of 5 are not considered. The rest
    /// are visited in order of their first scan id, closest to the anchor first.
    #[instrument(level = "debug", skip_all, fields(num_spectra = spectra.len()))]
    pub fn merge_across_fragment_spectra(&self, spectra: Vec<MergedSpectrum>) -> MergedSpectrum {
        if spectra.is_empty() {
            return MergedSpectrum::empty(0);
        }
        let total: usize = spectra.iter().map(|s| s.total_number_of_scans()).sum();
        let best_score = spectra
            .iter()
            .map(|s| s.best_fragment_scan_score)
            .fold(f64::NEG_INFINITY, f64::max);
        let cutoff = best_score / QUALITY_RATIO;

        let mut removed_by_low_quality = 0;
        let mut selected: Vec<(bool, MergedSpectrum)> = Vec::with_capacity(spectra.len());
        for spec in spectra {
            if spec.best_fragment_scan_score >= cutoff {
                selected.push((false, spec));
            } else {
                removed_by_low_quality += spec.total_number_of_scans();
            }
        }
        // Last one wins on ties
        let Some(anchor_pos) = selected
            .iter()
            .rposition(|(_, s)| s.best_fragment_scan_score >= best_score)
        else {
            return MergedSpectrum::empty(total);
        };
        selected[anchor_pos].0 = true;
        selected.sort_by_key(|(_, s)| s.scan_ids().first().copied().unwrap_or(u32::MAX));
        let Some(best) = selected.iter().position(|(is_anchor, _)| *is_anchor) else {
            return MergedSpectrum::empty(total);
        };

        let mut slots: Vec<Option<MergedSpectrum>> =
            selected.into_iter().map(|(_, s)| Some(s)).collect();
        let Some(mut merged) = slots[best].take() else {
            return MergedSpectrum::empty(total);
        };
        let mut to_merge: Vec<MergedSpectrum> = Vec::with_capacity(slots.len() - 1);
        for offset in 1..slots.len() {
            if offset <= best {
                to_merge.extend(slots[best - offset].take());
            }
            if best + offset < slots.len() {
                to_merge.extend(slots[best + offset].take());
            }
        }

        if to_merge.is_empty() {
            merged.removed_scans_by_low_quality += removed_by_low_quality;
            return merged;
        }

        let precursor_mz = merged.precursor_mz;
        let low = LOWEST_MASS_TO_CONSIDER.min(precursor_mz - LOWEST_MASS_TO_CONSIDER);
        let windows = (
            TupleRange::try_new(low, low + REDUCTION_BIN_WIDTH),
            TupleRange::try_new(low, precursor_mz - PRECURSOR_EXCLUSION),
            TupleRange::try_new(
                LOWEST_MASS_TO_CONSIDER,
                LOWEST_MASS_TO_CONSIDER + REDUCTION_BIN_WIDTH,
            ),
        );
        let (Ok(anchor_bins), Ok(cosine_range), Ok(candidate_bins)) = windows else {
            warn!("Cannot compare spectra for precursor m/z {}", precursor_mz);
            return MergedSpectrum::empty(total);
        };

        let Some(base_peak) = find_most_intense_within(merged.peaks(), cosine_range) else {
            debug!("No peak besides the precursor ion, discarding {} scans", total);
            return MergedSpectrum::empty(total);
        };
        let min_intensity =
            ACROSS_NOISE_FRACTION * merged.peaks()[base_peak].max_source_intensity();
        let anchor_reduced =
            most_intense_across_mass_range(merged.peaks(), anchor_bins, REDUCED_PEAKS_PER_BIN);

        let gate = self.gate();
        let anchor_norm = gate.self_similarity(&anchor_reduced, min_intensity, cosine_range);
        for candidate in to_merge {
            let reduced = most_intense_across_mass_range(
                candidate.peaks(),
                candidate_bins,
                REDUCED_PEAKS_PER_BIN,
            );
            let cosine = gate.cosine_with_norm(
                &anchor_reduced,
                anchor_norm,
                &reduced,
                min_intensity,
                cosine_range,
            );
            if gate.accepts(cosine) {
                let peaks = self.merge_into(&mut merged, candidate.peaks());
                merged.absorb(&candidate, peaks);
            } else {
                debug!(
                    "Spectrum anchored at scan {:?} rejected with cosine {:.3}",
                    candidate.scan_ids().first(),
                    cosine
                );
                merged.removed_scans_by_low_cosine += candidate.total_number_of_scans();
            }
        }
        merged.removed_scans_by_low_quality += removed_by_low_quality;
        merged
    }

    fn merge_clusters<F: FeatureLike>(&self, feature: &F) -> Vec<MergedSpectrum> {
        let clusters = feature.clusters_for(self.isolation_window, &self.config.mass_accuracy);
        debug!(
            "Feature {:.4} in {} has {} fragment scan clusters",
            feature.precursor_mz(),
            feature.raw_file(),
            clusters.len()
        );
        clusters
            .iter()
            .map(|cluster| self.merge_cluster(cluster))
            .collect()
    }

    /// One spectrum per run of consecutive fragment scans of the feature,
    /// leaving out runs that could not be merged.
    pub fn merge_consecutive_scans<F: FeatureLike>(&self, feature: &F) -> Vec<MergedSpectrum> {
        self.merge_clusters(feature)
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Merges all fragment scans of a feature into a single spectrum.
    pub fn merge_from_same_sample<F: FeatureLike>(&self, feature: &F) -> MergedSpectrum {
        merge_non_empty(self.merge_clusters(feature), |spectra| {
            self.merge_across_fragment_spectra(spectra)
        })
    }

    /// Merges all fragment scans of a row into a single spectrum.
    pub fn merge_across_samples<R: FeatureRowLike>(&self, row: &R) -> MergedSpectrum {
        let per_sample = row
            .features()
            .iter()
            .map(|f| self.merge_from_same_sample(f))
            .collect();
        merge_non_empty(per_sample, |spectra| self.merge_across_fragment_spectra(spectra))
    }

    /// Merged spectra of a row, as requested by the configured [MergeMode],
    /// after removing inconsistent peaks. Never contains empty spectra.
    pub fn merged_spectra<R: FeatureRowLike>(&self, row: &R) -> Vec<MergedSpectrum> {
        let spectra = match self.config.merge_mode {
            MergeMode::ConsecutiveScans => row
                .features()
                .iter()
                .flat_map(|f| self.merge_consecutive_scans(f))
                .collect(),
            MergeMode::SameSample => row
                .features()
                .iter()
                .map(|f| self.merge_from_same_sample(f))
                .collect(),
            MergeMode::AcrossSamples => vec![self.merge_across_samples(row)],
        };
        spectra
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(|s| s.filter_by_relative_number_of_scans(self.config.relative_signal_count))
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// The merged spectrum with the best fragment scan score, if any.
    pub fn best_merged_spectrum<R: FeatureRowLike>(&self, row: &R) -> Option<MergedSpectrum> {
        self.merged_spectra(row)
            .into_iter()
            .max_by(|a, b| a.best_fragment_scan_score.total_cmp(&b.best_fragment_scan_score))
    }

    /// Runs [SpectraMerger::merged_spectra] over many rows in parallel.
    ///
    /// The output is in the same order as the input rows.
    pub fn par_merge_rows<R>(&self, rows: &[R]) -> Vec<Vec<MergedSpectrum>>
    where
        R: FeatureRowLike + Sync,
        S: Sync,
    {
        let start = Instant::now();
        let out: Vec<Vec<MergedSpectrum>> = rows
            .par_iter()
            .map(|row| self.merged_spectra(row))
            .collect();
        let elapsed = start.elapsed();
        let num_spectra: usize = out.iter().map(|x| x.len()).sum();
        info!(
            "Merged {} rows into {} spectra in {:.2?}",
            rows.len(),
            num_spectra,
            elapsed
        );
        out
    }
}

/// Merges the non empty spectra with `merge_fn`, accounting the scans of
/// the empty ones as low quality.
fn merge_non_empty(
    spectra: Vec<MergedSpectrum>,
    merge_fn: impl FnOnce(Vec<MergedSpectrum>) -> MergedSpectrum,
) -> MergedSpectrum {
    let (non_empty, empty): (Vec<_>, Vec<_>) = spectra.into_iter().partition(|s| !s.is_empty());
    let lost: usize = empty.iter().map(|s| s.total_number_of_scans()).sum();
    if non_empty.is_empty() {
        return MergedSpectrum::empty(lost);
    }
    let mut merged = merge_fn(non_empty);
    merged.removed_scans_by_low_quality += lost;
    merged
}
