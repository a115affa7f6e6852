use specmerge::{
    Feature,
    FeatureRow,
    FragmentScan,
    FragmentScanCluster,
    MergeConfig,
    MergeMode,
    Ms1Scan,
    MzTolerance,
    PeakLike,
    Polarity,
    RawPeak,
    SpectraMerger,
    TupleRange,
};

const PRECURSOR_MZ: f64 = 500.1234;
const RAW_FILE: &str = "sample_a.mzML";

fn fragment_scan(scan_id: u32, peaks: &[(f64, f64)]) -> FragmentScan {
    FragmentScan {
        scan_id,
        raw_file: RAW_FILE.into(),
        rt: scan_id as f64 * 0.1,
        polarity: Polarity::Positive,
        precursor_mz: PRECURSOR_MZ,
        precursor_charge: 1,
        peaks: peaks.iter().map(|&(mz, i)| RawPeak::new(mz, i)).collect(),
    }
}

fn cluster(scans: Vec<FragmentScan>) -> FragmentScanCluster {
    FragmentScanCluster {
        feature_mz: PRECURSOR_MZ,
        raw_file: RAW_FILE.into(),
        ms1_before: None,
        ms1_after: None,
        ms2_scans: scans,
        isolation_window: TupleRange::try_new(PRECURSOR_MZ - 1.0, PRECURSOR_MZ + 1.0).unwrap(),
        tolerance: MzTolerance::default(),
    }
}

/// Scores by scan id, as a stand in for a real isolation purity model.
fn fixed_scores(scores: &'static [(u32, f64)]) -> impl Fn(&FragmentScanCluster) -> Vec<f64> {
    move |cluster: &FragmentScanCluster| {
        cluster
            .ms2_scans
            .iter()
            .map(|s| {
                scores
                    .iter()
                    .find(|(id, _)| *id == s.scan_id)
                    .map_or(0.0, |(_, score)| *score)
            })
            .collect()
    }
}

const SPECTRUM_B: [(f64, f64); 5] = [
    (72.0444, 40.0),
    (86.0600, 100.0),
    (130.0863, 55.0),
    (241.1183, 30.0),
    (398.2010, 20.0),
];
const SPECTRUM_C: [(f64, f64); 5] = [
    (72.0446, 45.0),
    (86.0601, 110.0),
    (130.0861, 50.0),
    (241.1185, 25.0),
    (398.2013, 22.0),
];
const SPECTRUM_A: [(f64, f64); 3] = [(64.0, 10.0), (150.3, 10.0), (299.9, 10.0)];

#[test]
fn test_best_scan_anchors_and_poor_scan_is_dropped() {
    let merger = SpectraMerger::with_scorer(
        MergeConfig::default(),
        fixed_scores(&[(1, 0.1), (2, 0.9), (3, 0.95)]),
    )
    .unwrap();
    let c = cluster(vec![
        fragment_scan(1, &SPECTRUM_A),
        fragment_scan(2, &SPECTRUM_B),
        fragment_scan(3, &SPECTRUM_C),
    ]);

    let merged = merger.merge_cluster(&c);
    assert_eq!(merged.scan_ids(), &[3, 2]);
    assert_eq!(merged.removed_scans_by_low_quality, 1);
    assert_eq!(merged.removed_scans_by_low_cosine, 0);
    assert_eq!(merged.total_number_of_scans(), 3);
    assert_eq!(merged.best_fragment_scan_score, 0.95);
    assert_eq!(merged.peaks().len(), SPECTRUM_B.len());
    assert!(merged.peaks().iter().all(|p| p.num_sources() == 2));
    assert!(merged.peaks().windows(2).all(|w| w[0].mz() <= w[1].mz()));
}

#[test]
fn test_end_to_end_across_samples() {
    let merger = SpectraMerger::with_scorer(
        MergeConfig::default(),
        fixed_scores(&[(1, 0.1), (2, 0.9), (3, 0.95)]),
    )
    .unwrap();
    let row = FeatureRow {
        id: 7,
        features: vec![Feature {
            raw_file: RAW_FILE.into(),
            mz: PRECURSOR_MZ,
            ms1_scans: vec![],
            fragment_scans: vec![
                fragment_scan(3, &SPECTRUM_C),
                fragment_scan(1, &SPECTRUM_A),
                fragment_scan(2, &SPECTRUM_B),
            ],
        }],
    };

    let spectra = merger.merged_spectra(&row);
    assert_eq!(spectra.len(), 1);
    let spectrum = &spectra[0];
    assert_eq!(spectrum.scan_ids(), &[3, 2]);
    assert_eq!(spectrum.removed_scans_by_low_quality, 1);
    assert_eq!(spectrum.total_number_of_scans(), 3);
    assert_eq!(spectrum.origins().len(), 1);

    let best = merger.best_merged_spectrum(&row).unwrap();
    assert_eq!(&best, spectrum);
}

#[test]
fn test_cluster_with_no_usable_scan_is_empty() {
    let merger = SpectraMerger::with_scorer(
        MergeConfig::default(),
        fixed_scores(&[(1, 0.0), (2, -3.0), (3, 0.0)]),
    )
    .unwrap();
    let c = cluster(vec![
        fragment_scan(1, &SPECTRUM_B),
        fragment_scan(2, &SPECTRUM_B),
        fragment_scan(3, &SPECTRUM_B),
    ]);

    let merged = merger.merge_cluster(&c);
    assert!(merged.peaks().is_empty());
    assert_eq!(merged.total_number_of_scans(), 3);

    let row = FeatureRow {
        id: 1,
        features: vec![Feature {
            raw_file: RAW_FILE.into(),
            mz: PRECURSOR_MZ,
            ms1_scans: vec![],
            fragment_scans: c.ms2_scans.clone(),
        }],
    };
    assert!(merger.merged_spectra(&row).is_empty());
    assert!(merger.best_merged_spectrum(&row).is_none());
}

#[test]
fn test_consistency_filter_on_ten_scans() {
    let common = [(86.06, 100.0), (130.09, 80.0), (241.12, 60.0)];
    let scans: Vec<FragmentScan> = (1..=10)
        .map(|id| {
            let mut peaks = common.to_vec();
            if id == 3 || id == 7 {
                peaks.push((250.0, 1.0));
            }
            fragment_scan(id, &peaks)
        })
        .collect();
    let merger = SpectraMerger::with_scorer(MergeConfig::default(), |c: &FragmentScanCluster| {
        vec![1.0; c.ms2_scans.len()]
    })
    .unwrap();

    let merged = merger.merge_cluster(&cluster(scans));
    assert_eq!(merged.num_contributing_scans(), 10);
    assert_eq!(merged.peaks().len(), 4);

    let strict = merged.clone().filter_by_relative_number_of_scans(0.3);
    assert_eq!(strict.peaks().len(), 3);
    assert!(strict.peaks().iter().all(|p| p.mz() < 250.0));

    let lenient = merged.filter_by_relative_number_of_scans(0.2);
    assert_eq!(lenient.peaks().len(), 4);
}

#[test]
fn test_same_sample_merges_clusters() {
    let ms1 = |scan_id: u32| Ms1Scan {
        scan_id,
        rt: scan_id as f64 * 0.1,
        peaks: vec![RawPeak::new(PRECURSOR_MZ, 1e6)],
    };
    let feature = Feature {
        raw_file: RAW_FILE.into(),
        mz: PRECURSOR_MZ,
        ms1_scans: vec![ms1(1), ms1(10), ms1(20)],
        fragment_scans: vec![
            fragment_scan(2, &SPECTRUM_B),
            fragment_scan(3, &SPECTRUM_C),
            fragment_scan(11, &SPECTRUM_C),
            fragment_scan(12, &SPECTRUM_B),
        ],
    };
    let row = FeatureRow {
        id: 3,
        features: vec![feature],
    };

    let config = MergeConfig {
        merge_mode: MergeMode::ConsecutiveScans,
        ..Default::default()
    };
    let merger = SpectraMerger::new(config).unwrap();
    let per_cluster = merger.merged_spectra(&row);
    assert_eq!(per_cluster.len(), 2);
    assert!(per_cluster.iter().all(|s| s.num_contributing_scans() == 2));

    let config = MergeConfig {
        merge_mode: MergeMode::SameSample,
        ..Default::default()
    };
    let merger = SpectraMerger::new(config).unwrap();
    let per_sample = merger.merged_spectra(&row);
    assert_eq!(per_sample.len(), 1);
    assert_eq!(per_sample[0].num_contributing_scans(), 4);
    assert_eq!(per_sample[0].total_number_of_scans(), 4);
    // both clusters score the same, the later one anchors
    assert_eq!(per_sample[0].scan_ids()[0], 11);
}

#[test]
fn test_rows_are_merged_in_parallel_in_order() {
    let merger = SpectraMerger::with_scorer(MergeConfig::default(), |c: &FragmentScanCluster| {
        vec![1.0; c.ms2_scans.len()]
    })
    .unwrap();
    let rows: Vec<FeatureRow> = (0..20)
        .map(|id| FeatureRow {
            id,
            features: vec![Feature {
                raw_file: RAW_FILE.into(),
                mz: PRECURSOR_MZ,
                ms1_scans: vec![],
                fragment_scans: vec![fragment_scan(id as u32 + 1, &SPECTRUM_B)],
            }],
        })
        .collect();

    let out = merger.par_merge_rows(&rows);
    assert_eq!(out.len(), rows.len());
    for (i, spectra) in out.iter().enumerate() {
        assert_eq!(spectra.len(), 1);
        assert_eq!(spectra[0].scan_ids(), &[i as u32 + 1]);
    }
}
