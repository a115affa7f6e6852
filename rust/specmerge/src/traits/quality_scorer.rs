use crate::models::FragmentScanCluster;

/// Scores every MS2 scan of a cluster by how trustworthy it is.
///
/// Must return exactly one score per MS2 scan, in the order of
/// [FragmentScanCluster::ms2_scans]. A score of zero or less marks
/// the scan as unusable.
pub trait QualityScorer {
    fn score(&self, cluster: &FragmentScanCluster) -> Vec<f64>;
}

/// Plain functions (and closures) are scorers too, mostly handy in tests.
impl<F> QualityScorer for F
where
    F: Fn(&FragmentScanCluster) -> Vec<f64>,
{
    fn score(&self, cluster: &FragmentScanCluster) -> Vec<f64> {
        self(cluster)
    }
}
