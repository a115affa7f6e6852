use serde::{
    Deserialize,
    Serialize,
};

use crate::utils::TupleRange;

/// Mass tolerance used for matching peaks.
///
/// Combines an absolute (dalton) and a relative (ppm) component,
/// the effective tolerance at a given mass is the larger of the two.
///
/// Example:
/// ```
/// use specmerge::MzTolerance;
///
/// let tol = MzTolerance::new(0.001, 10.0);
/// // 10 ppm of 500 is 0.005, larger than the absolute 0.001
/// assert!((tol.tolerance_for_mass(500.0) - 0.005).abs() < 1e-12);
/// // at low masses the absolute component takes over
/// assert_eq!(tol.tolerance_for_mass(50.0), 0.001);
/// ```
///
/// Convention:
/// Same as for every other range in this crate, tolerances are positive
/// values; a tolerance of 0.01 on 100 means the range [99.99, 100.01].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MzTolerance {
    #[serde(rename = "da", default)]
    pub absolute: f64,
    #[serde(default)]
    pub ppm: f64,
}

impl Default for MzTolerance {
    fn default() -> Self {
        Self {
            absolute: 0.001,
            ppm: 10.0,
        }
    }
}

impl MzTolerance {
    pub fn new(absolute: f64, ppm: f64) -> Self {
        Self { absolute, ppm }
    }

    pub fn absolute(absolute: f64) -> Self {
        Self { absolute, ppm: 0.0 }
    }

    pub fn ppm(ppm: f64) -> Self {
        Self { absolute: 0.0, ppm }
    }

    /// Absolute half-width of the tolerance window at `mz`.
    pub fn tolerance_for_mass(&self, mz: f64) -> f64 {
        let relative = mz * self.ppm * 1e-6;
        self.absolute.max(relative)
    }

    /// Same tolerance with both components multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            absolute: self.absolute * factor,
            ppm: self.ppm * factor,
        }
    }

    /// Calculate the m/z tolerance range `[mz - tol, mz + tol]`.
    ///
    /// Returns `None` for non finite inputs, since no valid range
    /// can be built for them.
    pub fn mz_range(&self, mz: f64) -> Option<TupleRange<f64>> {
        let tol = self.tolerance_for_mass(mz);
        TupleRange::try_new(mz - tol, mz + tol).ok()
    }

    /// Whether `other` lies inside the (closed) tolerance window around `reference`.
    pub fn within_tolerance(&self, reference: f64, other: f64) -> bool {
        (reference - other).abs() <= self.tolerance_for_mass(reference)
    }

    pub fn is_valid(&self) -> bool {
        self.absolute.is_finite()
            && self.ppm.is_finite()
            && self.absolute >= 0.0
            && self.ppm >= 0.0
            && (self.absolute > 0.0 || self.ppm > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled() {
        let tol = MzTolerance::new(0.002, 5.0).scaled(4.0);
        assert_eq!(tol, MzTolerance::new(0.008, 20.0));
    }

    #[test]
    fn test_within_tolerance_is_closed() {
        let tol = MzTolerance::absolute(0.5);
        assert!(tol.within_tolerance(100.0, 100.5));
        assert!(tol.within_tolerance(100.0, 99.5));
        assert!(!tol.within_tolerance(100.0, 100.50001));
    }

    #[test]
    fn test_mz_range() {
        let range = MzTolerance::ppm(20.0).mz_range(500.0).unwrap();
        assert!((range.start() - 499.99).abs() < 1e-9);
        assert!((range.end() - 500.01).abs() < 1e-9);
        assert!(MzTolerance::ppm(20.0).mz_range(f64::NAN).is_none());
    }

    #[test]
    fn test_deserialize() {
        let tol: MzTolerance = serde_json::from_str(r#"{ "da": 0.005, "ppm": 15.0 }"#).unwrap();
        assert_eq!(tol, MzTolerance::new(0.005, 15.0));
        let tol: MzTolerance = serde_json::from_str(r#"{ "ppm": 15.0 }"#).unwrap();
        assert_eq!(tol, MzTolerance::ppm(15.0));
    }

    #[test]
    fn test_validity() {
        assert!(MzTolerance::default().is_valid());
        assert!(!MzTolerance::new(0.0, 0.0).is_valid());
        assert!(!MzTolerance::new(-1.0, 10.0).is_valid());
    }
}
