use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

/// TupleRange represents a range defined by a tuple of two elements (T, T).
///
/// It represents a range as closed-closed [a, b], meaning both endpoints are inclusive.
/// The first element is always less than or equal to the second; mass windows
/// that would come out inverted are rejected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TupleRange<T: Copy + PartialOrd>(T, T);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TupleRangeError<T: Copy + PartialOrd + std::fmt::Debug> {
    #[error(
        "Expected the first element to be less than or equal to the second, got ({0:?}, {1:?})"
    )]
    ExpectedOrderedRange(T, T),
}

impl<T: Copy + PartialOrd + std::fmt::Debug> TupleRange<T> {
    pub fn try_new(left: T, right: T) -> Result<Self, TupleRangeError<T>> {
        // NaN endpoints also end up here, since the comparison below is false for them
        if left <= right {
            Ok(Self(left, right))
        } else {
            Err(TupleRangeError::ExpectedOrderedRange(left, right))
        }
    }

    pub fn as_tuple(&self) -> (T, T) {
        (self.0, self.1)
    }

    pub fn contains(&self, x: T) -> bool {
        self.0 <= x && x <= self.1
    }

    pub fn start(&self) -> T {
        self.0
    }

    pub fn end(&self) -> T {
        self.1
    }
}

impl TupleRange<f64> {
    pub fn width(&self) -> f64 {
        self.1 - self.0
    }

    /// Moves both ends of the range by `offset`.
    ///
    /// Used to turn isolation window offsets (relative to a precursor)
    /// into absolute m/z windows.
    pub fn shifted(&self, offset: f64) -> Self {
        Self(self.0 + offset, self.1 + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_range_is_rejected() {
        assert!(TupleRange::try_new(2.0, 1.0).is_err());
        assert!(TupleRange::try_new(f64::NAN, 1.0).is_err());
        assert!(TupleRange::try_new(1.0, 1.0).is_ok());
    }

    #[test]
    fn test_contains_is_closed() {
        let range = TupleRange::try_new(50.0, 150.0).unwrap();
        assert!(range.contains(50.0));
        assert!(range.contains(150.0));
        assert!(!range.contains(150.000001));
        assert_eq!(range.width(), 100.0);
    }

    #[test]
    fn test_shifted() {
        let range = TupleRange::try_new(-1.0, 1.0).unwrap().shifted(500.0);
        assert_eq!(range.as_tuple(), (499.0, 501.0));
    }
}
