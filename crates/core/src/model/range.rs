//! Closed integer intervals over the file-size search dimension.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Inclusive byte-size interval `[low, high]` used to scope a code search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SearchRange {
    low: u64,
    high: u64,
}

impl SearchRange {
    /// Create a range, rejecting `low > high`.
    pub fn new(low: u64, high: u64) -> Result<Self, Error> {
        if low > high {
            return Err(Error::InvalidInput(format!("search range {low}..{high} is inverted")));
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> u64 {
        self.low
    }

    pub fn high(&self) -> u64 {
        self.high
    }

    /// Number of discrete sizes covered.
    pub fn width(&self) -> u64 {
        self.high - self.low + 1
    }

    /// A dense range spans at most two sizes and cannot be bisected further.
    pub fn is_dense(&self) -> bool {
        self.high - self.low <= 1
    }

    pub fn contains(&self, value: u64) -> bool {
        self.low <= value && value <= self.high
    }

    /// Bisect at `⌊(low + high) / 2⌋` into two disjoint halves.
    ///
    /// Returns `None` for a single-value range.
    pub fn split(&self) -> Option<(SearchRange, SearchRange)> {
        if self.low == self.high {
            return None;
        }
        let mid = self.low + (self.high - self.low) / 2;
        Some((SearchRange { low: self.low, high: mid }, SearchRange { low: mid + 1, high: self.high }))
    }

    /// Search qualifier in GitHub syntax, e.g. `size:100..500`.
    pub fn size_qualifier(&self) -> String {
        format!("size:{}..{}", self.low, self.high)
    }
}

impl fmt::Display for SearchRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.low, self.high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_range_rejected() {
        assert!(matches!(SearchRange::new(10, 9), Err(Error::InvalidInput(_))));
        assert!(SearchRange::new(9, 9).is_ok());
    }

    #[test]
    fn test_split_halves_are_disjoint_and_cover_parent() {
        let cases = [(0, 100), (0, 1), (100, 500_000), (7, 8), (3, 10), (u64::MAX - 3, u64::MAX)];
        for (low, high) in cases {
            let parent = SearchRange::new(low, high).unwrap();
            let (left, right) = parent.split().unwrap();
            assert_eq!(left.low(), parent.low());
            assert_eq!(right.high(), parent.high());
            assert_eq!(left.high() + 1, right.low(), "gap or overlap splitting {parent}");
            assert_eq!(left.width() + right.width(), parent.width());
            assert!(left.width() < parent.width() && right.width() < parent.width());
        }
    }

    #[test]
    fn test_split_uses_floor_midpoint() {
        let (left, right) = SearchRange::new(0, 100).unwrap().split().unwrap();
        assert_eq!((left.low(), left.high()), (0, 50));
        assert_eq!((right.low(), right.high()), (51, 100));
    }

    #[test]
    fn test_single_value_does_not_split() {
        assert!(SearchRange::new(42, 42).unwrap().split().is_none());
    }

    #[test]
    fn test_dense() {
        assert!(SearchRange::new(5, 5).unwrap().is_dense());
        assert!(SearchRange::new(5, 6).unwrap().is_dense());
        assert!(!SearchRange::new(5, 7).unwrap().is_dense());
    }

    #[test]
    fn test_size_qualifier() {
        let range = SearchRange::new(100, 500_000).unwrap();
        assert_eq!(range.size_qualifier(), "size:100..500000");
        assert_eq!(range.to_string(), "100..500000");
    }
}
