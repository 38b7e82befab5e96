//! Intervals of a continuous grouping variable
//!
//! Intervals are half-open, `[lower, upper)`. The last interval of a
//! partition may be treated as closed by the enumerator so that an
//! open-ended top category (e.g. "85+") still captures its upper bound.

use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relative tolerance used when comparing breakpoints
pub const BREAKPOINT_TOLERANCE: f64 = 1e-12;

/// A slice `[lower, upper)` of a one-dimensional variable such as age
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    lower: f64,
    upper: f64,
}

impl Interval {
    /// Create a new interval
    ///
    /// # Errors
    /// Returns error if either bound is NaN or `lower > upper`
    pub fn new(lower: f64, upper: f64) -> Result<Self, DomainError> {
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(DomainError::InvalidInterval { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    /// Lower bound (inclusive)
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// Upper bound (exclusive, unless closed by the enumerator)
    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Length of the interval
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Check if `other` is nested within this interval
    pub fn contains(&self, other: &Interval) -> bool {
        other.lower >= self.lower && other.upper <= self.upper
    }

    /// Check if a point falls in the interval
    ///
    /// With `closed_upper` the upper bound itself is included.
    pub fn contains_point(&self, z: f64, closed_upper: bool) -> bool {
        z >= self.lower && (z < self.upper || (closed_upper && z == self.upper))
    }

    /// Check if two intervals share interior points
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.lower < other.upper && other.lower < self.upper
    }

    /// Length of the part of this interval that lies within `other`
    pub fn overlap_width(&self, other: &Interval) -> f64 {
        (self.upper.min(other.upper) - self.lower.max(other.lower)).max(0.0)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.lower, self.upper)
    }
}

/// Compare two breakpoints with a relative tolerance
pub fn breakpoints_equal(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= BREAKPOINT_TOLERANCE * scale
}

/// Check that `parts`, taken together, tile `target` exactly
///
/// `[0, 1)` and `[1, 10)` span `[0, 10)`; `[0, 1)` and `[2, 10)` do not.
///
/// # Errors
/// Returns `IntervalCoverage` describing the first gap, overlap or overhang
pub fn check_spans_exactly(target: &Interval, parts: &[Interval]) -> Result<(), DomainError> {
    let coverage = |reason: String| DomainError::IntervalCoverage {
        target: target.to_string(),
        reason,
    };

    let mut sorted: Vec<Interval> = parts.to_vec();
    sorted.sort_by(|a, b| a.lower.total_cmp(&b.lower));

    let Some(first) = sorted.first() else {
        return Err(coverage("no intervals supplied".to_string()));
    };
    if !breakpoints_equal(first.lower, target.lower) {
        return Err(coverage(format!("starts at {} instead of {}", first.lower, target.lower)));
    }

    let mut reach = first.upper;
    for part in &sorted[1..] {
        if !breakpoints_equal(part.lower, reach) {
            let kind = if part.lower > reach { "gap" } else { "overlap" };
            return Err(coverage(format!("{} between {} and {}", kind, reach, part.lower)));
        }
        reach = part.upper;
    }

    if !breakpoints_equal(reach, target.upper) {
        return Err(coverage(format!("ends at {} instead of {}", reach, target.upper)));
    }
    Ok(())
}
