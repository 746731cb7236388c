//! Integer-only numeric axes
//!
//! `IntegerAxis` wraps plotters' f64 coordinate so the mesh asks us for its
//! key points. Every tick it hands back is a whole number.

use plotters::coord::ranged1d::{DefaultFormatting, KeyPointHint, Ranged};
use plotters::coord::types::RangedCoordf64;
use std::ops::Range;

/// Relative padding added around the data on both axes
const AXIS_PADDING: f64 = 0.05;

/// Continuous f64 axis whose ticks are restricted to integers
#[derive(Clone)]
pub struct IntegerAxis {
    inner: RangedCoordf64,
    max_ticks: usize,
}

impl IntegerAxis {
    pub fn new(lo: f64, hi: f64, max_ticks: usize) -> Self {
        Self {
            inner: RangedCoordf64::from(lo..hi),
            max_ticks,
        }
    }

    /// Axis over the padded, integer-aligned bounds of `values`
    pub fn fit(values: impl Iterator<Item = f64>, max_ticks: usize) -> Self {
        let (lo, hi) = axis_range(values);
        Self::new(lo, hi, max_ticks)
    }
}

impl Ranged for IntegerAxis {
    type FormatOption = DefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.inner.map(value, limit)
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        let range = self.inner.range();
        integer_ticks(range.start, range.end, self.max_ticks.min(hint.max_num_points()))
    }

    fn range(&self) -> Range<f64> {
        self.inner.range()
    }
}

/// Padded, integer-aligned axis bounds for a set of values
pub fn axis_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if !lo.is_finite() {
        return (0.0, 1.0);
    }

    let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 1.0, hi + 1.0) };
    let pad = (hi - lo) * AXIS_PADDING;
    ((lo - pad).floor(), (hi + pad).ceil())
}

/// Integer tick positions within [lo, hi], at most `max_ticks` of them
///
/// Steps are searched in the 1-2-5 sequence (1, 2, 5, 10, 20, 50, ...) and the
/// first step yielding no more than `max_ticks` ticks wins.
pub fn integer_ticks(lo: f64, hi: f64, max_ticks: usize) -> Vec<f64> {
    if !lo.is_finite() || !hi.is_finite() || max_ticks == 0 {
        return Vec::new();
    }
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let start = lo.ceil() as i64;
    let end = hi.floor() as i64;
    if start > end {
        return Vec::new();
    }

    let mut magnitude: i64 = 1;
    loop {
        for multiple in [1, 2, 5] {
            let step = multiple * magnitude;
            let first = start.div_euclid(step) + i64::from(start.rem_euclid(step) != 0);
            let last = end.div_euclid(step);
            let count = (last - first + 1).max(0) as usize;
            if count <= max_ticks {
                return (first..=last).map(|k| (k * step) as f64).collect();
            }
        }
        magnitude = match magnitude.checked_mul(10) {
            Some(m) => m,
            None => return vec![start as f64],
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_ticks_are_integers_within_bounds() {
        for (lo, hi) in [(0.0, 3.0), (-7.0, 12.0), (0.0, 137.0), (2.0, 2.0), (-0.4, 0.9)] {
            for max_ticks in [2, 5, 8] {
                let ticks = integer_ticks(lo, hi, max_ticks);
                assert!(!ticks.is_empty(), "{}..{}", lo, hi);
                assert!(ticks.len() <= max_ticks);
                assert!(ticks.iter().all(|t| t.fract() == 0.0 && *t >= lo && *t <= hi));
                assert!(ticks.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn test_integer_ticks_step_choice() {
        assert_eq!(integer_ticks(0.0, 3.0, 8), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(integer_ticks(0.0, 10.0, 8), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(integer_ticks(-3.0, 3.0, 4), vec![-2.0, 0.0, 2.0]);
        // No half-steps on a narrow range
        assert_eq!(integer_ticks(0.0, 1.0, 8), vec![0.0, 1.0]);
        assert!(integer_ticks(0.2, 0.8, 8).is_empty());
    }

    #[test]
    fn test_axis_range() {
        assert_eq!(axis_range([1.0, 3.0].into_iter()), (0.0, 4.0));
        assert_eq!(axis_range([5.0].into_iter()), (3.0, 7.0));
        assert_eq!(axis_range(std::iter::empty()), (0.0, 1.0));
        let (lo, hi) = axis_range([0.0, 100.0].into_iter());
        assert!(lo <= -5.0 && hi >= 105.0);
    }

    #[test]
    fn test_mesh_key_points_are_integers() {
        // Deaths from a small standings table: 0.5 .. 3.5 pads out to 0 .. 4
        let axis = IntegerAxis::fit([0.5, 1.0, 3.5].into_iter(), 8);
        assert_eq!(axis.range(), 0.0..4.0);
        assert_eq!(axis.key_points(100usize), vec![0.0, 1.0, 2.0, 3.0, 4.0]);

        // A mesh asking for fewer points still gets whole numbers
        let sparse = axis.key_points(2usize);
        assert!(sparse.len() <= 2 && !sparse.is_empty());
        assert!(sparse.iter().all(|t| t.fract() == 0.0));
    }

    #[test]
    fn test_max_ticks_caps_key_points() {
        let axis = IntegerAxis::new(0.0, 137.0, 5);
        let ticks = axis.key_points(usize::MAX);
        assert!(ticks.len() <= 5);
        assert_eq!(ticks, vec![0.0, 50.0, 100.0]);
    }

    #[test]
    fn test_mapping_matches_plain_f64_axis() {
        let axis = IntegerAxis::new(0.0, 10.0, 8);
        assert_eq!(axis.map(&0.0, (0, 100)), 0);
        assert_eq!(axis.map(&5.0, (0, 100)), 50);
        assert_eq!(axis.map(&10.0, (0, 100)), 100);
    }
}
