//! Finite unions of disjoint intervals.
use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::interval::{Bound, Interval, lower_cmp, upper_cmp};

/// Past this many interval pairs, binary arithmetic works on hulls instead.
const MAX_PAIRS: usize = 64;

/// Rounding a range spanning more integers than this yields the hull instead of
/// the individual integers.
const MAX_DISCRETE: f64 = 64.0;

/// A set of reals stored as sorted, disjoint, non-adjacent intervals.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Numbers {
    intervals: SmallVec<[Interval; 2]>,
}

impl Numbers {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn unbounded() -> Self {
        Self::from_interval(Interval::unbounded())
    }

    pub fn from_interval(interval: Interval) -> Self {
        let mut intervals = SmallVec::new();
        intervals.push(interval);
        Self { intervals }
    }

    /// `[lo, hi]`, empty when `lo > hi`.
    pub fn closed(lo: f64, hi: f64) -> Self {
        Self::from_intervals(Interval::closed(lo, hi))
    }

    pub fn singleton(value: f64) -> Self {
        Self::from_intervals(Interval::singleton(value))
    }

    pub fn at_least(value: f64) -> Self {
        Self::from_intervals(Interval::at_least(value))
    }

    pub fn at_most(value: f64) -> Self {
        Self::from_intervals(Interval::at_most(value))
    }

    /// Normalize an arbitrary collection of intervals: sort, then merge every
    /// overlapping or touching pair.
    pub fn from_intervals(intervals: impl IntoIterator<Item = Interval>) -> Self {
        let mut sorted: SmallVec<[Interval; 4]> = intervals.into_iter().collect();
        sorted.sort_by(|a, b| lower_cmp(&a.lo(), &b.lo()));

        let mut out: SmallVec<[Interval; 2]> = SmallVec::new();
        for interval in sorted {
            match out.last_mut() {
                Some(last) if last.touches(&interval) => *last = last.hull(&interval),
                _ => out.push(interval),
            }
        }
        Self { intervals: out }
    }

    #[inline]
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self.intervals.as_slice(), [only] if only.is_unbounded())
    }

    pub fn is_singleton(&self) -> bool {
        matches!(self.intervals.as_slice(), [only] if only.is_singleton())
    }

    /// The only element, if this set has exactly one.
    pub fn single(&self) -> Option<f64> {
        self.is_singleton().then(|| self.intervals[0].min_elem())
    }

    pub fn min_elem(&self) -> Option<f64> {
        self.intervals.first().map(Interval::min_elem)
    }

    pub fn max_elem(&self) -> Option<f64> {
        self.intervals.last().map(Interval::max_elem)
    }

    pub fn hull(&self) -> Option<Interval> {
        let first = self.intervals.first()?;
        let last = self.intervals.last()?;
        Some(first.hull(last))
    }

    pub fn contains(&self, value: f64) -> bool {
        self.intervals.iter().any(|i| i.contains(value))
    }

    /// The element nearest to `target`. For open bounds this is the bound itself.
    pub fn closest_elem(&self, target: f64) -> Option<f64> {
        self.intervals
            .iter()
            .map(|i| {
                if i.contains(target) {
                    target
                } else if target < i.min_elem() {
                    i.min_elem()
                } else {
                    i.max_elem()
                }
            })
            .min_by(|a, b| {
                (a - target)
                    .abs()
                    .partial_cmp(&(b - target).abs())
                    .unwrap_or(Ordering::Equal)
            })
    }

    // ----- set algebra -------------------------------------------------------

    pub fn union(&self, other: &Numbers) -> Numbers {
        Self::from_intervals(self.intervals.iter().chain(other.intervals.iter()).copied())
    }

    pub fn intersection(&self, other: &Numbers) -> Numbers {
        let mut out: SmallVec<[Interval; 4]> = SmallVec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.intervals.len() && j < other.intervals.len() {
            let (a, b) = (&self.intervals[i], &other.intervals[j]);
            if let Some(both) = a.intersect(b) {
                out.push(both);
            }
            // advance whichever ends first
            if upper_cmp(&a.hi(), &b.hi()) == Ordering::Less {
                i += 1;
            } else {
                j += 1;
            }
        }
        Self::from_intervals(out)
    }

    pub fn complement(&self) -> Numbers {
        let mut out: SmallVec<[Interval; 4]> = SmallVec::new();
        let mut cursor = Bound::open(f64::NEG_INFINITY);
        for interval in &self.intervals {
            if let Some(gap) = Interval::from_bounds(cursor, interval.lo().flipped()) {
                out.push(gap);
            }
            cursor = interval.hi().flipped();
        }
        if let Some(gap) = Interval::from_bounds(cursor, Bound::open(f64::INFINITY)) {
            out.push(gap);
        }
        Self::from_intervals(out)
    }

    pub fn difference(&self, other: &Numbers) -> Numbers {
        self.intersection(&other.complement())
    }

    pub fn symmetric_difference(&self, other: &Numbers) -> Numbers {
        self.difference(other).union(&other.difference(self))
    }

    pub fn is_subset_of(&self, other: &Numbers) -> bool {
        self.intervals
            .iter()
            .all(|a| other.intervals.iter().any(|b| a.is_subset_of(b)))
    }

    #[inline]
    pub fn is_superset_of(&self, other: &Numbers) -> bool {
        other.is_subset_of(self)
    }

    pub fn is_disjoint(&self, other: &Numbers) -> bool {
        self.intersection(other).is_empty()
    }

    // ----- arithmetic --------------------------------------------------------

    fn map_increasing(&self, f: impl Fn(f64) -> f64) -> Numbers {
        Self::from_intervals(self.intervals.iter().filter_map(|i| {
            let (lo, hi) = (i.lo(), i.hi());
            Interval::from_bounds(
                Bound {
                    value: f(lo.value),
                    closed: lo.closed,
                },
                Bound {
                    value: f(hi.value),
                    closed: hi.closed,
                },
            )
        }))
    }

    /// Multiply every element by a positive `factor`.
    pub fn scale(&self, factor: f64) -> Numbers {
        if factor == 1.0 {
            return self.clone();
        }
        self.map_increasing(|v| v * factor)
    }

    /// Divide every element by a positive `divisor`.
    pub fn unscale(&self, divisor: f64) -> Numbers {
        if divisor == 1.0 {
            return self.clone();
        }
        self.map_increasing(|v| v / divisor)
    }

    fn pairwise<F>(&self, other: &Numbers, f: F) -> Numbers
    where
        F: Fn(&Interval, &Interval) -> SmallVec<[Interval; 2]>,
    {
        if self.is_empty() || other.is_empty() {
            return Numbers::empty();
        }
        if self.intervals.len() * other.intervals.len() > MAX_PAIRS {
            return match (self.hull(), other.hull()) {
                (Some(a), Some(b)) => Self::from_intervals(f(&a, &b)),
                _ => Numbers::empty(),
            };
        }
        Self::from_intervals(
            self.intervals
                .iter()
                .flat_map(|a| other.intervals.iter().flat_map(|b| f(a, b)))
                .collect::<SmallVec<[Interval; 4]>>(),
        )
    }

    fn map<F>(&self, f: F) -> Numbers
    where
        F: Fn(&Interval) -> SmallVec<[Interval; 2]>,
    {
        Self::from_intervals(
            self.intervals
                .iter()
                .flat_map(f)
                .collect::<SmallVec<[Interval; 4]>>(),
        )
    }

    pub fn add(&self, other: &Numbers) -> Numbers {
        self.pairwise(other, |a, b| a.add(b).into_iter().collect())
    }

    pub fn negate(&self) -> Numbers {
        self.map(|a| SmallVec::from_elem(a.negate(), 1))
    }

    pub fn subtract(&self, other: &Numbers) -> Numbers {
        self.add(&other.negate())
    }

    pub fn mul(&self, other: &Numbers) -> Numbers {
        self.pairwise(other, |a, b| a.mul(b).into_iter().collect())
    }

    pub fn invert(&self) -> Numbers {
        self.map(Interval::invert)
    }

    pub fn div(&self, other: &Numbers) -> Numbers {
        self.mul(&other.invert())
    }

    pub fn pow(&self, exponent: &Numbers) -> Numbers {
        self.pairwise(exponent, |a, b| a.pow(b))
    }

    /// Round half toward positive infinity, element-wise.
    pub fn round(&self) -> Numbers {
        self.map(|a| {
            let Some((lo, hi)) = a.round_range() else {
                return SmallVec::new();
            };
            if lo.is_finite() && hi.is_finite() && hi - lo < MAX_DISCRETE {
                let count = (hi - lo) as usize + 1;
                (0..count)
                    .filter_map(|k| Interval::singleton(lo + k as f64))
                    .collect()
            } else {
                Interval::closed(lo, hi).into_iter().collect()
            }
        })
    }

    pub fn abs(&self) -> Numbers {
        self.map(|a| SmallVec::from_elem(a.abs(), 1))
    }

    pub fn sin(&self) -> Numbers {
        self.map(|a| SmallVec::from_elem(a.sin(), 1))
    }

    pub fn ln(&self) -> Numbers {
        self.map(|a| a.ln().into_iter().collect())
    }
}

impl From<Interval> for Numbers {
    fn from(interval: Interval) -> Self {
        Self::from_interval(interval)
    }
}

impl std::fmt::Display for Numbers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "∅");
        }
        for (index, interval) in self.intervals.iter().enumerate() {
            if index > 0 {
                write!(f, " ∪ ")?;
            }
            write!(f, "{}", interval)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_intervals_merge() {
        let n = Numbers::closed(0.0, 1.0).union(&Numbers::closed(1.0, 2.0));
        assert_eq!(n, Numbers::closed(0.0, 2.0));

        let open = Interval::open(2.0, 3.0).unwrap();
        let gap = Numbers::closed(0.0, 1.0).union(&open.into());
        assert_eq!(gap.intervals().len(), 2);
        assert_eq!(format!("{}", gap), "[0, 1] ∪ (2, 3)");
    }

    #[test]
    fn complement_round_trips() {
        let n = Numbers::closed(1.0, 4.0).union(&Numbers::singleton(6.0));
        let c = n.complement();
        assert!(!c.contains(1.0));
        assert!(c.contains(5.0));
        assert!(!c.contains(6.0));
        assert_eq!(c.complement(), n);
        assert_eq!(Numbers::unbounded().complement(), Numbers::empty());
    }

    #[test]
    fn symmetric_difference_of_overlap() {
        let a = Numbers::closed(0.0, 2.0);
        let b = Numbers::closed(1.0, 3.0);
        let x = a.symmetric_difference(&b);
        assert!(x.contains(0.5));
        assert!(!x.contains(1.5));
        assert!(x.contains(2.5));
        assert!(!x.contains(1.0));
    }

    #[test]
    fn division_by_range_through_zero() {
        let q = Numbers::singleton(1.0).div(&Numbers::closed(-1.0, 1.0));
        assert!(q.contains(5.0));
        assert!(q.contains(-5.0));
        assert!(!q.contains(0.5));
    }

    #[test]
    fn rounding_small_ranges_is_discrete() {
        let r = Numbers::closed(0.6, 2.2).round();
        assert_eq!(r.intervals().len(), 2);
        assert_eq!(r.min_elem(), Some(1.0));
        assert_eq!(r.max_elem(), Some(2.0));
        assert!(!r.contains(1.5));

        let wide = Numbers::closed(0.0, 1000.0).round();
        assert_eq!(wide, Numbers::closed(0.0, 1000.0));
    }

    #[test]
    fn closest_element() {
        let n = Numbers::closed(1.0, 2.0).union(&Numbers::closed(5.0, 6.0));
        assert_eq!(n.closest_elem(4.0), Some(5.0));
        assert_eq!(n.closest_elem(1.5), Some(1.5));
        assert_eq!(Numbers::empty().closest_elem(0.0), None);
    }
}
