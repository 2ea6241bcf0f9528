//! Single intervals over the extended reals.
//!
//! Every bound is either open or closed; infinite bounds are always open. An
//! [`Interval`] is never empty: constructors return `None` instead.
use std::cmp::Ordering;
use std::f64::consts::{FRAC_PI_2, TAU};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

/// One end of an interval.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bound {
    pub value: f64,
    pub closed: bool,
}

impl Bound {
    #[inline]
    pub const fn closed(value: f64) -> Self {
        Self {
            value,
            closed: true,
        }
    }

    #[inline]
    pub const fn open(value: f64) -> Self {
        Self {
            value,
            closed: false,
        }
    }

    #[inline]
    fn normalized(self) -> Self {
        if self.value.is_infinite() {
            Self::open(self.value)
        } else {
            self
        }
    }

    /// The same point seen from the other side (used when complementing).
    #[inline]
    pub(crate) fn flipped(self) -> Self {
        Self {
            value: self.value,
            closed: !self.closed,
        }
    }
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Order lower bounds by where they start: at equal values a closed bound starts
/// before an open one.
pub(crate) fn lower_cmp(a: &Bound, b: &Bound) -> Ordering {
    cmp_f64(a.value, b.value).then_with(|| b.closed.cmp(&a.closed))
}

/// Order upper bounds by where they end: at equal values a closed bound ends
/// after an open one.
pub(crate) fn upper_cmp(a: &Bound, b: &Bound) -> Ordering {
    cmp_f64(a.value, b.value).then_with(|| a.closed.cmp(&b.closed))
}

fn lower_of<'a>(mut bounds: impl Iterator<Item = &'a Bound>) -> Option<Bound> {
    let first = *bounds.next()?;
    Some(bounds.fold(first, |acc, b| {
        if lower_cmp(b, &acc) == Ordering::Less {
            *b
        } else {
            acc
        }
    }))
}

fn upper_of<'a>(mut bounds: impl Iterator<Item = &'a Bound>) -> Option<Bound> {
    let first = *bounds.next()?;
    Some(bounds.fold(first, |acc, b| {
        if upper_cmp(b, &acc) == Ordering::Greater {
            *b
        } else {
            acc
        }
    }))
}

/// Round half toward positive infinity.
///
/// This is the tie-break used by every `round` in the solver. With it,
/// `floor(x) == round(x - 0.5)` holds for every real `x`.
#[inline]
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// A non-empty interval `lo .. hi`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interval {
    lo: Bound,
    hi: Bound,
}

impl Interval {
    /// Build an interval from two bounds, `None` if it would be empty.
    pub fn from_bounds(lo: Bound, hi: Bound) -> Option<Self> {
        let lo = lo.normalized();
        let hi = hi.normalized();
        if lo.value.is_nan() || hi.value.is_nan() {
            return None;
        }
        if lo.value == f64::INFINITY || hi.value == f64::NEG_INFINITY {
            return None;
        }
        match cmp_f64(lo.value, hi.value) {
            Ordering::Less => Some(Self { lo, hi }),
            Ordering::Equal if lo.closed && hi.closed => Some(Self { lo, hi }),
            _ => None,
        }
    }

    /// Closed interval `[lo, hi]`.
    #[inline]
    pub fn closed(lo: f64, hi: f64) -> Option<Self> {
        Self::from_bounds(Bound::closed(lo), Bound::closed(hi))
    }

    /// Open interval `(lo, hi)`.
    #[inline]
    pub fn open(lo: f64, hi: f64) -> Option<Self> {
        Self::from_bounds(Bound::open(lo), Bound::open(hi))
    }

    #[inline]
    pub fn singleton(value: f64) -> Option<Self> {
        Self::closed(value, value)
    }

    /// `[value, +∞)`
    #[inline]
    pub fn at_least(value: f64) -> Option<Self> {
        Self::from_bounds(Bound::closed(value), Bound::open(f64::INFINITY))
    }

    /// `(-∞, value]`
    #[inline]
    pub fn at_most(value: f64) -> Option<Self> {
        Self::from_bounds(Bound::open(f64::NEG_INFINITY), Bound::closed(value))
    }

    /// The whole real line.
    pub const fn unbounded() -> Self {
        Self {
            lo: Bound::open(f64::NEG_INFINITY),
            hi: Bound::open(f64::INFINITY),
        }
    }

    #[inline]
    pub fn lo(&self) -> Bound {
        self.lo
    }

    #[inline]
    pub fn hi(&self) -> Bound {
        self.hi
    }

    #[inline]
    pub fn min_elem(&self) -> f64 {
        self.lo.value
    }

    #[inline]
    pub fn max_elem(&self) -> f64 {
        self.hi.value
    }

    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.lo.value == self.hi.value
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.lo.value.is_finite() && self.hi.value.is_finite()
    }

    #[inline]
    pub fn is_unbounded(&self) -> bool {
        self.lo.value == f64::NEG_INFINITY && self.hi.value == f64::INFINITY
    }

    /// If this interval is the single integer `n`, return it.
    pub fn as_integer(&self) -> Option<i32> {
        let v = self.lo.value;
        if self.is_singleton() && v.fract() == 0.0 && v.abs() < i32::MAX as f64 {
            Some(v as i32)
        } else {
            None
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        let above = value > self.lo.value || (value == self.lo.value && self.lo.closed);
        let below = value < self.hi.value || (value == self.hi.value && self.hi.closed);
        above && below
    }

    pub fn is_subset_of(&self, other: &Interval) -> bool {
        lower_cmp(&other.lo, &self.lo) != Ordering::Greater
            && upper_cmp(&other.hi, &self.hi) != Ordering::Less
    }

    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        let lo = if lower_cmp(&self.lo, &other.lo) == Ordering::Less {
            other.lo
        } else {
            self.lo
        };
        let hi = if upper_cmp(&self.hi, &other.hi) == Ordering::Greater {
            other.hi
        } else {
            self.hi
        };
        Self::from_bounds(lo, hi)
    }

    /// Returns `true` if `other`, which must not start before `self`, overlaps
    /// or is adjacent to `self` so that their union is one interval.
    pub(crate) fn touches(&self, other: &Interval) -> bool {
        match cmp_f64(other.lo.value, self.hi.value) {
            Ordering::Less => true,
            Ordering::Equal => self.hi.closed || other.lo.closed,
            Ordering::Greater => false,
        }
    }

    /// Smallest interval containing both.
    pub fn hull(&self, other: &Interval) -> Interval {
        let lo = if lower_cmp(&other.lo, &self.lo) == Ordering::Less {
            other.lo
        } else {
            self.lo
        };
        let hi = if upper_cmp(&other.hi, &self.hi) == Ordering::Greater {
            other.hi
        } else {
            self.hi
        };
        Interval { lo, hi }
    }

    // ----- arithmetic --------------------------------------------------------

    pub fn add(&self, other: &Interval) -> Option<Interval> {
        Self::from_bounds(
            Bound {
                value: self.lo.value + other.lo.value,
                closed: self.lo.closed && other.lo.closed,
            },
            Bound {
                value: self.hi.value + other.hi.value,
                closed: self.hi.closed && other.hi.closed,
            },
        )
    }

    pub fn negate(&self) -> Interval {
        Interval {
            lo: Bound {
                value: -self.hi.value,
                closed: self.hi.closed,
            },
            hi: Bound {
                value: -self.lo.value,
                closed: self.lo.closed,
            },
        }
    }

    pub fn mul(&self, other: &Interval) -> Option<Interval> {
        fn corner(a: Bound, b: Bound) -> Bound {
            let a_zero = a.value == 0.0;
            let b_zero = b.value == 0.0;
            let value = if a_zero || b_zero { 0.0 } else { a.value * b.value };
            let closed = (a_zero && a.closed) || (b_zero && b.closed) || (a.closed && b.closed);
            Bound { value, closed }.normalized()
        }

        let corners = [
            corner(self.lo, other.lo),
            corner(self.lo, other.hi),
            corner(self.hi, other.lo),
            corner(self.hi, other.hi),
        ];
        Self::from_bounds(lower_of(corners.iter())?, upper_of(corners.iter())?)
    }

    /// Arithmetic inverse `1/x`. Zero is never part of the domain, so the result
    /// may split into two pieces or vanish.
    pub fn invert(&self) -> SmallVec<[Interval; 2]> {
        fn recip(b: Bound) -> Bound {
            if b.value.is_infinite() {
                Bound::open(0.0)
            } else {
                Bound {
                    value: 1.0 / b.value,
                    closed: b.closed,
                }
            }
        }

        let (lo, hi) = (self.lo, self.hi);
        let pieces: SmallVec<[Option<Interval>; 2]> = if lo.value == 0.0 && hi.value == 0.0 {
            smallvec![]
        } else if lo.value < 0.0 && hi.value > 0.0 {
            smallvec![
                Self::from_bounds(Bound::open(f64::NEG_INFINITY), recip(lo)),
                Self::from_bounds(recip(hi), Bound::open(f64::INFINITY)),
            ]
        } else if hi.value == 0.0 {
            smallvec![Self::from_bounds(Bound::open(f64::NEG_INFINITY), recip(lo))]
        } else if lo.value == 0.0 {
            smallvec![Self::from_bounds(recip(hi), Bound::open(f64::INFINITY))]
        } else {
            smallvec![Self::from_bounds(recip(hi), recip(lo))]
        };
        pieces.into_iter().flatten().collect()
    }

    /// Integer power.
    pub fn powi(&self, n: i32) -> SmallVec<[Interval; 2]> {
        fn raise(b: Bound, n: i32) -> Bound {
            Bound {
                value: b.value.powi(n),
                closed: b.closed,
            }
        }

        if n == 0 {
            return Self::singleton(1.0).into_iter().collect();
        }
        if n < 0 {
            return self
                .powi(-n)
                .iter()
                .flat_map(|piece| piece.invert())
                .collect();
        }

        let (lo, hi) = (self.lo, self.hi);
        let out = if n % 2 == 1 || lo.value >= 0.0 {
            Self::from_bounds(raise(lo, n), raise(hi, n))
        } else if hi.value <= 0.0 {
            Self::from_bounds(raise(hi, n), raise(lo, n))
        } else {
            let top = upper_of([raise(lo, n), raise(hi, n)].iter());
            top.and_then(|top| Self::from_bounds(Bound::closed(0.0), top))
        };
        out.into_iter().collect()
    }

    /// Real power `x^y`. Integral singleton exponents defer to [`Interval::powi`];
    /// otherwise only the non-negative part of the base is in the domain.
    pub fn pow(&self, exponent: &Interval) -> SmallVec<[Interval; 2]> {
        if let Some(n) = exponent.as_integer() {
            return self.powi(n);
        }
        let Some(base) = Self::at_least(0.0).and_then(|nn| self.intersect(&nn)) else {
            return smallvec![];
        };

        fn corner(b: Bound, e: Bound) -> Bound {
            Bound {
                value: b.value.powf(e.value),
                closed: b.closed && e.closed,
            }
            .normalized()
        }

        let corners = [
            corner(base.lo, exponent.lo),
            corner(base.lo, exponent.hi),
            corner(base.hi, exponent.lo),
            corner(base.hi, exponent.hi),
        ];
        match (lower_of(corners.iter()), upper_of(corners.iter())) {
            (Some(lo), Some(hi)) => Self::from_bounds(lo, hi).into_iter().collect(),
            _ => smallvec![],
        }
    }

    /// Lowest and highest integer reached by [`round_half_up`] over this interval.
    /// Infinite ends stay infinite.
    pub fn round_range(&self) -> Option<(f64, f64)> {
        let lo = round_half_up(self.lo.value);
        let mut hi = round_half_up(self.hi.value);
        if !self.hi.closed && self.hi.value.is_finite() && (self.hi.value + 0.5).fract() == 0.0 {
            hi -= 1.0;
        }
        (lo <= hi).then_some((lo, hi))
    }

    pub fn abs(&self) -> Interval {
        if self.lo.value >= 0.0 {
            return *self;
        }
        if self.hi.value <= 0.0 {
            return self.negate();
        }
        let neg_lo = Bound {
            value: -self.lo.value,
            closed: self.lo.closed,
        };
        let top = match upper_cmp(&neg_lo, &self.hi) {
            Ordering::Greater => neg_lo,
            _ => self.hi,
        };
        Interval {
            lo: Bound::closed(0.0),
            hi: top,
        }
    }

    /// Image of `sin` over this interval.
    pub fn sin(&self) -> Interval {
        let full = Interval {
            lo: Bound::closed(-1.0),
            hi: Bound::closed(1.0),
        };
        if !self.is_finite() || self.hi.value - self.lo.value >= TAU {
            return full;
        }

        let hits = |phase: f64| {
            let k = ((self.lo.value - phase) / TAU).ceil();
            phase + k * TAU <= self.hi.value
        };
        let (a, b) = (self.lo.value.sin(), self.hi.value.sin());
        let lo = if hits(-FRAC_PI_2) { -1.0 } else { a.min(b) };
        let hi = if hits(FRAC_PI_2) { 1.0 } else { a.max(b) };
        Interval {
            lo: Bound::closed(lo),
            hi: Bound::closed(hi),
        }
    }

    /// Natural logarithm over the positive part of this interval.
    pub fn ln(&self) -> Option<Interval> {
        if self.hi.value <= 0.0 {
            return None;
        }
        let lo = if self.lo.value <= 0.0 {
            Bound::open(f64::NEG_INFINITY)
        } else {
            Bound {
                value: self.lo.value.ln(),
                closed: self.lo.closed,
            }
        };
        let hi = Bound {
            value: self.hi.value.ln(),
            closed: self.hi.closed,
        };
        Self::from_bounds(lo, hi)
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_singleton() {
            return write!(f, "{{{}}}", self.lo.value);
        }
        write!(
            f,
            "{}{}, {}{}",
            if self.lo.closed { '[' } else { '(' },
            self.lo.value,
            self.hi.value,
            if self.hi.closed { ']' } else { ')' },
        )
    }
}
