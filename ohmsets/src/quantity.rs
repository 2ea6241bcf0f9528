//! Numeric sets carrying a physical unit.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    numbers::Numbers,
    units::Unit,
    utils::{SetError, SetResult},
};

/// A set of quantities. Values are stored in base units; `unit` only decides
/// how the set is rendered and which other sets it may be combined with.
///
/// Equality is semantic: the same base values in commensurable units are equal.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuantitySet {
    numbers: Numbers,
    unit: Unit,
}

impl PartialEq for QuantitySet {
    fn eq(&self, other: &Self) -> bool {
        self.unit.is_commensurable(&other.unit) && self.numbers == other.numbers
    }
}

impl QuantitySet {
    /// Wrap values given in `unit`.
    pub fn new(numbers: Numbers, unit: Unit) -> Self {
        Self {
            numbers: numbers.scale(unit.scale()),
            unit,
        }
    }

    /// Wrap values already expressed in base units.
    pub fn from_base(numbers: Numbers, unit: Unit) -> Self {
        Self { numbers, unit }
    }

    /// Dimensionless set.
    pub fn plain(numbers: Numbers) -> Self {
        Self::from_base(numbers, Unit::dimensionless())
    }

    /// `[lo, hi]` in `unit`.
    pub fn interval(lo: f64, hi: f64, unit: Unit) -> Self {
        Self::new(Numbers::closed(lo, hi), unit)
    }

    pub fn singleton(value: f64, unit: Unit) -> Self {
        Self::new(Numbers::singleton(value), unit)
    }

    pub fn unbounded(unit: Unit) -> Self {
        Self::from_base(Numbers::unbounded(), unit)
    }

    pub fn empty(unit: Unit) -> Self {
        Self::from_base(Numbers::empty(), unit)
    }

    /// Values in base units.
    #[inline]
    pub fn numbers(&self) -> &Numbers {
        &self.numbers
    }

    #[inline]
    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    /// Values converted back into the display unit.
    pub fn base_to_units(&self) -> Numbers {
        self.numbers.unscale(self.unit.scale())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.numbers.is_singleton()
    }

    /// The only element, in base units.
    #[inline]
    pub fn single(&self) -> Option<f64> {
        self.numbers.single()
    }

    #[inline]
    pub fn is_dimensionless(&self) -> bool {
        self.unit.is_dimensionless()
    }

    /// Render the same values in another commensurable unit.
    pub fn with_unit(&self, unit: Unit) -> SetResult<Self> {
        if !self.unit.is_commensurable(&unit) {
            return Err(SetError::UnitMismatch {
                left: self.unit,
                right: unit,
            });
        }
        Ok(Self::from_base(self.numbers.clone(), unit))
    }

    /// Base-unit values with the unit stripped.
    pub fn to_dimensionless(&self) -> Self {
        Self::plain(self.numbers.clone())
    }

    /// Smallest element in base units.
    pub fn min_elem(&self) -> SetResult<f64> {
        self.numbers
            .min_elem()
            .ok_or(SetError::Empty { what: "minimum" })
    }

    /// Largest element in base units.
    pub fn max_elem(&self) -> SetResult<f64> {
        self.numbers
            .max_elem()
            .ok_or(SetError::Empty { what: "maximum" })
    }

    /// Same values, rendered in the coherent SI unit of the dimension.
    pub fn in_base_unit(&self) -> Self {
        Self::from_base(self.numbers.clone(), self.unit.coherent())
    }

    fn check(&self, other: &QuantitySet) -> SetResult<()> {
        if self.unit.is_commensurable(&other.unit) {
            Ok(())
        } else {
            Err(SetError::UnitMismatch {
                left: self.unit,
                right: other.unit,
            })
        }
    }

    fn require_dimensionless(&self, op: &'static str) -> SetResult<()> {
        if self.is_dimensionless() {
            Ok(())
        } else {
            Err(SetError::NotDimensionless {
                op,
                unit: self.unit,
            })
        }
    }

    fn with_numbers(&self, numbers: Numbers) -> Self {
        Self::from_base(numbers, self.unit)
    }

    // ----- set algebra -------------------------------------------------------

    pub fn union(&self, other: &QuantitySet) -> SetResult<Self> {
        self.check(other)?;
        Ok(self.with_numbers(self.numbers.union(&other.numbers)))
    }

    pub fn intersection(&self, other: &QuantitySet) -> SetResult<Self> {
        self.check(other)?;
        Ok(self.with_numbers(self.numbers.intersection(&other.numbers)))
    }

    pub fn difference(&self, other: &QuantitySet) -> SetResult<Self> {
        self.check(other)?;
        Ok(self.with_numbers(self.numbers.difference(&other.numbers)))
    }

    pub fn symmetric_difference(&self, other: &QuantitySet) -> SetResult<Self> {
        self.check(other)?;
        Ok(self.with_numbers(self.numbers.symmetric_difference(&other.numbers)))
    }

    pub fn is_subset_of(&self, other: &QuantitySet) -> SetResult<bool> {
        self.check(other)?;
        Ok(self.numbers.is_subset_of(&other.numbers))
    }

    // ----- arithmetic --------------------------------------------------------

    pub fn add(&self, other: &QuantitySet) -> SetResult<Self> {
        self.check(other)?;
        Ok(self.with_numbers(self.numbers.add(&other.numbers)))
    }

    pub fn negate(&self) -> Self {
        self.with_numbers(self.numbers.negate())
    }

    pub fn mul(&self, other: &QuantitySet) -> SetResult<Self> {
        Ok(Self::from_base(
            self.numbers.mul(&other.numbers),
            self.unit.mul(&other.unit)?.coherent(),
        ))
    }

    pub fn invert(&self) -> SetResult<Self> {
        Ok(Self::from_base(self.numbers.invert(), self.unit.powi(-1)?.coherent()))
    }

    /// `self ^ exponent`. The exponent must be dimensionless; a dimensioned base
    /// additionally needs a single integer exponent so the result has a unit.
    pub fn pow(&self, exponent: &QuantitySet) -> SetResult<Self> {
        exponent.require_dimensionless("pow")?;
        let numbers = self.numbers.pow(&exponent.numbers);
        if self.is_dimensionless() {
            return Ok(Self::plain(numbers));
        }
        match exponent.single() {
            Some(n) if n.fract() == 0.0 && n.abs() <= i8::MAX as f64 => Ok(Self::from_base(
                numbers,
                self.unit.powi(n as i32)?.coherent(),
            )),
            _ => Err(SetError::NotDimensionless {
                op: "pow",
                unit: self.unit,
            }),
        }
    }

    /// Round half up, in base units.
    pub fn round(&self) -> Self {
        self.with_numbers(self.numbers.round())
    }

    pub fn abs(&self) -> Self {
        self.with_numbers(self.numbers.abs())
    }

    pub fn sin(&self) -> SetResult<Self> {
        self.require_dimensionless("sin")?;
        Ok(Self::plain(self.numbers.sin()))
    }

    pub fn ln(&self) -> SetResult<Self> {
        self.require_dimensionless("log")?;
        Ok(Self::plain(self.numbers.ln()))
    }
}

impl std::fmt::Display for QuantitySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.unit.is_unit_one() {
            write!(f, "{}", self.numbers)
        } else {
            write!(f, "{} {}", self.base_to_units(), self.unit)
        }
    }
}
