//! Physical units.
//!
//! A [`Unit`] is a vector of exponents over the seven SI base dimensions plus a
//! scale multiplier relative to the coherent SI unit. Numeric sets always store
//! their values in base units (scale already applied), so two commensurable units
//! only differ in how values are rendered back to the user.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use enum_map::{Enum, EnumMap};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::utils::{SetError, SetResult};

/// The seven SI base dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Enum, EnumIter, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BaseDimension {
    Time,
    Length,
    Mass,
    Current,
    Temperature,
    Amount,
    Luminosity,
}

impl BaseDimension {
    /// SI symbol of the coherent base unit of this dimension.
    pub const fn symbol(self) -> &'static str {
        match self {
            BaseDimension::Time => "s",
            BaseDimension::Length => "m",
            BaseDimension::Mass => "kg",
            BaseDimension::Current => "A",
            BaseDimension::Temperature => "K",
            BaseDimension::Amount => "mol",
            BaseDimension::Luminosity => "cd",
        }
    }
}

/// Decimal SI prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Prefix {
    Pico,
    Nano,
    Micro,
    Milli,
    None,
    Kilo,
    Mega,
    Giga,
}

impl Prefix {
    pub const fn factor(self) -> f64 {
        match self {
            Prefix::Pico => 1e-12,
            Prefix::Nano => 1e-9,
            Prefix::Micro => 1e-6,
            Prefix::Milli => 1e-3,
            Prefix::None => 1.0,
            Prefix::Kilo => 1e3,
            Prefix::Mega => 1e6,
            Prefix::Giga => 1e9,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Prefix::Pico => "p",
            Prefix::Nano => "n",
            Prefix::Micro => "µ",
            Prefix::Milli => "m",
            Prefix::None => "",
            Prefix::Kilo => "k",
            Prefix::Mega => "M",
            Prefix::Giga => "G",
        }
    }
}

/// A physical unit: base-dimension exponents and a scale relative to SI.
///
/// Equality compares dimensions and scale only; the display symbol is cosmetic.
///
/// ```rust
/// # use ohmsets::units::{Prefix, Unit};
/// let kohm = Unit::ohm().with_prefix(Prefix::Kilo);
/// assert!(kohm.is_commensurable(&Unit::ohm()));
/// assert_eq!(kohm.to_base(4.7), 4700.0);
/// assert_eq!(format!("{}", kohm), "kΩ");
/// ```
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Unit {
    dims: EnumMap<BaseDimension, i8>,
    scale: f64,
    #[cfg_attr(feature = "serde", serde(skip))]
    symbol: Option<(Prefix, &'static str)>,
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.dims == other.dims && self.scale == other.scale
    }
}

impl Default for Unit {
    fn default() -> Self {
        Self::dimensionless()
    }
}

fn dims(exponents: &[(BaseDimension, i8)]) -> EnumMap<BaseDimension, i8> {
    let mut map = EnumMap::default();
    for &(dim, exp) in exponents {
        map[dim] += exp;
    }
    map
}

impl Unit {
    fn named(exponents: &[(BaseDimension, i8)], symbol: &'static str) -> Self {
        Self {
            dims: dims(exponents),
            scale: 1.0,
            symbol: Some((Prefix::None, symbol)),
        }
    }

    pub fn dimensionless() -> Self {
        Self {
            dims: EnumMap::default(),
            scale: 1.0,
            symbol: None,
        }
    }

    /// The coherent SI unit of a single base dimension.
    pub fn base(dimension: BaseDimension) -> Self {
        Self::named(&[(dimension, 1)], dimension.symbol())
    }

    pub fn second() -> Self {
        Self::base(BaseDimension::Time)
    }

    pub fn meter() -> Self {
        Self::base(BaseDimension::Length)
    }

    pub fn ampere() -> Self {
        Self::base(BaseDimension::Current)
    }

    pub fn kelvin() -> Self {
        Self::base(BaseDimension::Temperature)
    }

    pub fn hertz() -> Self {
        Self::named(&[(BaseDimension::Time, -1)], "Hz")
    }

    pub fn watt() -> Self {
        use BaseDimension::*;
        Self::named(&[(Mass, 1), (Length, 2), (Time, -3)], "W")
    }

    pub fn volt() -> Self {
        use BaseDimension::*;
        Self::named(&[(Mass, 1), (Length, 2), (Time, -3), (Current, -1)], "V")
    }

    pub fn ohm() -> Self {
        use BaseDimension::*;
        Self::named(&[(Mass, 1), (Length, 2), (Time, -3), (Current, -2)], "Ω")
    }

    pub fn farad() -> Self {
        use BaseDimension::*;
        Self::named(&[(Mass, -1), (Length, -2), (Time, 4), (Current, 2)], "F")
    }

    pub fn henry() -> Self {
        use BaseDimension::*;
        Self::named(&[(Mass, 1), (Length, 2), (Time, -2), (Current, -2)], "H")
    }

    /// Dimensionless unit scaled by 1/100.
    pub fn percent() -> Self {
        Self {
            dims: EnumMap::default(),
            scale: 0.01,
            symbol: Some((Prefix::None, "%")),
        }
    }

    /// Apply a decimal prefix. Prefixing an already prefixed or derived unit only
    /// changes its scale.
    pub fn with_prefix(self, prefix: Prefix) -> Self {
        let symbol = match self.symbol {
            Some((Prefix::None, symbol)) => Some((prefix, symbol)),
            _ => None,
        };
        Self {
            dims: self.dims,
            scale: self.scale * prefix.factor(),
            symbol,
        }
    }

    /// Exponent of `dimension` in this unit.
    #[inline]
    pub fn exponent(&self, dimension: BaseDimension) -> i8 {
        self.dims[dimension]
    }

    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Returns `true` if no base dimension has a non-zero exponent. Scaled
    /// dimensionless units such as `%` are dimensionless too.
    pub fn is_dimensionless(&self) -> bool {
        self.dims.values().all(|&e| e == 0)
    }

    /// Returns `true` if this unit is exactly the plain dimensionless unit.
    pub fn is_unit_one(&self) -> bool {
        self.is_dimensionless() && self.scale == 1.0
    }

    /// Two units are commensurable when they measure the same dimension.
    pub fn is_commensurable(&self, other: &Unit) -> bool {
        self.dims == other.dims
    }

    /// Convert a value expressed in this unit into base units.
    #[inline]
    pub fn to_base(&self, value: f64) -> f64 {
        value * self.scale
    }

    /// Convert a base-unit value into this unit.
    #[inline]
    pub fn from_base(&self, value: f64) -> f64 {
        value / self.scale
    }

    /// Same dimensions at scale one, carrying the symbol of a named SI unit when
    /// one matches.
    pub fn coherent(&self) -> Unit {
        let named = [
            Unit::hertz(),
            Unit::watt(),
            Unit::volt(),
            Unit::ohm(),
            Unit::farad(),
            Unit::henry(),
        ];
        BaseDimension::iter()
            .map(Unit::base)
            .chain(named)
            .find(|unit| unit.dims == self.dims)
            .unwrap_or(Unit {
                dims: self.dims,
                scale: 1.0,
                symbol: None,
            })
    }

    pub fn mul(&self, other: &Unit) -> SetResult<Unit> {
        self.combine(other, 1)
    }

    pub fn div(&self, other: &Unit) -> SetResult<Unit> {
        self.combine(other, -1)
    }

    /// Fails when a dimension exponent leaves the `i8` range.
    pub fn powi(&self, exponent: i32) -> SetResult<Unit> {
        if exponent == 1 {
            return Ok(*self);
        }
        let mut out = self.dims;
        for exp in out.values_mut() {
            *exp = self.checked_exponent((*exp as i32).checked_mul(exponent))?;
        }
        Ok(Unit {
            dims: out,
            scale: self.scale.powi(exponent),
            symbol: None,
        })
    }

    /// `self * other^sign`.
    fn combine(&self, other: &Unit, sign: i32) -> SetResult<Unit> {
        let mut out = self.dims;
        for (dim, exp) in other.dims.iter() {
            out[dim] = self.checked_exponent(Some(out[dim] as i32 + sign * *exp as i32))?;
        }
        Ok(Unit {
            dims: out,
            scale: self.scale * other.scale.powi(sign),
            symbol: None,
        })
    }

    fn checked_exponent(&self, exponent: Option<i32>) -> SetResult<i8> {
        exponent
            .and_then(|e| i8::try_from(e).ok())
            .filter(|e| *e != i8::MIN)
            .ok_or(SetError::ExponentOverflow { unit: *self })
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some((prefix, symbol)) = self.symbol {
            return write!(f, "{}{}", prefix.symbol(), symbol);
        }
        if self.scale != 1.0 {
            write!(f, "{}", self.scale)?;
        }
        let mut first = self.scale == 1.0;
        for dim in BaseDimension::iter() {
            let exp = self.dims[dim];
            if exp == 0 {
                continue;
            }
            if !first {
                write!(f, "·")?;
            }
            first = false;
            if exp == 1 {
                write!(f, "{}", dim.symbol())?;
            } else {
                write!(f, "{}^{}", dim.symbol(), exp)?;
            }
        }
        if first && self.scale == 1.0 {
            write!(f, "1")?;
        }
        Ok(())
    }
}
