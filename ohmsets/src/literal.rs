//! The tagged literal type the solver stores in its graph.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{Display, EnumDiscriminants, EnumIs, EnumTryAs};

use crate::{
    discrete::{BoolSet, EnumSet, StringSet},
    numbers::Numbers,
    quantity::QuantitySet,
    units::Unit,
    utils::{SetError, SetResult},
};

/// A set of values of one kind.
///
/// Set operations are only defined between literals of the same kind; mixing
/// kinds is a [`SetError::DomainMismatch`].
///
/// ```rust
/// # use ohmsets::prelude::*;
/// let a = Literal::interval(0.0, 10.0, Unit::volt());
/// let b = Literal::interval(5.0, 20.0, Unit::volt());
/// let both = a.intersection(&b).unwrap();
/// assert_eq!(format!("{}", both), "[5, 10] V");
/// assert!(a.union(&Literal::truth()).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, EnumIs, EnumTryAs, EnumDiscriminants)]
#[strum_discriminants(name(LiteralKind), derive(Display, Hash))]
#[cfg_attr(feature = "serde", strum_discriminants(derive(Serialize, Deserialize)))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Literal {
    Numeric(QuantitySet),
    Boolean(BoolSet),
    Enum(EnumSet),
    Text(StringSet),
}

/// A single element extracted from a literal.
#[derive(Debug, Clone, PartialEq, EnumIs, EnumTryAs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    Number(f64),
    Boolean(bool),
    Enum(String),
    Text(String),
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Enum(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{:?}", v),
        }
    }
}

macro_rules! same_kind {
    ($lhs:expr, $rhs:expr, |$a:ident, $b:ident| numeric => $num:expr, boolean => $bool:expr, enumeration => $en:expr, text => $text:expr $(,)?) => {
        match ($lhs, $rhs) {
            (Literal::Numeric($a), Literal::Numeric($b)) => $num,
            (Literal::Boolean($a), Literal::Boolean($b)) => $bool,
            (Literal::Enum($a), Literal::Enum($b)) => $en,
            (Literal::Text($a), Literal::Text($b)) => $text,
            (l, r) => Err(SetError::DomainMismatch {
                left: l.kind(),
                right: r.kind(),
            }),
        }
    };
}

impl Literal {
    /// Dimensionless single number.
    pub fn number(value: f64) -> Self {
        Self::Numeric(QuantitySet::plain(Numbers::singleton(value)))
    }

    pub fn quantity(value: f64, unit: Unit) -> Self {
        Self::Numeric(QuantitySet::singleton(value, unit))
    }

    /// Closed interval `[lo, hi]` in `unit`.
    pub fn interval(lo: f64, hi: f64, unit: Unit) -> Self {
        Self::Numeric(QuantitySet::interval(lo, hi, unit))
    }

    pub fn numbers(numbers: Numbers, unit: Unit) -> Self {
        Self::Numeric(QuantitySet::new(numbers, unit))
    }

    pub fn bool(value: bool) -> Self {
        Self::Boolean(BoolSet::of(value))
    }

    /// The literal `{true}`.
    pub fn truth() -> Self {
        Self::bool(true)
    }

    pub fn text<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::Text(StringSet::of(values))
    }

    #[inline]
    pub fn kind(&self) -> LiteralKind {
        LiteralKind::from(self)
    }

    /// Returns `true` for exactly `{true}`.
    pub fn is_true(&self) -> bool {
        matches!(self, Literal::Boolean(b) if *b == BoolSet::TRUE)
    }

    pub fn is_false(&self) -> bool {
        matches!(self, Literal::Boolean(b) if *b == BoolSet::FALSE)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Literal::Numeric(q) => q.is_empty(),
            Literal::Boolean(b) => b.is_empty(),
            Literal::Enum(e) => e.is_empty(),
            Literal::Text(s) => s.is_empty(),
        }
    }

    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.single().is_some()
    }

    /// The only element of this literal, in base units for numbers.
    pub fn single(&self) -> Option<Value> {
        match self {
            Literal::Numeric(q) => q.single().map(Value::Number),
            Literal::Boolean(b) => b.single().map(Value::Boolean),
            Literal::Enum(e) => e.single().map(|v| Value::Enum(v.to_string())),
            Literal::Text(s) => s.single().map(|v| Value::Text(v.to_string())),
        }
    }

    /// Unit of a numeric literal.
    pub fn unit(&self) -> Option<&Unit> {
        self.try_as_numeric_ref().map(QuantitySet::unit)
    }

    pub fn union(&self, other: &Literal) -> SetResult<Literal> {
        same_kind!(self, other, |a, b|
            numeric => a.union(b).map(Literal::Numeric),
            boolean => Ok(Literal::Boolean(a.union(*b))),
            enumeration => a.union(b).map(Literal::Enum),
            text => Ok(Literal::Text(a.union(b))),
        )
    }

    pub fn intersection(&self, other: &Literal) -> SetResult<Literal> {
        same_kind!(self, other, |a, b|
            numeric => a.intersection(b).map(Literal::Numeric),
            boolean => Ok(Literal::Boolean(a.intersection(*b))),
            enumeration => a.intersection(b).map(Literal::Enum),
            text => Ok(Literal::Text(a.intersection(b))),
        )
    }

    pub fn difference(&self, other: &Literal) -> SetResult<Literal> {
        same_kind!(self, other, |a, b|
            numeric => a.difference(b).map(Literal::Numeric),
            boolean => Ok(Literal::Boolean(a.difference(*b))),
            enumeration => a.difference(b).map(Literal::Enum),
            text => Ok(Literal::Text(a.difference(b))),
        )
    }

    pub fn symmetric_difference(&self, other: &Literal) -> SetResult<Literal> {
        same_kind!(self, other, |a, b|
            numeric => a.symmetric_difference(b).map(Literal::Numeric),
            boolean => Ok(Literal::Boolean(a.symmetric_difference(*b))),
            enumeration => a.symmetric_difference(b).map(Literal::Enum),
            text => Ok(Literal::Text(a.symmetric_difference(b))),
        )
    }

    pub fn is_subset_of(&self, other: &Literal) -> SetResult<bool> {
        same_kind!(self, other, |a, b|
            numeric => a.is_subset_of(b),
            boolean => Ok(b.contains(*a)),
            enumeration => a.is_subset_of(b),
            text => Ok(a.is_subset_of(b)),
        )
    }

    #[inline]
    pub fn is_superset_of(&self, other: &Literal) -> SetResult<bool> {
        other.is_subset_of(self)
    }
}

impl From<QuantitySet> for Literal {
    fn from(value: QuantitySet) -> Self {
        Literal::Numeric(value)
    }
}

impl From<BoolSet> for Literal {
    fn from(value: BoolSet) -> Self {
        Literal::Boolean(value)
    }
}

impl From<EnumSet> for Literal {
    fn from(value: EnumSet) -> Self {
        Literal::Enum(value)
    }
}

impl From<StringSet> for Literal {
    fn from(value: StringSet) -> Self {
        Literal::Text(value)
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Numeric(q) => write!(f, "{}", q),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Enum(e) => write!(f, "{}", e),
            Literal::Text(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_do_not_mix() {
        let err = Literal::number(1.0).union(&Literal::truth()).unwrap_err();
        assert_eq!(
            err,
            SetError::DomainMismatch {
                left: LiteralKind::Numeric,
                right: LiteralKind::Boolean,
            }
        );
        assert_eq!(format!("{}", LiteralKind::Text), "Text");
    }

    #[test]
    fn singletons() {
        assert_eq!(Literal::number(3.0).single(), Some(Value::Number(3.0)));
        assert_eq!(Literal::truth().single(), Some(Value::Boolean(true)));
        assert!(!Literal::Boolean(BoolSet::all()).is_singleton());
        assert!(Literal::text(["x"]).is_singleton());
    }

    #[test]
    fn subset_checks() {
        let narrow = Literal::interval(1.0, 2.0, Unit::ohm());
        let wide = Literal::interval(0.0, 5.0, Unit::ohm());
        assert!(narrow.is_subset_of(&wide).unwrap());
        assert!(!wide.is_subset_of(&narrow).unwrap());
        assert!(Literal::truth().is_subset_of(&Literal::Boolean(BoolSet::all())).unwrap());
    }

    #[test]
    fn empty_literals() {
        let a = Literal::interval(0.0, 1.0, Unit::dimensionless());
        let b = Literal::interval(2.0, 3.0, Unit::dimensionless());
        assert!(a.intersection(&b).unwrap().is_empty());
        assert!(Literal::Boolean(BoolSet::empty()).is_empty());
    }
}
