use strum::{EnumIs, EnumTryAs};
use thiserror::Error;

use crate::{literal::LiteralKind, units::Unit};

#[derive(Debug, Clone, PartialEq, EnumIs, EnumTryAs, Error)]
pub enum SetError {
    /// Two numeric sets measure different physical dimensions.
    #[error(
        "Cannot combine quantities in `{left}` and `{right}`: the units are not commensurable."
    )]
    UnitMismatch { left: Unit, right: Unit },

    /// Literals of different kinds cannot be combined by set operations.
    #[error("Set operations between a `{left}` literal and a `{right}` literal are undefined.")]
    DomainMismatch { left: LiteralKind, right: LiteralKind },

    /// The operation needs at least one element but the set is empty.
    #[error("Cannot take the {what} of an empty set.")]
    Empty { what: &'static str },

    /// Two enum sets belong to different enumerations.
    #[error("Enum set over `{left}` cannot be combined with enum set over `{right}`.")]
    EnumMismatch { left: String, right: String },

    /// An operation was applied to a literal kind that does not support it.
    #[error("Operation `{op}` is not supported on `{kind}` literals.")]
    Unsupported { op: &'static str, kind: LiteralKind },

    /// A function that requires a dimensionless argument received a quantity.
    #[error("Operation `{op}` requires a dimensionless operand, got a quantity in `{unit}`.")]
    NotDimensionless { op: &'static str, unit: Unit },

    /// A product or power of units pushed a dimension exponent out of range.
    #[error("Dimension exponents of `{unit}` overflow in this product or power.")]
    ExponentOverflow { unit: Unit },
}

pub type SetResult<T> = Result<T, SetError>;
