//! Value sets for the ohm parameter solver.
//!
//! Everything here is a pure value type: numeric interval unions with units,
//! boolean sets, enumeration subsets and string sets, unified as [`Literal`].
pub mod discrete;
pub mod interval;
pub mod literal;
pub mod numbers;
pub mod quantity;
pub mod units;
pub mod utils;

pub use literal::{Literal, LiteralKind, Value};
pub use utils::{SetError, SetResult};

pub mod prelude {
    pub use crate::discrete::{BoolSet, EnumDomain, EnumSet, StringSet};
    pub use crate::interval::{Bound, Interval};
    pub use crate::literal::{Literal, LiteralKind, Value};
    pub use crate::numbers::Numbers;
    pub use crate::quantity::QuantitySet;
    pub use crate::units::{BaseDimension, Prefix, Unit};
    pub use crate::utils::{SetError, SetResult};
}
