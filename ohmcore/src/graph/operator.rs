use bitflags::bitflags;
use strum::{Display, EnumIs, EnumIter, IntoEnumIterator};

bitflags! {
    /// Static properties of an [`Operator`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OperatorFlags: u32 {
        /// Boolean valued; the expression may carry a must-hold flag.
        const PREDICATE = 1 << 0;

        /// Operand order does not matter.
        const COMMUTATIVE = 1 << 1;

        /// Nested applications of the operator may be flattened into one.
        const ASSOCIATIVE = 1 << 2;

        /// Repeating an operand does not change the result.
        const IDEMPOTENT = 1 << 3;

        /// Part of the canonical basis every pass reduces towards.
        const CANONICAL = 1 << 4;

        const ARITHMETIC = 1 << 5;
        const LOGIC = 1 << 6;
        const SET = 1 << 7;

        /// Relational predicate comparing two values.
        const RELATION = 1 << 8;
    }
}

/// Number of operands an operator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "exactly {}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

/// Every operator an expression may carry, canonical or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIs, EnumIter)]
pub enum Operator {
    // Canonical basis
    Add,
    Multiply,
    Power,
    Round,
    Abs,
    Sin,
    Log,
    Or,
    Not,
    Union,
    SymmetricDifference,
    GreaterOrEqual,
    IsSubset,
    Is,

    // Rewritten into the basis
    Subtract,
    Divide,
    And,
    Implies,
    Xor,
    LessOrEqual,
    LessThan,
    GreaterThan,
    IsSuperset,
    Floor,
    Ceil,
    Cos,
    Sqrt,
    Min,
    Max,
    Intersection,
    Difference,

    // No canonical encoding
    Cardinality,
    Differentiate,
    Integrate,
}

impl Operator {
    pub fn flags(self) -> OperatorFlags {
        use Operator::*;
        use OperatorFlags as F;

        let arithmetic = F::ARITHMETIC;
        let relation = F::PREDICATE.union(F::RELATION);
        let logic = F::PREDICATE.union(F::LOGIC);
        let monoid = F::COMMUTATIVE.union(F::ASSOCIATIVE);

        let flags = match self {
            Add | Multiply => arithmetic | monoid,
            Power | Round | Abs | Sin | Log => arithmetic,
            Or => logic | monoid | F::IDEMPOTENT,
            Not => logic,
            Union => F::SET | monoid | F::IDEMPOTENT,
            SymmetricDifference => F::SET | F::COMMUTATIVE,
            GreaterOrEqual | IsSubset => relation,
            Is => relation | F::COMMUTATIVE,

            Subtract | Divide | Floor | Ceil | Cos | Sqrt => arithmetic,
            Min | Max => arithmetic | F::COMMUTATIVE | F::IDEMPOTENT,
            And => logic | monoid | F::IDEMPOTENT,
            Xor => logic | F::COMMUTATIVE,
            Implies => logic,
            LessOrEqual | LessThan | GreaterThan | IsSuperset => relation,
            Intersection => F::SET | monoid | F::IDEMPOTENT,
            Difference => F::SET,
            Cardinality => F::SET | arithmetic,
            Differentiate | Integrate => arithmetic,
        };

        if matches!(
            self,
            Add | Multiply
                | Power
                | Round
                | Abs
                | Sin
                | Log
                | Or
                | Not
                | Union
                | SymmetricDifference
                | GreaterOrEqual
                | IsSubset
                | Is
        ) {
            flags | F::CANONICAL
        } else {
            flags
        }
    }

    pub fn arity(self) -> Arity {
        use Operator::*;
        match self {
            Round | Abs | Sin | Log | Not | Floor | Ceil | Cos | Sqrt | Cardinality => {
                Arity::Exactly(1)
            }
            Power | SymmetricDifference | GreaterOrEqual | IsSubset | Is | Divide
            | LessOrEqual | LessThan | GreaterThan | IsSuperset | Differentiate | Integrate => {
                Arity::Exactly(2)
            }
            Subtract | Implies | Xor | Difference | Intersection => Arity::AtLeast(2),
            Add | Multiply | Or | Union | And | Min | Max => Arity::AtLeast(1),
        }
    }

    #[inline]
    pub fn is_canonical(self) -> bool {
        self.flags().contains(OperatorFlags::CANONICAL)
    }

    #[inline]
    pub fn is_predicate(self) -> bool {
        self.flags().contains(OperatorFlags::PREDICATE)
    }

    /// Operators a canonical generation must not contain.
    pub fn non_canonical() -> impl Iterator<Item = Operator> {
        Operator::iter().filter(|op| !op.is_canonical())
    }
}
