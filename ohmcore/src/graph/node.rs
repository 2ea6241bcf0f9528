use bitflags::bitflags;
use ohmsets::prelude::*;
use smallvec::SmallVec;
use strum::{EnumDiscriminants, EnumIs, EnumTryAs};

use crate::graph::{NodeId, Operator};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ParameterFlags: u8 {
        /// Some predicate restricts this parameter.
        const CONSTRAINED = 1 << 0;

        /// Consumers expect a single value for this parameter.
        const MUST_RESOLVE = 1 << 1;

        /// The declared domain has been turned into a subset constraint.
        const DOMAIN_APPLIED = 1 << 2;
    }
}

/// Domain a parameter ranges over.
#[derive(Debug, Clone, PartialEq, EnumIs)]
pub enum Domain {
    Numbers {
        negative: bool,
        zero: bool,
        integer: bool,
    },
    Boolean,
    Enum(EnumDomain),
    Text,
}

impl Domain {
    pub const fn real() -> Self {
        Domain::Numbers {
            negative: true,
            zero: true,
            integer: false,
        }
    }

    pub const fn non_negative() -> Self {
        Domain::Numbers {
            negative: false,
            zero: true,
            integer: false,
        }
    }

    pub const fn positive() -> Self {
        Domain::Numbers {
            negative: false,
            zero: false,
            integer: false,
        }
    }

    pub const fn integer() -> Self {
        Domain::Numbers {
            negative: true,
            zero: true,
            integer: true,
        }
    }

    /// Every value the domain admits, in `unit`. Integrality is not tracked, so
    /// integer domains get the real hull.
    pub fn universe(&self, unit: &Unit) -> Literal {
        match self {
            Domain::Numbers { negative, zero, .. } => {
                let numbers = match (negative, zero) {
                    (true, _) => Numbers::unbounded(),
                    (false, true) => Numbers::at_least(0.0),
                    (false, false) => Interval::from_bounds(
                        Bound::open(0.0),
                        Bound::open(f64::INFINITY),
                    )
                    .map(Numbers::from)
                    .unwrap_or_default(),
                };
                Literal::Numeric(QuantitySet::from_base(numbers, *unit))
            }
            Domain::Boolean => Literal::Boolean(BoolSet::all()),
            Domain::Enum(domain) => Literal::Enum(domain.full()),
            Domain::Text => Literal::Text(StringSet::any()),
        }
    }

    /// The part of the domain that needs an explicit constraint. Discrete
    /// domains and the unrestricted reals need none.
    pub fn restriction(&self, unit: &Unit) -> Option<Literal> {
        match self {
            Domain::Numbers {
                negative: false, ..
            } => Some(self.universe(unit)),
            _ => None,
        }
    }
}

/// A symbolic unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: Option<String>,
    pub domain: Domain,
    pub unit: Unit,
    /// Unit the front-end declared, kept once values are made dimensionless.
    pub source_unit: Option<Unit>,
    pub within: Option<Literal>,
    pub soft_set: Option<Literal>,
    pub guess: Option<Literal>,
    pub flags: ParameterFlags,
}

impl Parameter {
    pub fn new(domain: Domain, unit: Unit) -> Self {
        Self {
            name: None,
            domain,
            unit,
            source_unit: None,
            within: None,
            soft_set: None,
            guess: None,
            flags: ParameterFlags::empty(),
        }
    }

    /// Unconstrained dimensionless real.
    pub fn real() -> Self {
        Self::new(Domain::real(), Unit::dimensionless())
    }

    pub fn boolean() -> Self {
        Self::new(Domain::Boolean, Unit::dimensionless())
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn within(mut self, within: Literal) -> Self {
        self.within = Some(within);
        self.flags |= ParameterFlags::CONSTRAINED;
        self
    }

    pub fn soft_set(mut self, soft_set: Literal) -> Self {
        self.soft_set = Some(soft_set);
        self
    }

    pub fn guess(mut self, guess: Literal) -> Self {
        self.guess = Some(guess);
        self
    }

    pub fn must_resolve(mut self) -> Self {
        self.flags |= ParameterFlags::MUST_RESOLVE;
        self
    }

    /// Unit values are displayed in.
    pub fn display_unit(&self) -> Unit {
        self.source_unit.unwrap_or(self.unit)
    }

    pub fn universe(&self) -> Literal {
        self.domain.universe(&self.unit)
    }
}

/// A symbolic operation over other nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression {
    pub op: Operator,
    pub operands: SmallVec<[NodeId; 3]>,
    /// Must hold. Only meaningful for predicates.
    pub constrained: bool,
}

impl Expression {
    pub fn new(op: Operator, operands: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            op,
            operands: operands.into_iter().collect(),
            constrained: false,
        }
    }

    pub fn asserted(op: Operator, operands: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            constrained: true,
            ..Self::new(op, operands)
        }
    }
}

/// A literal leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralNode {
    pub value: Literal,
    /// Unit of the value before it was made dimensionless.
    pub source_unit: Option<Unit>,
}

impl From<Literal> for LiteralNode {
    fn from(value: Literal) -> Self {
        Self {
            value,
            source_unit: None,
        }
    }
}

/// A source-level constant not yet turned into a [`Literal`].
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Number { value: f64, unit: Unit },
    Range { lo: f64, hi: f64, unit: Unit },
    Bool(bool),
    EnumMember { domain: EnumDomain, member: String },
    Text(String),
}

impl Constant {
    pub fn to_literal(&self) -> SetResult<Literal> {
        Ok(match self {
            Constant::Number { value, unit } => Literal::quantity(*value, *unit),
            Constant::Range { lo, hi, unit } => Literal::interval(*lo, *hi, *unit),
            Constant::Bool(value) => Literal::bool(*value),
            Constant::EnumMember { domain, member } => {
                Literal::Enum(domain.set_of([member.as_str()])?)
            }
            Constant::Text(value) => Literal::text([value.as_str()]),
        })
    }
}

/// Any node of a generation.
#[derive(Debug, Clone, PartialEq, EnumIs, EnumTryAs, EnumDiscriminants)]
#[strum_discriminants(name(NodeKind))]
pub enum Node {
    Parameter(Parameter),
    Expression(Expression),
    Literal(LiteralNode),
    Constant(Constant),
}

impl Node {
    /// Operands of an expression, empty for leaves.
    pub fn operands(&self) -> &[NodeId] {
        match self {
            Node::Expression(expr) => &expr.operands,
            _ => &[],
        }
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        NodeKind::from(self)
    }
}
