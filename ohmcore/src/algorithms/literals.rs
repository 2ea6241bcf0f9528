//! Normalizes raw constants and strips units.
//!
//! After this pass every numeric value lives in base units with the plain
//! dimensionless unit; the declared unit is kept as `source_unit` for display.
use ohmsets::{Literal, prelude::Unit};

use crate::{
    algorithms::Algorithm,
    graph::{LiteralNode, Node},
    mutator::Mutator,
    utils::error::SolverResult,
};

pub const ALGORITHM: Algorithm = Algorithm {
    name: "canonical_literals",
    run,
};

/// Unit to record as source unit, if `literal` still carries one.
fn carried_unit(literal: &Literal) -> Option<Unit> {
    literal.unit().filter(|unit| !unit.is_unit_one()).copied()
}

fn strip(literal: &Literal) -> Literal {
    match literal {
        Literal::Numeric(q) => Literal::Numeric(q.to_dimensionless()),
        other => other.clone(),
    }
}

fn strip_opt(literal: &mut Option<Literal>) {
    if let Some(value) = literal.as_mut() {
        *value = strip(value);
    }
}

fn run(m: &mut Mutator<'_>) -> SolverResult<()> {
    let input = m.input();
    for (id, data) in input.iter() {
        match &data.node {
            Node::Constant(constant) => {
                let value = constant.to_literal()?;
                let source_unit = carried_unit(&value);
                m.replace_leaf(
                    id,
                    Node::Literal(LiteralNode {
                        value: strip(&value),
                        source_unit,
                    }),
                )?;
            }
            Node::Literal(literal) => {
                if let Some(unit) = carried_unit(&literal.value) {
                    m.replace_leaf(
                        id,
                        Node::Literal(LiteralNode {
                            value: strip(&literal.value),
                            source_unit: literal.source_unit.or(Some(unit)),
                        }),
                    )?;
                }
            }
            Node::Parameter(parameter) => {
                let needs_strip = !parameter.unit.is_unit_one()
                    || [&parameter.within, &parameter.soft_set, &parameter.guess]
                        .into_iter()
                        .flatten()
                        .any(|l| carried_unit(l).is_some());
                if needs_strip {
                    m.mutate_parameter(id, |p| {
                        if !p.unit.is_unit_one() {
                            p.source_unit = p.source_unit.or(Some(p.unit));
                            p.unit = Unit::dimensionless();
                        }
                        strip_opt(&mut p.within);
                        strip_opt(&mut p.soft_set);
                        strip_opt(&mut p.guess);
                    })?;
                }
            }
            Node::Expression(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ohmsets::prelude::*;

    use super::*;
    use crate::graph::{Constant, Domain, GraphBuilder, Operator, Parameter};
    use crate::algorithms::testing::run_once;

    #[test]
    fn constants_and_units_are_normalized() {
        let kohm = Unit::ohm().with_prefix(Prefix::Kilo);
        let mut builder = GraphBuilder::new();
        let r = builder.parameter(
            Parameter::new(Domain::non_negative(), kohm).guess(Literal::quantity(4.7, kohm)),
        );
        let c = builder.constant(Constant::Number {
            value: 10.0,
            unit: kohm,
        });
        let flag = builder.constant(Constant::Bool(true));
        builder.assert(Operator::Is, [r, c]);
        let input = builder.build().unwrap();

        let (mutation, _) = run_once(ALGORITHM, &input);
        let output = &mutation.generation;
        assert!(output.constants().next().is_none());

        let literal = output.literal(mutation.mapping[c]).unwrap();
        assert_eq!(literal.value, Literal::number(10_000.0));
        assert_eq!(literal.source_unit, Some(kohm));
        assert_eq!(literal.value.unit(), Some(&Unit::dimensionless()));

        let flag = output.literal(mutation.mapping[flag]).unwrap();
        assert_eq!(flag.value, Literal::truth());
        assert_eq!(flag.source_unit, None);

        let p = output.parameter(mutation.mapping[r]).unwrap();
        assert!(p.unit.is_unit_one());
        assert_eq!(p.source_unit, Some(kohm));
        assert_eq!(p.display_unit(), kohm);
        assert_eq!(p.guess, Some(Literal::number(4_700.0)));

        let (again, _) = run_once(ALGORITHM, output);
        assert!(!again.dirty);
    }
}
