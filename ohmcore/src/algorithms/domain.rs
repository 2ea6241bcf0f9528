//! Turns declared domains and `within` ranges into subset constraints.
use crate::{
    algorithms::Algorithm,
    graph::{Operator, ParameterFlags},
    mutator::{Mutator, Operand},
    ohmtrace,
    utils::error::SolverResult,
};

pub const ALGORITHM: Algorithm = Algorithm {
    name: "constrain_within_and_domain",
    run,
};

fn run(m: &mut Mutator<'_>) -> SolverResult<()> {
    let input = m.input();
    for (id, parameter) in input.parameters() {
        let applied = parameter.flags.contains(ParameterFlags::DOMAIN_APPLIED);
        if applied && parameter.within.is_none() {
            continue;
        }

        let mut constraints = Vec::new();
        if let Some(within) = &parameter.within {
            constraints.push(within.clone());
        }
        if !applied {
            constraints.extend(parameter.domain.restriction(&parameter.unit));
        }

        let constrained = !constraints.is_empty();
        let Some(out) = m.mutate_parameter(id, |p| {
            p.within = None;
            p.flags |= ParameterFlags::DOMAIN_APPLIED;
            if constrained {
                p.flags |= ParameterFlags::CONSTRAINED;
            }
        })?
        else {
            continue;
        };

        for constraint in constraints {
            ohmtrace!(
                m.diagnostics(),
                "{} is constrained to {}",
                input.display(id),
                constraint
            );
            m.create_expression(
                Operator::IsSubset,
                [Operand::Output(out), Operand::Literal(constraint)],
                true,
                &[id],
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ohmsets::prelude::*;

    use super::*;
    use crate::{
        algorithms::testing::run_once,
        graph::{Domain, GraphBuilder, Parameter},
    };

    #[test]
    fn within_and_non_negative_domain_become_subset_constraints() {
        let mut builder = GraphBuilder::new();
        let r = builder.parameter(
            Parameter::new(Domain::non_negative(), Unit::ohm())
                .within(Literal::interval(10.0, 20.0, Unit::ohm())),
        );
        let flag = builder.parameter(Parameter::boolean());
        let input = builder.build().unwrap();

        let (mutation, _) = run_once(ALGORITHM, &input);
        let output = &mutation.generation;
        assert!(mutation.dirty);

        let r_out = mutation.mapping[r];
        let p = output.parameter(r_out).unwrap();
        assert!(p.within.is_none());
        assert!(p.flags.contains(ParameterFlags::DOMAIN_APPLIED | ParameterFlags::CONSTRAINED));

        let subsets: Vec<_> = output
            .expressions()
            .filter(|(_, e)| e.op == Operator::IsSubset)
            .collect();
        assert_eq!(subsets.len(), 2);
        for (sid, subset) in subsets {
            assert!(subset.constrained);
            assert_eq!(subset.operands[0], r_out);
            assert_eq!(output.provenance(sid), input.provenance(r));
        }

        let b = output.parameter(mutation.mapping[flag]).unwrap();
        assert!(b.flags.contains(ParameterFlags::DOMAIN_APPLIED));
        assert!(!b.flags.contains(ParameterFlags::CONSTRAINED));
    }

    #[test]
    fn second_run_is_clean() {
        let mut builder = GraphBuilder::new();
        builder.parameter(Parameter::new(Domain::positive(), Unit::volt()));
        let input = builder.build().unwrap();

        let (first, _) = run_once(ALGORITHM, &input);
        let (second, _) = run_once(ALGORITHM, &first.generation);
        assert!(first.dirty);
        assert!(!second.dirty);
        assert_eq!(second.generation.len(), first.generation.len());
    }
}
