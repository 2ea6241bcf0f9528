//! Rewrites every operator outside the canonical basis.
//!
//! Each law replaces the expression in place, so users keep pointing at the
//! same output node. Helper expressions are fresh nodes carrying the
//! provenance of the expression they were derived from.
use std::f64::consts::FRAC_PI_2;

use ohmsets::Literal;

use crate::{
    algorithms::Algorithm,
    graph::{Expression, NodeId, Operator, Parameter},
    mutator::{ExpressionEdit, Mutator, Operand},
    ohmdebug, ohmwarn,
    utils::error::SolverResult,
};

pub const ALGORITHM: Algorithm = Algorithm {
    name: "canonical_operations",
    run,
};

enum Rewrite {
    Done,
    /// A helper could not be built because one of its operands is gone.
    OperandRemoved,
}

/// Create an unasserted helper expression, bailing out of the current law when
/// one of its operands was removed.
macro_rules! helper {
    ($m:expr, $id:expr, $op:expr, [$($operand:expr),* $(,)?]) => {
        helper!($m, $id, $op, vec![$(Operand::from($operand)),*])
    };
    ($m:expr, $id:expr, $op:expr, $operands:expr) => {
        match $m.create_expression($op, $operands, false, &[$id])? {
            Some(out) => Operand::Output(out),
            None => return Ok(Rewrite::OperandRemoved),
        }
    };
}

fn number(value: f64) -> Operand {
    Operand::Literal(Literal::number(value))
}

fn inputs(operands: &[NodeId]) -> Vec<Operand> {
    operands.iter().copied().map(Operand::Input).collect()
}

fn replace(m: &mut Mutator<'_>, id: NodeId, op: Operator, operands: Vec<Operand>) -> SolverResult<Rewrite> {
    m.mutate_expression(id, ExpressionEdit::new().op(op).operands(operands))?;
    Ok(Rewrite::Done)
}

/// `A ∩ B` as `(A ∪ B) △ (A △ B)`, as operands of the outer difference.
fn intersection_parts(
    m: &mut Mutator<'_>,
    id: NodeId,
    a: Operand,
    b: Operand,
) -> SolverResult<Result<[Operand; 2], Rewrite>> {
    let union = match m.create_expression(Operator::Union, [a.clone(), b.clone()], false, &[id])? {
        Some(out) => Operand::Output(out),
        None => return Ok(Err(Rewrite::OperandRemoved)),
    };
    let delta = match m.create_expression(Operator::SymmetricDifference, [a, b], false, &[id])? {
        Some(out) => Operand::Output(out),
        None => return Ok(Err(Rewrite::OperandRemoved)),
    };
    Ok(Ok([union, delta]))
}

fn rewrite(m: &mut Mutator<'_>, id: NodeId, expr: &Expression) -> SolverResult<Rewrite> {
    use Operator::*;

    let ops = expr.operands.as_slice();
    match expr.op {
        Subtract => {
            let mut operands = vec![Operand::Input(ops[0])];
            for subtrahend in &ops[1..] {
                operands.push(helper!(m, id, Multiply, [*subtrahend, number(-1.0)]));
            }
            replace(m, id, Add, operands)
        }
        Divide => {
            let inverse = helper!(m, id, Power, [ops[1], number(-1.0)]);
            replace(m, id, Multiply, vec![ops[0].into(), inverse])
        }
        And => {
            let mut negated = Vec::with_capacity(ops.len());
            for operand in ops {
                negated.push(helper!(m, id, Not, [*operand]));
            }
            let any_false = helper!(m, id, Or, negated);
            replace(m, id, Not, vec![any_false])
        }
        Implies => {
            let premise = helper!(m, id, Not, [ops[0]]);
            let mut operands = vec![premise];
            operands.extend(inputs(&ops[1..]));
            replace(m, id, Or, operands)
        }
        Xor => {
            let any_true = helper!(m, id, Or, inputs(ops));
            let none_true = helper!(m, id, Not, [any_true]);
            let mut negated = Vec::with_capacity(ops.len());
            for operand in ops {
                negated.push(helper!(m, id, Not, [*operand]));
            }
            let any_false = helper!(m, id, Or, negated);
            let none_false = helper!(m, id, Not, [any_false]);
            let uniform = helper!(m, id, Or, [none_true, none_false]);
            replace(m, id, Not, vec![uniform])
        }
        LessOrEqual => replace(m, id, GreaterOrEqual, inputs(&[ops[1], ops[0]])),
        IsSuperset => replace(m, id, IsSubset, inputs(&[ops[1], ops[0]])),
        GreaterThan | LessThan => {
            let input = m.input();
            ohmwarn!(
                m.diagnostics(),
                "strict comparison {} is approximated by {}",
                input.display(id),
                GreaterOrEqual
            );
            let operands = if expr.op == GreaterThan {
                [ops[0], ops[1]]
            } else {
                [ops[1], ops[0]]
            };
            replace(m, id, GreaterOrEqual, inputs(&operands))
        }
        Floor => {
            let shifted = helper!(m, id, Add, [ops[0], number(-0.5)]);
            replace(m, id, Round, vec![shifted])
        }
        Ceil => {
            let negated = helper!(m, id, Multiply, [ops[0], number(-1.0)]);
            let shifted = helper!(m, id, Add, [negated, number(-0.5)]);
            let rounded = helper!(m, id, Round, [shifted]);
            replace(m, id, Multiply, vec![rounded, number(-1.0)])
        }
        Cos => {
            let shifted = helper!(m, id, Add, [ops[0], number(FRAC_PI_2)]);
            replace(m, id, Sin, vec![shifted])
        }
        Sqrt => replace(m, id, Power, vec![ops[0].into(), number(0.5)]),
        Min | Max => {
            let union = helper!(m, id, Union, inputs(ops));
            let witness = Operand::Output(m.create_parameter(Parameter::real(), &[id])?);
            let (greater, lesser) = if expr.op == Min {
                (union.clone(), witness.clone())
            } else {
                (witness.clone(), union.clone())
            };
            for (op, operands) in [
                (IsSubset, [witness.clone(), union]),
                (GreaterOrEqual, [greater, lesser]),
            ] {
                m.create_expression(op, operands, true, &[id])?;
            }
            if let Operand::Output(witness) = witness {
                m.redirect(id, witness)?;
            }
            ohmdebug!(
                m.diagnostics(),
                "{} replaced by a witness parameter",
                m.input().display(id)
            );
            Ok(Rewrite::Done)
        }
        Difference => {
            let all = helper!(m, id, Union, inputs(ops));
            let removed = helper!(m, id, Union, inputs(&ops[1..]));
            replace(m, id, SymmetricDifference, vec![all, removed])
        }
        Intersection => {
            let mut acc = Operand::Input(ops[0]);
            for (index, operand) in ops[1..].iter().enumerate() {
                let parts = match intersection_parts(m, id, acc, Operand::Input(*operand))? {
                    Ok(parts) => parts,
                    Err(rewrite) => return Ok(rewrite),
                };
                if index + 2 == ops.len() {
                    return replace(m, id, SymmetricDifference, parts.to_vec());
                }
                acc = helper!(m, id, SymmetricDifference, parts.to_vec());
            }
            Ok(Rewrite::Done)
        }
        Cardinality | Differentiate | Integrate => {
            let input = m.input();
            ohmwarn!(
                m.diagnostics(),
                "operator `{}` has no canonical form, dropping {}",
                expr.op,
                input.display(id)
            );
            m.remove(id);
            Ok(Rewrite::Done)
        }
        Add | Multiply | Power | Round | Abs | Sin | Log | Or | Not | Union
        | SymmetricDifference | GreaterOrEqual | IsSubset | Is => Ok(Rewrite::Done),
    }
}

fn run(m: &mut Mutator<'_>) -> SolverResult<()> {
    let input = m.input();
    for (id, expr) in input.expressions() {
        if expr.op.is_canonical() || m.is_removed(id) {
            continue;
        }
        if let Rewrite::OperandRemoved = rewrite(m, id, expr)? {
            m.remove(id);
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
        ext::ohmlog::LogLevel,
        graph::{Generation, GraphBuilder, Node},
    };

    fn single(op: Operator, arity: usize) -> (Generation, NodeId, Vec<NodeId>) {
        let mut builder = GraphBuilder::new();
        let params: Vec<_> = (0..arity)
            .map(|_| builder.parameter(Parameter::real()))
            .collect();
        let root = builder.expression(op, params.iter().copied());
        (builder.build().unwrap(), root, params)
    }

    fn shape(generation: &Generation, id: NodeId) -> String {
        generation.display(id).to_string()
    }

    #[test]
    fn every_law_reaches_the_basis() {
        for op in Operator::non_canonical() {
            let arity = match op.arity() {
                crate::graph::Arity::Exactly(n) => n,
                crate::graph::Arity::AtLeast(n) => n.max(3),
            };
            let (input, _, _) = single(op, arity);
            let (mutation, _) = run_once(ALGORITHM, &input);
            assert!(mutation.dirty, "{} was not rewritten", op);
            assert!(
                mutation.generation.is_canonical(),
                "{} left {:?}",
                op,
                mutation.generation.first_non_canonical()
            );
        }
    }

    #[test]
    fn subtraction_and_division() {
        let (input, root, _) = single(Operator::Subtract, 3);
        let (mutation, _) = run_once(ALGORITHM, &input);
        assert_eq!(
            shape(&mutation.generation, mutation.mapping[root]),
            "Add(A, Multiply(B, {-1}), Multiply(C, {-1}))"
        );

        let (input, root, _) = single(Operator::Divide, 2);
        let (mutation, _) = run_once(ALGORITHM, &input);
        assert_eq!(
            shape(&mutation.generation, mutation.mapping[root]),
            "Multiply(A, Power(B, {-1}))"
        );
    }

    #[test]
    fn strict_comparisons_warn_once_and_keep_operand_order() {
        let (input, root, _) = single(Operator::GreaterThan, 2);
        let (mutation, diagnostics) = run_once(ALGORITHM, &input);
        assert_eq!(diagnostics.count(LogLevel::Warn), 1);
        assert_eq!(
            shape(&mutation.generation, mutation.mapping[root]),
            "GreaterOrEqual(A, B)"
        );

        let (input, root, _) = single(Operator::LessThan, 2);
        let (mutation, diagnostics) = run_once(ALGORITHM, &input);
        assert_eq!(diagnostics.warnings().count(), 1);
        assert_eq!(
            shape(&mutation.generation, mutation.mapping[root]),
            "GreaterOrEqual(B, A)"
        );
    }

    #[test]
    fn rounding_laws() {
        let (input, root, _) = single(Operator::Floor, 1);
        let (mutation, _) = run_once(ALGORITHM, &input);
        assert_eq!(
            shape(&mutation.generation, mutation.mapping[root]),
            "Round(Add(A, {-0.5}))"
        );

        let (input, root, _) = single(Operator::Ceil, 1);
        let (mutation, _) = run_once(ALGORITHM, &input);
        assert_eq!(
            shape(&mutation.generation, mutation.mapping[root]),
            "Multiply(Round(Add(Multiply(A, {-1}), {-0.5})), {-1})"
        );
    }

    #[test]
    fn min_introduces_one_witness() {
        let mut builder = GraphBuilder::new();
        let a = builder.literal(Literal::interval(1.0, 4.0, Unit::dimensionless()));
        let b = builder.literal(Literal::interval(2.0, 6.0, Unit::dimensionless()));
        let min = builder.expression(Operator::Min, [a, b]);
        let user = builder.expression(Operator::Abs, [min]);
        let input = builder.build().unwrap();

        let (mutation, _) = run_once(ALGORITHM, &input);
        let output = &mutation.generation;
        assert_eq!(output.parameters().count(), 1);
        let (witness, _) = output.parameters().next().unwrap();
        assert_eq!(mutation.mapping[min], witness);
        assert_eq!(output.expression(mutation.mapping[user]).unwrap().operands[0], witness);
        assert_eq!(output.provenance(witness), input.provenance(min));

        let constraints: Vec<_> = output
            .users(witness)
            .iter()
            .filter_map(|id| output.expression(*id))
            .filter(|e| e.constrained)
            .map(|e| e.op)
            .collect();
        assert_eq!(constraints, [Operator::IsSubset, Operator::GreaterOrEqual]);
        let ge = output
            .expressions()
            .find(|(_, e)| e.op == Operator::GreaterOrEqual)
            .unwrap()
            .1;
        assert_eq!(ge.operands[1], witness);
        assert_eq!(output.count_op(Operator::Union), 1);
    }

    #[test]
    fn unsupported_operators_are_dropped_with_their_users() {
        let mut builder = GraphBuilder::new();
        let s = builder.parameter(Parameter::real());
        let card = builder.expression(Operator::Cardinality, [s]);
        let three = builder.literal(Literal::number(3.0));
        builder.assert(Operator::Is, [card, three]);
        let input = builder.build().unwrap();

        let (mutation, diagnostics) = run_once(ALGORITHM, &input);
        assert_eq!(diagnostics.count(LogLevel::Warn), 1);
        assert_eq!(mutation.generation.expressions().count(), 0);
        assert!(
            mutation
                .generation
                .iter()
                .all(|(_, data)| !matches!(data.node, Node::Expression(_)))
        );
    }
}
