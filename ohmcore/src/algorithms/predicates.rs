//! Moves the must-hold flag of every predicate onto an `Is(e, true)` wrapper.
use ohmsets::Literal;

use crate::{
    algorithms::Algorithm,
    graph::{Expression, Generation, Operator},
    mutator::{ExpressionEdit, Mutator, Operand},
    utils::error::SolverResult,
};

pub const ALGORITHM: Algorithm = Algorithm {
    name: "alias_predicates_to_true",
    run,
};

/// `Is(x, true)`, with `true` on either side.
fn is_true_alias(generation: &Generation, expr: &Expression) -> bool {
    expr.op == Operator::Is
        && expr
            .operands
            .iter()
            .any(|o| generation.literal(*o).is_some_and(|l| l.value.is_true()))
}

fn run(m: &mut Mutator<'_>) -> SolverResult<()> {
    let input = m.input();
    for (id, expr) in input.expressions() {
        if !expr.constrained || !expr.op.is_predicate() || is_true_alias(input, expr) {
            continue;
        }
        let Some(inner) = m.mutate_expression(id, ExpressionEdit::new().constrained(false))? else {
            continue;
        };
        m.create_expression(
            Operator::Is,
            [Operand::Output(inner), Operand::Literal(Literal::truth())],
            true,
            &[id],
        )?;
    }
    Ok(())
}
