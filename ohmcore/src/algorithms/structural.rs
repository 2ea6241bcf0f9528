//! Flattens nested associative operators and drops repeated operands of
//! idempotent ones.
use smallvec::SmallVec;

use crate::{
    algorithms::Algorithm,
    graph::{Expression, Generation, NodeId, Operator, OperatorFlags},
    mutator::{ExpressionEdit, Mutator},
    utils::error::SolverResult,
};

pub const ALGORITHM: Algorithm = Algorithm {
    name: "compress_associative",
    run,
};

fn flattens(op: Operator) -> bool {
    op.is_canonical() && op.flags().contains(OperatorFlags::ASSOCIATIVE)
}

/// The expression `id`, if its only user is `parent` and the two can be merged.
fn absorbable<'g>(generation: &'g Generation, id: NodeId, parent: &Expression) -> Option<&'g Expression> {
    let expr = generation.expression(id)?;
    let merges = expr.op == parent.op && !expr.constrained && flattens(expr.op);
    let users = generation.users(id);
    (merges && users.len() == 1).then_some(expr)
}

/// Will `id` disappear into its user?
fn is_absorbed(generation: &Generation, id: NodeId) -> bool {
    match generation.users(id) {
        [parent] => generation
            .expression(*parent)
            .is_some_and(|parent| absorbable(generation, id, parent).is_some()),
        _ => false,
    }
}

fn flatten(
    generation: &Generation,
    expr: &Expression,
    operands: &mut SmallVec<[NodeId; 8]>,
    absorbed: &mut Vec<NodeId>,
) {
    for operand in &expr.operands {
        match absorbable(generation, *operand, expr) {
            Some(child) => {
                if !absorbed.contains(operand) {
                    absorbed.push(*operand);
                }
                flatten(generation, child, operands, absorbed);
            }
            None => operands.push(*operand),
        }
    }
}

fn run(m: &mut Mutator<'_>) -> SolverResult<()> {
    let input = m.input();
    for (id, expr) in input.expressions() {
        let idempotent = expr.op.flags().contains(OperatorFlags::IDEMPOTENT);
        if !(flattens(expr.op) || idempotent) || is_absorbed(input, id) {
            continue;
        }

        let mut operands = SmallVec::<[NodeId; 8]>::new();
        let mut absorbed = Vec::new();
        if flattens(expr.op) {
            flatten(input, expr, &mut operands, &mut absorbed);
        } else {
            operands.extend(expr.operands.iter().copied());
        }
        if idempotent {
            let mut seen = SmallVec::<[NodeId; 8]>::new();
            operands.retain(|o| {
                let first = !seen.contains(o);
                seen.push(*o);
                first
            });
        }
        if operands.as_slice() == expr.operands.as_slice() {
            continue;
        }

        let Some(out) = m.mutate_expression(id, ExpressionEdit::new().operands(operands))? else {
            continue;
        };
        if !absorbed.is_empty() {
            m.absorb_provenance(out, &absorbed)?;
        }
        for child in absorbed {
            m.remove(child);
        }
    }
    Ok(())
}
