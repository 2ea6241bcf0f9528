//! Forward evaluation of operators over value supersets.
//!
//! Every function returns a superset of the values the expression can take
//! when each operand ranges over its own superset. `None` means nothing is
//! known.
use std::f64::consts::FRAC_PI_2;

use ohmsets::prelude::*;

use crate::graph::{Operator, OperatorFlags};

/// Operators whose result is computed exactly from exact operands.
pub(crate) fn preserves_exactness(op: Operator) -> bool {
    matches!(
        op,
        Operator::Union
            | Operator::Intersection
            | Operator::Difference
            | Operator::SymmetricDifference
    )
}

pub(crate) fn evaluate(op: Operator, operands: &[Option<&Literal>], exact: &[bool]) -> Option<Literal> {
    if let Some(empty) = operands.iter().flatten().find(|l| l.is_empty()) {
        return Some(if op.is_predicate() {
            Literal::Boolean(BoolSet::empty())
        } else {
            (*empty).clone()
        });
    }

    let unknown = || op.is_predicate().then(|| Literal::Boolean(BoolSet::all()));
    let Some(known) = operands.iter().copied().collect::<Option<Vec<&Literal>>>() else {
        return unknown();
    };

    let flags = op.flags();
    let value = if flags.contains(OperatorFlags::LOGIC) {
        logic(op, &known).map(Literal::Boolean)
    } else if flags.contains(OperatorFlags::RELATION) {
        relation(op, &known, exact).map(Literal::Boolean)
    } else if flags.contains(OperatorFlags::SET) {
        set(op, &known, exact)
    } else if flags.contains(OperatorFlags::ARITHMETIC) {
        arithmetic(op, &known).map(Literal::Numeric)
    } else {
        None
    };
    value.or_else(unknown)
}

fn quantities<'a>(operands: &[&'a Literal]) -> Option<Vec<&'a QuantitySet>> {
    operands.iter().map(|l| l.try_as_numeric_ref()).collect()
}

fn fold<T: Clone>(items: &[&T], f: impl Fn(&T, &T) -> Option<T>) -> Option<T> {
    let (first, rest) = items.split_first()?;
    rest.iter().try_fold((*first).clone(), |acc, item| f(&acc, *item))
}

/// `x + by`, with `by` in base units.
fn shift(x: &QuantitySet, by: f64) -> Option<QuantitySet> {
    x.add(&QuantitySet::from_base(Numbers::singleton(by), *x.unit()))
        .ok()
}

/// Hull of the pointwise minimum (or maximum) of the operands.
fn extremum(q: &[&QuantitySet], max: bool) -> Option<QuantitySet> {
    let unit = *q.first()?.unit();
    if q.iter().any(|x| !x.unit().is_commensurable(&unit)) {
        return None;
    }
    let pick = |a: f64, b: f64| if max { a.max(b) } else { a.min(b) };
    let lo = q.iter().map(|x| x.numbers().min_elem()).try_fold(
        if max { f64::NEG_INFINITY } else { f64::INFINITY },
        |acc, v| v.map(|v| pick(acc, v)),
    )?;
    let hi = q.iter().map(|x| x.numbers().max_elem()).try_fold(
        if max { f64::NEG_INFINITY } else { f64::INFINITY },
        |acc, v| v.map(|v| pick(acc, v)),
    )?;
    Some(QuantitySet::from_base(Numbers::closed(lo, hi), unit))
}

fn arithmetic(op: Operator, operands: &[&Literal]) -> Option<QuantitySet> {
    use Operator::*;

    let q = quantities(operands)?;
    let first = *q.first()?;
    match op {
        Add => fold(&q, |a, b| a.add(b).ok()),
        Subtract => q[1..]
            .iter()
            .try_fold(first.clone(), |acc, x| acc.add(&x.negate()).ok()),
        Multiply => fold(&q, |a, b| a.mul(b).ok()),
        Divide => first.mul(&q.get(1)?.invert().ok()?).ok(),
        Power => first.pow(q.get(1)?).ok(),
        Round => Some(first.round()),
        Abs => Some(first.abs()),
        Sin => first.sin().ok(),
        Log => first.ln().ok(),
        Floor => Some(shift(first, -0.5)?.round()),
        Ceil => Some(shift(&first.negate(), -0.5)?.round().negate()),
        Cos => shift(first, FRAC_PI_2)?.sin().ok(),
        Sqrt => first.pow(&QuantitySet::plain(Numbers::singleton(0.5))).ok(),
        Min => extremum(&q, false),
        Max => extremum(&q, true),
        _ => None,
    }
}

/// Image of `f` over every combination of operand values.
fn combine(sets: &[BoolSet], f: &dyn Fn(&[bool]) -> bool) -> BoolSet {
    fn walk(sets: &[BoolSet], values: &mut Vec<bool>, f: &dyn Fn(&[bool]) -> bool, out: &mut BoolSet) {
        match sets.split_first() {
            None => *out |= BoolSet::of(f(values)),
            Some((first, rest)) => {
                for value in [false, true] {
                    if first.contains_value(value) {
                        values.push(value);
                        walk(rest, values, f, out);
                        values.pop();
                    }
                }
            }
        }
    }

    let mut out = BoolSet::empty();
    walk(sets, &mut Vec::with_capacity(sets.len()), f, &mut out);
    out
}

fn logic(op: Operator, operands: &[&Literal]) -> Option<BoolSet> {
    use Operator::*;

    let sets: Vec<BoolSet> = operands
        .iter()
        .map(|l| l.try_as_boolean_ref().copied())
        .collect::<Option<_>>()?;
    let first = *sets.first()?;
    Some(match op {
        Not => first.logical_not(),
        Or => sets[1..].iter().fold(first, |acc, b| acc.logical_or(b)),
        And => combine(&sets, &|v| v.iter().all(|x| *x)),
        Implies => combine(&sets, &|v| !v[0] || v[1..].iter().any(|x| *x)),
        Xor => combine(&sets, &|v| v.iter().any(|x| *x) && !v.iter().all(|x| *x)),
        _ => return None,
    })
}

fn possible(can_be_true: bool, can_be_false: bool) -> BoolSet {
    let mut out = BoolSet::empty();
    out.set(BoolSet::TRUE, can_be_true);
    out.set(BoolSet::FALSE, can_be_false);
    out
}

fn equals(a: &Literal, b: &Literal) -> Option<BoolSet> {
    let meet = a.intersection(b).ok()?;
    let certain = a.is_singleton() && b.is_singleton();
    Some(possible(!meet.is_empty(), !certain || meet.is_empty()))
}

fn subset(a: &Literal, b: &Literal, b_exact: bool) -> Option<BoolSet> {
    if a.intersection(b).ok()?.is_empty() {
        return Some(BoolSet::FALSE);
    }
    let certain = a.is_subset_of(b).ok()? && (b_exact || b.is_singleton());
    Some(possible(true, !certain))
}

/// `a ≥ b`, or `a > b` when `strict`.
fn compare(a: &Literal, b: &Literal, strict: bool) -> Option<BoolSet> {
    let (a, b) = (a.try_as_numeric_ref()?, b.try_as_numeric_ref()?);
    if !a.unit().is_commensurable(b.unit()) {
        return None;
    }
    let (a_lo, a_hi) = (a.min_elem().ok()?, a.max_elem().ok()?);
    let (b_lo, b_hi) = (b.min_elem().ok()?, b.max_elem().ok()?);
    Some(if strict {
        possible(a_hi > b_lo, a_lo <= b_hi)
    } else {
        possible(a_hi >= b_lo, a_lo < b_hi)
    })
}

fn relation(op: Operator, operands: &[&Literal], exact: &[bool]) -> Option<BoolSet> {
    use Operator::*;

    let (a, b) = (*operands.first()?, *operands.get(1)?);
    let exact_at = |index: usize| exact.get(index).copied().unwrap_or(false);
    match op {
        Is => equals(a, b),
        IsSubset => subset(a, b, exact_at(1)),
        IsSuperset => subset(b, a, exact_at(0)),
        GreaterOrEqual => compare(a, b, false),
        LessOrEqual => compare(b, a, false),
        GreaterThan => compare(a, b, true),
        LessThan => compare(b, a, true),
        _ => None,
    }
}

fn set(op: Operator, operands: &[&Literal], exact: &[bool]) -> Option<Literal> {
    use Operator::*;

    let all_exact = exact.iter().all(|e| *e);
    match op {
        Union => fold(operands, |a, b| a.union(b).ok()),
        Intersection => fold(operands, |a, b| a.intersection(b).ok()),
        SymmetricDifference if all_exact => fold(operands, |a, b| a.symmetric_difference(b).ok()),
        SymmetricDifference => fold(operands, |a, b| a.union(b).ok()),
        Difference if all_exact => fold(operands, |a, b| a.difference(b).ok()),
        Difference => operands.first().map(|a| (*a).clone()),
        _ => None,
    }
}
