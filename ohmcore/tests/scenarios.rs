use ohmcore::prelude::*;

fn interval(lo: f64, hi: f64) -> Literal {
    Literal::interval(lo, hi, Unit::dimensionless())
}

#[test]
fn two_sided_bound_resolves_to_a_point() {
    let mut builder = GraphBuilder::new();
    let p = builder.parameter(Parameter::new(Domain::non_negative(), Unit::dimensionless()).named("P"));
    let three = builder.literal(Literal::number(3.0));
    builder.assert(Operator::GreaterOrEqual, [p, three]);
    builder.assert(Operator::LessOrEqual, [p, three]);

    let solution = Solver::default().solve(builder.build().unwrap()).unwrap();
    let query = solution.query();
    let p = solution.resolve(p).unwrap();

    let superset = query.superset(p).unwrap();
    assert!(superset.is_singleton());
    assert_eq!(query.try_single(p).unwrap(), Some(Value::Number(3.0)));
    assert!(query.is_satisfiable());
    assert_eq!(solution.last().count_op(Operator::LessOrEqual), 0);
}

#[test]
fn strict_comparison_is_downgraded_once() {
    let mut builder = GraphBuilder::new();
    let a = builder.parameter(Parameter::real().named("A"));
    let b = builder.parameter(Parameter::real().named("B"));
    builder.assert(Operator::GreaterThan, [a, b]);

    let solution = Solver::default().solve(builder.build().unwrap()).unwrap();
    let last = solution.last();

    assert_eq!(solution.diagnostics().count(LogLevel::Warn), 1);
    assert_eq!(last.count_op(Operator::GreaterThan), 0);
    assert_eq!(last.count_op(Operator::GreaterOrEqual), 1);

    let (a, b) = (solution.resolve(a).unwrap(), solution.resolve(b).unwrap());
    let (_, ge) = last
        .expressions()
        .find(|(_, e)| e.op == Operator::GreaterOrEqual)
        .unwrap();
    assert_eq!(ge.operands.as_slice(), [a, b]);
}

#[test]
fn less_than_swaps_its_operands() {
    let mut builder = GraphBuilder::new();
    let a = builder.parameter(Parameter::real());
    let b = builder.parameter(Parameter::real());
    builder.assert(Operator::LessThan, [a, b]);

    let solution = Solver::default().solve(builder.build().unwrap()).unwrap();
    let last = solution.last();
    let (a, b) = (solution.resolve(a).unwrap(), solution.resolve(b).unwrap());
    let (_, ge) = last
        .expressions()
        .find(|(_, e)| e.op == Operator::GreaterOrEqual)
        .unwrap();
    assert_eq!(ge.operands.as_slice(), [b, a]);
    assert_eq!(solution.diagnostics().warnings().count(), 1);
}

#[test]
fn minimum_gets_a_witness_parameter() {
    let mut builder = GraphBuilder::new();
    let low = builder.literal(interval(1.0, 4.0));
    let high = builder.literal(interval(2.0, 6.0));
    let min = builder.expression(Operator::Min, [low, high]);

    let solution = Solver::default().solve(builder.build().unwrap()).unwrap();
    let last = solution.last();
    assert_eq!(solution.first().parameters().count(), 0);
    assert_eq!(last.parameters().count(), 1);
    assert_eq!(last.count_op(Operator::Min), 0);
    assert_eq!(last.count_op(Operator::Union), 1);

    let witness = solution.resolve(min).unwrap();
    assert!(last.parameter(witness).is_some());

    let (union, _) = last
        .expressions()
        .find(|(_, e)| e.op == Operator::Union)
        .unwrap();
    let relations: Vec<_> = last
        .expressions()
        .filter(|(_, e)| matches!(e.op, Operator::IsSubset | Operator::GreaterOrEqual))
        .map(|(_, e)| (e.op, e.operands.to_vec()))
        .collect();
    assert!(relations.contains(&(Operator::IsSubset, vec![witness, union])));
    assert!(relations.contains(&(Operator::GreaterOrEqual, vec![union, witness])));

    let query = solution.query();
    assert_eq!(query.superset(witness).unwrap(), interval(1.0, 4.0));
}

#[test]
fn maximum_is_bounded_from_below() {
    let mut builder = GraphBuilder::new();
    let low = builder.literal(interval(1.0, 4.0));
    let high = builder.literal(interval(2.0, 6.0));
    let max = builder.expression(Operator::Max, [low, high]);

    let solution = Solver::default().solve(builder.build().unwrap()).unwrap();
    let witness = solution.resolve(max).unwrap();
    assert_eq!(solution.query().superset(witness).unwrap(), interval(2.0, 6.0));
}

#[test]
fn conflicting_assignments_are_one_contradiction() {
    let mut builder = GraphBuilder::new();
    let x = builder.parameter(Parameter::real().named("X"));
    let five = builder.alias(x, Literal::number(5.0));
    builder.label(five, "X = 5");
    let six = builder.alias(x, Literal::number(6.0));
    builder.label(six, "X = 6");

    let solution = Solver::default().solve(builder.build().unwrap()).unwrap();
    let query = solution.query();
    assert!(!query.is_satisfiable());

    let Contradictions(found) = query.check().unwrap_err();
    assert_eq!(found.len(), 1);
    let contradiction = &found[0];
    assert_eq!(contradiction.node, solution.resolve(x).unwrap());
    assert_eq!(contradiction.name, "X");

    let origins = solution.first().origins();
    for assertion in [five, six] {
        let origin = origins.origin_of(assertion).unwrap();
        assert!(contradiction.involves(origin));
        assert!(contradiction.origin_nodes.contains(&assertion));
    }
    assert!(contradiction.labels.contains(&"X = 5".to_string()));
    assert!(contradiction.labels.contains(&"X = 6".to_string()));
}

#[test]
fn independent_contradictions_are_batched() {
    let mut builder = GraphBuilder::new();
    for name in ["X", "Y"] {
        let p = builder.parameter(Parameter::real().named(name));
        builder.alias(p, Literal::number(1.0));
        builder.alias(p, Literal::number(2.0));
    }
    let solution = Solver::default().solve(builder.build().unwrap()).unwrap();
    let err = solution.query().check().unwrap_err();
    let names: Vec<_> = err.0.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["X", "Y"]);
}

#[test]
fn units_are_restored_for_display() {
    let mut builder = GraphBuilder::new();
    let kilo_ohm = Unit::ohm().with_prefix(Prefix::Kilo);
    let r = builder.parameter(Parameter::new(Domain::positive(), kilo_ohm).named("R"));
    builder.alias(r, Literal::quantity(2.0, kilo_ohm));

    let solution = Solver::default().solve(builder.build().unwrap()).unwrap();
    let r = solution.resolve(r).unwrap();
    let query = solution.query();

    let last = solution.last().parameter(r).unwrap();
    assert!(last.unit.is_unit_one());
    assert_eq!(query.try_single(r).unwrap(), Some(Value::Number(2.0)));
    assert_eq!(query.superset(r).unwrap().unit(), Some(&kilo_ohm));
}

#[test]
fn volts_and_ohms_do_not_add() {
    let mut builder = GraphBuilder::new();
    let v = builder.parameter(Parameter::new(Domain::non_negative(), Unit::volt()).named("V"));
    let r = builder.parameter(Parameter::new(Domain::positive(), Unit::ohm()).named("R"));
    let sum = builder.expression(Operator::Add, [v, r]);
    let ten = builder.literal(Literal::quantity(10.0, Unit::volt()));
    builder.assert(Operator::Is, [sum, ten]);
    builder.alias(r, Literal::quantity(3.0, Unit::ohm()));
    builder.alias(v, Literal::quantity(5.0, Unit::ohm()));

    let errors = match builder.build() {
        Err(SolverError::Graph(errors)) => errors,
        other => panic!("unexpected {:?}", other.map(|g| g.len())),
    };
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| e.to_string().contains("measure different dimensions")));
}
