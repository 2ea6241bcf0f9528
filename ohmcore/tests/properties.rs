use ohmcore::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

fn interval(lo: f64, hi: f64) -> Literal {
    Literal::interval(lo, hi, Unit::dimensionless())
}

fn solve(builder: GraphBuilder) -> Solution {
    Solver::default().solve(builder.build().unwrap()).unwrap()
}

/// A small design touching every pass.
fn sample_design() -> GraphBuilder {
    let mut builder = GraphBuilder::new();
    let volt = Unit::volt();
    let v = builder.parameter(Parameter::new(Domain::non_negative(), volt).named("V"));
    let i = builder.parameter(Parameter::new(Domain::positive(), Unit::ampere()).within(
        Literal::interval(1.0, 2.0, Unit::ampere().with_prefix(Prefix::Milli)),
    ));
    let r = builder.parameter(Parameter::new(Domain::positive(), Unit::ohm()));
    let enable = builder.parameter(Parameter::boolean().named("EN"));

    let product = builder.expression(Operator::Multiply, [i, r]);
    builder.assert(Operator::Is, [v, product]);
    let headroom = builder.literal(Literal::quantity(5.0, volt));
    let drop = builder.expression(Operator::Subtract, [headroom, v]);
    let zero = builder.literal(Literal::quantity(0.0, volt));
    builder.assert(Operator::GreaterThan, [drop, zero]);

    let low = builder.literal(interval(1.0, 3.0));
    let high = builder.literal(interval(2.0, 8.0));
    let spread = builder.expression(Operator::Max, [low, high]);
    let floor = builder.expression(Operator::Floor, [spread]);
    let nested = builder.expression(Operator::Add, [floor, floor]);
    builder.expression(Operator::Multiply, [nested, r]);

    let other = builder.parameter(Parameter::boolean());
    builder.expression(Operator::And, [enable, other]);
    builder.expression(Operator::Xor, [enable, other]);
    builder.constant(Constant::Number {
        value: 3.3,
        unit: volt,
    });
    builder
}

#[test]
fn canonical_forms_evaluate_like_the_originals() {
    let t = Literal::truth();
    let f = Literal::bool(false);
    let any = Literal::Boolean(BoolSet::all());
    let cases = [
        (Operator::Subtract, vec![interval(1.0, 5.0), interval(1.0, 2.0)]),
        (Operator::Intersection, vec![interval(1.0, 5.0), interval(3.0, 8.0)]),
        (Operator::Difference, vec![interval(1.0, 5.0), interval(2.0, 3.0)]),
        (Operator::LessOrEqual, vec![interval(1.0, 2.0), interval(3.0, 4.0)]),
        (Operator::Floor, vec![Literal::number(2.5)]),
        (Operator::Floor, vec![interval(1.25, 3.75)]),
        (Operator::Ceil, vec![Literal::number(2.5)]),
        (Operator::And, vec![t.clone(), any.clone()]),
        (Operator::Implies, vec![f.clone(), any.clone()]),
        (Operator::Xor, vec![t.clone(), f.clone()]),
        (Operator::Xor, vec![t, f, any]),
    ];

    for (op, operands) in cases {
        let mut builder = GraphBuilder::new();
        let ids: Vec<_> = operands.into_iter().map(|l| builder.literal(l)).collect();
        let original = builder.expression(op, ids);
        let solution = solve(builder);

        let before = Query::new(solution.first());
        let after = solution.query();
        let rewritten = solution.resolve(original).unwrap();
        assert_ne!(solution.last().expression(rewritten).unwrap().op, op);
        assert_eq!(
            before.value(original),
            after.value(rewritten),
            "{op} and its rewrite disagree"
        );
        assert!(before.value(original).is_some());
    }
}

#[test]
fn solving_a_canonical_generation_changes_nothing() {
    let solution = solve(sample_design());
    let last = solution.last().as_ref().clone();
    let len = last.len();

    let again = Solver::default().solve(last).unwrap();
    assert_eq!(again.generations().len(), 1);
    assert_eq!(again.rounds(), 1);
    assert_eq!(again.last().len(), len);
    assert_eq!(again.diagnostics().count(LogLevel::Warn), 0);
}

#[test]
fn non_negative_parameters_stay_non_negative() {
    let mut builder = GraphBuilder::new();
    let p = builder.parameter(
        Parameter::new(Domain::non_negative(), Unit::dimensionless()).within(interval(-5.0, 10.0)),
    );
    let solution = solve(builder);

    let mut current = p;
    for (index, generation) in solution.generations().iter().enumerate() {
        if index > 0 {
            current = solution.mappings()[index - 1][current];
        }
        let superset = Query::new(generation).superset(current).unwrap();
        let numbers = superset.try_as_numeric_ref().unwrap().numbers();
        assert_eq!(numbers.min_elem(), Some(0.0), "generation {index}");
        assert_eq!(numbers.max_elem(), Some(10.0), "generation {index}");
    }
}

#[test]
fn every_node_traces_back_to_the_front_end() {
    let solution = solve(sample_design());
    let first = solution.first();
    for generation in solution.generations() {
        for (id, data) in generation.iter() {
            assert!(!data.provenance.is_empty(), "{} has no origin", generation.display(id));
            for origin in data.provenance.origins() {
                let source = generation.origins().node(origin).unwrap();
                assert!(first.contains(source));
            }
        }
    }
}

fn random_design(seed: u64) -> GraphBuilder {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let mut builder = GraphBuilder::new();
    let mut numeric = Vec::new();
    for _ in 0..rng.random_range(2..6) {
        let domain = if rng.random_bool(0.5) {
            Domain::non_negative()
        } else {
            Domain::real()
        };
        numeric.push(builder.parameter(Parameter::new(domain, Unit::dimensionless())));
    }
    for _ in 0..rng.random_range(1..4) {
        let lo = rng.random_range(-10..10) as f64;
        numeric.push(builder.literal(interval(lo, lo + rng.random_range(0..5) as f64)));
    }

    let unary = [Operator::Abs, Operator::Floor, Operator::Ceil, Operator::Sqrt, Operator::Cos];
    let variadic = [
        Operator::Add,
        Operator::Subtract,
        Operator::Multiply,
        Operator::Min,
        Operator::Max,
    ];
    let relations = [
        Operator::GreaterOrEqual,
        Operator::LessOrEqual,
        Operator::GreaterThan,
        Operator::LessThan,
    ];
    for _ in 0..rng.random_range(4..12) {
        let pick = |rng: &mut ChaCha20Rng| numeric[rng.random_range(0..numeric.len())];
        let id = match rng.random_range(0..4) {
            0 => {
                let op = unary[rng.random_range(0..unary.len())];
                let operand = pick(&mut rng);
                builder.expression(op, [operand])
            }
            1 | 2 => {
                let op = variadic[rng.random_range(0..variadic.len())];
                let operands: Vec<_> = (0..rng.random_range(2..4)).map(|_| pick(&mut rng)).collect();
                builder.expression(op, operands)
            }
            _ => {
                let op = relations[rng.random_range(0..relations.len())];
                let operands = [pick(&mut rng), pick(&mut rng)];
                builder.assert(op, operands);
                continue;
            }
        };
        numeric.push(id);
    }
    builder
}

#[test]
fn identical_inputs_give_identical_solves() {
    for seed in 0..16 {
        let first = solve(random_design(seed));
        let second = solve(random_design(seed));

        assert_eq!(first.rounds(), second.rounds());
        assert_eq!(first.generations().len(), second.generations().len());
        assert_eq!(first.diagnostics().records(), second.diagnostics().records());

        let render = |solution: &Solution| -> Vec<String> {
            let last = solution.last();
            last.iter().map(|(id, _)| last.display(id).to_string()).collect()
        };
        assert_eq!(render(&first), render(&second), "seed {seed}");
        assert_eq!(first.query().names(), second.query().names());
        assert!(first.last().is_canonical());
    }
}

#[test]
fn configuration_is_read_from_toml() {
    let config = SolverConfig::from_toml_str(
        r#"
        max_rounds = 4
        max_propagation_rounds = 2
        "#,
    )
    .unwrap();
    assert_eq!(config.max_rounds, 4);
    assert!(!config.deduplicate);

    let err = SolverConfig::from_toml_str("max_round = 4").unwrap_err();
    assert!(matches!(err, SolverError::ConfigParse { .. }));

    let solver = Solver::new(SolverConfig {
        deduplicate: true,
        ..SolverConfig::default()
    });
    let solution = solver.solve(sample_design().build().unwrap()).unwrap();
    assert!(solution.last().is_canonical());
}

#[test]
fn propagation_budget_is_respected() {
    let config = SolverConfig {
        max_propagation_rounds: 1,
        ..SolverConfig::default()
    };
    let solution = Solver::new(config).solve(sample_design().build().unwrap()).unwrap();
    assert_eq!(solution.query().rounds(), 1);
}
