use ohmsets::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

const ROUNDS: usize = 200;

fn random_numbers(rng: &mut impl Rng) -> Numbers {
    let count = rng.random_range(0..=3);
    Numbers::from_intervals((0..count).filter_map(|_| {
        let lo = rng.random_range(-10..=10) as f64;
        let hi = lo + rng.random_range(0..=6) as f64;
        let lo = if rng.random_bool(0.1) {
            Bound::open(f64::NEG_INFINITY)
        } else {
            Bound {
                value: lo,
                closed: rng.random_bool(0.5),
            }
        };
        let hi = Bound {
            value: hi,
            closed: rng.random_bool(0.5),
        };
        Interval::from_bounds(lo, hi)
    }))
}

/// Sample points on a half-integer grid, which hits every bound used above.
fn sample_points() -> impl Iterator<Item = f64> {
    (-40..=40).map(|k| k as f64 * 0.5)
}

#[test]
fn membership_follows_set_algebra() {
    let mut rng = ChaCha20Rng::seed_from_u64(0x0A11CE);
    for _ in 0..ROUNDS {
        let a = random_numbers(&mut rng);
        let b = random_numbers(&mut rng);
        let union = a.union(&b);
        let inter = a.intersection(&b);
        let diff = a.difference(&b);
        let sym = a.symmetric_difference(&b);
        for x in sample_points() {
            let (in_a, in_b) = (a.contains(x), b.contains(x));
            assert_eq!(union.contains(x), in_a || in_b, "{a} ∪ {b} at {x}");
            assert_eq!(inter.contains(x), in_a && in_b, "{a} ∩ {b} at {x}");
            assert_eq!(diff.contains(x), in_a && !in_b, "{a} - {b} at {x}");
            assert_eq!(sym.contains(x), in_a != in_b, "{a} △ {b} at {x}");
        }
    }
}

#[test]
fn complement_and_subset_laws() {
    let mut rng = ChaCha20Rng::seed_from_u64(0xB0B);
    for _ in 0..ROUNDS {
        let a = random_numbers(&mut rng);
        let b = random_numbers(&mut rng);
        assert_eq!(a.complement().complement(), a);
        assert!(a.union(&a.complement()).is_unbounded());
        assert!(a.intersection(&b).is_subset_of(&a));
        assert!(a.is_subset_of(&a.union(&b)));
        assert!(a.symmetric_difference(&a).is_empty());
        assert_eq!(
            a.union(&b).complement(),
            a.complement().intersection(&b.complement())
        );
    }
}

#[test]
fn arithmetic_is_sound_on_sampled_points() {
    let mut rng = ChaCha20Rng::seed_from_u64(0xC0FFEE);
    for _ in 0..ROUNDS {
        let a = random_numbers(&mut rng);
        let b = random_numbers(&mut rng);
        let sum = a.add(&b);
        let product = a.mul(&b);
        let members_a: Vec<f64> = sample_points().filter(|x| a.contains(*x)).collect();
        let members_b: Vec<f64> = sample_points().filter(|x| b.contains(*x)).collect();
        for x in &members_a {
            assert!(a.abs().contains(x.abs()));
            assert!(a.negate().contains(-x));
            for y in &members_b {
                assert!(sum.contains(x + y), "{x} + {y} not in {sum}");
                assert!(product.contains(x * y), "{x} * {y} not in {product}");
            }
        }
    }
}

#[test]
fn rounding_is_sound_on_sampled_points() {
    let mut rng = ChaCha20Rng::seed_from_u64(0xD1CE);
    for _ in 0..ROUNDS {
        let a = random_numbers(&mut rng);
        let rounded = a.round();
        for x in sample_points().filter(|x| a.contains(*x)) {
            let r = ohmsets::interval::round_half_up(x);
            assert!(rounded.contains(r), "round({x}) = {r} not in {rounded}");
        }
    }
}

#[test]
fn literals_of_different_kinds_never_combine() {
    let n = Literal::interval(1.0, 2.0, Unit::volt());
    let t = Literal::truth();
    let s = Literal::text(["a"]);
    for (left, right) in [(&n, &t), (&t, &s), (&s, &n)] {
        let err = left.intersection(right).unwrap_err();
        assert!(err.is_domain_mismatch());
    }
    let amps = Literal::interval(1.0, 2.0, Unit::ampere());
    assert!(n.union(&amps).unwrap_err().is_unit_mismatch());
}
