use ndarray as nd;
use proptest::prelude::*;
use rand::{ rngs::StdRng, SeedableRng };
use qplay::{
    angmom::{ twice_j, Axis, MAX_TWICE_J },
    grid::{ Grid, TimeGrid },
    limits::Limits,
    operators::{ self, OperatorKind, OscillatorBasis, StateKind },
    propagate::{ evolve_basis, split_substeps },
    spin::{ couple, precess },
    symmetry::rotation,
    utils::{ hermitian_deviation, max_abs_diff, norm_sqr },
};

fn axis() -> impl Strategy<Value = Axis> {
    prop_oneof![Just(Axis::X), Just(Axis::Y), Just(Axis::Z)]
}

fn operator_kind() -> impl Strategy<Value = OperatorKind> {
    prop_oneof![
        Just(OperatorKind::Position),
        Just(OperatorKind::Momentum),
        Just(OperatorKind::Number),
        Just(OperatorKind::Hamiltonian),
        Just(OperatorKind::RandomHermitian),
    ]
}

fn half_integer() -> impl Strategy<Value = f64> {
    (0_u32..=6).prop_map(|k| f64::from(k) / 2.0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn built_operators_are_hermitian(
        dim in 2_usize..=12,
        kind in operator_kind(),
        seed in any::<u64>(),
    ) {
        let limits = Limits::default();
        let basis = OscillatorBasis::new(dim, 1.0, 1.0, &limits).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let op = basis.operator(kind, &mut rng);
        prop_assert!(hermitian_deviation(&op) < 1e-12);
    }

    #[test]
    fn measurement_probabilities_sum_to_one(
        dim in 2_usize..=10,
        kind in operator_kind(),
        seed in any::<u64>(),
    ) {
        let limits = Limits::default();
        let basis = OscillatorBasis::new(dim, 1.0, 1.0, &limits).unwrap();
        let (mut rng, used) = operators::seeded_rng(Some(seed));
        prop_assert_eq!(used, seed);
        let obs = operators::observe(&basis, kind, StateKind::Random, 0, &mut rng).unwrap();
        let total: f64 = obs.measurement.probabilities.sum();
        prop_assert!((total - 1.0).abs() < 1e-10);
        prop_assert!(obs.measurement.probabilities.iter().all(|p| *p >= 0.0));
        prop_assert!(obs.measurement.variance > -1e-10);
    }

    #[test]
    fn basis_evolution_preserves_norm(
        dim in 2_usize..=8,
        seed in any::<u64>(),
        t_max in 0.1_f64..200.0,
    ) {
        let limits = Limits::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let h = operators::random_hermitian(dim, &mut rng);
        let psi0 = operators::random_state(dim, &mut rng).unwrap();
        let times = TimeGrid::new("nSteps", t_max, 40, &limits).unwrap();
        let traj = evolve_basis(&h, &psi0, &times).unwrap();
        prop_assert!(traj.norms.iter().all(|n| (n - 1.0).abs() < 1e-10));
    }

    #[test]
    fn precession_conserves_spin_length(
        twice_j in 1_u32..=6,
        bx in -2.0_f64..2.0,
        by in -2.0_f64..2.0,
        bz in -2.0_f64..2.0,
        theta0 in 0.0_f64..std::f64::consts::PI,
        phi0 in 0.0_f64..std::f64::consts::TAU,
    ) {
        let limits = Limits::default();
        let j = f64::from(twice_j) / 2.0;
        let times = TimeGrid::new("nSteps", 10.0, 50, &limits).unwrap();
        let traj = precess(j, 1.0, [bx, by, bz], theta0, phi0, &times, &limits).unwrap();
        // coherent states have |⟨J⟩| = j
        prop_assert!(traj.magnitude.iter().all(|m| (m - j).abs() < 1e-8));
    }

    #[test]
    fn rotation_round_trip_is_identity(
        dim in 2_usize..=9,
        axis in axis(),
        angle in -10.0_f64..10.0,
        seed in any::<u64>(),
    ) {
        let limits = Limits::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let psi = operators::random_state(dim, &mut rng).unwrap();
        let fwd = rotation(dim, axis, angle, &limits).unwrap();
        let back = rotation(dim, axis, -angle, &limits).unwrap();
        let rotated = fwd.rotate_state(&psi).unwrap();
        prop_assert!((norm_sqr(&rotated) - 1.0).abs() < 1e-10);
        let restored = back.rotate_state(&rotated).unwrap();
        prop_assert!(max_abs_diff(&restored, &psi) < 1e-10);
        prop_assert!(fwd.moduli().iter().all(|m| (m - 1.0).abs() < 1e-10));
    }

    #[test]
    fn coupled_states_are_orthonormal(j1 in half_integer(), j2 in half_integer()) {
        prop_assume!(j1 + j2 > 0.0);
        let limits = Limits::default();
        let c = couple(j1, j2, &limits).unwrap();
        let n = c.product_basis.len();
        prop_assert_eq!(c.states.len(), n);
        let u: nd::Array2<f64>
            = nd::Array2::from_shape_fn((n, n), |(i, k)| c.states[i].coefficients[k]);
        let overlap = u.dot(&u.t()) - nd::Array2::<f64>::eye(n);
        prop_assert!(overlap.iter().all(|o| o.abs() < 1e-10));
        for s in c.states.iter() {
            prop_assert!(s.m.abs() <= s.j + 1e-12);
        }
    }

    #[test]
    fn twice_j_is_bounded_for_any_float(j in any::<f64>()) {
        if let Ok(tj) = twice_j("j", j) {
            prop_assert!(tj <= MAX_TWICE_J);
            prop_assert!((tj as f64 - 2.0 * j).abs() < 1e-6);
        }
    }

    #[test]
    fn substep_count_respects_limit(
        t_max in -1e300_f64..1e300,
        n_frames in 2_usize..=50,
        log_dt in -300.0_f64..3.0,
    ) {
        let limits = Limits::default();
        let times = TimeGrid::new("nFrames", t_max, n_frames, &limits).unwrap();
        if let Ok(total) = split_substeps(times.t(), 10_f64.powf(log_dt), &limits) {
            prop_assert!(total >= n_frames - 1);
            prop_assert!(total <= limits.max_steps);
        }
    }

    #[test]
    fn accepted_grids_have_usable_spacing(
        a in any::<f64>(),
        b in any::<f64>(),
        n in 0_usize..=1100,
    ) {
        let limits = Limits::default();
        if let Ok(grid) = Grid::new(a, b, n, &limits) {
            prop_assert!(grid.dx().is_finite() && grid.dx() > 0.0);
            prop_assert!(grid.dx().powi(2).recip().is_finite());
        }
    }
}

#[test]
fn seeded_draws_repeat() {
    let basis = OscillatorBasis::new(4, 1.0, 1.0, &Limits::default()).unwrap();
    let draw = |seed| {
        let (mut rng, _) = operators::seeded_rng(Some(seed));
        operators::observe(&basis, OperatorKind::RandomHermitian, StateKind::Random, 0, &mut rng)
            .unwrap()
    };
    let a = draw(7);
    let b = draw(7);
    assert_eq!(a.operator, b.operator);
    assert_eq!(a.state, b.state);
    let c = draw(8);
    assert!(max_abs_diff(&a.operator, &c.operator) > 0.0);
}
