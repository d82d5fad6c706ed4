//! Truncated-basis and grid representations of observables, and the states
//! they act on.
//!
//! Finite-dimensional operators live in the harmonic-oscillator number basis
//! `|0⟩, ..., |N - 1⟩`, with
//! ```text
//! x = ℓ (a + a†) / √2
//! p = i (a† - a) / (√2 ℓ)
//! ```
//! for characteristic length `ℓ` (ħ = m = 1, so `ℓ = 1/√ω` for the matching
//! oscillator). Truncation breaks `[x, p] = i` in the last basis state; both
//! matrices are still exactly Hermitian.
//!
//! Random draws always come from an explicitly seeded [`StdRng`].

use ndarray as nd;
use num_complex::Complex64 as C64;
use rand::{ Rng, SeedableRng, rngs::StdRng };
use serde::{ Deserialize, Serialize };
use tracing::debug;
use crate::{
    Arr1,
    Arr2,
    error::{ Error, LengthError, QResult, ValidationError },
    grid::Grid,
    limits::Limits,
    spectrum::{ self, Measurement, Spectrum },
    utils::{ c64_identity, dagger, max_abs_diff, norm_sqr, normalized },
};

/// Tolerance on `max |U†U - I|` for a matrix to count as unitary.
pub const UNITARY_TOL: f64 = 1e-8;

/// Observable tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorKind {
    Position,
    Momentum,
    /// `a† a`
    Number,
    /// `ω (a† a + ½)`
    Hamiltonian,
    /// `(A + A†) / 2` for `A` with uniform random entries.
    RandomHermitian,
}

/// State preparation tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    /// A single basis vector `|n⟩`.
    Basis,
    /// `Σ_k |k⟩ / √N`
    Superposition,
    /// A normalized vector with uniform random components.
    Random,
}

/// Create a seeded generator, drawing a fresh seed if none is given.
///
/// The seed actually used is returned so that the draw can be reproduced.
pub fn seeded_rng(seed: Option<u64>) -> (StdRng, u64) {
    // drawn seeds stay exactly representable as JSON numbers
    let seed = seed.unwrap_or_else(|| rand::thread_rng().gen_range(0..1_u64 << 53));
    (StdRng::seed_from_u64(seed), seed)
}

fn random_c64<R: Rng>(rng: &mut R) -> C64 {
    C64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
}

/// Truncated harmonic-oscillator basis.
#[derive(Copy, Clone, Debug)]
pub struct OscillatorBasis {
    dim: usize,
    length: f64,
    omega: f64,
}

impl OscillatorBasis {
    /// Create a new basis of `dim` states with characteristic length `length`
    /// and oscillator frequency `omega`.
    pub fn new(dim: usize, length: f64, omega: f64, limits: &Limits)
        -> Result<Self, ValidationError>
    {
        limits.check_dim("N", dim)?;
        ValidationError::check_positive("length", length)?;
        ValidationError::check_positive("omega", omega)?;
        Ok(Self { dim, length, omega })
    }

    pub fn dim(&self) -> usize { self.dim }

    pub fn length(&self) -> f64 { self.length }

    pub fn omega(&self) -> f64 { self.omega }

    /// Lowering operator, `a|n⟩ = √n |n - 1⟩`.
    pub fn annihilation(&self) -> nd::Array2<C64> {
        let n = self.dim;
        let mut a: nd::Array2<C64> = nd::Array2::zeros((n, n));
        a.slice_mut(nd::s![0..n - 1, 1..n]).diag_mut()
            .iter_mut()
            .enumerate()
            .for_each(|(k, ak)| { *ak = C64::from(((k + 1) as f64).sqrt()); });
        a
    }

    pub fn position(&self) -> nd::Array2<C64> {
        let a = self.annihilation();
        let scale = self.length / 2.0_f64.sqrt();
        (&a + &dagger(&a)).mapv(|z| z * scale)
    }

    pub fn momentum(&self) -> nd::Array2<C64> {
        let a = self.annihilation();
        let scale = C64::i() / (2.0_f64.sqrt() * self.length);
        (&dagger(&a) - &a).mapv(|z| z * scale)
    }

    pub fn number(&self) -> nd::Array2<C64> {
        let n: nd::Array1<C64> = (0..self.dim).map(|k| C64::from(k as f64)).collect();
        nd::Array2::from_diag(&n)
    }

    pub fn hamiltonian(&self) -> nd::Array2<C64> {
        let e: nd::Array1<C64>
            = (0..self.dim)
            .map(|k| C64::from(self.omega * (k as f64 + 0.5)))
            .collect();
        nd::Array2::from_diag(&e)
    }

    /// Build the operator named by `kind`.
    pub fn operator<R>(&self, kind: OperatorKind, rng: &mut R) -> nd::Array2<C64>
    where R: Rng
    {
        match kind {
            OperatorKind::Position => self.position(),
            OperatorKind::Momentum => self.momentum(),
            OperatorKind::Number => self.number(),
            OperatorKind::Hamiltonian => self.hamiltonian(),
            OperatorKind::RandomHermitian => random_hermitian(self.dim, rng),
        }
    }
}

/// Draw `(A + A†)/2` with `Re A_ij, Im A_ij ~ U[-1, 1)`.
pub fn random_hermitian<R>(n: usize, rng: &mut R) -> nd::Array2<C64>
where R: Rng
{
    let a: nd::Array2<C64>
        = nd::Array2::from_shape_simple_fn((n, n), || random_c64(&mut *rng));
    (&a + &dagger(&a)).mapv(|z| z * 0.5)
}

/// The unit vector `|index⟩`.
pub fn basis_state(dim: usize, index: usize) -> Result<nd::Array1<C64>, ValidationError> {
    ValidationError::check_index("n", index, dim)?;
    let mut psi: nd::Array1<C64> = nd::Array1::zeros(dim);
    psi[index] = C64::from(1.0);
    Ok(psi)
}

/// The equal-amplitude superposition of all `dim` basis states.
pub fn superposition_state(dim: usize) -> nd::Array1<C64> {
    nd::Array1::from_elem(dim, C64::from((dim as f64).sqrt().recip()))
}

/// A normalized random state.
pub fn random_state<R>(dim: usize, rng: &mut R) -> Result<nd::Array1<C64>, ValidationError>
where R: Rng
{
    let psi: nd::Array1<C64> = (0..dim).map(|_| random_c64(&mut *rng)).collect();
    normalized("random state", &psi)
}

/// Build the state named by `kind` in a `dim`-dimensional space. `index` is
/// only used for [`StateKind::Basis`].
pub fn prepare_state<R>(kind: StateKind, dim: usize, index: usize, rng: &mut R)
    -> Result<nd::Array1<C64>, ValidationError>
where R: Rng
{
    match kind {
        StateKind::Basis => basis_state(dim, index),
        StateKind::Superposition => Ok(superposition_state(dim)),
        StateKind::Random => random_state(dim, rng),
    }
}

/// An observable, a state, and the statistics of measuring one in the other.
#[derive(Clone, Debug)]
pub struct Observation {
    pub operator: nd::Array2<C64>,
    pub state: nd::Array1<C64>,
    pub spectrum: Spectrum<C64>,
    pub measurement: Measurement,
}

/// Build an operator and a state, then diagonalize and measure.
pub fn observe<R>(
    basis: &OscillatorBasis,
    operator: OperatorKind,
    state: StateKind,
    index: usize,
    rng: &mut R,
) -> QResult<Observation>
where R: Rng
{
    // the operator is drawn first so that a given seed fixes it independently
    // of the state kind
    let op = basis.operator(operator, rng);
    let psi = prepare_state(state, basis.dim(), index, rng)?;
    spectrum::check_hermitian("operator", &op)
        .map_err(|e| Error::Internal(format!("built a non-Hermitian {operator:?}: {e}")))?;
    let spec = spectrum::eigh(&op)?;
    let measurement = spec.measure(&psi)?;
    debug!(
        dim = basis.dim(),
        ?operator,
        ?state,
        expectation = measurement.expectation,
        "measured observable",
    );
    Ok(Observation { operator: op, state: psi, spectrum: spec, measurement })
}

/// Position operator `diag(x)` on a grid.
pub fn grid_position(grid: &Grid) -> nd::Array2<C64> {
    nd::Array2::from_diag(&grid.x().mapv(C64::from))
}

/// Momentum operator `-i d/dx` on a grid, as a central difference with the
/// wavefunction forced to zero outside of it.
pub fn grid_momentum(grid: &Grid) -> nd::Array2<C64> {
    let n = grid.len();
    let c = C64::new(0.0, -0.5 / grid.dx());
    let mut p: nd::Array2<C64> = nd::Array2::zeros((n, n));
    p.slice_mut(nd::s![0..n - 1, 1..n]).diag_mut().fill(c);
    p.slice_mut(nd::s![1..n, 0..n - 1]).diag_mut().fill(c.conj());
    p
}

/// Result of re-expressing a state in a new basis.
#[derive(Clone, Debug)]
pub struct BasisChange {
    pub state: nd::Array1<C64>,
    /// `max |U†U - I|`
    pub unitarity_deviation: f64,
    /// Whether `U` is unitary to within [`UNITARY_TOL`], i.e. whether
    /// measurement probabilities are preserved.
    pub probabilities_invariant: bool,
}

/// Compute `ψ' = U ψ`.
///
/// Non-unitary `U` is not rejected; the returned flag records whether total
/// probability survives the transformation.
pub fn change_basis<S, T>(u: &Arr2<S>, psi: &Arr1<T>) -> QResult<BasisChange>
where
    S: nd::Data<Elem = C64>,
    T: nd::Data<Elem = C64>,
{
    let (rows, cols) = u.dim();
    if rows != cols {
        return Err(ValidationError::NotSquare { what: "U", rows, cols }.into());
    }
    if psi.len() != cols {
        return Err(LengthError(cols, psi.len()).into());
    }
    let state = u.dot(psi);
    let unitarity_deviation = max_abs_diff(&dagger(u).dot(u), &c64_identity(rows));
    let norm_change = (norm_sqr(&state) - norm_sqr(psi)).abs();
    let probabilities_invariant
        = unitarity_deviation < UNITARY_TOL
        && norm_change < UNITARY_TOL * norm_sqr(psi).max(1.0);
    Ok(BasisChange { state, unitarity_deviation, probabilities_invariant })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::hermitian_deviation;

    fn basis(n: usize) -> OscillatorBasis {
        OscillatorBasis::new(n, 1.0, 1.0, &Limits::default()).unwrap()
    }

    #[test]
    fn builder_operators_are_hermitian() {
        let b = basis(12);
        let (mut rng, _) = seeded_rng(Some(7));
        let kinds = [
            OperatorKind::Position,
            OperatorKind::Momentum,
            OperatorKind::Number,
            OperatorKind::Hamiltonian,
            OperatorKind::RandomHermitian,
        ];
        for kind in kinds {
            assert!(hermitian_deviation(&b.operator(kind, &mut rng)) < 1e-14, "{kind:?}");
        }
    }

    #[test]
    fn position_entries_follow_ladder_convention() {
        let b = OscillatorBasis::new(4, 2.0, 1.0, &Limits::default()).unwrap();
        let x = b.position();
        assert!((x[[0, 1]].re - 2.0 / 2.0_f64.sqrt()).abs() < 1e-14);
        assert!((x[[2, 3]].re - 2.0 * 3.0_f64.sqrt() / 2.0_f64.sqrt()).abs() < 1e-14);
        let p = b.momentum();
        assert!(p[[0, 1]].re.abs() < 1e-15);
        assert!((p[[0, 1]].im + 0.5 / 2.0_f64.sqrt()).abs() < 1e-14);
    }

    #[test]
    fn canonical_commutator_holds_away_from_truncation() {
        let b = basis(10);
        let (x, p) = (b.position(), b.momentum());
        let comm = x.dot(&p) - p.dot(&x);
        for k in 0..9 {
            assert!((comm[[k, k]] - C64::i()).norm() < 1e-12);
        }
    }

    #[test]
    fn seeded_draws_are_reproducible() {
        let (mut r1, s) = seeded_rng(Some(42));
        let (mut r2, _) = seeded_rng(Some(s));
        let a = random_hermitian(5, &mut r1);
        let b = random_hermitian(5, &mut r2);
        assert_eq!(a, b);
        let (_, drawn) = seeded_rng(None);
        let (mut r3, _) = seeded_rng(Some(drawn));
        let (mut r4, _) = seeded_rng(Some(drawn));
        assert_eq!(random_state(4, &mut r3).unwrap(), random_state(4, &mut r4).unwrap());
    }

    #[test]
    fn states_are_normalized() {
        let (mut rng, _) = seeded_rng(Some(1));
        for kind in [StateKind::Basis, StateKind::Superposition, StateKind::Random] {
            let psi = prepare_state(kind, 6, 2, &mut rng).unwrap();
            assert!((norm_sqr(&psi) - 1.0).abs() < 1e-12);
        }
        assert!(basis_state(3, 3).is_err());
    }

    #[test]
    fn number_operator_measured_in_superposition() {
        let b = basis(4);
        let (mut rng, _) = seeded_rng(Some(0));
        let obs = observe(&b, OperatorKind::Number, StateKind::Superposition, 0, &mut rng)
            .unwrap();
        let expected = [0.0, 1.0, 2.0, 3.0];
        assert!(obs.spectrum.values.iter().zip(expected).all(|(l, e)| (l - e).abs() < 1e-12));
        assert!(obs.measurement.probabilities.iter().all(|p| (p - 0.25).abs() < 1e-12));
        assert!((obs.measurement.expectation - 1.5).abs() < 1e-12);
        assert!((obs.measurement.variance - 1.25).abs() < 1e-12);
    }

    #[test]
    fn rejects_small_dimension() {
        assert!(OscillatorBasis::new(1, 1.0, 1.0, &Limits::default()).is_err());
        assert!(OscillatorBasis::new(4, 0.0, 1.0, &Limits::default()).is_err());
    }

    #[test]
    fn grid_momentum_is_hermitian() {
        let grid = Grid::new(-1.0, 1.0, 9, &Limits::default()).unwrap();
        assert!(hermitian_deviation(&grid_momentum(&grid)) < 1e-15);
        assert_eq!(grid_position(&grid)[[8, 8]], C64::from(1.0));
    }

    #[test]
    fn basis_change_flags_non_unitary_matrices() {
        let s = 0.5_f64.sqrt();
        let h = nd::array![
            [C64::from(s), C64::from(s)],
            [C64::from(s), C64::from(-s)],
        ];
        let psi = nd::array![C64::from(1.0), C64::from(0.0)];
        let res = change_basis(&h, &psi).unwrap();
        assert!(res.probabilities_invariant);
        assert!((res.state[1].re - s).abs() < 1e-14);
        let m = nd::array![
            [C64::from(2.0), C64::from(0.0)],
            [C64::from(0.0), C64::from(1.0)],
        ];
        assert!(!change_basis(&m, &psi).unwrap().probabilities_invariant);
        let short = nd::array![C64::from(1.0)];
        assert!(change_basis(&h, &short).is_err());
    }
}
