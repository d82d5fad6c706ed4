//! Hermitian eigendecomposition with a deterministic phase convention, plus
//! discretized Hamiltonians for one-dimensional potentials.
//!
//! Eigenvalues are returned in ascending order, as produced by LAPACK. Within
//! each eigenvector, the first component whose modulus exceeds
//! [`PHASE_TOL`] times the largest modulus is rotated onto the positive real
//! axis, so that repeated calls on the same matrix agree to floating-point
//! tolerance. Degenerate eigenvalues keep the solver's return order; any
//! orthonormal basis of a degenerate subspace is a valid answer.

use ndarray as nd;
use ndarray_linalg::{ self as la, Eigh, Inverse, Lapack, Scalar };
use num_complex::Complex64 as C64;
use serde::{ Deserialize, Serialize };
use tracing::debug;
use crate::{
    Arr1,
    Arr2,
    error::{ LengthError, NumericalError, QResult, ValidationError },
    grid::Grid,
    utils::{ hermitian_deviation, max_abs, normalized, wf_normalized },
};

/// Relative threshold selecting the phase-fixing component of an eigenvector.
pub const PHASE_TOL: f64 = 1e-10;

/// Relative tolerance on `|A - A†|` for user-supplied Hermitian matrices.
pub const HERMITIAN_TOL: f64 = 1e-9;

/// Relative tolerance under which adjacent eigenvalues count as degenerate.
pub const DEGENERACY_TOL: f64 = 1e-9;

/// Eigenvalues in ascending order, paired with unit-norm eigenvectors stored
/// as the columns of `vectors`.
#[derive(Clone, Debug)]
pub struct Spectrum<A> {
    pub values: nd::Array1<f64>,
    pub vectors: nd::Array2<A>,
}

/// Outcome probabilities for measuring an observable in some state.
#[derive(Clone, Debug)]
pub struct Measurement {
    /// `p[k] = |⟨v_k|ψ⟩|²`
    pub probabilities: nd::Array1<f64>,
    /// `Σ λ_k p_k`
    pub expectation: f64,
    /// `Σ λ_k² p_k - (Σ λ_k p_k)²`
    pub variance: f64,
}

/// Check that `a` is square, finite, and Hermitian to within
/// [`HERMITIAN_TOL`] relative to its largest element.
pub fn check_hermitian<S, A>(what: &'static str, a: &nd::ArrayBase<S, nd::Ix2>)
    -> Result<(), ValidationError>
where
    S: nd::Data<Elem = A>,
    A: Scalar<Real = f64>,
{
    let (rows, cols) = a.dim();
    if rows != cols {
        return Err(ValidationError::NotSquare { what, rows, cols });
    }
    let scale = max_abs(a);
    ValidationError::check_finite(what, scale)?;
    let deviation = hermitian_deviation(a);
    if deviation > HERMITIAN_TOL * scale.max(1.0) {
        return Err(ValidationError::NotHermitian { what, deviation });
    }
    Ok(())
}

// rotate each column so that its first significant component is real and
// positive
fn fix_phases<A>(vectors: &mut nd::Array2<A>)
where A: Scalar<Real = f64>
{
    for mut v in vectors.axis_iter_mut(nd::Axis(1)) {
        let vmax = max_abs(&v);
        let pivot = v.iter().copied().find(|z| z.abs() > PHASE_TOL * vmax);
        if let Some(c) = pivot {
            let phase = c.conj() / A::from_real(c.abs());
            v.mapv_inplace(|z| z * phase);
        }
    }
}

/// Count adjacent eigenvalue pairs closer than [`DEGENERACY_TOL`] (relative
/// to the spectral radius).
pub fn count_degeneracies(values: &nd::Array1<f64>) -> usize {
    let scale = values.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
    values.iter().zip(values.iter().skip(1))
        .filter(|(l, r)| (*r - *l).abs() <= DEGENERACY_TOL * scale)
        .count()
}

/// Diagonalize a Hermitian matrix.
///
/// The matrix is assumed Hermitian; only its lower triangle is read. Use
/// [`check_hermitian`] first for untrusted input.
pub fn eigh<S, A>(a: &nd::ArrayBase<S, nd::Ix2>) -> QResult<Spectrum<A>>
where
    S: nd::Data<Elem = A>,
    A: Scalar<Real = f64> + Lapack,
{
    NumericalError::check_finite("eigensolver input", [max_abs(a)].iter())?;
    let (values, mut vectors): (nd::Array1<f64>, nd::Array2<A>)
        = a.eigh(la::UPLO::Lower)?;
    NumericalError::check_finite("eigendecomposition", values.iter())?;
    fix_phases(&mut vectors);
    let degenerate = count_degeneracies(&values);
    if degenerate > 0 {
        debug!(dim = values.len(), degenerate, "near-degenerate spectrum");
    }
    Ok(Spectrum { values, vectors })
}

impl<A> Spectrum<A> {
    /// Get the dimension of the decomposed matrix.
    pub fn dim(&self) -> usize { self.values.len() }
}

impl Spectrum<C64> {
    /// Expansion coefficients `c[k] = ⟨v_k|ψ⟩` of a state in the eigenbasis.
    pub fn project<S>(&self, psi: &Arr1<S>) -> Result<nd::Array1<C64>, LengthError>
    where S: nd::Data<Elem = C64>
    {
        if psi.len() != self.dim() {
            return Err(LengthError(self.dim(), psi.len()));
        }
        Ok(self.vectors.t().mapv(|z| z.conj()).dot(psi))
    }

    /// Measurement statistics of the diagonalized observable in state `psi`.
    ///
    /// `psi` is normalized first; a zero vector is rejected.
    pub fn measure<S>(&self, psi: &Arr1<S>) -> QResult<Measurement>
    where S: nd::Data<Elem = C64>
    {
        let psi = normalized("state", psi)?;
        let c = self.project(&psi)?;
        let probabilities: nd::Array1<f64> = c.mapv(|ck| ck.norm_sqr());
        let expectation: f64
            = probabilities.iter().zip(&self.values)
            .map(|(p, l)| p * l)
            .sum();
        let second: f64
            = probabilities.iter().zip(&self.values)
            .map(|(p, l)| p * l * l)
            .sum();
        let variance = (second - expectation.powi(2)).max(0.0);
        NumericalError::check_finite("measurement", probabilities.iter())?;
        Ok(Measurement { probabilities, expectation, variance })
    }

    /// Reassemble `V diag(λ) V†`.
    pub fn reconstruct(&self) -> nd::Array2<C64> {
        let scaled: nd::Array2<C64>
            = &self.vectors
            * &self.values.mapv(C64::from).insert_axis(nd::Axis(0));
        scaled.dot(&self.vectors.t().mapv(|z| z.conj()))
    }
}

/// Scheme used to discretize the kinetic energy on a grid.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discretization {
    /// Three-point central difference, `O(dx²)`.
    #[default]
    FiniteDifference,
    /// Matrix Numerov, `O(dx⁴)`.
    Numerov,
}

/// Build the (real symmetric) Hamiltonian `-½ d²/dx² + V(x)` on a grid with
/// the wavefunction forced to zero outside of it.
///
/// For the matrix Numerov method this is
/// ```text
/// H = -½ inv(B) A + V
/// A = (I{-1} - 2 I{0} + I{+1}) / δx²
/// B = (I{-1} + 10 I{0} + I{+1}) / 12
/// ```
/// explicitly symmetrized to remove rounding asymmetry from the inverse.
pub fn grid_hamiltonian<S>(
    grid: &Grid,
    V: &Arr1<S>,
    method: Discretization,
) -> QResult<nd::Array2<f64>>
where S: nd::Data<Elem = f64>
{
    LengthError::check(grid.x(), V)?;
    ValidationError::check_all_finite("V", V.iter())?;
    let n = grid.len();
    let ondx2 = grid.dx().powi(2).recip();
    let mut H: nd::Array2<f64>
        = match method {
            Discretization::FiniteDifference => {
                let mut H: nd::Array2<f64> = nd::Array2::from_diag_elem(n, ondx2);
                H.slice_mut(nd::s![1..n, 0..n - 1]).diag_mut().fill(-0.5 * ondx2);
                H.slice_mut(nd::s![0..n - 1, 1..n]).diag_mut().fill(-0.5 * ondx2);
                H
            },
            Discretization::Numerov => {
                let mut A: nd::Array2<f64>
                    = nd::Array2::from_diag_elem(n, -2.0 * ondx2);
                A.slice_mut(nd::s![1..n, 0..n - 1]).diag_mut().fill(ondx2);
                A.slice_mut(nd::s![0..n - 1, 1..n]).diag_mut().fill(ondx2);
                let mut B: nd::Array2<f64>
                    = nd::Array2::from_diag_elem(n, 10.0 / 12.0);
                B.slice_mut(nd::s![1..n, 0..n - 1]).diag_mut().fill(12.0_f64.recip());
                B.slice_mut(nd::s![0..n - 1, 1..n]).diag_mut().fill(12.0_f64.recip());
                let Binv = B.inv()?;
                let K: nd::Array2<f64> = Binv.dot(&A).mapv(|k| -0.5 * k);
                (&K + &K.t()).mapv(|k| 0.5 * k)
            },
        };
    let mut H_diag = H.diag_mut();
    H_diag += V;
    Ok(H)
}

/// Lowest bound states of a grid Hamiltonian.
#[derive(Clone, Debug)]
pub struct GridSpectrum {
    /// Energies, ascending.
    pub energies: nd::Array1<f64>,
    /// Wavefunctions, one per row, normalized so that `Σ |ψ|² dx = 1`.
    pub wavefunctions: nd::Array2<f64>,
}

/// Compute the lowest `n_levels` eigenstates of `-½ d²/dx² + V(x)` on a grid.
pub fn solve_grid<S>(
    grid: &Grid,
    V: &Arr1<S>,
    method: Discretization,
    n_levels: usize,
) -> QResult<GridSpectrum>
where S: nd::Data<Elem = f64>
{
    ValidationError::check_min("nLevels", 1, n_levels)?;
    if n_levels > grid.len() {
        return Err(ValidationError::LimitExceeded {
            what: "nLevels",
            limit: grid.len(),
            got: n_levels,
        }.into());
    }
    let H = grid_hamiltonian(grid, V, method)?;
    let spec: Spectrum<f64> = eigh(&H)?;
    debug!(n = grid.len(), ?method, n_levels, "solved grid spectrum");
    let energies: nd::Array1<f64>
        = spec.values.slice(nd::s![..n_levels]).to_owned();
    let dx = grid.dx();
    let mut wavefunctions: nd::Array2<f64>
        = nd::Array2::zeros((n_levels, grid.len()));
    let iter
        = spec.vectors.columns().into_iter()
        .zip(wavefunctions.outer_iter_mut());
    for (v, mut wf) in iter {
        wf.assign(&wf_normalized(&v, dx));
    }
    Ok(GridSpectrum { energies, wavefunctions })
}

/// Diagonalize an untrusted Hermitian matrix, validating it first.
pub fn eigh_checked<S>(what: &'static str, a: &Arr2<S>) -> QResult<Spectrum<C64>>
where S: nd::Data<Elem = C64>
{
    check_hermitian(what, a)?;
    eigh(a)
}
