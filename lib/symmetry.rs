//! Rotation, parity, and time-reversal operators on an `N`-dimensional space.
//!
//! The `N`-dimensional space is identified with a spin-`j` multiplet,
//! `j = (N - 1)/2`, so that rotations are generated by the matching
//! `Jx, Jy, Jz`.

use std::cmp::Ordering;
use ndarray as nd;
use ndarray_linalg::EigVals;
use num_complex::Complex64 as C64;
use tracing::debug;
use crate::{
    Arr1,
    Arr2,
    angmom::{ Axis, SpinMatrices },
    eigexp::HermitianExp,
    error::{ Error, LengthError, NumericalError, QResult, ValidationError },
    limits::Limits,
    spectrum::{ self, Spectrum },
    utils::{ c64_identity, dagger, max_abs, max_abs_diff },
};

/// Tolerance for symmetry checks (`Θ H Θ⁻¹ = H`, `Θ² = ±1`).
pub const SYMMETRY_TOL: f64 = 1e-9;

// order complex numbers by phase in (-π, π], then by modulus
fn phase_order(l: &C64, r: &C64) -> Ordering {
    l.arg().total_cmp(&r.arg()).then(l.norm().total_cmp(&r.norm()))
}

/// A rotation operator together with its numerically computed spectrum.
#[derive(Clone, Debug)]
pub struct Rotation {
    pub operator: nd::Array2<C64>,
    /// Eigenvalues of `operator`, sorted by phase.
    pub eigenvalues: nd::Array1<C64>,
}

impl Rotation {
    /// `|λ|` for every eigenvalue; all equal to 1 for a unitary operator.
    pub fn moduli(&self) -> nd::Array1<f64> { self.eigenvalues.mapv(|l| l.norm()) }

    /// Compute `R ψ`.
    pub fn rotate_state<S>(&self, psi: &Arr1<S>) -> Result<nd::Array1<C64>, LengthError>
    where S: nd::Data<Elem = C64>
    {
        if psi.len() != self.operator.ncols() {
            return Err(LengthError(self.operator.ncols(), psi.len()));
        }
        Ok(self.operator.dot(psi))
    }

    /// Compute `R A R†`.
    pub fn rotate_operator<S>(&self, a: &Arr2<S>) -> Result<nd::Array2<C64>, LengthError>
    where S: nd::Data<Elem = C64>
    {
        let n = self.operator.nrows();
        if a.nrows() != n || a.ncols() != n {
            return Err(LengthError(n, a.nrows()));
        }
        Ok(self.operator.dot(a).dot(&dagger(&self.operator)))
    }
}

/// Build `R = exp(-i angle J_axis)` in dimension `dim`.
pub fn rotation(dim: usize, axis: Axis, angle: f64, limits: &Limits) -> QResult<Rotation> {
    limits.check_dim("N", dim)?;
    ValidationError::check_finite("angle", angle)?;
    let spin = SpinMatrices::from_dim(dim)?;
    let operator = HermitianExp::new(spin.along(axis))?.unitary(angle);
    let mut eigenvalues: Vec<C64> = operator.eigvals()?.to_vec();
    NumericalError::check_finite(
        "rotation eigenvalues",
        eigenvalues.iter().flat_map(|l| [l.re, l.im]).collect::<Vec<f64>>().iter(),
    )?;
    eigenvalues.sort_by(phase_order);
    debug!(dim, ?axis, angle, "built rotation");
    Ok(Rotation { operator, eigenvalues: eigenvalues.into() })
}

/// Parity (basis reversal) `P|k⟩ = |N - 1 - k⟩`.
#[derive(Clone, Debug)]
pub struct Parity {
    pub operator: nd::Array2<f64>,
    /// `-1` repeated `⌊N/2⌋` times, then `+1` repeated `⌈N/2⌉` times.
    pub eigenvalues: nd::Array1<f64>,
}

/// Build the parity operator in dimension `dim`.
pub fn parity(dim: usize, limits: &Limits) -> QResult<Parity> {
    limits.check_dim("N", dim)?;
    let operator: nd::Array2<f64>
        = nd::Array2::from_shape_fn((dim, dim), |(i, j)| {
            if i + j == dim - 1 { 1.0 } else { 0.0 }
        });
    let spec: Spectrum<f64> = spectrum::eigh(&operator)?;
    Ok(Parity { operator, eigenvalues: spec.values })
}

/// The antiunitary time-reversal operator `Θ = U K`.
#[derive(Clone, Debug)]
pub struct TimeReversal {
    /// The unitary part `U`.
    pub unitary: nd::Array2<C64>,
    /// Eigenvalues of `U`, sorted by phase.
    pub eigenvalues: nd::Array1<C64>,
    /// `Θ² = U U*`, which is `±1` times the identity.
    pub theta_squared: f64,
}

impl TimeReversal {
    /// Build `Θ` in dimension `dim`: `U = exp(-iπ Jy)` with `j = (N - 1)/2` if
    /// `spin_flip`, else `U = 1` (plain complex conjugation).
    pub fn new(dim: usize, spin_flip: bool, limits: &Limits) -> QResult<Self> {
        limits.check_dim("N", dim)?;
        let unitary: nd::Array2<C64>
            = if spin_flip {
                let spin = SpinMatrices::from_dim(dim)?;
                HermitianExp::new(spin.jy())?.unitary(std::f64::consts::PI)
            } else {
                c64_identity(dim)
            };
        let mut eigenvalues: Vec<C64> = unitary.eigvals()?.to_vec();
        eigenvalues.sort_by(phase_order);
        let sq = unitary.dot(&unitary.mapv(|z| z.conj()));
        let theta_squared = sq[[0, 0]].re;
        let deviation = max_abs_diff(&sq, &c64_identity(dim).mapv(|z| z * theta_squared));
        if deviation > SYMMETRY_TOL || (theta_squared.abs() - 1.0).abs() > SYMMETRY_TOL {
            return Err(Error::Internal(
                format!("Θ² deviates from ±1 by {deviation:.3e}")));
        }
        debug!(dim, spin_flip, theta_squared, "built time reversal");
        Ok(Self { unitary, eigenvalues: eigenvalues.into(), theta_squared })
    }

    pub fn dim(&self) -> usize { self.unitary.nrows() }

    /// Compute `Θ ψ = U ψ*`.
    pub fn apply_state<S>(&self, psi: &Arr1<S>) -> Result<nd::Array1<C64>, LengthError>
    where S: nd::Data<Elem = C64>
    {
        if psi.len() != self.dim() {
            return Err(LengthError(self.dim(), psi.len()));
        }
        Ok(self.unitary.dot(&psi.mapv(|z| z.conj())))
    }

    /// Compute `Θ H Θ⁻¹ = U H* U†`.
    pub fn apply_operator<S>(&self, h: &Arr2<S>) -> Result<nd::Array2<C64>, LengthError>
    where S: nd::Data<Elem = C64>
    {
        if h.nrows() != self.dim() || h.ncols() != self.dim() {
            return Err(LengthError(self.dim(), h.nrows()));
        }
        Ok(self.unitary.dot(&h.mapv(|z| z.conj())).dot(&dagger(&self.unitary)))
    }

    /// Whether `Θ H Θ⁻¹ = H` to within [`SYMMETRY_TOL`] (relative).
    pub fn is_invariant<S>(&self, h: &Arr2<S>) -> Result<bool, LengthError>
    where S: nd::Data<Elem = C64>
    {
        let reversed = self.apply_operator(h)?;
        let scale = max_abs(h).max(1.0);
        Ok(max_abs_diff(&reversed, h) <= SYMMETRY_TOL * scale)
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{ FRAC_PI_3, PI };
    use super::*;
    use crate::angmom::m_values;

    fn limits() -> Limits { Limits::default() }

    #[test]
    fn rotation_eigenvalues_are_unimodular() {
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            let rot = rotation(5, axis, 1.234, &limits()).unwrap();
            assert!(rot.moduli().iter().all(|m| (m - 1.0).abs() < 1e-10));
        }
    }

    #[test]
    fn z_rotation_eigenvalues_follow_m() {
        let angle = 0.7;
        let rot = rotation(4, Axis::Z, angle, &limits()).unwrap();
        let mut expected: Vec<C64>
            = m_values(1.5).into_iter().map(|m| C64::cis(-angle * m)).collect();
        expected.sort_by(phase_order);
        for (l, e) in rot.eigenvalues.iter().zip(expected) {
            assert!((l - e).norm() < 1e-10);
        }
    }

    #[test]
    fn rotation_round_trip_restores_operator() {
        let spin = SpinMatrices::from_dim(3).unwrap();
        let a = spin.jx().dot(spin.jz()) + spin.jy();
        let fwd = rotation(3, Axis::Y, FRAC_PI_3, &limits()).unwrap();
        let back = rotation(3, Axis::Y, -FRAC_PI_3, &limits()).unwrap();
        let rotated = fwd.rotate_operator(&a).unwrap();
        assert!(max_abs_diff(&rotated, &a) > 1e-3);
        let restored = back.rotate_operator(&rotated).unwrap();
        assert!(max_abs_diff(&restored, &a) < 1e-12);
    }

    #[test]
    fn two_pi_rotation_of_half_integer_spin_is_minus_one() {
        let rot = rotation(2, Axis::X, 2.0 * PI, &limits()).unwrap();
        let minus = c64_identity(2).mapv(|z| -z);
        assert!(max_abs_diff(&rot.operator, &minus) < 1e-12);
    }

    #[test]
    fn parity_eigenvalues_are_signs() {
        let p = parity(5, &limits()).unwrap();
        let expected = [-1.0, -1.0, 1.0, 1.0, 1.0];
        assert!(p.eigenvalues.iter().zip(expected).all(|(l, e)| (l - e).abs() < 1e-12));
        assert_eq!(p.operator[[0, 4]], 1.0);
        assert_eq!(p.operator[[2, 2]], 1.0);
        assert!(parity(1, &limits()).is_err());
    }

    #[test]
    fn theta_squared_depends_on_spin() {
        let half = TimeReversal::new(2, true, &limits()).unwrap();
        assert!((half.theta_squared + 1.0).abs() < 1e-12);
        let one = TimeReversal::new(3, true, &limits()).unwrap();
        assert!((one.theta_squared - 1.0).abs() < 1e-12);
        let plain = TimeReversal::new(4, false, &limits()).unwrap();
        assert!((plain.theta_squared - 1.0).abs() < 1e-12);
    }

    #[test]
    fn spin_flip_reverses_spin_expectation() {
        let spin = SpinMatrices::from_dim(2).unwrap();
        let tr = TimeReversal::new(2, true, &limits()).unwrap();
        let up = nd::array![C64::from(1.0), C64::from(0.0)];
        let flipped = tr.apply_state(&up).unwrap();
        let sz = crate::utils::expectation(spin.jz(), &flipped);
        assert!((sz + 0.5).abs() < 1e-12);
        // a Zeeman term is odd under time reversal, a real potential is even
        assert!(!tr.is_invariant(spin.jz()).unwrap());
        let plain = TimeReversal::new(2, false, &limits()).unwrap();
        let real_h = nd::array![
            [C64::from(1.0), C64::from(0.5)],
            [C64::from(0.5), C64::from(-1.0)],
        ];
        assert!(plain.is_invariant(&real_h).unwrap());
    }
}
