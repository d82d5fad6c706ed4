//! Spin precession, addition of angular momenta, and fine-structure splitting.
//!
//! A spin `j` in a static field `B` has `H = -γ B·J`, so that
//! ```text
//! d⟨J⟩/dt = γ ⟨J⟩ × B
//! ```
//! Trajectories are computed by exact propagation of the spin state rather than
//! by integrating the Bloch equation, so `|⟨J⟩|` is conserved to rounding.

use ndarray as nd;
use num_complex::Complex64 as C64;
use tracing::debug;
use crate::{
    angmom::{ self, SpinMatrices, kron },
    eigexp::HermitianExp,
    error::{ Error, NumericalError, QResult, ValidationError },
    grid::TimeGrid,
    limits::Limits,
    operators::basis_state,
    spectrum::{ self, Spectrum },
    utils::{ c64_identity, expectation },
};

/// Largest tolerated change in `|⟨J⟩|` over a trajectory, relative to `j`.
pub const MAGNITUDE_TOL: f64 = 1e-9;

/// Default gyromagnetic ratio.
pub const DEF_GAMMA: f64 = 1.0;

/// Spin coherent state `exp(-iφ Jz) exp(-iθ Jy) |j, j⟩`, pointing along
/// `(sin θ cos φ, sin θ sin φ, cos θ)`.
pub fn coherent_state(spin: &SpinMatrices, theta: f64, phi: f64)
    -> QResult<nd::Array1<C64>>
{
    ValidationError::check_finite("theta0", theta)?;
    ValidationError::check_finite("phi0", phi)?;
    let top = basis_state(spin.dim(), 0)?;
    let mut psi = HermitianExp::new(spin.jy())?.evolve(&top, theta)?;
    // Jz is diagonal
    psi.iter_mut().zip(angmom::m_values(spin.j()))
        .for_each(|(pk, mk)| { *pk *= C64::cis(-phi * mk); });
    Ok(psi)
}

/// Expectation-value trajectory of a precessing spin.
#[derive(Clone, Debug)]
pub struct SpinTrajectory {
    pub t: nd::Array1<f64>,
    pub sx: nd::Array1<f64>,
    pub sy: nd::Array1<f64>,
    pub sz: nd::Array1<f64>,
    /// `√(sx² + sy² + sz²)`
    pub magnitude: nd::Array1<f64>,
}

/// Evolve a spin-`j` coherent state starting at `(theta0, phi0)` in the field
/// `field = (Bx, By, Bz)`.
pub fn precess(
    j: f64,
    gamma: f64,
    field: [f64; 3],
    theta0: f64,
    phi0: f64,
    times: &TimeGrid,
    limits: &Limits,
) -> QResult<SpinTrajectory>
{
    let tj = angmom::twice_j("spin", j)?;
    limits.check_dim("2 spin + 1", tj + 1)?;
    ValidationError::check_finite("gamma", gamma)?;
    ValidationError::check_all_finite("B", field.iter())?;
    let spin = SpinMatrices::new(j)?;
    let h: nd::Array2<C64> = spin.dot(field).mapv(|z| -gamma * z);
    let ex = HermitianExp::new(&h)?;
    let psi0 = coherent_state(&spin, theta0, phi0)?;
    let c = ex.coefficients(&psi0)?;

    let n = times.len();
    let mut sx: nd::Array1<f64> = nd::Array1::zeros(n);
    let mut sy: nd::Array1<f64> = nd::Array1::zeros(n);
    let mut sz: nd::Array1<f64> = nd::Array1::zeros(n);
    for (k, &tk) in times.t().iter().enumerate() {
        let psi = ex.evolve_coefficients(&c, tk);
        sx[k] = expectation(spin.jx(), &psi);
        sy[k] = expectation(spin.jy(), &psi);
        sz[k] = expectation(spin.jz(), &psi);
    }
    let magnitude: nd::Array1<f64>
        = nd::Zip::from(&sx).and(&sy).and(&sz)
        .map_collect(|x, y, z| (x * x + y * y + z * z).sqrt());
    NumericalError::check_finite("spin precession", magnitude.iter())?;
    let m0 = magnitude[0];
    let tol = MAGNITUDE_TOL * j.max(1.0);
    let drift
        = times.t().iter().zip(&magnitude)
        .find(|(_, mk)| (*mk - m0).abs() > tol);
    if let Some((&t, &norm)) = drift {
        return Err(NumericalError::NormDrift { t, norm }.into());
    }
    debug!(j, ?field, frames = n, "precessed spin");
    Ok(SpinTrajectory { t: times.t().clone(), sx, sy, sz, magnitude })
}

/// A coupled state `|J, M⟩` expanded in the product basis `|m1⟩ ⊗ |m2⟩`.
#[derive(Clone, Debug)]
pub struct CoupledState {
    pub j: f64,
    pub m: f64,
    /// Clebsch-Gordan coefficients `⟨m1, m2|J, M⟩`, in product-basis order.
    pub coefficients: Vec<f64>,
}

/// Decomposition of `j1 ⊗ j2` into total-angular-momentum multiplets.
#[derive(Clone, Debug)]
pub struct Coupling {
    /// `(m1, m2)` for each product state, `m1` descending then `m2`
    /// descending.
    pub product_basis: Vec<(f64, f64)>,
    /// Allowed `J`, ascending.
    pub total_j: Vec<f64>,
    /// Eigenvalue of `J²` found for each entry of `total_j`.
    pub eigenvalues: Vec<f64>,
    /// All `|J, M⟩`, grouped by ascending `J` and descending `M`.
    pub states: Vec<CoupledState>,
}

/// Couple two angular momenta.
///
/// Each `|J, J⟩` is the `J(J+1)` eigenvector of `J²` within the `M = J`
/// block of the product basis, with its `m1 = j1`-most component positive;
/// the rest of the multiplet follows by repeated application of `J₋`. This
/// reproduces the Condon-Shortley phase convention.
pub fn couple(j1: f64, j2: f64, limits: &Limits) -> QResult<Coupling> {
    let tj1 = angmom::twice_j("j1", j1)?;
    let tj2 = angmom::twice_j("j2", j2)?;
    let dim = (tj1 + 1).saturating_mul(tj2 + 1);
    limits.check_dim("(2 j1 + 1)(2 j2 + 1)", dim)?;
    let s1 = SpinMatrices::new(j1)?;
    let s2 = SpinMatrices::new(j2)?;
    let (id1, id2) = (c64_identity(s1.dim()), c64_identity(s2.dim()));
    let total = |a: &nd::Array2<C64>, b: &nd::Array2<C64>| -> nd::Array2<C64> {
        kron(a, &id2) + kron(&id1, b)
    };
    let jx = total(s1.jx(), s2.jx());
    let jy = total(s1.jy(), s2.jy());
    let jz = total(s1.jz(), s2.jz());
    let jm = total(s1.jm(), s2.jm());
    let jsq: nd::Array2<C64> = jx.dot(&jx) + jy.dot(&jy) + jz.dot(&jz);

    let product_basis: Vec<(f64, f64)>
        = angmom::m_values(j1).into_iter()
        .flat_map(|m1| angmom::m_values(j2).into_iter().map(move |m2| (m1, m2)))
        .collect();
    let m_tot: Vec<f64> = product_basis.iter().map(|(m1, m2)| m1 + m2).collect();

    let n_j = tj1.min(tj2) + 1;
    let j_min = (j1 - j2).abs();
    let total_j: Vec<f64> = (0..n_j).map(|k| j_min + k as f64).collect();
    let mut eigenvalues: Vec<f64> = Vec::with_capacity(n_j);
    let mut states: Vec<CoupledState> = Vec::with_capacity(dim);
    for &j in total_j.iter() {
        let block: Vec<usize>
            = m_tot.iter().enumerate()
            .filter(|(_, m)| (*m - j).abs() < 1e-9)
            .map(|(k, _)| k)
            .collect();
        let sub: nd::Array2<f64>
            = jsq.select(nd::Axis(0), &block).select(nd::Axis(1), &block)
            .mapv(|z| z.re);
        let spec: Spectrum<f64> = spectrum::eigh(&sub)?;
        let target = j * (j + 1.0);
        let (k, &lambda)
            = spec.values.iter().enumerate()
            .min_by(|(_, l), (_, r)| (*l - target).abs().total_cmp(&(*r - target).abs()))
            .ok_or_else(|| Error::Internal(format!("empty M = {j} block")))?;
        if (lambda - target).abs() > 1e-8 * target.max(1.0) {
            return Err(Error::Internal(
                format!("no J(J+1) = {target} eigenvalue in M = {j} block")));
        }
        eigenvalues.push(lambda);

        let mut state: nd::Array1<C64> = nd::Array1::zeros(dim);
        block.iter().zip(spec.vectors.column(k))
            .for_each(|(&b, &v)| { state[b] = C64::from(v); });
        let n_m = (2.0 * j).round() as usize + 1;
        for step in 0..n_m {
            states.push(CoupledState {
                j,
                m: j - step as f64,
                coefficients: state.iter().map(|z| z.re).collect(),
            });
            if step + 1 < n_m {
                state = jm.dot(&state);
                let norm = state.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt();
                if norm <= f64::EPSILON {
                    return Err(NumericalError::NonFinite("lowering").into());
                }
                state.mapv_inplace(|z| z / norm);
            }
        }
    }
    debug!(j1, j2, dim, multiplets = n_j, "coupled angular momenta");
    Ok(Coupling { product_basis, total_j, eigenvalues, states })
}

/// Fine-structure energies `λ ⟨L·S⟩` for every allowed `j`.
#[derive(Clone, Debug)]
pub struct SpinOrbit {
    /// `|l - s|, ..., l + s`
    pub j_values: Vec<f64>,
    /// `E_j(λ)`, one row per `λ`.
    pub energies: Vec<Vec<f64>>,
}

/// Compute `E_j = (λ/2) [j(j+1) - l(l+1) - s(s+1)]` over a sweep of coupling
/// constants.
pub fn spin_orbit(l: f64, s: f64, lambdas: &[f64], limits: &Limits)
    -> Result<SpinOrbit, ValidationError>
{
    let tl = angmom::twice_j("l", l)?;
    let ts = angmom::twice_j("s", s)?;
    limits.check_sweep("lambdaArray", lambdas.len())?;
    limits.check_samples("energies", lambdas.len(), tl.min(ts) + 1)?;
    ValidationError::check_all_finite("lambdaArray", lambdas.iter())?;
    let j_min = (l - s).abs();
    let j_values: Vec<f64>
        = (0..=tl.min(ts)).map(|k| j_min + k as f64).collect();
    let ls = |j: f64| 0.5 * (j * (j + 1.0) - l * (l + 1.0) - s * (s + 1.0));
    let energies: Vec<Vec<f64>>
        = lambdas.iter()
        .map(|lam| j_values.iter().map(|&j| lam * ls(j)).collect())
        .collect();
    Ok(SpinOrbit { j_values, energies })
}
