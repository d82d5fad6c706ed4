//! Unitary time evolution under time-independent Hamiltonians.
//!
//! Finite-dimensional states evolve by phase-rotating their coefficients in the
//! eigenbasis of `H` (see [`HermitianExp`]), which stays accurate for
//! arbitrarily large `|t|`. Grid wavefunctions evolve either the same way with
//! the finite-difference Hamiltonian, or with the pseudo-spectral split-step
//! operator
//! ```text
//! ψ(t + δt) ≈ exp(-i V δt / 2) F⁻¹ exp(-i k² δt / 2) F exp(-i V δt / 2) ψ(t)
//! ```
//! which treats the grid as periodic.
//!
//! Every returned trajectory has its norm checked against [`NORM_TOL`].

use std::collections::BTreeSet;
use ndarray as nd;
use num_complex::Complex64 as C64;
use serde::Deserialize;
use tracing::{ debug, warn };
use crate::{
    Arr1,
    Arr2,
    eigexp::HermitianExp,
    error::{ Error, LengthError, NumericalError, QResult, ValidationError },
    grid::{ Grid, TimeGrid },
    limits::Limits,
    spectrum::{ self, Discretization, Spectrum },
    utils::{
        expectation,
        fft_inplace,
        fft_wavenumbers,
        ifft_inplace,
        max_abs,
        normalized,
        wf_norm_sqr,
        wf_renormalize,
    },
};

/// Largest tolerated `|‖ψ(t)‖² - 1|` before a trajectory is rejected.
pub const NORM_TOL: f64 = 1e-8;

/// `|‖ψ(t)‖² - 1|` above which norm drift is logged.
pub const NORM_WARN: f64 = 1e-11;

/// Relative tolerance for Schrödinger/Heisenberg agreement, scaled by the
/// operator's magnitude and dimension.
pub const PICTURE_TOL: f64 = 1e-9;

/// Default largest split-step substep.
pub const DEF_MAX_DT: f64 = 0.01;

fn check_norms<S, T>(t: &Arr1<S>, norms: &Arr1<T>) -> Result<(), NumericalError>
where
    S: nd::Data<Elem = f64>,
    T: nd::Data<Elem = f64>,
{
    NumericalError::check_finite("propagation", norms.iter())?;
    let mut worst: f64 = 0.0;
    for (&tk, &nk) in t.iter().zip(norms) {
        let drift = (nk - 1.0).abs();
        if drift > NORM_TOL {
            return Err(NumericalError::NormDrift { t: tk, norm: nk });
        }
        worst = worst.max(drift);
    }
    if worst > NORM_WARN {
        warn!(drift = worst, "norm drift during propagation");
    }
    Ok(())
}

/// Time series of a finite-dimensional state.
#[derive(Clone, Debug)]
pub struct Trajectory {
    pub t: nd::Array1<f64>,
    /// `ψ(t_k)`, one per row.
    pub states: nd::Array2<C64>,
    /// `|ψ_j(t_k)|²`, one time per row.
    pub probabilities: nd::Array2<f64>,
    /// `‖ψ(t_k)‖²`
    pub norms: nd::Array1<f64>,
}

/// Compute `ψ(t) = exp(-i H t) ψ0` over a time grid.
///
/// `h` must be Hermitian; `psi0` is normalized first.
pub fn evolve_basis<S, T>(h: &Arr2<S>, psi0: &Arr1<T>, times: &TimeGrid)
    -> QResult<Trajectory>
where
    S: nd::Data<Elem = C64>,
    T: nd::Data<Elem = C64>,
{
    spectrum::check_hermitian("H", h)?;
    if psi0.len() != h.nrows() {
        return Err(LengthError(h.nrows(), psi0.len()).into());
    }
    let psi0 = normalized("psi0", psi0)?;
    let ex = HermitianExp::new(h)?;
    let c = ex.coefficients(&psi0)?;
    let mut states: nd::Array2<C64> = nd::Array2::zeros((times.len(), h.nrows()));
    for (&tk, mut row) in times.t().iter().zip(states.outer_iter_mut()) {
        row.assign(&ex.evolve_coefficients(&c, tk));
    }
    let probabilities: nd::Array2<f64> = states.mapv(|z| z.norm_sqr());
    NumericalError::check_finite("propagation", probabilities.iter())?;
    let norms = probabilities.sum_axis(nd::Axis(1));
    check_norms(times.t(), &norms)?;
    debug!(dim = h.nrows(), frames = times.len(), "evolved state");
    Ok(Trajectory { t: times.t().clone(), states, probabilities, norms })
}

/// Compute the Heisenberg-picture operator `A(t) = exp(i H t) A exp(-i H t)`.
pub fn heisenberg<S, T>(a: &Arr2<S>, h: &Arr2<T>, t: f64) -> QResult<nd::Array2<C64>>
where
    S: nd::Data<Elem = C64>,
    T: nd::Data<Elem = C64>,
{
    ValidationError::check_finite("t", t)?;
    spectrum::check_hermitian("H", h)?;
    let (rows, cols) = a.dim();
    if rows != cols {
        return Err(ValidationError::NotSquare { what: "A", rows, cols }.into());
    }
    let ex = HermitianExp::new(h)?;
    let a_t = ex.conjugate(a, t)?;
    NumericalError::check_finite("Heisenberg evolution", [max_abs(&a_t)].iter())?;
    Ok(a_t)
}

/// `⟨A⟩(t)` computed independently in both pictures.
#[derive(Clone, Debug)]
pub struct PictureComparison {
    pub t: nd::Array1<f64>,
    /// `⟨ψ(t)|A|ψ(t)⟩`
    pub schrodinger: nd::Array1<f64>,
    /// `⟨ψ0|A(t)|ψ0⟩`
    pub heisenberg: nd::Array1<f64>,
    pub max_deviation: f64,
}

/// Evaluate `⟨A⟩(t)` by evolving the state and, separately, by evolving the
/// operator, and check that the two agree.
///
/// Disagreement beyond [`PICTURE_TOL`] (scaled by `max |A_ij|` and the
/// dimension) is reported as [`NumericalError::PictureMismatch`].
pub fn compare_pictures<S, T, U>(
    a: &Arr2<S>,
    h: &Arr2<T>,
    psi0: &Arr1<U>,
    times: &TimeGrid,
) -> QResult<PictureComparison>
where
    S: nd::Data<Elem = C64>,
    T: nd::Data<Elem = C64>,
    U: nd::Data<Elem = C64>,
{
    spectrum::check_hermitian("A", a)?;
    spectrum::check_hermitian("H", h)?;
    let n = h.nrows();
    if a.nrows() != n {
        return Err(LengthError(n, a.nrows()).into());
    }
    if psi0.len() != n {
        return Err(LengthError(n, psi0.len()).into());
    }
    let psi0 = normalized("psi0", psi0)?;
    let ex = HermitianExp::new(h)?;
    let c = ex.coefficients(&psi0)?;
    let a_eig = ex.to_eigenbasis(a)?;
    let mut schrodinger: nd::Array1<f64> = nd::Array1::zeros(times.len());
    let mut heisenberg: nd::Array1<f64> = nd::Array1::zeros(times.len());
    let tol = PICTURE_TOL * max_abs(a).max(1.0) * n as f64;
    let mut max_deviation: f64 = 0.0;
    let iter
        = times.t().iter()
        .zip(schrodinger.iter_mut().zip(heisenberg.iter_mut()));
    for (&tk, (sk, hk)) in iter {
        let psi_t = ex.evolve_coefficients(&c, tk);
        *sk = expectation(a, &psi_t);
        // ψ0 in the eigenbasis is just c
        *hk = expectation(&ex.conjugate_eigenbasis(&a_eig, tk), &c);
        let deviation = (*sk - *hk).abs();
        if !deviation.is_finite() {
            return Err(NumericalError::NonFinite("picture comparison").into());
        }
        if deviation > tol {
            return Err(NumericalError::PictureMismatch { t: tk, deviation }.into());
        }
        max_deviation = max_deviation.max(deviation);
    }
    debug!(dim = n, frames = times.len(), max_deviation, "compared pictures");
    Ok(PictureComparison { t: times.t().clone(), schrodinger, heisenberg, max_deviation })
}

/// Grid propagation scheme.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Propagation {
    /// Phase evolution in the eigenbasis of the finite-difference Hamiltonian.
    #[default]
    Eigen,
    /// Pseudo-spectral split-step operator with periodic boundaries.
    SplitStep,
}

/// Initial wavefunction on a grid.
///
/// Deserializes from an object with a `kind` tag, which defaults to
/// `"eigenstate"` when absent so that `{"n": 0}` selects the ground state.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawWavefunction")]
pub enum InitialWavefunction {
    /// The `n`-th bound state of the grid Hamiltonian.
    Eigenstate { n: usize },
    /// Equal-amplitude superposition of the listed bound states.
    Superposition { levels: Vec<usize> },
    /// `exp(-(x - x0)² / 4σ² + i k0 x)`, normalized on the grid.
    Gaussian { x0: f64, k0: f64, sigma: f64 },
}

impl Default for InitialWavefunction {
    fn default() -> Self { Self::Eigenstate { n: 0 } }
}

#[derive(Copy, Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum WavefunctionKind {
    #[default]
    Eigenstate,
    Superposition,
    Gaussian,
}

#[derive(Clone, Debug, Deserialize)]
struct RawWavefunction {
    #[serde(default)]
    kind: WavefunctionKind,
    n: Option<usize>,
    levels: Option<Vec<usize>>,
    x0: Option<f64>,
    k0: Option<f64>,
    sigma: Option<f64>,
}

impl TryFrom<RawWavefunction> for InitialWavefunction {
    type Error = ValidationError;

    fn try_from(raw: RawWavefunction) -> Result<Self, Self::Error> {
        match raw.kind {
            WavefunctionKind::Eigenstate => {
                Ok(Self::Eigenstate { n: raw.n.unwrap_or(0) })
            },
            WavefunctionKind::Superposition => {
                let levels = raw.levels.unwrap_or_else(|| vec![0, 1]);
                if levels.is_empty() {
                    return Err(ValidationError::Empty("psi0.levels"));
                }
                Ok(Self::Superposition { levels })
            },
            WavefunctionKind::Gaussian => {
                let x0 = raw.x0.unwrap_or(0.0);
                let k0 = raw.k0.unwrap_or(0.0);
                let sigma = raw.sigma.unwrap_or(1.0);
                ValidationError::check_finite("psi0.x0", x0)?;
                ValidationError::check_finite("psi0.k0", k0)?;
                ValidationError::check_positive("psi0.sigma", sigma)?;
                Ok(Self::Gaussian { x0, k0, sigma })
            },
        }
    }
}

impl InitialWavefunction {
    fn needs_eigenstates(&self) -> bool {
        !matches!(self, Self::Gaussian { .. })
    }

    /// Sample the wavefunction on a grid, normalized so that
    /// `Σ |ψ|² dx = 1`.
    ///
    /// Eigenstates are taken from `spec`, the decomposition of the grid
    /// Hamiltonian.
    pub fn sample(&self, grid: &Grid, spec: Option<&Spectrum<f64>>)
        -> QResult<nd::Array1<C64>>
    {
        let eigenstate = |n: usize| -> QResult<nd::Array1<C64>> {
            let spec = spec.ok_or_else(|| {
                Error::Internal("eigenstate requested without a spectrum".into())
            })?;
            ValidationError::check_index("psi0 level", n, spec.dim())?;
            Ok(spec.vectors.column(n).mapv(C64::from))
        };
        let mut psi: nd::Array1<C64>
            = match self {
                Self::Eigenstate { n } => eigenstate(*n)?,
                Self::Superposition { levels } => {
                    let distinct: BTreeSet<usize> = levels.iter().copied().collect();
                    let mut acc: nd::Array1<C64> = nd::Array1::zeros(grid.len());
                    for n in distinct {
                        acc += &eigenstate(n)?;
                    }
                    acc
                },
                Self::Gaussian { x0, k0, sigma } => {
                    let amp = (std::f64::consts::TAU * sigma.powi(2)).powf(-0.25);
                    grid.x().mapv(|x| {
                        let env = amp * (-(x - x0).powi(2) / (4.0 * sigma.powi(2))).exp();
                        env * C64::cis(k0 * x)
                    })
                },
            };
        let norm = wf_norm_sqr(&psi, grid.dx());
        if !norm.is_finite() || norm <= f64::MIN_POSITIVE {
            return Err(ValidationError::ZeroNorm("psi0").into());
        }
        wf_renormalize(&mut psi, grid.dx());
        Ok(psi)
    }
}

/// Time series of a grid wavefunction and its moments.
#[derive(Clone, Debug)]
pub struct GridEvolution {
    pub t: nd::Array1<f64>,
    /// `|ψ(x_i, t_k)|²`, one time per row.
    pub density: nd::Array2<f64>,
    /// `Σ |ψ|² dx`
    pub norms: nd::Array1<f64>,
    /// `⟨x⟩`
    pub expectation_x: nd::Array1<f64>,
    /// `⟨p⟩` with a central-difference derivative.
    pub expectation_p: nd::Array1<f64>,
}

/// Number of split-step substeps needed to cover `t` with steps no larger
/// than `max_dt`.
///
/// The count is accumulated in floating point and checked against
/// `limits.max_steps` before it is converted, so no `max_dt` can wrap it.
pub fn split_substeps<S>(t: &Arr1<S>, max_dt: f64, limits: &Limits)
    -> Result<usize, ValidationError>
where S: nd::Data<Elem = f64>
{
    ValidationError::check_positive("maxDt", max_dt)?;
    let total: f64
        = t.iter().zip(t.iter().skip(1))
        .map(|(tk, tkp1)| ((tkp1 - tk).abs() / max_dt).ceil().max(1.0))
        .sum();
    let limit = limits.max_steps;
    // also rejects an infinite or NaN total
    if !(total <= limit as f64) {
        return Err(ValidationError::LimitExceeded {
            what: "split-step substeps",
            limit,
            got: total.min(usize::MAX as f64) as usize,
        });
    }
    Ok(total as usize)
}

/// Evolve an initial wavefunction on a grid under the static potential `V`.
pub fn evolve_grid<S>(
    grid: &Grid,
    V: &Arr1<S>,
    init: &InitialWavefunction,
    times: &TimeGrid,
    method: Propagation,
    max_dt: f64,
    limits: &Limits,
) -> QResult<GridEvolution>
where S: nd::Data<Elem = f64>
{
    LengthError::check(grid.x(), V)?;
    ValidationError::check_all_finite("V", V.iter())?;
    limits.check_samples("densityFrames", times.len(), grid.len())?;
    if method == Propagation::SplitStep {
        split_substeps(times.t(), max_dt, limits)?;
    }

    let spec: Option<Spectrum<f64>>
        = if method == Propagation::Eigen || init.needs_eigenstates() {
            let H = spectrum::grid_hamiltonian(
                grid, V, Discretization::FiniteDifference)?;
            Some(spectrum::eigh(&H)?)
        } else {
            None
        };
    let psi0 = init.sample(grid, spec.as_ref())?;
    let states: nd::Array2<C64>
        = match (method, spec.as_ref()) {
            (Propagation::Eigen, Some(spec)) => {
                eigen_frames(spec, &psi0, times.t())?
            },
            (Propagation::Eigen, None) => {
                return Err(Error::Internal("missing grid spectrum".into()));
            },
            (Propagation::SplitStep, _) => {
                split_step_frames(grid, V, &psi0, times.t(), max_dt)
            },
        };
    debug!(n = grid.len(), frames = times.len(), ?method, "evolved wavefunction");

    let dx = grid.dx();
    let density: nd::Array2<f64> = states.mapv(|z| z.norm_sqr());
    NumericalError::check_finite("propagation", density.iter())?;
    let norms: nd::Array1<f64> = density.sum_axis(nd::Axis(1)) * dx;
    check_norms(times.t(), &norms)?;
    let expectation_x: nd::Array1<f64> = density.dot(grid.x()) * dx;
    let expectation_p: nd::Array1<f64>
        = states.outer_iter()
        .map(|psi| momentum_expectation(&psi, dx))
        .collect();
    Ok(GridEvolution {
        t: times.t().clone(),
        density,
        norms,
        expectation_x,
        expectation_p,
    })
}

// ⟨p⟩ = Re Σ ψ*(x) (-i) ∂ψ/∂x dx, central difference, ψ = 0 off-grid
fn momentum_expectation<S>(psi: &Arr1<S>, dx: f64) -> f64
where S: nd::Data<Elem = C64>
{
    let n = psi.len();
    let at = |k: isize| -> C64 {
        if k < 0 || k as usize >= n { C64::from(0.0) } else { psi[k as usize] }
    };
    (0..n as isize)
        .map(|k| at(k).conj() * (at(k + 1) - at(k - 1)) * C64::new(0.0, -0.5))
        .sum::<C64>()
        .re
}

// phase-evolve in the eigenbasis of the grid Hamiltonian
fn eigen_frames<S>(spec: &Spectrum<f64>, psi0: &Arr1<S>, t: &nd::Array1<f64>)
    -> QResult<nd::Array2<C64>>
where S: nd::Data<Elem = C64>
{
    let ex = HermitianExp::from_spectrum(Spectrum {
        values: spec.values.clone(),
        vectors: spec.vectors.mapv(C64::from),
    });
    let c = ex.coefficients(psi0)?;
    let mut frames: nd::Array2<C64> = nd::Array2::zeros((t.len(), psi0.len()));
    for (&tk, mut row) in t.iter().zip(frames.outer_iter_mut()) {
        row.assign(&ex.evolve_coefficients(&c, tk));
    }
    Ok(frames)
}

fn apply_split_potential<S, T>(V: &Arr1<S>, q: &mut Arr1<T>, dt: f64)
where
    S: nd::Data<Elem = f64>,
    T: nd::DataMut<Elem = C64>,
{
    q.iter_mut().zip(V)
        .for_each(|(qi, Vi)| { *qi *= C64::cis(-Vi * dt); });
}

fn apply_split_kinetic<S, T>(kin: &Arr1<S>, q: &mut Arr1<T>)
where
    S: nd::Data<Elem = C64>,
    T: nd::DataMut<Elem = C64>,
{
    fft_inplace(q);
    q.iter_mut().zip(kin).for_each(|(qi, ki)| { *qi *= ki; });
    ifft_inplace(q);
}

fn split_step_frames<S, T>(
    grid: &Grid,
    V: &Arr1<S>,
    psi0: &Arr1<T>,
    t: &nd::Array1<f64>,
    max_dt: f64,
) -> nd::Array2<C64>
where
    S: nd::Data<Elem = f64>,
    T: nd::Data<Elem = C64>,
{
    let k = fft_wavenumbers(grid.len(), grid.dx());
    let mut frames: nd::Array2<C64> = nd::Array2::zeros((t.len(), psi0.len()));
    let mut q: nd::Array1<C64> = psi0.to_owned();
    frames.row_mut(0).assign(psi0);
    let iter
        = t.iter().zip(t.iter().skip(1))
        .zip(frames.outer_iter_mut().skip(1));
    for ((tk, tkp1), mut frame) in iter {
        let dtk = tkp1 - tk;
        let m = (dtk.abs() / max_dt).ceil().max(1.0) as usize;
        let h = dtk / m as f64;
        let kin: nd::Array1<C64> = k.mapv(|kj| C64::cis(-0.5 * kj.powi(2) * h));
        for _ in 0..m {
            apply_split_potential(V, &mut q, h / 2.0);
            apply_split_kinetic(&kin, &mut q);
            apply_split_potential(V, &mut q, h / 2.0);
        }
        frame.assign(&q);
    }
    frames
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{ FRAC_PI_2, PI, TAU };
    use super::*;
    use crate::{
        potential::Potential,
        utils::max_abs_diff,
    };

    fn c(re: f64) -> C64 { C64::from(re) }

    fn limits() -> Limits { Limits::default() }

    #[test]
    fn diagonal_hamiltonian_preserves_populations() {
        let h = nd::array![[c(1.0), c(0.0)], [c(0.0), c(2.0)]];
        let psi0 = nd::array![c(1.0), c(0.0)];
        let times = TimeGrid::new("nSteps", 10.0, 100, &limits()).unwrap();
        let traj = evolve_basis(&h, &psi0, &times).unwrap();
        assert_eq!(traj.probabilities.nrows(), 100);
        for row in traj.probabilities.outer_iter() {
            assert!((row[0] - 1.0).abs() < 1e-14);
            assert!(row[1].abs() < 1e-14);
        }
        assert!((traj.t[99] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn rabi_oscillation_and_reversibility() {
        // H = σx / 2 flips |0⟩ to |1⟩ at t = π
        let h = nd::array![[c(0.0), c(0.5)], [c(0.5), c(0.0)]];
        let psi0 = nd::array![c(1.0), c(0.0)];
        let times = TimeGrid::new("nSteps", PI, 3, &limits()).unwrap();
        let traj = evolve_basis(&h, &psi0, &times).unwrap();
        assert!((traj.probabilities[[1, 1]] - 0.5).abs() < 1e-12);
        assert!((traj.probabilities[[2, 1]] - 1.0).abs() < 1e-12);

        let fwd = TimeGrid::new("nSteps", 7.3, 2, &limits()).unwrap();
        let psi_t = evolve_basis(&h, &psi0, &fwd).unwrap().states.row(1).to_owned();
        let back = TimeGrid::new("nSteps", -7.3, 2, &limits()).unwrap();
        let psi_back = evolve_basis(&h, &psi_t, &back).unwrap().states.row(1).to_owned();
        assert!(max_abs_diff(&psi_back, &psi0) < 1e-12);
    }

    #[test]
    fn norms_stay_unity_for_large_times() {
        let h = nd::array![
            [c(0.3), C64::new(0.1, 0.4)],
            [C64::new(0.1, -0.4), c(-1.2)],
        ];
        let psi0 = nd::array![c(3.0), C64::new(0.0, 4.0)];
        let times = TimeGrid::new("nSteps", 1e6, 11, &limits()).unwrap();
        let traj = evolve_basis(&h, &psi0, &times).unwrap();
        assert!(traj.norms.iter().all(|n| (n - 1.0).abs() < 1e-10));
    }

    #[test]
    fn rejects_non_hermitian_hamiltonian() {
        let h = nd::array![[c(0.0), c(1.0)], [c(0.0), c(0.0)]];
        let psi0 = nd::array![c(1.0), c(0.0)];
        let times = TimeGrid::new("nSteps", 1.0, 2, &limits()).unwrap();
        assert!(matches!(
            evolve_basis(&h, &psi0, &times),
            Err(Error::Validation(ValidationError::NotHermitian { .. }))
        ));
        let zero = nd::array![c(0.0), c(0.0)];
        let h = nd::array![[c(0.0), c(1.0)], [c(1.0), c(0.0)]];
        assert!(evolve_basis(&h, &zero, &times).is_err());
    }

    #[test]
    fn heisenberg_sigma_z_precesses() {
        // H = σx / 2: σz(t) = cos t σz + sin t σy
        let h = nd::array![[c(0.0), c(0.5)], [c(0.5), c(0.0)]];
        let sz = nd::array![[c(1.0), c(0.0)], [c(0.0), c(-1.0)]];
        let a_t = heisenberg(&sz, &h, FRAC_PI_2).unwrap();
        let sy = nd::array![[c(0.0), C64::new(0.0, -1.0)], [C64::new(0.0, 1.0), c(0.0)]];
        assert!(max_abs_diff(&a_t, &sy) < 1e-12);
    }

    #[test]
    fn pictures_agree() {
        let h = nd::array![
            [c(1.0), C64::new(0.2, 0.3), c(0.0)],
            [C64::new(0.2, -0.3), c(0.0), c(0.7)],
            [c(0.0), c(0.7), c(-1.0)],
        ];
        let a = nd::array![
            [c(0.0), c(1.0), c(0.0)],
            [c(1.0), c(0.0), c(1.0)],
            [c(0.0), c(1.0), c(0.0)],
        ];
        let psi0 = nd::array![c(1.0), c(0.0), c(0.0)];
        let times = TimeGrid::new("nSteps", 25.0, 200, &limits()).unwrap();
        let cmp = compare_pictures(&a, &h, &psi0, &times).unwrap();
        assert!(cmp.max_deviation < 1e-10);
        assert!(cmp.schrodinger[0].abs() < 1e-14);
    }

    #[test]
    fn initial_wavefunction_defaults_to_ground_state() {
        let init: InitialWavefunction = serde_json::from_str(r#"{"n": 0}"#).unwrap();
        assert_eq!(init, InitialWavefunction::Eigenstate { n: 0 });
        let init: InitialWavefunction = serde_json::from_str("{}").unwrap();
        assert_eq!(init, InitialWavefunction::default());
        let init: InitialWavefunction
            = serde_json::from_str(r#"{"kind": "gaussian", "x0": -2.0, "k0": 3.0}"#)
            .unwrap();
        assert_eq!(init, InitialWavefunction::Gaussian { x0: -2.0, k0: 3.0, sigma: 1.0 });
        assert!(serde_json::from_str::<InitialWavefunction>(r#"{"kind": "cat"}"#).is_err());
        assert!(
            serde_json::from_str::<InitialWavefunction>(
                r#"{"kind": "gaussian", "sigma": -1.0}"#
            ).is_err()
        );
    }

    fn harmonic_setup() -> (Grid, nd::Array1<f64>) {
        let grid = Grid::new(-8.0, 8.0, 256, &limits()).unwrap();
        let V = Potential::Harmonic { omega: 1.0 }.sample(&grid);
        (grid, V)
    }

    #[test]
    fn ground_state_density_is_periodic() {
        let (grid, V) = harmonic_setup();
        let times = TimeGrid::new("nFrames", TAU, 2, &limits()).unwrap();
        let init = InitialWavefunction::Eigenstate { n: 0 };
        let evo = evolve_grid(
            &grid, &V, &init, &times, Propagation::Eigen, DEF_MAX_DT, &limits(),
        ).unwrap();
        let diff = (&evo.density.row(0) - &evo.density.row(1))
            .iter()
            .fold(0.0_f64, |acc, d| acc.max(d.abs()));
        assert!(diff < 1e-12);
        assert!(evo.norms.iter().all(|n| (n - 1.0).abs() < 1e-10));
        assert!(evo.expectation_x[1].abs() < 1e-10);
    }

    #[test]
    fn superposition_returns_after_one_period() {
        let (grid, V) = harmonic_setup();
        let times = TimeGrid::new("nFrames", TAU, 3, &limits()).unwrap();
        let init = InitialWavefunction::Superposition { levels: vec![0, 1] };
        let evo = evolve_grid(
            &grid, &V, &init, &times, Propagation::Eigen, DEF_MAX_DT, &limits(),
        ).unwrap();
        let diff = (&evo.density.row(0) - &evo.density.row(2))
            .iter()
            .fold(0.0_f64, |acc, d| acc.max(d.abs()));
        assert!(diff < 2e-2);
        // half a period later the packet sits on the other side
        assert!(evo.expectation_x[0] * evo.expectation_x[1] < 0.0);
    }

    #[test]
    fn split_step_matches_eigen_evolution() {
        let (grid, V) = harmonic_setup();
        let times = TimeGrid::new("nFrames", 2.0, 5, &limits()).unwrap();
        let init = InitialWavefunction::Gaussian { x0: 1.0, k0: 0.5, sigma: 0.8 };
        let eig = evolve_grid(
            &grid, &V, &init, &times, Propagation::Eigen, DEF_MAX_DT, &limits(),
        ).unwrap();
        let split = evolve_grid(
            &grid, &V, &init, &times, Propagation::SplitStep, 0.005, &limits(),
        ).unwrap();
        assert!(split.norms.iter().all(|n| (n - 1.0).abs() < 1e-10));
        for (xe, xs) in eig.expectation_x.iter().zip(&split.expectation_x) {
            assert!((xe - xs).abs() < 2e-2, "{xe} vs {xs}");
        }
        // classical motion: ⟨x⟩(t) = x0 cos t + p0 sin t
        let t_end = 2.0_f64;
        let classical = t_end.cos() + 0.5 * t_end.sin();
        assert!((split.expectation_x[4] - classical).abs() < 2e-2);
    }

    #[test]
    fn eigen_grid_evolution_applies_hamiltonian_exponential() {
        let grid = Grid::new(-4.0, 4.0, 64, &limits()).unwrap();
        let V = Potential::Harmonic { omega: 1.0 }.sample(&grid);
        let times = TimeGrid::new("nFrames", 1.5, 4, &limits()).unwrap();
        let init = InitialWavefunction::Gaussian { x0: 0.5, k0: -1.0, sigma: 0.7 };
        let evo = evolve_grid(
            &grid, &V, &init, &times, Propagation::Eigen, DEF_MAX_DT, &limits(),
        ).unwrap();
        let H = spectrum::grid_hamiltonian(&grid, &V, Discretization::FiniteDifference)
            .unwrap()
            .mapv(C64::from);
        let ex = HermitianExp::new(&H).unwrap();
        let psi0 = init.sample(&grid, None).unwrap();
        for (k, &tk) in times.t().iter().enumerate() {
            let density = ex.evolve(&psi0, tk).unwrap().mapv(|z| z.norm_sqr());
            let dev = density.iter().zip(evo.density.row(k))
                .fold(0.0_f64, |acc, (a, b)| acc.max((a - b).abs()));
            assert!(dev < 1e-10);
        }
    }

    #[test]
    fn rejects_excessive_substeps() {
        let (grid, V) = harmonic_setup();
        let times = TimeGrid::new("nFrames", 1e4, 10, &limits()).unwrap();
        let init = InitialWavefunction::Gaussian { x0: 0.0, k0: 0.0, sigma: 1.0 };
        let res = evolve_grid(
            &grid, &V, &init, &times, Propagation::SplitStep, 1e-3, &limits(),
        );
        assert!(matches!(
            res,
            Err(Error::Validation(ValidationError::LimitExceeded { .. }))
        ));
    }

    #[test]
    fn substep_count_is_checked_before_conversion() {
        let t = nd::array![0.0, 1.0, 2.0, 3.0];
        let max_dt = 0.5_f64.powi(12);
        let at = Limits { max_steps: 3 * 4096, ..limits() };
        assert_eq!(split_substeps(&t, max_dt, &at).unwrap(), 3 * 4096);
        let below = Limits { max_steps: 3 * 4096 - 1, ..limits() };
        assert!(split_substeps(&t, max_dt, &below).is_err());

        // counts that would wrap a usize sum
        let t = nd::array![0.0, 2.0 / 3.0, 4.0 / 3.0, 2.0];
        for max_dt in [1.0842021724855043e-19, 1e-300, f64::MIN_POSITIVE] {
            assert!(matches!(
                split_substeps(&t, max_dt, &limits()),
                Err(ValidationError::LimitExceeded { .. })
            ));
        }
        assert!(split_substeps(&t, 0.0, &limits()).is_err());
        assert!(split_substeps(&t, f64::NAN, &limits()).is_err());
    }

    #[test]
    fn eigenstate_index_is_bounded() {
        let grid = Grid::new(-1.0, 1.0, 5, &limits()).unwrap();
        let V: nd::Array1<f64> = nd::Array1::zeros(5);
        let times = TimeGrid::new("nFrames", 1.0, 2, &limits()).unwrap();
        let init = InitialWavefunction::Eigenstate { n: 5 };
        assert!(evolve_grid(
            &grid, &V, &init, &times, Propagation::Eigen, DEF_MAX_DT, &limits(),
        ).is_err());
    }
}
