//! Semiclassical (WKB) tunneling through one-dimensional barriers, checked
//! against an exact transfer-matrix calculation.
//!
//! The WKB estimate is
//! ```text
//! T ≈ exp(-2θ),   θ = Σ_regions ∫ √(2 (V(x) - E)) dx
//! ```
//! where the sum runs over every classically forbidden region between the
//! grid ends, with no prefactor. Turning points are bracketed by sign changes
//! of `V - E` on the grid and refined by bisection on the potential itself,
//! so step edges are found exactly.
//!
//! The transfer-matrix transmission treats `V` as piecewise constant over grid
//! cells (sampled at cell midpoints), connected to flat leads at the
//! potential's values at the two grid ends.

use ndarray as nd;
use num_complex::Complex64 as C64;
use tracing::debug;
use crate::{
    error::{ NumericalError, QResult, ValidationError },
    grid::Grid,
    limits::Limits,
    potential::Potential,
};

// bisection iterations when refining turning points
const BISECT_ITERS: usize = 60;

// minimum number of midpoint-rule panels per forbidden region
const MIN_PANELS: usize = 64;

// smallest |k| allowed in transfer matrices
const K_FLOOR: f64 = 1e-12;

// refine a root of `f` in [a, b] where f(a) <= 0 < f(b) or vice versa
fn bisect<F>(mut f: F, mut a: f64, mut b: f64) -> f64
where F: FnMut(f64) -> f64
{
    let fa_neg = f(a) <= 0.0;
    for _ in 0..BISECT_ITERS {
        let m = 0.5 * (a + b);
        if (f(m) <= 0.0) == fa_neg { a = m; } else { b = m; }
    }
    0.5 * (a + b)
}

/// A classically forbidden interval `[a, b]` and its action `∫ √(2(V - E))`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ForbiddenRegion {
    pub a: f64,
    pub b: f64,
    pub action: f64,
}

/// Locate every forbidden region for energy `energy` between the grid ends.
pub fn forbidden_regions(potential: &Potential, grid: &Grid, energy: f64)
    -> Vec<ForbiddenRegion>
{
    let x = grid.x();
    let n = grid.len();
    let f = |xk: f64| potential.eval(xk) - energy;
    let above: Vec<bool> = x.iter().map(|&xk| f(xk) > 0.0).collect();
    let mut regions: Vec<ForbiddenRegion> = Vec::new();
    let mut k = 0;
    while k < n {
        if !above[k] {
            k += 1;
            continue;
        }
        let start = k;
        while k < n && above[k] { k += 1; }
        let end = k; // one past the last forbidden sample
        let a = if start == 0 { x[0] } else { bisect(f, x[start - 1], x[start]) };
        let b = if end == n { x[n - 1] } else { bisect(f, x[end - 1], x[end]) };
        let panels = (end - start + 1).max(MIN_PANELS);
        let h = (b - a) / panels as f64;
        let action: f64
            = (0..panels)
            .map(|j| {
                let xm = a + (j as f64 + 0.5) * h;
                (2.0 * f(xm)).max(0.0).sqrt()
            })
            .sum::<f64>()
            * h;
        regions.push(ForbiddenRegion { a, b, action });
    }
    regions
}

/// Compute `T_wkb` alone.
///
/// `T = 1` when `E` exceeds the potential everywhere on the grid, and `T = 0`
/// (with infinite action) when `E` does not exceed the potential at both grid
/// ends, since then there is no incoming or outgoing wave.
pub fn wkb_transmission(potential: &Potential, grid: &Grid, energy: f64) -> (f64, f64) {
    let v_left = potential.eval(grid.x_min());
    let v_right = potential.eval(grid.x_max());
    if energy <= v_left || energy <= v_right {
        return (0.0, f64::INFINITY);
    }
    let theta: f64
        = forbidden_regions(potential, grid, energy).iter()
        .map(|r| r.action)
        .sum();
    ((-2.0 * theta).exp(), theta)
}

fn wavenumber(energy: f64, v: f64) -> C64 {
    let k = C64::from(2.0 * (energy - v)).sqrt();
    if k.norm() < K_FLOOR { C64::from(K_FLOOR) } else { k }
}

/// Exact transmission probability for the piecewise-constant approximation
/// of `potential` over the grid cells.
///
/// Within each constant region `ψ = A e^{ik(x - x_j)} + B e^{-ik(x - x_j)}`
/// with `x_j` the region's left edge; matching `ψ` and `ψ'` at each interface
/// gives the 2×2 transfer matrix `M` with `(A_R, B_R) = M (A_L, B_L)`, so that
/// `t = det(M) / M₂₂` and `T = |t|² Re(k_R) / Re(k_L)`.
pub fn transfer_matrix_transmission(potential: &Potential, grid: &Grid, energy: f64)
    -> Result<f64, NumericalError>
{
    let x = grid.x();
    let v_left = potential.eval(grid.x_min());
    let v_right = potential.eval(grid.x_max());
    let k_left = wavenumber(energy, v_left);
    let k_right = wavenumber(energy, v_right);
    if energy <= v_left || energy <= v_right {
        return Ok(0.0);
    }

    // merge equal neighboring cells into (potential, width) regions
    let mut regions: Vec<(f64, f64)> = Vec::with_capacity(grid.len());
    for (xk, xkp1) in x.iter().zip(x.iter().skip(1)) {
        let v = potential.eval(0.5 * (xk + xkp1));
        let w = xkp1 - xk;
        match regions.last_mut() {
            Some((vl, wl)) if *vl == v => { *wl += w; },
            _ => { regions.push((v, w)); },
        }
    }

    let mut m: nd::Array2<C64> = nd::Array2::eye(2);
    let mut k_prev = k_left;
    let mut d_prev = 0.0;
    let steps
        = regions.iter()
        .map(|&(v, w)| (wavenumber(energy, v), w))
        .chain(std::iter::once((k_right, 0.0)));
    for (k, w) in steps {
        let prop: nd::Array2<C64>
            = nd::array![
                [(C64::i() * k_prev * d_prev).exp(), C64::from(0.0)],
                [C64::from(0.0), (-C64::i() * k_prev * d_prev).exp()],
            ];
        let r = k_prev / k;
        let half = C64::from(0.5);
        let iface: nd::Array2<C64>
            = nd::array![
                [half * (1.0 + r), half * (1.0 - r)],
                [half * (1.0 - r), half * (1.0 + r)],
            ];
        m = iface.dot(&prop).dot(&m);
        k_prev = k;
        d_prev = w;
    }
    let det = m[[0, 0]] * m[[1, 1]] - m[[0, 1]] * m[[1, 0]];
    let t = det / m[[1, 1]];
    if !t.is_finite() {
        // an overflowing M₂₂ means total reflection to double precision
        if m[[1, 1]].is_infinite() && det.is_finite() { return Ok(0.0); }
        return Err(NumericalError::NonFinite("transfer matrix"));
    }
    Ok(t.norm_sqr() * k_right.re / k_left.re)
}

/// Transmission over an energy sweep.
#[derive(Clone, Debug)]
pub struct TunnelingSweep {
    pub t_wkb: Vec<f64>,
    pub t_num: Vec<f64>,
    pub actions: Vec<f64>,
}

/// Compute WKB and transfer-matrix transmission for every energy.
pub fn tunneling(potential: &Potential, grid: &Grid, energies: &[f64], limits: &Limits)
    -> QResult<TunnelingSweep>
{
    limits.check_sweep("EArray", energies.len())?;
    ValidationError::check_all_finite("EArray", energies.iter())?;
    let mut t_wkb: Vec<f64> = Vec::with_capacity(energies.len());
    let mut t_num: Vec<f64> = Vec::with_capacity(energies.len());
    let mut actions: Vec<f64> = Vec::with_capacity(energies.len());
    for &e in energies.iter() {
        let (tw, theta) = wkb_transmission(potential, grid, e);
        t_wkb.push(tw);
        actions.push(theta);
        t_num.push(transfer_matrix_transmission(potential, grid, e)?);
    }
    NumericalError::check_finite("tunneling", t_wkb.iter().chain(t_num.iter()))?;
    debug!(kind = ?potential.kind(), n = energies.len(), points = grid.len(), "computed tunneling");
    Ok(TunnelingSweep { t_wkb, t_num, actions })
}
