//! Variational energy sweeps.
//!
//! The one-dimensional trial family is the normalized Gaussian
//! ```text
//! ψ_α(x) = (α/π)^(1/4) exp(-α x² / 2),   α > 0
//! ```
//! with `⟨T⟩ = α/4`. For the harmonic potential `⟨V⟩ = ω²/(4α)` in closed
//! form; every other potential is integrated with the trapezoidal rule.
//!
//! Sweeps report every energy and the index of the smallest one; no search
//! beyond the supplied parameter values is attempted.

use std::f64::consts::PI;
use ndarray as nd;
use tracing::debug;
use crate::{
    error::{ NumericalError, QResult, ValidationError },
    grid::Grid,
    limits::Limits,
    potential::Potential,
    spectrum::{ self, Discretization },
    utils::{ argmin, trapz },
};

/// Reference nonrelativistic ground-state energy of helium (Hartree).
pub const HELIUM_REF_ENERGY: f64 = -2.9037;

/// Default nuclear charge for the helium-like sweep.
pub const DEF_NUCLEAR_CHARGE: f64 = 2.0;

// default integration window is ±WINDOW/√α with DEF_QUAD_POINTS samples
const WINDOW: f64 = 12.0;
const DEF_QUAD_POINTS: usize = 4001;

// reference spectra are computed on [-REF_EXTENT, REF_EXTENT]
const REF_EXTENT: f64 = 10.0;
const DEF_REF_POINTS: usize = 801;

/// Evaluate `⟨ψ_α|H|ψ_α⟩` for the Gaussian trial state.
///
/// If `grid` is given, `⟨V⟩` is integrated over it (normalized by the
/// integrated density over the same grid); otherwise a window scaled to the
/// width of `ψ_α` is used.
pub fn gaussian_energy(potential: &Potential, alpha: f64, grid: Option<&Grid>) -> f64 {
    let kinetic = alpha / 4.0;
    if let Potential::Harmonic { omega } = *potential {
        return kinetic + omega.powi(2) / (4.0 * alpha);
    }
    let (x, dx): (nd::Array1<f64>, f64)
        = match grid {
            Some(g) => (g.x().clone(), g.dx()),
            None => {
                let half = WINDOW / alpha.sqrt();
                let x = nd::Array1::linspace(-half, half, DEF_QUAD_POINTS);
                let dx = x[1] - x[0];
                (x, dx)
            },
        };
    let norm = (alpha / PI).sqrt();
    let density: nd::Array1<f64> = x.mapv(|xk| norm * (-alpha * xk * xk).exp());
    let weighted: nd::Array1<f64>
        = nd::Zip::from(&density).and(&x)
        .map_collect(|rho, &xk| rho * potential.eval(xk));
    kinetic + trapz(&weighted, dx) / trapz(&density, dx)
}

/// Result of a one-parameter variational sweep.
#[derive(Clone, Debug)]
pub struct Sweep {
    pub energies: Vec<f64>,
    pub min_index: usize,
    /// Known or numerically exact ground-state energy, if any.
    pub reference: Option<f64>,
}

fn min_index(energies: &[f64]) -> Result<usize, NumericalError> {
    NumericalError::check_finite("variational energy", energies.iter())?;
    argmin(energies).ok_or(NumericalError::NonFinite("variational energy"))
}

/// Ground-state energy to compare against: exact for the harmonic
/// oscillator, from a Numerov grid spectrum for other confining potentials,
/// and absent for a free particle.
pub fn reference_energy(potential: &Potential, limits: &Limits) -> QResult<Option<f64>> {
    match *potential {
        Potential::Harmonic { omega } => Ok(Some(omega / 2.0)),
        Potential::Free => Ok(None),
        _ => {
            let n = DEF_REF_POINTS.min(limits.max_grid_points);
            let grid = Grid::new(-REF_EXTENT, REF_EXTENT, n, limits)?;
            let V = potential.sample(&grid);
            let sols = spectrum::solve_grid(&grid, &V, Discretization::Numerov, 1)?;
            Ok(Some(sols.energies[0]))
        },
    }
}

/// Sweep the Gaussian trial energy over `alphas`.
pub fn oscillator(
    alphas: &[f64],
    potential: &Potential,
    grid: Option<&Grid>,
    limits: &Limits,
) -> QResult<Sweep>
{
    limits.check_sweep("alphaArray", alphas.len())?;
    alphas.iter()
        .try_for_each(|&a| ValidationError::check_positive("alphaArray", a))?;
    let energies: Vec<f64>
        = alphas.iter()
        .map(|&a| gaussian_energy(potential, a, grid))
        .collect();
    let min_index = min_index(&energies)?;
    let reference = reference_energy(potential, limits)?;
    debug!(
        kind = ?potential.kind(),
        n = alphas.len(),
        best = energies[min_index],
        "swept gaussian trial",
    );
    Ok(Sweep { energies, min_index, reference })
}

/// Two-electron energy `E(Z) = Z² - 2 Z_nuc Z + (5/8) Z` for the
/// product-of-hydrogenic-orbitals trial state with effective charge `Z`.
pub fn helium_energy(z: f64, nuclear_charge: f64) -> f64 {
    z * z - 2.0 * nuclear_charge * z + 0.625 * z
}

/// Sweep the helium-like trial energy over effective charges `z_values`.
///
/// The reference energy is only reported for helium itself
/// (`nuclear_charge = 2`).
pub fn helium(z_values: &[f64], nuclear_charge: f64, limits: &Limits) -> QResult<Sweep> {
    limits.check_sweep("ZArray", z_values.len())?;
    ValidationError::check_all_finite("ZArray", z_values.iter())?;
    ValidationError::check_positive("nuclearCharge", nuclear_charge)?;
    let energies: Vec<f64>
        = z_values.iter()
        .map(|&z| helium_energy(z, nuclear_charge))
        .collect();
    let min_index = min_index(&energies)?;
    let reference
        = (nuclear_charge == DEF_NUCLEAR_CHARGE).then_some(HELIUM_REF_ENERGY);
    Ok(Sweep { energies, min_index, reference })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harmonic_minimum_is_exact() {
        let alphas: Vec<f64> = (1..=40).map(|k| 0.1 * k as f64).collect();
        let pot = Potential::Harmonic { omega: 2.0 };
        let sweep = oscillator(&alphas, &pot, None, &Limits::default()).unwrap();
        assert!((alphas[sweep.min_index] - 2.0).abs() < 1e-12);
        assert!((sweep.energies[sweep.min_index] - 1.0).abs() < 1e-12);
        assert_eq!(sweep.reference, Some(1.0));
    }

    #[test]
    fn quartic_matches_closed_form() {
        let a = 0.7;
        let pot = Potential::Quartic { a };
        for alpha in [0.3, 1.0, 2.5] {
            let exact = alpha / 4.0 + 3.0 * a / (4.0 * alpha * alpha);
            assert!((gaussian_energy(&pot, alpha, None) - exact).abs() < 1e-8);
        }
    }

    #[test]
    fn quartic_sweep_bounds_ground_state_from_above() {
        let alphas: Vec<f64> = (1..=60).map(|k| 0.05 * k as f64).collect();
        let pot = Potential::Quartic { a: 1.0 };
        let sweep = oscillator(&alphas, &pot, None, &Limits::default()).unwrap();
        let exact = sweep.reference.unwrap();
        // E₀ ≈ 0.66799 against a best Gaussian of ≈ 0.68142
        assert!((exact - 0.66799).abs() < 1e-3);
        let best = sweep.energies[sweep.min_index];
        assert!(best >= exact);
        assert!(best - exact < 0.03 * exact.abs());
    }

    #[test]
    fn user_grid_agrees_with_default_window() {
        let pot = Potential::Quartic { a: 1.0 };
        let grid = Grid::new(-8.0, 8.0, 1001, &Limits::default()).unwrap();
        let e_default = gaussian_energy(&pot, 1.3, None);
        let e_grid = gaussian_energy(&pot, 1.3, Some(&grid));
        assert!((e_default - e_grid).abs() < 1e-6);
    }

    #[test]
    fn helium_minimum_at_screened_charge() {
        let zs: Vec<f64> = (0..=200).map(|k| 1.0 + 0.005 * k as f64).collect();
        let sweep = helium(&zs, DEF_NUCLEAR_CHARGE, &Limits::default()).unwrap();
        // dE/dZ = 0 at Z = 27/16
        assert!((zs[sweep.min_index] - 27.0 / 16.0).abs() < 0.005);
        let best = sweep.energies[sweep.min_index];
        assert!((best + (27.0_f64 / 16.0).powi(2)).abs() < 1e-4);
        assert!(best > HELIUM_REF_ENERGY);
        assert_eq!(sweep.reference, Some(HELIUM_REF_ENERGY));
        let li = helium(&zs, 3.0, &Limits::default()).unwrap();
        assert_eq!(li.reference, None);
    }

    #[test]
    fn rejects_bad_sweeps() {
        let pot = Potential::Harmonic { omega: 1.0 };
        assert!(oscillator(&[], &pot, None, &Limits::default()).is_err());
        assert!(oscillator(&[1.0, -1.0], &pot, None, &Limits::default()).is_err());
        assert!(helium(&[f64::NAN], 2.0, &Limits::default()).is_err());
    }
}
