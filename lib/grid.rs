//! Uniform spatial and temporal sampling grids.

use ndarray as nd;
use crate::{
    error::ValidationError,
    limits::Limits,
};

/// Uniform spatial grid over `[x_min, x_max]`, endpoints included.
///
/// Arrays borrowed from this type are guaranteed to have length at least 3 and
/// uniform spacing. Wavefunctions defined over a `Grid` are implicitly zero
/// outside of it.
#[derive(Clone, Debug)]
pub struct Grid {
    // coordinate array
    x: nd::Array1<f64>,
    // coordinate array grid spacing
    dx: f64,
}

impl Grid {
    /// Create a new `Grid` from "linspace-style" arguments (start, inclusive
    /// end, and number of points).
    pub fn new(x_min: f64, x_max: f64, n_points: usize, limits: &Limits)
        -> Result<Self, ValidationError>
    {
        ValidationError::check_range("[xMin, xMax]", x_min, x_max)?;
        ValidationError::check_finite("xMax - xMin", x_max - x_min)?;
        limits.check_grid_points(n_points)?;
        let x: nd::Array1<f64> = nd::Array1::linspace(x_min, x_max, n_points);
        let dx = x[1] - x[0];
        ValidationError::check_positive("dx", dx)?;
        // kinetic terms scale as 1/dx²
        ValidationError::check_finite("1/dx²", dx.powi(2).recip())?;
        Ok(Self { x, dx })
    }

    /// Get a reference to the coordinate array.
    pub fn x(&self) -> &nd::Array1<f64> { &self.x }

    /// Get the grid spacing.
    pub fn dx(&self) -> f64 { self.dx }

    /// Get the first coordinate.
    pub fn x_min(&self) -> f64 { self.x[0] }

    /// Get the last coordinate.
    pub fn x_max(&self) -> f64 { self.x[self.x.len() - 1] }

    /// Get the number of points.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize { self.x.len() }

    /// Sample a function over the grid.
    pub fn sample<F>(&self, f: F) -> nd::Array1<f64>
    where F: FnMut(f64) -> f64
    {
        self.x.mapv(f)
    }
}

/// Uniform time samples `t[k] = t_max k / (n - 1)`, `k = 0, ..., n - 1`.
///
/// `t_max` may be negative (backward evolution) or zero; a single sample is
/// just `t = 0`.
#[derive(Clone, Debug)]
pub struct TimeGrid {
    t: nd::Array1<f64>,
}

impl TimeGrid {
    /// Create a new `TimeGrid` from a final time and a number of samples.
    pub fn new(
        what: &'static str,
        t_max: f64,
        n_steps: usize,
        limits: &Limits,
    ) -> Result<Self, ValidationError>
    {
        ValidationError::check_finite("tMax", t_max)?;
        limits.check_steps(what, n_steps)?;
        let t: nd::Array1<f64>
            = (0..n_steps)
            .map(|k| {
                if n_steps == 1 {
                    0.0
                } else {
                    t_max * (k as f64 / (n_steps - 1) as f64)
                }
            })
            .collect();
        Ok(Self { t })
    }

    /// Get a reference to the time array.
    pub fn t(&self) -> &nd::Array1<f64> { &self.t }

    /// Get the number of samples.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize { self.t.len() }
}
