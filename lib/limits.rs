//! Upper bounds on request sizes.
//!
//! Every engine entry point accepts a [`Limits`] and checks its inputs against
//! it before doing any `O(N³)` work, so that oversized requests are rejected
//! cheaply.

use crate::error::ValidationError;

/// Default bound on matrix dimension.
pub const DEF_MAX_DIM: usize = 256;
/// Default bound on spatial grid size.
pub const DEF_MAX_GRID_POINTS: usize = 1024;
/// Default bound on time samples.
pub const DEF_MAX_STEPS: usize = 20_000;
/// Default bound on parameter sweep lengths.
pub const DEF_MAX_SWEEP: usize = 10_000;
/// Default bound on the element count of any returned 2D array.
pub const DEF_MAX_SAMPLES: usize = 4_000_000;

/// Size limits applied to untrusted requests.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Maximum matrix dimension `N`.
    pub max_dim: usize,
    /// Maximum number of spatial grid points.
    pub max_grid_points: usize,
    /// Maximum number of time samples (`nSteps`/`nFrames`).
    pub max_steps: usize,
    /// Maximum length of parameter sweeps (`alphaArray`, `EArray`, ...).
    pub max_sweep: usize,
    /// Maximum number of elements in a returned 2D array.
    pub max_samples: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_dim: DEF_MAX_DIM,
            max_grid_points: DEF_MAX_GRID_POINTS,
            max_steps: DEF_MAX_STEPS,
            max_sweep: DEF_MAX_SWEEP,
            max_samples: DEF_MAX_SAMPLES,
        }
    }
}

fn check_max(what: &'static str, limit: usize, got: usize)
    -> Result<(), ValidationError>
{
    (got <= limit).then_some(())
        .ok_or(ValidationError::LimitExceeded { what, limit, got })
}

impl Limits {
    /// Check a matrix dimension: `2 <= n <= max_dim`.
    pub fn check_dim(&self, what: &'static str, n: usize)
        -> Result<(), ValidationError>
    {
        ValidationError::check_min(what, 2, n)?;
        check_max(what, self.max_dim, n)
    }

    /// Check a spatial grid size: `3 <= n <= max_grid_points`.
    pub fn check_grid_points(&self, n: usize) -> Result<(), ValidationError> {
        ValidationError::check_min("nPoints", 3, n)?;
        check_max("nPoints", self.max_grid_points, n)
    }

    /// Check a time sample count: `1 <= n <= max_steps`.
    pub fn check_steps(&self, what: &'static str, n: usize)
        -> Result<(), ValidationError>
    {
        ValidationError::check_min(what, 1, n)?;
        check_max(what, self.max_steps, n)
    }

    /// Check a sweep length: `1 <= n <= max_sweep`.
    pub fn check_sweep(&self, what: &'static str, n: usize)
        -> Result<(), ValidationError>
    {
        if n == 0 { return Err(ValidationError::Empty(what)); }
        check_max(what, self.max_sweep, n)
    }

    /// Check the element count of a `rows × cols` output array.
    pub fn check_samples(&self, what: &'static str, rows: usize, cols: usize)
        -> Result<(), ValidationError>
    {
        check_max(what, self.max_samples, rows.saturating_mul(cols))
    }
}
